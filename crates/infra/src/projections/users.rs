//! User directory read model. Password hashes never reach it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use wms_auth::{Role, UserEvent};
use wms_core::UserId;
use wms_events::EventEnvelope;

use super::{ProjectionCursorStore, ProjectionError, admit};
use crate::read_model::KeyedStore;
use crate::streams;

const PROJECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct UsersProjection<S> {
    store: S,
    cursors: Arc<dyn ProjectionCursorStore>,
}

impl<S> UsersProjection<S>
where
    S: KeyedStore<UserId, UserView>,
{
    pub fn new(store: S, cursors: Arc<dyn ProjectionCursorStore>) -> Self {
        Self { store, cursors }
    }

    pub fn get(&self, user_id: &UserId) -> Option<UserView> {
        self.store.get(user_id)
    }

    /// Ordered by username.
    pub fn list(&self) -> Vec<UserView> {
        let mut users = self.store.list();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::USER {
            return Ok(());
        }
        if !admit(self.cursors.as_ref(), PROJECTION, envelope)? {
            return Ok(());
        }

        let event: UserEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        match event {
            UserEvent::Created(e) => {
                self.store.upsert(
                    e.user_id,
                    UserView {
                        user_id: e.user_id,
                        username: e.username,
                        role: e.role,
                        created_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    },
                );
            }
            UserEvent::Renamed(e) => {
                if let Some(mut model) = self.store.get(&e.user_id) {
                    model.username = e.username;
                    model.updated_at = e.occurred_at;
                    self.store.upsert(e.user_id, model);
                }
            }
            UserEvent::RoleChanged(e) => {
                if let Some(mut model) = self.store.get(&e.user_id) {
                    model.role = e.role;
                    model.updated_at = e.occurred_at;
                    self.store.upsert(e.user_id, model);
                }
            }
            UserEvent::PasswordHashSet(e) => {
                if let Some(mut model) = self.store.get(&e.user_id) {
                    model.updated_at = e.occurred_at;
                    self.store.upsert(e.user_id, model);
                }
            }
            UserEvent::Deleted(e) => {
                self.store.remove(&e.user_id);
            }
        }

        self.cursors
            .update_cursor(envelope.aggregate_id(), PROJECTION, envelope.sequence_number());
        Ok(())
    }

    pub fn reset(&self) {
        self.cursors.clear_cursors(PROJECTION);
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wms_auth::{PasswordHash, UserCreated, UserDeleted};

    use crate::projections::InMemoryCursorStore;
    use crate::read_model::InMemoryStore;

    fn env(user_id: UserId, seq: u64, event: UserEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            user_id.into(),
            streams::USER.to_string(),
            seq,
            serde_json::to_value(event).unwrap(),
        )
    }

    #[test]
    fn deleted_users_disappear_and_hashes_are_not_projected() {
        let p = UsersProjection::new(InMemoryStore::new(), Arc::new(InMemoryCursorStore::new()));
        let user_id = UserId::new();
        let now = Utc::now();

        p.apply_envelope(&env(user_id, 1, UserEvent::Created(UserCreated {
            user_id,
            username: "picker".to_string(),
            password_hash: PasswordHash::from_hash("$2b$04$secret"),
            role: Role::Picker,
            occurred_at: now,
        })))
        .unwrap();

        let json = serde_json::to_string(&p.list()).unwrap();
        assert!(!json.contains("secret"));

        p.apply_envelope(&env(user_id, 2, UserEvent::Deleted(UserDeleted {
            user_id,
            username: "picker".to_string(),
            deleted_by: UserId::new(),
            occurred_at: now,
        })))
        .unwrap();
        assert!(p.get(&user_id).is_none());
    }
}
