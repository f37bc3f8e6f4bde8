use chrono::Utc;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use wms_auth::{
    ChangeRole, CreateUser, DeleteUser, PasswordChangeReason, Permission, Principal, RenameUser,
    Role, SetPasswordHash, User, UserCommand,
};
use wms_core::{Aggregate, DomainError, UserId};
use wms_events::{EventBus, EventEnvelope, execute};

use super::WarehouseService;
use crate::error::{WorkflowError, WorkflowResult};
use crate::event_store::EventStore;
use crate::projections::UserView;
use crate::streams;
use crate::unique_index::IndexScope;
use crate::unit_of_work::UnitOfWork;

/// Admin edit of a user; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub role: Option<Role>,
}

fn require_password(password: &str) -> Result<(), DomainError> {
    if password.trim().is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    Ok(())
}

impl<S, B> WarehouseService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Check a username/password pair.
    ///
    /// Unknown user, deleted user and wrong password all fail the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> WorkflowResult<Principal> {
        let rejected = || -> WorkflowError {
            tracing::warn!(username, "login rejected");
            DomainError::InvalidCredentials.into()
        };

        let Some(id) = self.index.lookup(IndexScope::Username, username.trim()) else {
            return Err(rejected());
        };
        let user_id = UserId::from(id);

        let mut uow = UnitOfWork::begin(&self.store);
        let user: User = uow.load(id, || User::empty(user_id))?;

        let verified = user.is_active()
            && user
                .password_hash()
                .is_some_and(|hash| self.hasher.verify(password, hash));
        if !verified {
            return Err(rejected());
        }

        tracing::info!(username = user.username(), role = %user.role(), "login");
        Ok(Principal::new(user_id, user.username(), user.role()))
    }

    pub fn create_user(
        &self,
        actor: &Principal,
        username: &str,
        password: &str,
        role: Role,
    ) -> WorkflowResult<UserView> {
        self.authorize(actor, Permission::UsersCreate)?;
        let view = self.insert_user(username, password, role)?;
        tracing::info!(username = %view.username, role = %role, by = %actor.username, "user created");
        Ok(view)
    }

    /// Create the first admin of an empty user store and return it as a
    /// principal. Fails once any user exists.
    pub fn bootstrap_admin(&self, username: &str, password: &str) -> WorkflowResult<Principal> {
        if !self.projections.users.list().is_empty() {
            return Err(DomainError::invariant("users already exist").into());
        }
        let view = self.insert_user(username, password, Role::Admin)?;
        tracing::info!(username = %view.username, "first admin created");
        Ok(Principal::new(view.user_id, view.username, view.role))
    }

    /// Rename and/or change the role of a user in one commit.
    pub fn update_user(
        &self,
        actor: &Principal,
        user_id: UserId,
        changes: UserChanges,
    ) -> WorkflowResult<UserView> {
        self.authorize(actor, Permission::UsersUpdate)?;

        let current = self.user_view(user_id)?;
        let new_username = changes
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| *u != current.username)
            .map(str::to_string);
        if new_username.as_deref() == Some("") {
            return Err(DomainError::validation("username is required").into());
        }
        let claim = match &new_username {
            Some(name) => Some(self.index.reserve(IndexScope::Username, name, user_id.into())?),
            None => None,
        };

        self.run("users.update", |uow| {
            let mut user: User = uow.load(user_id.into(), || User::empty(user_id))?;
            let now = Utc::now();
            let mut events = Vec::new();
            if let Some(name) = &new_username {
                events.extend(execute(&mut user, &UserCommand::Rename(RenameUser {
                    user_id,
                    username: name.clone(),
                    occurred_at: now,
                }))?);
            }
            if let Some(role) = changes.role {
                events.extend(execute(&mut user, &UserCommand::ChangeRole(ChangeRole {
                    user_id,
                    role,
                    occurred_at: now,
                }))?);
            }
            uow.stage(user_id.into(), streams::USER, &events)
        })?;

        if let Some(claim) = claim {
            claim.commit();
            self.index.release(IndexScope::Username, &current.username);
        }

        tracing::info!(user_id = %user_id, by = %actor.username, "user updated");
        self.user_view(user_id)
    }

    /// Admin reset; no knowledge of the old password needed.
    pub fn reset_password(
        &self,
        actor: &Principal,
        user_id: UserId,
        new_password: &str,
    ) -> WorkflowResult<UserView> {
        self.authorize(actor, Permission::UsersResetPassword)?;
        require_password(new_password)?;

        self.set_password(user_id, new_password, PasswordChangeReason::AdminReset)?;
        tracing::info!(user_id = %user_id, by = %actor.username, "password reset");
        self.user_view(user_id)
    }

    /// Self-service change; the current password must be proven first.
    pub fn change_own_password(
        &self,
        actor: &Principal,
        old_password: &str,
        new_password: &str,
    ) -> WorkflowResult<()> {
        self.authorize(actor, Permission::AccountChangePassword)?;
        require_password(new_password)?;

        let mut uow = UnitOfWork::begin(&self.store);
        let user: User = uow.load(actor.user_id.into(), || User::empty(actor.user_id))?;
        let verified = user.is_active()
            && user
                .password_hash()
                .is_some_and(|hash| self.hasher.verify(old_password, hash));
        if !verified {
            tracing::warn!(username = %actor.username, "password change rejected");
            return Err(DomainError::InvalidCredentials.into());
        }

        self.set_password(actor.user_id, new_password, PasswordChangeReason::SelfService)?;
        tracing::info!(username = %actor.username, "password changed");
        Ok(())
    }

    /// Fails with `SelfDeletion` when `user_id` is the caller.
    pub fn delete_user(&self, actor: &Principal, user_id: UserId) -> WorkflowResult<()> {
        self.authorize(actor, Permission::UsersDelete)?;

        let username = self.run("users.delete", |uow| {
            let user: User = uow.load(user_id.into(), || User::empty(user_id))?;
            let events = user.handle(&UserCommand::Delete(DeleteUser {
                user_id,
                actor_id: actor.user_id,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(user_id.into(), streams::USER, &events)?;
            Ok(user.username().to_string())
        })?;
        self.index.release(IndexScope::Username, &username);

        tracing::info!(username = %username, by = %actor.username, "user deleted");
        Ok(())
    }

    /// Ordered by username.
    pub fn list_users(&self, actor: &Principal) -> WorkflowResult<Vec<UserView>> {
        self.authorize(actor, Permission::UsersList)?;
        Ok(self.projections.users.list())
    }

    fn insert_user(&self, username: &str, password: &str, role: Role) -> WorkflowResult<UserView> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username is required").into());
        }
        require_password(password)?;

        let user_id = UserId::new();
        let claim = self.index.reserve(IndexScope::Username, &username, user_id.into())?;
        let password_hash = self.hasher.hash(password)?;

        self.run("users.create", |uow| {
            let user: User = uow.load(user_id.into(), || User::empty(user_id))?;
            let events = user.handle(&UserCommand::Create(CreateUser {
                user_id,
                username: username.clone(),
                password_hash: password_hash.clone(),
                role,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(user_id.into(), streams::USER, &events)
        })?;
        claim.commit();

        self.user_view(user_id)
    }

    fn set_password(
        &self,
        user_id: UserId,
        password: &str,
        reason: PasswordChangeReason,
    ) -> WorkflowResult<()> {
        let password_hash = self.hasher.hash(password)?;
        self.run("users.set_password", |uow| {
            let user: User = uow.load(user_id.into(), || User::empty(user_id))?;
            let events = user.handle(&UserCommand::SetPasswordHash(SetPasswordHash {
                user_id,
                password_hash: password_hash.clone(),
                reason,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(user_id.into(), streams::USER, &events)
        })
    }

    fn user_view(&self, user_id: UserId) -> WorkflowResult<UserView> {
        Self::committed_view(self.projections.users.get(&user_id), format!("user {user_id}"))
    }
}
