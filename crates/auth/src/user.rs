//! User account aggregate (event-sourced).
//!
//! Username uniqueness is enforced by infrastructure (a unique index), not
//! here. Password hashes are computed before a command is built, so the
//! aggregate stays free of crypto.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{Aggregate, AggregateRoot, DomainError, UserId};
use wms_events::Event;

use crate::{PasswordHash, Role};

/// User account.
///
/// # Invariants
/// - `username` is non-blank and trimmed.
/// - A deleted user accepts no further commands.
/// - A user can never delete their own account.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    username: String,
    role: Role,
    password_hash: Option<PasswordHash>,
    created_at: Option<DateTime<Utc>>,
    deleted: bool,
    version: u64,
    created: bool,
}

impl User {
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            username: String::new(),
            role: Role::Picker,
            password_hash: None,
            created_at: None,
            deleted: false,
            version: 0,
            created: false,
        }
    }

    /// Created and not deleted.
    pub fn is_active(&self) -> bool {
        self.created && !self.deleted
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password_hash(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if !self.is_active() {
            return Err(DomainError::not_found(format!("user {}", self.id)));
        }
        Ok(())
    }

    fn ensure_user_id(&self, user_id: UserId) -> Result<(), DomainError> {
        if self.id != user_id {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }
}

impl AggregateRoot for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameUser {
    pub user_id: UserId,
    pub username: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRole {
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Who replaced the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordChangeReason {
    /// An admin reset it.
    AdminReset,
    /// The user changed it after proving the old one.
    SelfService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPasswordHash {
    pub user_id: UserId,
    pub password_hash: PasswordHash,
    pub reason: PasswordChangeReason,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUser {
    pub user_id: UserId,
    /// The authenticated caller.
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserCommand {
    Create(CreateUser),
    Rename(RenameUser),
    ChangeRole(ChangeRole),
    SetPasswordHash(SetPasswordHash),
    Delete(DeleteUser),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreated {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRenamed {
    pub user_id: UserId,
    pub previous_username: String,
    pub username: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleChanged {
    pub user_id: UserId,
    pub previous_role: Role,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHashSet {
    pub user_id: UserId,
    pub password_hash: PasswordHash,
    pub reason: PasswordChangeReason,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDeleted {
    pub user_id: UserId,
    pub username: String,
    pub deleted_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserEvent {
    Created(UserCreated),
    Renamed(UserRenamed),
    RoleChanged(UserRoleChanged),
    PasswordHashSet(PasswordHashSet),
    Deleted(UserDeleted),
}

impl Event for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Created(_) => "auth.user.created",
            UserEvent::Renamed(_) => "auth.user.renamed",
            UserEvent::RoleChanged(_) => "auth.user.role_changed",
            UserEvent::PasswordHashSet(_) => "auth.user.password_set",
            UserEvent::Deleted(_) => "auth.user.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::Created(e) => e.occurred_at,
            UserEvent::Renamed(e) => e.occurred_at,
            UserEvent::RoleChanged(e) => e.occurred_at,
            UserEvent::PasswordHashSet(e) => e.occurred_at,
            UserEvent::Deleted(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for User {
    type Command = UserCommand;
    type Event = UserEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            UserEvent::Created(e) => {
                self.id = e.user_id;
                self.username = e.username.clone();
                self.role = e.role;
                self.password_hash = Some(e.password_hash.clone());
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            UserEvent::Renamed(e) => self.username = e.username.clone(),
            UserEvent::RoleChanged(e) => self.role = e.role,
            UserEvent::PasswordHashSet(e) => self.password_hash = Some(e.password_hash.clone()),
            UserEvent::Deleted(_) => self.deleted = true,
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            UserCommand::Create(cmd) => self.handle_create(cmd),
            UserCommand::Rename(cmd) => self.handle_rename(cmd),
            UserCommand::ChangeRole(cmd) => self.handle_change_role(cmd),
            UserCommand::SetPasswordHash(cmd) => self.handle_set_password(cmd),
            UserCommand::Delete(cmd) => self.handle_delete(cmd),
        }
    }
}

impl User {
    fn handle_create(&self, cmd: &CreateUser) -> Result<Vec<UserEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("user already exists"));
        }
        let username = normalize_username(&cmd.username)?;

        Ok(vec![UserEvent::Created(UserCreated {
            user_id: cmd.user_id,
            username,
            password_hash: cmd.password_hash.clone(),
            role: cmd.role,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_rename(&self, cmd: &RenameUser) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_active()?;
        self.ensure_user_id(cmd.user_id)?;

        let username = normalize_username(&cmd.username)?;
        if username == self.username {
            return Ok(vec![]);
        }

        Ok(vec![UserEvent::Renamed(UserRenamed {
            user_id: cmd.user_id,
            previous_username: self.username.clone(),
            username,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_role(&self, cmd: &ChangeRole) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_active()?;
        self.ensure_user_id(cmd.user_id)?;

        if cmd.role == self.role {
            return Ok(vec![]);
        }

        Ok(vec![UserEvent::RoleChanged(UserRoleChanged {
            user_id: cmd.user_id,
            previous_role: self.role,
            role: cmd.role,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_password(&self, cmd: &SetPasswordHash) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_active()?;
        self.ensure_user_id(cmd.user_id)?;

        Ok(vec![UserEvent::PasswordHashSet(PasswordHashSet {
            user_id: cmd.user_id,
            password_hash: cmd.password_hash.clone(),
            reason: cmd.reason,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteUser) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_active()?;
        self.ensure_user_id(cmd.user_id)?;

        if cmd.actor_id == self.id {
            return Err(DomainError::SelfDeletion);
        }

        Ok(vec![UserEvent::Deleted(UserDeleted {
            user_id: cmd.user_id,
            username: self.username.clone(),
            deleted_by: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn normalize_username(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_events::execute;

    fn hash(s: &str) -> PasswordHash {
        PasswordHash::from_hash(format!("hash:{s}"))
    }

    fn created_user(role: Role) -> User {
        let id = UserId::new();
        let mut user = User::empty(id);
        let cmd = UserCommand::Create(CreateUser {
            user_id: id,
            username: "  supervisor ".into(),
            password_hash: hash("super123"),
            role,
            occurred_at: Utc::now(),
        });
        execute(&mut user, &cmd).unwrap();
        user
    }

    #[test]
    fn create_trims_username() {
        let user = created_user(Role::Supervisor);
        assert_eq!(user.username(), "supervisor");
        assert!(user.is_active());
        assert_eq!(user.version(), 1);
    }

    #[test]
    fn blank_username_is_rejected() {
        let id = UserId::new();
        let cmd = UserCommand::Create(CreateUser {
            user_id: id,
            username: "   ".into(),
            password_hash: hash("x"),
            role: Role::Picker,
            occurred_at: Utc::now(),
        });
        assert!(matches!(
            User::empty(id).handle(&cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn self_deletion_is_refused() {
        let user = created_user(Role::Admin);
        let me = *user.id();
        let cmd = UserCommand::Delete(DeleteUser {
            user_id: me,
            actor_id: me,
            occurred_at: Utc::now(),
        });
        assert_eq!(user.handle(&cmd).unwrap_err(), DomainError::SelfDeletion);
    }

    #[test]
    fn deleted_user_accepts_nothing() {
        let mut user = created_user(Role::Picker);
        let id = *user.id();
        let delete = UserCommand::Delete(DeleteUser {
            user_id: id,
            actor_id: UserId::new(),
            occurred_at: Utc::now(),
        });
        execute(&mut user, &delete).unwrap();
        assert!(!user.is_active());

        let rename = UserCommand::Rename(RenameUser {
            user_id: id,
            username: "ghost".into(),
            occurred_at: Utc::now(),
        });
        assert!(matches!(user.handle(&rename), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn unchanged_role_or_name_emits_nothing() {
        let user = created_user(Role::Supervisor);
        let id = *user.id();
        let same_role = UserCommand::ChangeRole(ChangeRole {
            user_id: id,
            role: Role::Supervisor,
            occurred_at: Utc::now(),
        });
        let same_name = UserCommand::Rename(RenameUser {
            user_id: id,
            username: "supervisor".into(),
            occurred_at: Utc::now(),
        });
        assert!(user.handle(&same_role).unwrap().is_empty());
        assert!(user.handle(&same_name).unwrap().is_empty());
    }

    #[test]
    fn role_change_records_previous_role() {
        let mut user = created_user(Role::Picker);
        let id = *user.id();
        let cmd = UserCommand::ChangeRole(ChangeRole {
            user_id: id,
            role: Role::Supervisor,
            occurred_at: Utc::now(),
        });
        let events = execute(&mut user, &cmd).unwrap();
        match &events[0] {
            UserEvent::RoleChanged(e) => assert_eq!(e.previous_role, Role::Picker),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(user.role(), Role::Supervisor);
    }

    #[test]
    fn password_replacement_swaps_hash() {
        let mut user = created_user(Role::Picker);
        let id = *user.id();
        let cmd = UserCommand::SetPasswordHash(SetPasswordHash {
            user_id: id,
            password_hash: hash("new"),
            reason: PasswordChangeReason::AdminReset,
            occurred_at: Utc::now(),
        });
        execute(&mut user, &cmd).unwrap();
        assert_eq!(user.password_hash(), Some(&hash("new")));
    }
}
