//! `wms-auth`: users, roles and the authorization policy table.
//!
//! Decoupled from HTTP and storage: the API layer decodes bearer tokens with
//! [`JwtValidator`], and workflow services consult [`Policy`] once per
//! operation.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthorizationExplanation, AuthzError, Policy, authorize, explain_authorization};
pub use claims::{
    Hs256Jwt, JwtClaims, JwtError, JwtValidator, TokenValidationError, validate_claims,
};
pub use password::{HashError, PasswordHash, PasswordHasher};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use user::{
    ChangeRole, CreateUser, DeleteUser, PasswordChangeReason, PasswordHashSet, RenameUser,
    SetPasswordHash, User, UserCommand, UserCreated, UserDeleted, UserEvent, UserRenamed,
    UserRoleChanged,
};
