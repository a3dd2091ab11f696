//! `teamspace-auth` — identity, roles, and the pure authorization engine.
//!
//! This crate is intentionally decoupled from HTTP and storage: decisions are
//! computed from decoded claims plus a resource descriptor the caller
//! resolves. Token and credential-hash capabilities live here as traits so
//! the lifecycle layer can take them by injection.

pub mod claims;
pub mod engine;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::Claims;
pub use engine::{
    Action, Decision, DenyReason, ProjectAction, ResourceRef, TaskAction, TenantAction,
    UserAction, decide,
};
pub use password::{Argon2Hasher, CredentialHasher, HashError};
pub use roles::Role;
pub use token::{DEFAULT_TTL_SECS, Hs256TokenCodec, SignedToken, TokenCodec, TokenError};
