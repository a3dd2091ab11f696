//! `teamspace-tenancy` — tenants, users, and subscription quota admission.
//!
//! Pure domain types and validation; storage and transport live elsewhere.

pub mod quota;
pub mod tenant;
pub mod user;

pub use quota::Admission;
pub use tenant::{
    DEFAULT_MAX_PROJECTS, DEFAULT_MAX_USERS, NewTenant, SubscriptionPlan, Tenant, TenantPatch,
    TenantStatus, validate_subdomain,
};
pub use user::{
    MIN_PASSWORD_LEN, NewUser, User, UserPatch, validate_assignable_role, validate_email,
    validate_password,
};
