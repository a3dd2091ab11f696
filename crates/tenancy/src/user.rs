use chrono::{DateTime, Utc};
use serde::Serialize;

use teamspace_auth::Role;
use teamspace_core::{DomainError, DomainResult, TenantId, UserId};

/// A member of a tenant, or a platform operator when `tenant_id` is `None`.
///
/// Invariant: `role == SuperAdmin` iff `tenant_id.is_none()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(DomainError::validation("A valid email is required"));
    }
    Ok(())
}

/// Roles a tenant admin may hand out. Super admin is never assignable.
pub fn validate_assignable_role(role: Role) -> DomainResult<()> {
    match role {
        Role::User | Role::TenantAdmin => Ok(()),
        Role::SuperAdmin => Err(DomainError::validation("Invalid role")),
    }
}

/// Validated input for adding a user to a tenant. The credential arrives
/// already hashed; plaintext never reaches the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> DomainResult<Self> {
        let email = email.into();
        let full_name = full_name.into();
        validate_email(&email)?;
        if full_name.trim().is_empty() {
            return Err(DomainError::validation(
                "Email, password, and name are required",
            ));
        }
        validate_assignable_role(role)?;
        Ok(Self {
            email,
            password_hash: password_hash.into(),
            full_name,
            role,
        })
    }
}

/// Partial user update. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.role.is_none() && self.is_active.is_none()
    }

    /// Role and activation changes are admin-gated even when the base
    /// update is otherwise allowed.
    pub fn touches_admin_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(full_name) = &self.full_name {
            if full_name.trim().is_empty() {
                return Err(DomainError::validation("Name cannot be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn email_needs_an_at_sign() {
        assert!(validate_email("ada@acme.test").is_ok());
        assert!(validate_email("ada.acme.test").is_err());
        assert!(validate_email("   ").is_err());
    }

    #[test]
    fn super_admin_is_not_assignable() {
        assert!(validate_assignable_role(Role::User).is_ok());
        assert!(validate_assignable_role(Role::TenantAdmin).is_ok());
        let err = validate_assignable_role(Role::SuperAdmin).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_user_requires_a_name() {
        let err = NewUser::new("ada@acme.test", "digest", "  ", Role::User).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn patch_flags_admin_fields() {
        let patch = UserPatch {
            full_name: Some("Ada Lovelace".into()),
            ..UserPatch::default()
        };
        assert!(!patch.touches_admin_fields());

        let patch = UserPatch {
            is_active: Some(false),
            ..UserPatch::default()
        };
        assert!(patch.touches_admin_fields());
        assert!(!patch.is_empty());
    }
}
