//! Registration, login, and session identity.

use std::sync::Arc;

use tracing::instrument;

use teamspace_audit::{AuditAction, AuditEntry, AuditSink, EntityKind, RequestOrigin};
use teamspace_auth::{Claims, CredentialHasher, Role, SignedToken, TokenCodec};
use teamspace_core::{DomainError, DomainResult};
use teamspace_tenancy::{NewTenant, NewUser, Tenant, User, validate_email, validate_password};

use super::audit_entry;
use crate::store::WorkspaceStore;

/// Input for self-service tenant registration.
#[derive(Debug, Clone)]
pub struct RegisterTenant {
    pub tenant_name: String,
    pub subdomain: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
}

/// Login credentials. `subdomain` is absent for platform operators.
#[derive(Debug, Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
    pub subdomain: Option<String>,
}

/// A fresh workspace plus the signed-in admin session.
#[derive(Debug, Clone)]
pub struct RegisteredTenant {
    pub tenant: Tenant,
    pub admin: User,
    pub token: SignedToken,
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SignedToken,
    pub user: User,
}

/// The acting user plus their tenant, for the profile surface.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub tenant: Option<Tenant>,
}

/// Registration and login flows.
///
/// Hashing and token signing are injected so tests can run with cheap
/// deterministic substitutes.
pub struct IdentityService<S, A> {
    store: S,
    audit: A,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenCodec>,
}

impl<S, A> IdentityService<S, A>
where
    S: WorkspaceStore,
    A: AuditSink,
{
    pub fn new(
        store: S,
        audit: A,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            store,
            audit,
            hasher,
            tokens,
        }
    }

    /// Create a tenant with its first admin and sign them in.
    ///
    /// One transaction in the store: either both rows land or neither does.
    #[instrument(skip_all, fields(subdomain = %input.subdomain), err)]
    pub async fn register(
        &self,
        input: RegisterTenant,
        origin: &RequestOrigin,
    ) -> DomainResult<RegisteredTenant> {
        let blank = [
            &input.tenant_name,
            &input.subdomain,
            &input.admin_email,
            &input.admin_password,
            &input.admin_name,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if blank {
            return Err(DomainError::validation("All fields are required"));
        }

        let subdomain = input.subdomain.trim().to_lowercase();
        let new_tenant = NewTenant::new(input.tenant_name, subdomain)?;
        validate_password(&input.admin_password)?;
        validate_email(&input.admin_email)?;

        let hash = self
            .hasher
            .hash(&input.admin_password)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let new_admin = NewUser::new(input.admin_email, hash, input.admin_name, Role::TenantAdmin)?;

        let (tenant, admin) = self
            .store
            .create_tenant_with_admin(&new_tenant, &new_admin)
            .await?;

        let claims = Claims::new(admin.id, Some(tenant.id), admin.role);
        let token = self.tokens.sign(&claims)?;

        self.audit
            .record(AuditEntry::new(
                Some(tenant.id),
                Some(admin.id),
                AuditAction::RegisterTenant,
                EntityKind::Tenant,
                *tenant.id.as_uuid(),
                origin,
            ))
            .await;

        Ok(RegisteredTenant {
            tenant,
            admin,
            token,
        })
    }

    /// Authenticate within a tenant, or on the platform when no subdomain
    /// is given.
    ///
    /// A missing account and a wrong password produce the same error, and
    /// the password is checked before the account's activation flag, so the
    /// response does not reveal whether the address exists.
    #[instrument(skip_all, fields(scoped = input.subdomain.is_some()), err)]
    pub async fn login(&self, input: Login, origin: &RequestOrigin) -> DomainResult<Session> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(DomainError::validation("Email and password are required"));
        }

        let user = match &input.subdomain {
            Some(raw) => {
                let subdomain = raw.trim().to_lowercase();
                let tenant = self
                    .store
                    .find_tenant_by_subdomain(&subdomain)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Tenant not found"))?;
                if !tenant.is_active() {
                    return Err(DomainError::forbidden("Tenant account is not active"));
                }
                self.store.find_user_by_email(tenant.id, &input.email).await?
            }
            None => self.store.find_super_admin_by_email(&input.email).await?,
        };

        let user = user.ok_or_else(|| DomainError::unauthenticated("Invalid credentials"))?;
        let matches = self
            .hasher
            .verify(&input.password, &user.password_hash)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        if !matches {
            return Err(DomainError::unauthenticated("Invalid credentials"));
        }
        if !user.is_active {
            return Err(DomainError::forbidden("Account is deactivated"));
        }

        let claims = Claims::new(user.id, user.tenant_id, user.role);
        let token = self.tokens.sign(&claims)?;

        self.audit
            .record(AuditEntry::new(
                user.tenant_id,
                Some(user.id),
                AuditAction::Login,
                EntityKind::User,
                *user.id.as_uuid(),
                origin,
            ))
            .await;

        Ok(Session { token, user })
    }

    /// Resolve the acting user and their tenant from verified claims.
    pub async fn current_user(&self, claims: &Claims) -> DomainResult<CurrentUser> {
        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        let tenant = match user.tenant_id {
            Some(tenant_id) => self.store.find_tenant(tenant_id).await?,
            None => None,
        };
        Ok(CurrentUser { user, tenant })
    }

    /// Tokens are stateless; logout only leaves a trail entry.
    pub async fn logout(&self, claims: &Claims, origin: &RequestOrigin) {
        self.audit
            .record(audit_entry(
                claims,
                AuditAction::Logout,
                EntityKind::User,
                *claims.sub.as_uuid(),
                origin,
            ))
            .await;
    }
}
