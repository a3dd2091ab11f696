//! Tenant roster management: add, list, update, and remove members.

use std::sync::Arc;

use tracing::instrument;

use teamspace_audit::{AuditAction, AuditSink, EntityKind, RequestOrigin};
use teamspace_auth::{
    Action, Claims, CredentialHasher, Decision, DenyReason, ResourceRef, Role, UserAction, decide,
};
use teamspace_core::{DomainError, DomainResult, Listing, PageRequest, TenantId, UserId};
use teamspace_tenancy::{NewUser, User, UserPatch, validate_assignable_role, validate_password};

use super::{Surface, Updated, audit_entry, deny_error, ensure};
use crate::store::WorkspaceStore;
use crate::store::filter::UserFilter;

/// Input for adding a member to a tenant. `role` defaults to plain user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<Role>,
}

pub struct UserService<S, A> {
    store: S,
    audit: A,
    hasher: Arc<dyn CredentialHasher>,
}

impl<S, A> UserService<S, A>
where
    S: WorkspaceStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            store,
            audit,
            hasher,
        }
    }

    /// Add a member. Quota admission happens inside the store transaction.
    #[instrument(skip_all, fields(tenant_id = %tenant_id), err)]
    pub async fn create(
        &self,
        claims: &Claims,
        tenant_id: TenantId,
        input: CreateUser,
        origin: &RequestOrigin,
    ) -> DomainResult<User> {
        ensure(
            decide(
                claims,
                Action::User(UserAction::Create),
                &ResourceRef::in_tenant(tenant_id),
            ),
            Surface::User,
        )?;

        if input.email.trim().is_empty()
            || input.password.is_empty()
            || input.full_name.trim().is_empty()
        {
            return Err(DomainError::validation(
                "Email, password, and name are required",
            ));
        }
        validate_password(&input.password)?;
        let role = input.role.unwrap_or(Role::User);
        validate_assignable_role(role)?;

        let hash = self
            .hasher
            .hash(&input.password)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let new_user = NewUser::new(input.email, hash, input.full_name, role)?;
        let user = self.store.create_user(tenant_id, &new_user).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::CreateUser,
                EntityKind::User,
                *user.id.as_uuid(),
                origin,
            ))
            .await;

        Ok(user)
    }

    pub async fn list(
        &self,
        claims: &Claims,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> DomainResult<Listing<User>> {
        ensure(
            decide(
                claims,
                Action::User(UserAction::List),
                &ResourceRef::in_tenant(tenant_id),
            ),
            Surface::User,
        )?;
        Ok(self.store.list_users(tenant_id, filter, page).await?)
    }

    /// Update profile, role, or activation. Role and activation changes are
    /// admin-gated on top of the base profile permission.
    #[instrument(skip_all, fields(user_id = %user_id), err)]
    pub async fn update(
        &self,
        claims: &Claims,
        user_id: UserId,
        patch: &UserPatch,
        origin: &RequestOrigin,
    ) -> DomainResult<Updated<User>> {
        patch.validate()?;

        let target = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        ensure_same_tenant(claims, &target)?;

        let resource = ResourceRef::user(target.tenant_id, target.id);
        ensure(
            decide(claims, Action::User(UserAction::UpdateProfile), &resource),
            Surface::User,
        )?;

        if let Some(role) = patch.role {
            self.ensure_admin_field(claims, Action::User(UserAction::UpdateRole { to: role }), &resource)?;
        }
        if patch.is_active.is_some() {
            self.ensure_admin_field(claims, Action::User(UserAction::UpdateActivation), &resource)?;
        }

        if patch.is_empty() {
            return Ok(Updated::unchanged(target));
        }

        let user = self.store.update_user(user_id, patch).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::UpdateUser,
                EntityKind::User,
                *user_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(Updated::changed(user))
    }

    /// Remove a member. References they hold (assigned tasks, created
    /// projects) are cleared, not deleted.
    #[instrument(skip_all, fields(user_id = %user_id), err)]
    pub async fn delete(
        &self,
        claims: &Claims,
        user_id: UserId,
        origin: &RequestOrigin,
    ) -> DomainResult<()> {
        // Role and self gates run before the existence probe, so a
        // non-admin cannot learn whether an id exists.
        ensure(
            decide(
                claims,
                Action::User(UserAction::Delete),
                &ResourceRef::user(None, user_id),
            ),
            Surface::User,
        )?;

        let target = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        ensure_same_tenant(claims, &target)?;
        ensure(
            decide(
                claims,
                Action::User(UserAction::Delete),
                &ResourceRef::user(target.tenant_id, target.id),
            ),
            Surface::User,
        )?;

        let Some(tenant_id) = target.tenant_id else {
            // Platform operators are not deletable through this surface.
            return Err(deny_error(Surface::User, DenyReason::CrossTenant));
        };
        self.store.delete_user(tenant_id, user_id).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::DeleteUser,
                EntityKind::User,
                *user_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(())
    }

    fn ensure_admin_field(
        &self,
        claims: &Claims,
        action: Action,
        resource: &ResourceRef,
    ) -> DomainResult<()> {
        match decide(claims, action, resource) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::RoleInsufficient) => Err(DomainError::forbidden(
                "Only admins can update role/status",
            )),
            Decision::Deny(reason) => Err(deny_error(Surface::User, reason)),
        }
    }
}

/// Same-tenant guard for operations addressed by bare user id. Operators
/// bypass it; the engine's role gates still apply afterwards.
fn ensure_same_tenant(claims: &Claims, target: &User) -> DomainResult<()> {
    if claims.is_super_admin() {
        return Ok(());
    }
    if target.tenant_id.is_some() && target.tenant_id == claims.tenant_id {
        Ok(())
    } else {
        Err(deny_error(Surface::User, DenyReason::CrossTenant))
    }
}
