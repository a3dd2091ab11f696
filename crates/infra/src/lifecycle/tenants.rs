//! Tenant detail, update, and the platform roster.

use tracing::instrument;

use teamspace_audit::{AuditAction, AuditEntry, AuditSink, EntityKind, RequestOrigin};
use teamspace_auth::{Action, Claims, Decision, DenyReason, ResourceRef, TenantAction, decide};
use teamspace_core::{DomainError, DomainResult, Listing, PageRequest, TenantId};
use teamspace_tenancy::{Tenant, TenantPatch};

use super::{Surface, Updated, deny_error, ensure};
use crate::store::filter::TenantFilter;
use crate::store::{TenantOverview, TenantStats, WorkspaceStore};

pub struct TenantService<S, A> {
    store: S,
    audit: A,
}

impl<S, A> TenantService<S, A>
where
    S: WorkspaceStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }

    /// Tenant detail plus aggregate counts, for members and the platform
    /// operator.
    pub async fn get(
        &self,
        claims: &Claims,
        tenant_id: TenantId,
    ) -> DomainResult<(Tenant, TenantStats)> {
        let decision = decide(
            claims,
            Action::Tenant(TenantAction::Read),
            &ResourceRef::in_tenant(tenant_id),
        );
        match decision {
            Decision::Allow => {}
            Decision::Deny(DenyReason::CrossTenant) => {
                return Err(DomainError::forbidden(
                    "Not authorized to access this tenant",
                ));
            }
            Decision::Deny(reason) => return Err(deny_error(Surface::Tenant, reason)),
        }

        let tenant = self
            .store
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tenant not found"))?;
        let stats = self.store.tenant_stats(tenant_id).await?;
        Ok((tenant, stats))
    }

    /// Apply a partial update. Renaming is open to tenant admins; status,
    /// plan, and limits belong to the platform operator.
    #[instrument(skip(self, claims, patch, origin), fields(tenant_id = %tenant_id), err)]
    pub async fn update(
        &self,
        claims: &Claims,
        tenant_id: TenantId,
        patch: &TenantPatch,
        origin: &RequestOrigin,
    ) -> DomainResult<Updated<Tenant>> {
        patch.validate()?;

        let resource = ResourceRef::in_tenant(tenant_id);
        ensure(
            decide(claims, Action::Tenant(TenantAction::UpdateName), &resource),
            Surface::Tenant,
        )?;
        if patch.touches_subscription() {
            let decision = decide(
                claims,
                Action::Tenant(TenantAction::UpdateSubscription),
                &resource,
            );
            match decision {
                Decision::Allow => {}
                Decision::Deny(DenyReason::RoleInsufficient) => {
                    return Err(DomainError::forbidden("Tenant admins can only update name"));
                }
                Decision::Deny(reason) => return Err(deny_error(Surface::Tenant, reason)),
            }
        }

        if patch.is_empty() {
            let current = self
                .store
                .find_tenant(tenant_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Tenant not found"))?;
            return Ok(Updated::unchanged(current));
        }

        let tenant = self.store.update_tenant(tenant_id, patch).await?;

        // The trail row carries the tenant that changed, not the actor's
        // (they differ when the operator acts).
        self.audit
            .record(AuditEntry::new(
                Some(tenant_id),
                Some(claims.sub),
                AuditAction::UpdateTenant,
                EntityKind::Tenant,
                *tenant_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(Updated::changed(tenant))
    }

    /// Platform-wide tenant roster. Operator only.
    pub async fn list(
        &self,
        claims: &Claims,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> DomainResult<Listing<TenantOverview>> {
        ensure(
            decide(claims, Action::Tenant(TenantAction::List), &ResourceRef::global()),
            Surface::Tenant,
        )?;
        Ok(self.store.list_tenants(filter, page).await?)
    }
}
