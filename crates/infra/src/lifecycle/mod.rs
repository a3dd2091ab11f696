//! Application services: the orchestration between authorization, domain
//! validation, storage, and the audit trail.
//!
//! Every mutating method follows the same pipeline: validate input, decide
//! authorization, apply the change through the store, record an audit entry.
//! When a decision needs fields of the target row (owning tenant, creator),
//! the row is fetched first and the decision made against the loaded
//! descriptor; cheap gates that need only the caller's claims run before the
//! fetch.
//!
//! Denials are mapped onto the error surface here. Project and task ids
//! from another tenant read as missing, so a caller cannot distinguish a
//! foreign id from an absent one. Tenant and user surfaces are addressed by
//! ids the caller already holds and deny openly.

pub mod identity;
pub mod projects;
pub mod tasks;
pub mod tenants;
pub mod users;

use uuid::Uuid;

use teamspace_audit::{AuditAction, AuditEntry, EntityKind, RequestOrigin};
use teamspace_auth::{Claims, Decision, DenyReason};
use teamspace_core::{DomainError, DomainResult};

pub use identity::{CurrentUser, IdentityService, Login, RegisterTenant, RegisteredTenant, Session};
pub use projects::{CreateProject, ProjectService};
pub use tasks::{CreateTask, TaskService};
pub use tenants::TenantService;
pub use users::{CreateUser, UserService};

/// Which resource surface a denial happened on. Drives the enumeration
/// mapping above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Tenant,
    User,
    Project,
    Task,
}

pub(crate) fn deny_error(surface: Surface, reason: DenyReason) -> DomainError {
    match (surface, reason) {
        (Surface::Project, DenyReason::CrossTenant) => {
            DomainError::not_found("Project not found")
        }
        (Surface::Task, DenyReason::CrossTenant) => DomainError::not_found("Task not found"),
        (_, DenyReason::CrossTenant) => DomainError::forbidden("Not authorized"),
        (_, DenyReason::SelfActionForbidden) => DomainError::forbidden("Cannot delete yourself"),
        (_, DenyReason::PrivilegeEscalation) => {
            DomainError::forbidden("Cannot grant super admin role")
        }
        (_, DenyReason::NotOwner) | (_, DenyReason::RoleInsufficient) => {
            DomainError::forbidden("Not authorized")
        }
    }
}

pub(crate) fn ensure(decision: Decision, surface: Surface) -> DomainResult<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(deny_error(surface, reason)),
    }
}

/// Outcome of a patch: the row plus whether anything actually changed.
///
/// An empty patch is not an error; it returns the current row, records no
/// audit entry, and the transport layer words the response accordingly.
#[derive(Debug, Clone, PartialEq)]
pub struct Updated<T> {
    pub value: T,
    pub changed: bool,
}

impl<T> Updated<T> {
    pub fn changed(value: T) -> Self {
        Self {
            value,
            changed: true,
        }
    }

    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }
}

pub(crate) fn audit_entry(
    claims: &Claims,
    action: AuditAction,
    entity_type: EntityKind,
    entity_id: Uuid,
    origin: &RequestOrigin,
) -> AuditEntry {
    AuditEntry::new(
        claims.tenant_id,
        Some(claims.sub),
        action,
        entity_type,
        entity_id,
        origin,
    )
}
