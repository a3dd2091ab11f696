use serde::{Deserialize, Serialize};

use teamspace_core::{TenantId, UserId};

use crate::Role;

/// Identity decoded from a presented credential.
///
/// Pure data, no behavior beyond convenience accessors. The transport layer
/// builds this after the token signature has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the acting user.
    pub sub: UserId,

    /// Tenant context. `None` for super admins.
    pub tenant_id: Option<TenantId>,

    /// Role granted at login time.
    pub role: Role,
}

impl Claims {
    pub fn new(sub: UserId, tenant_id: Option<TenantId>, role: Role) -> Self {
        Self {
            sub,
            tenant_id,
            role,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_member_of(&self, tenant_id: TenantId) -> bool {
        self.tenant_id == Some(tenant_id)
    }
}
