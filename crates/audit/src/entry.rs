use chrono::{DateTime, Utc};
use serde::Serialize;
use teamspace_core::{TenantId, UserId};
use uuid::Uuid;

/// Every action the trail records. Closed on purpose: a new kind of
/// mutation means a new variant, not a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RegisterTenant,
    Login,
    Logout,
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,
    UpdateTenant,
}

impl AuditAction {
    /// Stable tag stored in the `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RegisterTenant => "REGISTER_TENANT",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::UpdateUser => "UPDATE_USER",
            AuditAction::DeleteUser => "DELETE_USER",
            AuditAction::CreateProject => "CREATE_PROJECT",
            AuditAction::UpdateProject => "UPDATE_PROJECT",
            AuditAction::DeleteProject => "DELETE_PROJECT",
            AuditAction::CreateTask => "CREATE_TASK",
            AuditAction::UpdateTask => "UPDATE_TASK",
            AuditAction::UpdateTaskStatus => "UPDATE_TASK_STATUS",
            AuditAction::DeleteTask => "DELETE_TASK",
            AuditAction::UpdateTenant => "UPDATE_TENANT",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row the entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Tenant,
    User,
    Project,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant",
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
        }
    }
}

/// Where the request came from, as far as the edge could tell.
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    pub ip: Option<String>,
}

impl RequestOrigin {
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self { ip: Some(ip.into()) }
    }
}

/// One recorded mutation. `tenant_id` is `None` for platform-level
/// actions performed by a super admin, `user_id` is `None` when the
/// actor is not yet authenticated (tenant registration).
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub ip_address: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        tenant_id: Option<TenantId>,
        user_id: Option<UserId>,
        action: AuditAction,
        entity_type: EntityKind,
        entity_id: Uuid,
        origin: &RequestOrigin,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            action,
            entity_type,
            entity_id,
            ip_address: origin.ip.clone(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tags_are_screaming_snake() {
        assert_eq!(AuditAction::RegisterTenant.as_str(), "REGISTER_TENANT");
        assert_eq!(AuditAction::UpdateTaskStatus.as_str(), "UPDATE_TASK_STATUS");
        assert_eq!(
            serde_json::to_value(AuditAction::DeleteProject).unwrap(),
            serde_json::json!("DELETE_PROJECT")
        );
    }

    #[test]
    fn entity_kinds_serialize_lowercase() {
        assert_eq!(EntityKind::Tenant.as_str(), "tenant");
        assert_eq!(
            serde_json::to_value(EntityKind::Task).unwrap(),
            serde_json::json!("task")
        );
    }

    #[test]
    fn entry_captures_origin_ip() {
        let origin = RequestOrigin::from_ip("203.0.113.7");
        let entry = AuditEntry::new(
            None,
            None,
            AuditAction::RegisterTenant,
            EntityKind::Tenant,
            Uuid::now_v7(),
            &origin,
        );
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
        assert!(entry.tenant_id.is_none());
    }
}
