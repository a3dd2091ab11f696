//! Storage boundary for workspace state.
//!
//! Everything the lifecycle services persist or read goes through
//! [`WorkspaceStore`], so the Postgres adapter and the in-memory store are
//! interchangeable. Multi-step writes (tenant registration, quota-gated
//! creates, reference reassignment on delete) are single transactions in
//! both implementations.

pub mod filter;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use teamspace_core::{
    DomainError, Listing, PageRequest, ProjectId, QuotaKind, TaskId, TenantId, UserId,
};
use teamspace_projects::{
    NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch, TaskPriority, TaskStatus,
};
use teamspace_tenancy::{
    NewTenant, NewUser, SubscriptionPlan, Tenant, TenantPatch, TenantStatus, User, UserPatch,
};

use self::filter::{ProjectFilter, TaskFilter, TenantFilter, UserFilter};

/// Storage failures. Mapped onto the domain taxonomy at the service
/// boundary via the `From` impl below.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness guarantee was hit (subdomain, tenant-scoped email).
    #[error("{0}")]
    Duplicate(String),

    /// The target row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Admission was rejected inside the create transaction.
    #[error("subscription {0} quota reached")]
    Quota(QuotaKind),

    /// Backend fault: connection loss, constraint corruption, bad row data.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => DomainError::conflict(msg),
            StoreError::NotFound(msg) => DomainError::not_found(msg),
            StoreError::Quota(kind) => DomainError::quota(kind),
            StoreError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tenant row enriched for the platform operator's list surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverview {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    pub max_users: i32,
    pub max_projects: i32,
    pub total_users: i64,
    pub total_projects: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOverview {
    pub fn new(tenant: Tenant, total_users: i64, total_projects: i64) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            subdomain: tenant.subdomain,
            status: tenant.status,
            subscription_plan: tenant.subscription_plan,
            max_users: tenant.max_users,
            max_projects: tenant.max_projects,
            total_users,
            total_projects,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

/// Aggregate counts shown on the tenant detail surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total_users: i64,
    pub total_projects: i64,
    pub total_tasks: i64,
}

/// Project row enriched for list surfaces: creator name plus task tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Option<UserId>,
    pub created_by_name: Option<String>,
    pub task_count: i64,
    pub completed_task_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectOverview {
    pub fn new(
        project: Project,
        created_by_name: Option<String>,
        task_count: i64,
        completed_task_count: i64,
    ) -> Self {
        Self {
            id: project.id,
            tenant_id: project.tenant_id,
            name: project.name,
            description: project.description,
            status: project.status,
            created_by: project.created_by,
            created_by_name,
            task_count,
            completed_task_count,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Task row enriched for list surfaces: assignee name and email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverview {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskOverview {
    pub fn new(task: Task, assignee_name: Option<String>, assignee_email: Option<String>) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            tenant_id: task.tenant_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to,
            assignee_name,
            assignee_email,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Every persistent operation the lifecycle layer needs.
///
/// Contracts shared by all implementations:
/// - creates run their quota admission and uniqueness checks inside the
///   same transaction as the insert, with the tenant row as the
///   serialization point;
/// - `find_*` methods are unscoped by tenant; the caller decides what a
///   cross-tenant hit surfaces as;
/// - `delete_user` reassigns (`tasks.assigned_to`, `projects.created_by`
///   become NULL) rather than cascading, leaving every other field of the
///   touched rows unchanged;
/// - `delete_project` removes the project's tasks in the same transaction;
/// - task listings follow [`Task::listing_order`], everything else is
///   newest-first.
#[async_trait::async_trait]
pub trait WorkspaceStore: Send + Sync {
    // Tenants.
    async fn create_tenant_with_admin(
        &self,
        tenant: &NewTenant,
        admin: &NewUser,
    ) -> StoreResult<(Tenant, User)>;
    async fn find_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>>;
    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>>;
    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TenantOverview>>;
    async fn update_tenant(&self, id: TenantId, patch: &TenantPatch) -> StoreResult<Tenant>;
    async fn tenant_stats(&self, id: TenantId) -> StoreResult<TenantStats>;

    // Users.
    async fn create_user(&self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> StoreResult<Option<User>>;
    async fn find_super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>>;
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> StoreResult<User>;
    async fn delete_user(&self, tenant_id: TenantId, id: UserId) -> StoreResult<()>;

    // Projects.
    async fn create_project(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        project: &NewProject,
    ) -> StoreResult<Project>;
    async fn find_project(&self, id: ProjectId) -> StoreResult<Option<Project>>;
    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectOverview>>;
    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project>;
    async fn delete_project(&self, id: ProjectId) -> StoreResult<()>;

    // Tasks.
    async fn create_task(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        task: &NewTask,
    ) -> StoreResult<Task>;
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    async fn list_tasks(
        &self,
        project_id: ProjectId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TaskOverview>>;
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task>;
    async fn delete_task(&self, id: TaskId) -> StoreResult<()>;
}

#[async_trait::async_trait]
impl<S> WorkspaceStore for Arc<S>
where
    S: WorkspaceStore + ?Sized,
{
    async fn create_tenant_with_admin(
        &self,
        tenant: &NewTenant,
        admin: &NewUser,
    ) -> StoreResult<(Tenant, User)> {
        (**self).create_tenant_with_admin(tenant, admin).await
    }

    async fn find_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        (**self).find_tenant(id).await
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        (**self).find_tenant_by_subdomain(subdomain).await
    }

    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TenantOverview>> {
        (**self).list_tenants(filter, page).await
    }

    async fn update_tenant(&self, id: TenantId, patch: &TenantPatch) -> StoreResult<Tenant> {
        (**self).update_tenant(id, patch).await
    }

    async fn tenant_stats(&self, id: TenantId) -> StoreResult<TenantStats> {
        (**self).tenant_stats(id).await
    }

    async fn create_user(&self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        (**self).create_user(tenant_id, user).await
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        (**self).find_user(id).await
    }

    async fn find_user_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> StoreResult<Option<User>> {
        (**self).find_user_by_email(tenant_id, email).await
    }

    async fn find_super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).find_super_admin_by_email(email).await
    }

    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>> {
        (**self).list_users(tenant_id, filter, page).await
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> StoreResult<User> {
        (**self).update_user(id, patch).await
    }

    async fn delete_user(&self, tenant_id: TenantId, id: UserId) -> StoreResult<()> {
        (**self).delete_user(tenant_id, id).await
    }

    async fn create_project(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        project: &NewProject,
    ) -> StoreResult<Project> {
        (**self).create_project(tenant_id, created_by, project).await
    }

    async fn find_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        (**self).find_project(id).await
    }

    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectOverview>> {
        (**self).list_projects(tenant_id, filter, page).await
    }

    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project> {
        (**self).update_project(id, patch).await
    }

    async fn delete_project(&self, id: ProjectId) -> StoreResult<()> {
        (**self).delete_project(id).await
    }

    async fn create_task(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        task: &NewTask,
    ) -> StoreResult<Task> {
        (**self).create_task(tenant_id, project_id, task).await
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        (**self).find_task(id).await
    }

    async fn list_tasks(
        &self,
        project_id: ProjectId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TaskOverview>> {
        (**self).list_tasks(project_id, filter, page).await
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        (**self).update_task(id, patch).await
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        (**self).delete_task(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        Project {
            id: ProjectId::new(),
            tenant_id: TenantId::new(),
            name: "Website".into(),
            description: None,
            status: "active".into(),
            created_by: Some(UserId::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn overview_rows_serialize_in_wire_casing() {
        let overview = ProjectOverview::new(sample_project(), Some("Ada".into()), 4, 1);
        let json = serde_json::to_value(&overview).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"createdByName"));
        assert!(keys.contains(&"taskCount"));
        assert!(keys.contains(&"completedTaskCount"));
        assert!(!keys.contains(&"task_count"));

        let stats = TenantStats {
            total_users: 2,
            total_projects: 1,
            total_tasks: 7,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalTasks"], 7);
    }

    #[test]
    fn store_errors_map_onto_the_domain_taxonomy() {
        let err = DomainError::from(StoreError::duplicate("Subdomain already exists"));
        assert_eq!(err, DomainError::conflict("Subdomain already exists"));

        let err = DomainError::from(StoreError::Quota(QuotaKind::Projects));
        assert_eq!(err, DomainError::quota(QuotaKind::Projects));
        assert_eq!(err.message(), "Subscription project limit reached");

        let err = DomainError::from(StoreError::backend("connection reset"));
        assert_eq!(err.message(), "Server Error");
    }
}
