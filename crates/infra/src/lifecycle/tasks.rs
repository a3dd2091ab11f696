//! Task lifecycle under a project.

use chrono::NaiveDate;
use tracing::instrument;

use teamspace_audit::{AuditAction, AuditSink, EntityKind, RequestOrigin};
use teamspace_auth::{Action, Claims, ResourceRef, TaskAction, decide};
use teamspace_core::{DomainError, DomainResult, Listing, PageRequest, ProjectId, TaskId, TenantId, UserId};
use teamspace_projects::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};

use super::{Surface, Updated, audit_entry, ensure};
use crate::store::WorkspaceStore;
use crate::store::filter::TaskFilter;
use crate::store::TaskOverview;

/// Input for task creation. New tasks start in `todo`; priority defaults
/// to medium.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
}

pub struct TaskService<S, A> {
    store: S,
    audit: A,
}

impl<S, A> TaskService<S, A>
where
    S: WorkspaceStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }

    /// Create a task under a project of the caller's tenant.
    #[instrument(skip_all, fields(project_id = %project_id), err)]
    pub async fn create(
        &self,
        claims: &Claims,
        project_id: ProjectId,
        input: CreateTask,
        origin: &RequestOrigin,
    ) -> DomainResult<Task> {
        let new_task = NewTask::new(
            input.title,
            input.description,
            input.priority,
            input.assigned_to,
            input.due_date,
        )?;

        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        ensure(
            decide(
                claims,
                Action::Task(TaskAction::Create),
                &ResourceRef::in_tenant(project.tenant_id),
            ),
            Surface::Project,
        )?;

        if let Some(assignee) = new_task.assigned_to {
            self.ensure_assignable(assignee, project.tenant_id).await?;
        }

        let task = self
            .store
            .create_task(project.tenant_id, project_id, &new_task)
            .await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::CreateTask,
                EntityKind::Task,
                *task.id.as_uuid(),
                origin,
            ))
            .await;

        Ok(task)
    }

    /// Tasks of one project, in priority order, enriched with assignee
    /// name and email.
    pub async fn list(
        &self,
        claims: &Claims,
        project_id: ProjectId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> DomainResult<Listing<TaskOverview>> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        ensure(
            decide(
                claims,
                Action::Task(TaskAction::List),
                &ResourceRef::in_tenant(project.tenant_id),
            ),
            Surface::Project,
        )?;
        Ok(self.store.list_tasks(project_id, filter, page).await?)
    }

    /// Move a task along the board. Any member of the tenant may.
    #[instrument(skip_all, fields(task_id = %task_id), err)]
    pub async fn update_status(
        &self,
        claims: &Claims,
        task_id: TaskId,
        status: TaskStatus,
        origin: &RequestOrigin,
    ) -> DomainResult<Task> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;
        ensure(
            decide(
                claims,
                Action::Task(TaskAction::UpdateStatus),
                &ResourceRef::in_tenant(task.tenant_id),
            ),
            Surface::Task,
        )?;

        let patch = TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        };
        let task = self.store.update_task(task_id, &patch).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::UpdateTaskStatus,
                EntityKind::Task,
                *task_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(task)
    }

    /// Full update: title, description, status, priority, assignment, due
    /// date. Unassigning and clearing the date go through the inner null.
    #[instrument(skip_all, fields(task_id = %task_id), err)]
    pub async fn update(
        &self,
        claims: &Claims,
        task_id: TaskId,
        patch: &TaskPatch,
        origin: &RequestOrigin,
    ) -> DomainResult<Updated<Task>> {
        patch.validate()?;

        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;
        ensure(
            decide(
                claims,
                Action::Task(TaskAction::Update),
                &ResourceRef::in_tenant(task.tenant_id),
            ),
            Surface::Task,
        )?;

        if let Some(Some(assignee)) = patch.assigned_to {
            self.ensure_assignable(assignee, task.tenant_id).await?;
        }

        if patch.is_empty() {
            return Ok(Updated::unchanged(task));
        }

        let task = self.store.update_task(task_id, patch).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::UpdateTask,
                EntityKind::Task,
                *task_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(Updated::changed(task))
    }

    #[instrument(skip_all, fields(task_id = %task_id), err)]
    pub async fn delete(
        &self,
        claims: &Claims,
        task_id: TaskId,
        origin: &RequestOrigin,
    ) -> DomainResult<()> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;
        ensure(
            decide(
                claims,
                Action::Task(TaskAction::Delete),
                &ResourceRef::in_tenant(task.tenant_id),
            ),
            Surface::Task,
        )?;

        self.store.delete_task(task_id).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::DeleteTask,
                EntityKind::Task,
                *task_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(())
    }

    /// Assignees must belong to the task's tenant.
    async fn ensure_assignable(&self, assignee: UserId, tenant_id: TenantId) -> DomainResult<()> {
        let belongs = self
            .store
            .find_user(assignee)
            .await?
            .is_some_and(|u| u.tenant_id == Some(tenant_id));
        if belongs {
            Ok(())
        } else {
            Err(DomainError::validation(
                "Assigned user does not belong to this tenant",
            ))
        }
    }
}
