//! Project lifecycle inside a tenant.

use tracing::instrument;

use teamspace_audit::{AuditAction, AuditSink, EntityKind, RequestOrigin};
use teamspace_auth::{Action, Claims, DenyReason, ProjectAction, ResourceRef, decide};
use teamspace_core::{DomainError, DomainResult, Listing, PageRequest, ProjectId};
use teamspace_projects::{NewProject, Project, ProjectPatch};

use super::{Surface, Updated, audit_entry, deny_error, ensure};
use crate::store::WorkspaceStore;
use crate::store::filter::ProjectFilter;
use crate::store::ProjectOverview;

/// Input for project creation. Status defaults to `active`.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

pub struct ProjectService<S, A> {
    store: S,
    audit: A,
}

impl<S, A> ProjectService<S, A>
where
    S: WorkspaceStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }

    /// Create a project in the caller's tenant. Quota admission happens
    /// inside the store transaction.
    #[instrument(skip_all, fields(actor = %claims.sub), err)]
    pub async fn create(
        &self,
        claims: &Claims,
        input: CreateProject,
        origin: &RequestOrigin,
    ) -> DomainResult<Project> {
        let Some(tenant_id) = claims.tenant_id else {
            // Operators have no tenant to create in.
            return Err(deny_error(Surface::Project, DenyReason::RoleInsufficient));
        };
        ensure(
            decide(
                claims,
                Action::Project(ProjectAction::Create),
                &ResourceRef::in_tenant(tenant_id),
            ),
            Surface::Project,
        )?;

        let new_project = NewProject::new(input.name, input.description, input.status)?;
        let project = self
            .store
            .create_project(tenant_id, claims.sub, &new_project)
            .await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::CreateProject,
                EntityKind::Project,
                *project.id.as_uuid(),
                origin,
            ))
            .await;

        Ok(project)
    }

    /// Projects of the caller's tenant, enriched with creator names and
    /// task tallies.
    pub async fn list(
        &self,
        claims: &Claims,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> DomainResult<Listing<ProjectOverview>> {
        let Some(tenant_id) = claims.tenant_id else {
            return Err(deny_error(Surface::Project, DenyReason::RoleInsufficient));
        };
        ensure(
            decide(
                claims,
                Action::Project(ProjectAction::List),
                &ResourceRef::in_tenant(tenant_id),
            ),
            Surface::Project,
        )?;
        Ok(self.store.list_projects(tenant_id, filter, page).await?)
    }

    /// Fetch one project. A foreign tenant's project reads as missing.
    pub async fn get(&self, claims: &Claims, project_id: ProjectId) -> DomainResult<Project> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        ensure(
            decide(
                claims,
                Action::Project(ProjectAction::Read),
                &ResourceRef::project(project.tenant_id, project.created_by),
            ),
            Surface::Project,
        )?;
        Ok(project)
    }

    /// Update name, description, or status. Admins and the creator only.
    #[instrument(skip_all, fields(project_id = %project_id), err)]
    pub async fn update(
        &self,
        claims: &Claims,
        project_id: ProjectId,
        patch: &ProjectPatch,
        origin: &RequestOrigin,
    ) -> DomainResult<Updated<Project>> {
        patch.validate()?;

        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        ensure(
            decide(
                claims,
                Action::Project(ProjectAction::Update),
                &ResourceRef::project(project.tenant_id, project.created_by),
            ),
            Surface::Project,
        )?;

        if patch.is_empty() {
            return Ok(Updated::unchanged(project));
        }

        let project = self.store.update_project(project_id, patch).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::UpdateProject,
                EntityKind::Project,
                *project_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(Updated::changed(project))
    }

    /// Delete a project and its tasks in one transaction.
    #[instrument(skip_all, fields(project_id = %project_id), err)]
    pub async fn delete(
        &self,
        claims: &Claims,
        project_id: ProjectId,
        origin: &RequestOrigin,
    ) -> DomainResult<()> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        ensure(
            decide(
                claims,
                Action::Project(ProjectAction::Delete),
                &ResourceRef::project(project.tenant_id, project.created_by),
            ),
            Surface::Project,
        )?;

        self.store.delete_project(project_id).await?;

        self.audit
            .record(audit_entry(
                claims,
                AuditAction::DeleteProject,
                EntityKind::Project,
                *project_id.as_uuid(),
                origin,
            ))
            .await;

        Ok(())
    }
}
