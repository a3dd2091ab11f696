//! In-memory [`WorkspaceStore`] for tests and development.
//!
//! One `RwLock` over the whole state stands in for the database: every
//! multi-step write holds the write guard for its duration, which gives the
//! same all-or-nothing and quota-serialization guarantees the Postgres
//! implementation gets from transactions and the tenant row lock.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use teamspace_auth::Role;
use teamspace_core::{Listing, PageRequest, ProjectId, QuotaKind, TaskId, TenantId, UserId};
use teamspace_projects::{NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch, TaskStatus};
use teamspace_tenancy::{
    Admission, DEFAULT_MAX_PROJECTS, DEFAULT_MAX_USERS, NewTenant, NewUser, SubscriptionPlan,
    Tenant, TenantPatch, TenantStatus, User, UserPatch,
};

use super::filter::{ProjectFilter, TaskFilter, TenantFilter, UserFilter, contains_ci};
use super::{
    ProjectOverview, StoreError, StoreResult, TaskOverview, TenantOverview, TenantStats,
    WorkspaceStore,
};

#[derive(Debug, Default)]
struct State {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a platform operator row. Production environments seed this via
    /// SQL; tests need it for the no-subdomain login path.
    pub fn insert_super_admin(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> StoreResult<User> {
        let mut state = self.write()?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: None,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            full_name: full_name.to_string(),
            role: Role::SuperAdmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("store lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("store lock poisoned"))
    }
}

/// Newest first, with the time-ordered id as tie-breaker.
fn newest_first<T, F: Fn(&T) -> (chrono::DateTime<Utc>, uuid::Uuid)>(items: &mut [T], key: F) {
    items.sort_by(|a, b| {
        let (a_at, a_id) = key(a);
        let (b_at, b_id) = key(b);
        b_at.cmp(&a_at).then_with(|| b_id.cmp(&a_id))
    });
}

fn page_slice<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let sliced = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (sliced, total)
}

#[async_trait::async_trait]
impl WorkspaceStore for MemoryStore {
    async fn create_tenant_with_admin(
        &self,
        tenant: &NewTenant,
        admin: &NewUser,
    ) -> StoreResult<(Tenant, User)> {
        let mut state = self.write()?;
        if state
            .tenants
            .values()
            .any(|t| t.subdomain == tenant.subdomain)
        {
            return Err(StoreError::duplicate("Subdomain already exists"));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::new(),
            name: tenant.name.clone(),
            subdomain: tenant.subdomain.clone(),
            status: TenantStatus::Active,
            subscription_plan: SubscriptionPlan::Free,
            max_users: DEFAULT_MAX_USERS,
            max_projects: DEFAULT_MAX_PROJECTS,
            created_at: now,
            updated_at: now,
        };
        let admin = User {
            id: UserId::new(),
            tenant_id: Some(tenant.id),
            email: admin.email.clone(),
            password_hash: admin.password_hash.clone(),
            full_name: admin.full_name.clone(),
            role: admin.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.tenants.insert(tenant.id, tenant.clone());
        state.users.insert(admin.id, admin.clone());
        Ok((tenant, admin))
    }

    async fn find_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        Ok(self.read()?.tenants.get(&id).cloned())
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        Ok(self
            .read()?
            .tenants
            .values()
            .find(|t| t.subdomain == subdomain)
            .cloned())
    }

    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TenantOverview>> {
        let state = self.read()?;
        let mut tenants: Vec<Tenant> = state
            .tenants
            .values()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.plan.is_none_or(|p| t.subscription_plan == p))
            .cloned()
            .collect();
        newest_first(&mut tenants, |t| (t.created_at, *t.id.as_uuid()));

        let (rows, total) = page_slice(tenants, page);
        let items = rows
            .into_iter()
            .map(|t| {
                let total_users = state
                    .users
                    .values()
                    .filter(|u| u.tenant_id == Some(t.id))
                    .count() as i64;
                let total_projects = state
                    .projects
                    .values()
                    .filter(|p| p.tenant_id == t.id)
                    .count() as i64;
                TenantOverview::new(t, total_users, total_projects)
            })
            .collect();
        Ok(Listing::new(items, total, page))
    }

    async fn update_tenant(&self, id: TenantId, patch: &TenantPatch) -> StoreResult<Tenant> {
        let mut state = self.write()?;
        let tenant = state
            .tenants
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Tenant not found"))?;
        if let Some(name) = &patch.name {
            tenant.name = name.clone();
        }
        if let Some(status) = patch.status {
            tenant.status = status;
        }
        if let Some(plan) = patch.subscription_plan {
            tenant.subscription_plan = plan;
        }
        if let Some(max_users) = patch.max_users {
            tenant.max_users = max_users;
        }
        if let Some(max_projects) = patch.max_projects {
            tenant.max_projects = max_projects;
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn tenant_stats(&self, id: TenantId) -> StoreResult<TenantStats> {
        let state = self.read()?;
        Ok(TenantStats {
            total_users: state
                .users
                .values()
                .filter(|u| u.tenant_id == Some(id))
                .count() as i64,
            total_projects: state.projects.values().filter(|p| p.tenant_id == id).count() as i64,
            total_tasks: state.tasks.values().filter(|t| t.tenant_id == id).count() as i64,
        })
    }

    async fn create_user(&self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        let mut state = self.write()?;
        let max_users = state
            .tenants
            .get(&tenant_id)
            .map(|t| t.max_users)
            .ok_or_else(|| StoreError::not_found("Tenant not found"))?;
        let used = state
            .users
            .values()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .count() as i64;
        match Admission::evaluate(used, i64::from(max_users)) {
            Admission::Rejected => return Err(StoreError::Quota(QuotaKind::Users)),
            Admission::Admitted => {}
        }
        if state
            .users
            .values()
            .any(|u| u.tenant_id == Some(tenant_id) && u.email == user.email)
        {
            return Err(StoreError::duplicate("Email already exists in this tenant"));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: Some(tenant_id),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.tenant_id == Some(tenant_id) && u.email == email)
            .cloned())
    }

    async fn find_super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.tenant_id.is_none() && u.role == Role::SuperAdmin && u.email == email)
            .cloned())
    }

    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>> {
        let state = self.read()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| {
                filter.search.as_deref().is_none_or(|term| {
                    contains_ci(&u.email, term) || contains_ci(&u.full_name, term)
                })
            })
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, *u.id.as_uuid()));

        let (items, total) = page_slice(users, page);
        Ok(Listing::new(items, total, page))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> StoreResult<User> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        if let Some(full_name) = &patch.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, tenant_id: TenantId, id: UserId) -> StoreResult<()> {
        let mut state = self.write()?;
        let belongs = state
            .users
            .get(&id)
            .map(|u| u.tenant_id == Some(tenant_id))
            .unwrap_or(false);
        if !belongs {
            return Err(StoreError::not_found("User not found"));
        }

        // Reassignment, not cascade: owned rows survive with the reference
        // cleared and every other field untouched.
        for task in state.tasks.values_mut() {
            if task.tenant_id == tenant_id && task.assigned_to == Some(id) {
                task.assigned_to = None;
            }
        }
        for project in state.projects.values_mut() {
            if project.tenant_id == tenant_id && project.created_by == Some(id) {
                project.created_by = None;
            }
        }
        state.users.remove(&id);
        Ok(())
    }

    async fn create_project(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        project: &NewProject,
    ) -> StoreResult<Project> {
        let mut state = self.write()?;
        let max_projects = state
            .tenants
            .get(&tenant_id)
            .map(|t| t.max_projects)
            .ok_or_else(|| StoreError::not_found("Tenant not found"))?;
        let used = state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .count() as i64;
        match Admission::evaluate(used, i64::from(max_projects)) {
            Admission::Rejected => return Err(StoreError::Quota(QuotaKind::Projects)),
            Admission::Admitted => {}
        }

        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            tenant_id,
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status.clone(),
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectOverview>> {
        let state = self.read()?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .filter(|p| filter.status.as_deref().is_none_or(|s| p.status == s))
            .filter(|p| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|term| contains_ci(&p.name, term))
            })
            .cloned()
            .collect();
        newest_first(&mut projects, |p| (p.created_at, *p.id.as_uuid()));

        let (rows, total) = page_slice(projects, page);
        let items = rows
            .into_iter()
            .map(|p| {
                let created_by_name = p
                    .created_by
                    .and_then(|id| state.users.get(&id))
                    .map(|u| u.full_name.clone());
                let task_count =
                    state.tasks.values().filter(|t| t.project_id == p.id).count() as i64;
                let completed_task_count = state
                    .tasks
                    .values()
                    .filter(|t| t.project_id == p.id && t.status == TaskStatus::Completed)
                    .count() as i64;
                ProjectOverview::new(p, created_by_name, task_count, completed_task_count)
            })
            .collect();
        Ok(Listing::new(items, total, page))
    }

    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project> {
        let mut state = self.write()?;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Project not found"))?;
        if let Some(name) = &patch.name {
            project.name = name.clone();
        }
        if let Some(description) = &patch.description {
            project.description = description.clone();
        }
        if let Some(status) = &patch.status {
            project.status = status.clone();
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: ProjectId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.projects.remove(&id).is_none() {
            return Err(StoreError::not_found("Project not found"));
        }
        state.tasks.retain(|_, t| t.project_id != id);
        Ok(())
    }

    async fn create_task(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        task: &NewTask,
    ) -> StoreResult<Task> {
        let mut state = self.write()?;
        if !state.projects.contains_key(&project_id) {
            return Err(StoreError::not_found("Project not found"));
        }

        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            project_id,
            tenant_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: TaskStatus::Todo,
            priority: task.priority,
            assigned_to: task.assigned_to,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_tasks(
        &self,
        project_id: ProjectId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TaskOverview>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.assigned_to.is_none_or(|u| t.assigned_to == Some(u)))
            .filter(|t| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|term| contains_ci(&t.title, term))
            })
            .cloned()
            .collect();
        // Tie-break on the time-ordered id so pages stay stable.
        tasks.sort_by(|a, b| {
            Task::listing_order(a, b).then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        let (rows, total) = page_slice(tasks, page);
        let items = rows
            .into_iter()
            .map(|t| {
                let assignee = t.assigned_to.and_then(|id| state.users.get(&id));
                let assignee_name = assignee.map(|u| u.full_name.clone());
                let assignee_email = assignee.map(|u| u.email.clone());
                TaskOverview::new(t, assignee_name, assignee_email)
            })
            .collect();
        Ok(Listing::new(items, total, page))
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let mut state = self.write()?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Task not found"))?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Err(StoreError::not_found("Task not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use teamspace_projects::TaskPriority;

    use super::*;

    fn new_tenant(subdomain: &str) -> NewTenant {
        NewTenant::new("Acme Corp", subdomain).unwrap()
    }

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser::new(email, "digest", "Some Person", role).unwrap()
    }

    async fn seeded(store: &MemoryStore) -> (Tenant, User) {
        store
            .create_tenant_with_admin(
                &new_tenant("acme"),
                &new_user("admin@acme.test", Role::TenantAdmin),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_subdomain_is_rejected() {
        let store = MemoryStore::new();
        seeded(&store).await;

        let err = store
            .create_tenant_with_admin(
                &new_tenant("acme"),
                &new_user("other@acme.test", Role::TenantAdmin),
            )
            .await
            .unwrap_err();
        match err {
            StoreError::Duplicate(msg) => assert_eq!(msg, "Subdomain already exists"),
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn user_quota_counts_the_seed_admin() {
        let store = MemoryStore::new();
        let (tenant, _) = seeded(&store).await;

        // Default limit is 5 and the registration admin occupies one slot.
        for i in 0..4 {
            store
                .create_user(tenant.id, &new_user(&format!("u{i}@acme.test"), Role::User))
                .await
                .unwrap();
        }
        let err = store
            .create_user(tenant.id, &new_user("u5@acme.test", Role::User))
            .await
            .unwrap_err();
        match err {
            StoreError::Quota(QuotaKind::Users) => {}
            other => panic!("expected user quota rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_scoped_to_the_tenant() {
        let store = MemoryStore::new();
        let (acme, _) = seeded(&store).await;
        let (globex, _) = store
            .create_tenant_with_admin(
                &new_tenant("globex"),
                &new_user("admin@globex.test", Role::TenantAdmin),
            )
            .await
            .unwrap();

        store
            .create_user(acme.id, &new_user("dev@shared.test", Role::User))
            .await
            .unwrap();
        // Same address in another tenant is fine.
        store
            .create_user(globex.id, &new_user("dev@shared.test", Role::User))
            .await
            .unwrap();
        // Same address in the same tenant is not.
        let err = store
            .create_user(acme.id, &new_user("dev@shared.test", Role::User))
            .await
            .unwrap_err();
        match err {
            StoreError::Duplicate(msg) => assert_eq!(msg, "Email already exists in this tenant"),
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deleting_a_user_unassigns_without_touching_other_fields() {
        let store = MemoryStore::new();
        let (tenant, admin) = seeded(&store).await;
        let member = store
            .create_user(tenant.id, &new_user("dev@acme.test", Role::User))
            .await
            .unwrap();

        let project = store
            .create_project(
                tenant.id,
                member.id,
                &NewProject::new("Website", None, None).unwrap(),
            )
            .await
            .unwrap();
        let task = store
            .create_task(
                tenant.id,
                project.id,
                &NewTask::new("Deploy", None, None, Some(member.id), None).unwrap(),
            )
            .await
            .unwrap();

        store.delete_user(tenant.id, member.id).await.unwrap();

        assert!(store.find_user(member.id).await.unwrap().is_none());
        let project_after = store.find_project(project.id).await.unwrap().unwrap();
        assert_eq!(project_after.created_by, None);
        assert_eq!(project_after.updated_at, project.updated_at);
        let task_after = store.find_task(task.id).await.unwrap().unwrap();
        assert_eq!(task_after.assigned_to, None);
        assert_eq!(task_after.title, task.title);
        assert_eq!(task_after.updated_at, task.updated_at);

        // The admin is untouched.
        assert!(store.find_user(admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn task_listing_ranks_priority_then_due_date() {
        let store = MemoryStore::new();
        let (tenant, admin) = seeded(&store).await;
        let project = store
            .create_project(
                tenant.id,
                admin.id,
                &NewProject::new("Launch", None, None).unwrap(),
            )
            .await
            .unwrap();

        let specs = [
            (TaskPriority::Low, Some("2024-01-01")),
            (TaskPriority::High, None),
            (TaskPriority::Medium, Some("2024-01-02")),
            (TaskPriority::High, Some("2023-12-31")),
        ];
        for (priority, due) in specs {
            let due_date = due.map(|d| d.parse().unwrap());
            store
                .create_task(
                    tenant.id,
                    project.id,
                    &NewTask::new("t", None, Some(priority), None, due_date).unwrap(),
                )
                .await
                .unwrap();
        }

        let listing = store
            .list_tasks(
                project.id,
                &TaskFilter::default(),
                PageRequest::clamped(None, None, 50),
            )
            .await
            .unwrap();
        let order: Vec<(TaskPriority, Option<String>)> = listing
            .items
            .iter()
            .map(|t| (t.priority, t.due_date.map(|d| d.to_string())))
            .collect();
        assert_eq!(listing.total, 4);
        assert_eq!(
            order,
            vec![
                (TaskPriority::High, Some("2023-12-31".into())),
                (TaskPriority::High, None),
                (TaskPriority::Medium, Some("2024-01-02".into())),
                (TaskPriority::Low, Some("2024-01-01".into())),
            ]
        );
    }

    #[tokio::test]
    async fn project_overviews_count_tasks() {
        let store = MemoryStore::new();
        let (tenant, admin) = seeded(&store).await;
        let project = store
            .create_project(
                tenant.id,
                admin.id,
                &NewProject::new("Website", None, None).unwrap(),
            )
            .await
            .unwrap();

        for _ in 0..3 {
            store
                .create_task(
                    tenant.id,
                    project.id,
                    &NewTask::new("t", None, None, None, None).unwrap(),
                )
                .await
                .unwrap();
        }
        let done = store
            .create_task(
                tenant.id,
                project.id,
                &NewTask::new("done", None, None, None, None).unwrap(),
            )
            .await
            .unwrap();
        store
            .update_task(
                done.id,
                &TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        let listing = store
            .list_projects(
                tenant.id,
                &ProjectFilter::default(),
                PageRequest::clamped(None, None, 20),
            )
            .await
            .unwrap();
        assert_eq!(listing.items.len(), 1);
        let overview = &listing.items[0];
        assert_eq!(overview.task_count, 4);
        assert_eq!(overview.completed_task_count, 1);
        assert_eq!(overview.created_by_name.as_deref(), Some("Some Person"));
    }

    #[tokio::test]
    async fn tenant_listing_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .create_tenant_with_admin(
                    &new_tenant(&format!("org{i}")),
                    &new_user(&format!("admin@org{i}.test"), Role::TenantAdmin),
                )
                .await
                .unwrap();
        }

        let all = store
            .list_tenants(
                &TenantFilter::default(),
                PageRequest::clamped(Some(1), Some(2), 10),
            )
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items.len(), 2);
        assert_eq!(all.items[0].total_users, 1);

        let pro_only = store
            .list_tenants(
                &TenantFilter {
                    plan: Some(SubscriptionPlan::Pro),
                    ..TenantFilter::default()
                },
                PageRequest::clamped(None, None, 10),
            )
            .await
            .unwrap();
        assert_eq!(pro_only.total, 0);
    }
}
