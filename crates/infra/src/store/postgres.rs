//! Postgres-backed workspace store.
//!
//! Quota admission and uniqueness checks run inside the same transaction as
//! the insert they guard. The tenant row is locked (`SELECT ... FOR UPDATE`)
//! first, so two concurrent creates in the same tenant serialize and the
//! member/project counts they admit against cannot go stale.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to [`StoreError`] as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Duplicate` | Two registrations race on the same subdomain past the pre-check |
//! | Database (other) | Any other | `Backend` | Constraint or data faults |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! Missing rows never surface as `sqlx::Error::RowNotFound`: lookups use
//! `fetch_optional` and map absence to `StoreError::NotFound` with the
//! caller-facing message.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use teamspace_audit::{AuditEntry, AuditSink};
use teamspace_core::{Listing, PageRequest, ProjectId, QuotaKind, TaskId, TenantId, UserId};
use teamspace_projects::{NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch};
use teamspace_tenancy::{Admission, NewTenant, NewUser, Tenant, TenantPatch, User, UserPatch};

use super::filter::{ProjectFilter, TaskFilter, TenantFilter, UserFilter, like_pattern};
use super::{
    ProjectOverview, StoreError, StoreResult, TaskOverview, TenantOverview, TenantStats,
    WorkspaceStore,
};

/// Idempotent schema DDL, applied one statement at a time at startup.
const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        subdomain         TEXT NOT NULL UNIQUE,
        status            TEXT NOT NULL DEFAULT 'active'
                          CHECK (status IN ('active', 'suspended', 'cancelled')),
        subscription_plan TEXT NOT NULL DEFAULT 'free'
                          CHECK (subscription_plan IN ('free', 'pro', 'enterprise')),
        max_users         INTEGER NOT NULL DEFAULT 5,
        max_projects      INTEGER NOT NULL DEFAULT 3,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        tenant_id     UUID REFERENCES tenants(id),
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        full_name     TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'user'
                      CHECK (role IN ('super_admin', 'tenant_admin', 'user')),
        is_active     BOOLEAN NOT NULL DEFAULT TRUE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (tenant_id, email),
        CHECK ((role = 'super_admin') = (tenant_id IS NULL))
    )
    "#,
    // UNIQUE (tenant_id, email) does not deduplicate NULL tenant_ids.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS users_platform_email_key
        ON users (email) WHERE tenant_id IS NULL
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS users_tenant_idx ON users (tenant_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id          UUID PRIMARY KEY,
        tenant_id   UUID NOT NULL REFERENCES tenants(id),
        name        TEXT NOT NULL,
        description TEXT,
        status      TEXT NOT NULL DEFAULT 'active',
        created_by  UUID REFERENCES users(id),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS projects_tenant_idx ON projects (tenant_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          UUID PRIMARY KEY,
        project_id  UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        tenant_id   UUID NOT NULL REFERENCES tenants(id),
        title       TEXT NOT NULL,
        description TEXT,
        status      TEXT NOT NULL DEFAULT 'todo'
                    CHECK (status IN ('todo', 'in_progress', 'completed')),
        priority    TEXT NOT NULL DEFAULT 'medium'
                    CHECK (priority IN ('low', 'medium', 'high')),
        assigned_to UUID REFERENCES users(id),
        due_date    DATE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS tasks_project_idx ON tasks (project_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS tasks_tenant_idx ON tasks (tenant_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS tasks_assigned_idx ON tasks (assigned_to)
    "#,
    // No foreign keys: audit rows outlive the resources they reference.
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id          BIGSERIAL PRIMARY KEY,
        tenant_id   UUID,
        user_id     UUID,
        action      TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        entity_id   UUID NOT NULL,
        ip_address  TEXT,
        recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS audit_logs_tenant_idx ON audit_logs (tenant_id)
    "#,
];

/// Postgres-backed [`WorkspaceStore`].
///
/// Uses the SQLx connection pool, which is thread-safe and cheap to share.
/// Every multi-step write runs in a transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply the schema. Safe to call on every startup.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for ddl in SCHEMA_DDL {
            sqlx::query(ddl)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WorkspaceStore for PostgresStore {
    #[instrument(skip(self, tenant, admin), fields(subdomain = %tenant.subdomain), err)]
    async fn create_tenant_with_admin(
        &self,
        tenant: &NewTenant,
        admin: &NewUser,
    ) -> StoreResult<(Tenant, User)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM tenants WHERE subdomain = $1) AS taken")
            .bind(&tenant.subdomain)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_tenant_with_admin", e))?;
        let taken: bool = row
            .try_get("taken")
            .map_err(|e| map_sqlx_error("create_tenant_with_admin", e))?;
        if taken {
            return Err(StoreError::duplicate("Subdomain already exists"));
        }

        let tenant_id = TenantId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO tenants (id, name, subdomain)
            VALUES ($1, $2, $3)
            RETURNING id, name, subdomain, status, subscription_plan,
                      max_users, max_projects, created_at, updated_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(&tenant.name)
        .bind(&tenant.subdomain)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::duplicate("Subdomain already exists")
            } else {
                map_sqlx_error("create_tenant_with_admin", e)
            }
        })?;
        let tenant = Tenant::try_from(decode_row::<TenantRow>("create_tenant_with_admin", &row)?)?;

        let admin_id = UserId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, email, password_hash, full_name, role,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(admin_id.as_uuid())
        .bind(tenant.id.as_uuid())
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.full_name)
        .bind(admin.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_tenant_with_admin", e))?;
        let admin = User::try_from(decode_row::<UserRow>("create_tenant_with_admin", &row)?)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok((tenant, admin))
    }

    async fn find_tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, subdomain, status, subscription_plan,
                   max_users, max_projects, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_tenant", e))?;

        row.map(|row| Tenant::try_from(decode_row::<TenantRow>("find_tenant", &row)?))
            .transpose()
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, subdomain, status, subscription_plan,
                   max_users, max_projects, created_at, updated_at
            FROM tenants
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_tenant_by_subdomain", e))?;

        row.map(|row| Tenant::try_from(decode_row::<TenantRow>("find_tenant_by_subdomain", &row)?))
            .transpose()
    }

    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TenantOverview>> {
        let status = filter.status.map(|s| s.as_str());
        let plan = filter.plan.map(|p| p.as_str());

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM tenants t
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR t.subscription_plan = $2)
            "#,
        )
        .bind(status)
        .bind(plan)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tenants", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("list_tenants", e))?;

        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.subdomain, t.status, t.subscription_plan,
                   t.max_users, t.max_projects, t.created_at, t.updated_at,
                   (SELECT COUNT(*) FROM users u WHERE u.tenant_id = t.id) AS total_users,
                   (SELECT COUNT(*) FROM projects p WHERE p.tenant_id = t.id) AS total_projects
            FROM tenants t
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR t.subscription_plan = $2)
            ORDER BY t.created_at DESC, t.id DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(status)
        .bind(plan)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tenants", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let decoded = decode_row::<TenantOverviewRow>("list_tenants", row)?;
            items.push(TenantOverview::try_from(decoded)?);
        }
        Ok(Listing::new(items, total as u64, page))
    }

    async fn update_tenant(&self, id: TenantId, patch: &TenantPatch) -> StoreResult<Tenant> {
        let row = sqlx::query(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                subscription_plan = COALESCE($4, subscription_plan),
                max_users = COALESCE($5, max_users),
                max_projects = COALESCE($6, max_projects),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, subdomain, status, subscription_plan,
                      max_users, max_projects, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.subscription_plan.map(|p| p.as_str()))
        .bind(patch.max_users)
        .bind(patch.max_projects)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_tenant", e))?
        .ok_or_else(|| StoreError::not_found("Tenant not found"))?;

        Tenant::try_from(decode_row::<TenantRow>("update_tenant", &row)?)
    }

    async fn tenant_stats(&self, id: TenantId) -> StoreResult<TenantStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE tenant_id = $1) AS total_users,
                (SELECT COUNT(*) FROM projects WHERE tenant_id = $1) AS total_projects,
                (SELECT COUNT(*) FROM tasks WHERE tenant_id = $1) AS total_tasks
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("tenant_stats", e))?;

        Ok(TenantStats {
            total_users: row
                .try_get("total_users")
                .map_err(|e| map_sqlx_error("tenant_stats", e))?,
            total_projects: row
                .try_get("total_projects")
                .map_err(|e| map_sqlx_error("tenant_stats", e))?,
            total_tasks: row
                .try_get("total_tasks")
                .map_err(|e| map_sqlx_error("tenant_stats", e))?,
        })
    }

    #[instrument(skip(self, user), fields(tenant_id = %tenant_id), err)]
    async fn create_user(&self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Lock the tenant row; concurrent creates in this tenant serialize
        // here, so the count below cannot admit past the limit.
        let row = sqlx::query("SELECT max_users FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?
            .ok_or_else(|| StoreError::not_found("Tenant not found"))?;
        let max_users: i32 = row
            .try_get("max_users")
            .map_err(|e| map_sqlx_error("create_user", e))?;

        let row = sqlx::query("SELECT COUNT(*) AS used FROM users WHERE tenant_id = $1")
            .bind(tenant_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;
        let used: i64 = row
            .try_get("used")
            .map_err(|e| map_sqlx_error("create_user", e))?;

        match Admission::evaluate(used, i64::from(max_users)) {
            Admission::Rejected => return Err(StoreError::Quota(QuotaKind::Users)),
            Admission::Admitted => {}
        }

        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM users WHERE tenant_id = $1 AND email = $2) AS taken",
        )
        .bind(tenant_id.as_uuid())
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        let taken: bool = row
            .try_get("taken")
            .map_err(|e| map_sqlx_error("create_user", e))?;
        if taken {
            return Err(StoreError::duplicate("Email already exists in this tenant"));
        }

        let user_id = UserId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, email, password_hash, full_name, role,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        let user = User::try_from(decode_row::<UserRow>("create_user", &row)?)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, email, password_hash, full_name, role,
                   is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.map(|row| User::try_from(decode_row::<UserRow>("find_user", &row)?))
            .transpose()
    }

    async fn find_user_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, email, password_hash, full_name, role,
                   is_active, created_at, updated_at
            FROM users
            WHERE tenant_id = $1 AND email = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.map(|row| User::try_from(decode_row::<UserRow>("find_user_by_email", &row)?))
            .transpose()
    }

    async fn find_super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, email, password_hash, full_name, role,
                   is_active, created_at, updated_at
            FROM users
            WHERE tenant_id IS NULL AND role = 'super_admin' AND email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_super_admin_by_email", e))?;

        row.map(|row| User::try_from(decode_row::<UserRow>("find_super_admin_by_email", &row)?))
            .transpose()
    }

    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<User>> {
        let role = filter.role.map(|r| r.as_str());
        let search = filter.search.as_deref().map(like_pattern);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM users
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL OR email ILIKE $3 ESCAPE '\' OR full_name ILIKE $3 ESCAPE '\')
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role)
        .bind(&search)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("list_users", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, email, password_hash, full_name, role,
                   is_active, created_at, updated_at
            FROM users
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL OR email ILIKE $3 ESCAPE '\' OR full_name ILIKE $3 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role)
        .bind(&search)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(User::try_from(decode_row::<UserRow>("list_users", row)?)?);
        }
        Ok(Listing::new(items, total as u64, page))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, tenant_id, email, password_hash, full_name, role,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.full_name.as_deref())
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.is_active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?
        .ok_or_else(|| StoreError::not_found("User not found"))?;

        User::try_from(decode_row::<UserRow>("update_user", &row)?)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %id), err)]
    async fn delete_user(&self, tenant_id: TenantId, id: UserId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Clear references without touching updated_at: reassignment is a
        // bookkeeping change, not an edit of the task or project.
        sqlx::query("UPDATE tasks SET assigned_to = NULL WHERE tenant_id = $1 AND assigned_to = $2")
            .bind(tenant_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        sqlx::query("UPDATE projects SET created_by = NULL WHERE tenant_id = $1 AND created_by = $2")
            .bind(tenant_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id.as_uuid())
            .bind(tenant_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User not found"));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(skip(self, project), fields(tenant_id = %tenant_id), err)]
    async fn create_project(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        project: &NewProject,
    ) -> StoreResult<Project> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query("SELECT max_projects FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_project", e))?
            .ok_or_else(|| StoreError::not_found("Tenant not found"))?;
        let max_projects: i32 = row
            .try_get("max_projects")
            .map_err(|e| map_sqlx_error("create_project", e))?;

        let row = sqlx::query("SELECT COUNT(*) AS used FROM projects WHERE tenant_id = $1")
            .bind(tenant_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_project", e))?;
        let used: i64 = row
            .try_get("used")
            .map_err(|e| map_sqlx_error("create_project", e))?;

        match Admission::evaluate(used, i64::from(max_projects)) {
            Admission::Rejected => return Err(StoreError::Quota(QuotaKind::Projects)),
            Admission::Admitted => {}
        }

        let project_id = ProjectId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO projects (id, tenant_id, name, description, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, name, description, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(&project.name)
        .bind(project.description.as_deref())
        .bind(&project.status)
        .bind(created_by.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_project", e))?;
        let project = Project::from(decode_row::<ProjectRow>("create_project", &row)?);

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(project)
    }

    async fn find_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, name, description, status, created_by,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_project", e))?;

        Ok(row
            .map(|row| decode_row::<ProjectRow>("find_project", &row).map(Project::from))
            .transpose()?)
    }

    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<ProjectOverview>> {
        let search = filter.search.as_deref().map(like_pattern);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM projects p
            WHERE p.tenant_id = $1
              AND ($2::text IS NULL OR p.status = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3 ESCAPE '\')
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(filter.status.as_deref())
        .bind(&search)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_projects", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("list_projects", e))?;

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.tenant_id, p.name, p.description, p.status, p.created_by,
                   p.created_at, p.updated_at,
                   u.full_name AS created_by_name,
                   (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count,
                   (SELECT COUNT(*) FROM tasks t
                     WHERE t.project_id = p.id AND t.status = 'completed') AS completed_task_count
            FROM projects p
            LEFT JOIN users u ON u.id = p.created_by
            WHERE p.tenant_id = $1
              AND ($2::text IS NULL OR p.status = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3 ESCAPE '\')
            ORDER BY p.created_at DESC, p.id DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(filter.status.as_deref())
        .bind(&search)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_projects", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let decoded = decode_row::<ProjectOverviewRow>("list_projects", row)?;
            items.push(ProjectOverview::from(decoded));
        }
        Ok(Listing::new(items, total as u64, page))
    }

    async fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project> {
        let row = sqlx::query(
            r#"
            UPDATE projects SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4::text ELSE description END,
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, tenant_id, name, description, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.status.as_deref())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_project", e))?
        .ok_or_else(|| StoreError::not_found("Project not found"))?;

        Ok(Project::from(decode_row::<ProjectRow>(
            "update_project",
            &row,
        )?))
    }

    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn delete_project(&self, id: ProjectId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_project", e))?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_project", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Project not found"));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(skip(self, task), fields(project_id = %project_id), err)]
    async fn create_task(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        task: &NewTask,
    ) -> StoreResult<Task> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1) AS present")
            .bind(project_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_task", e))?;
        let present: bool = row
            .try_get("present")
            .map_err(|e| map_sqlx_error("create_task", e))?;
        if !present {
            return Err(StoreError::not_found("Project not found"));
        }

        let task_id = TaskId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO tasks (id, project_id, tenant_id, title, description,
                               priority, assigned_to, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, project_id, tenant_id, title, description, status,
                      priority, assigned_to, due_date, created_at, updated_at
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(project_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.priority.as_str())
        .bind(task.assigned_to.map(|u| *u.as_uuid()))
        .bind(task.due_date)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_task", e))?;

        Task::try_from(decode_row::<TaskRow>("create_task", &row)?)
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, tenant_id, title, description, status,
                   priority, assigned_to, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_task", e))?;

        row.map(|row| Task::try_from(decode_row::<TaskRow>("find_task", &row)?))
            .transpose()
    }

    async fn list_tasks(
        &self,
        project_id: ProjectId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> StoreResult<Listing<TaskOverview>> {
        let status = filter.status.map(|s| s.as_str());
        let priority = filter.priority.map(|p| p.as_str());
        let assigned_to = filter.assigned_to.map(|u| *u.as_uuid());
        let search = filter.search.as_deref().map(like_pattern);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM tasks t
            WHERE t.project_id = $1
              AND ($2::text IS NULL OR t.status = $2)
              AND ($3::text IS NULL OR t.priority = $3)
              AND ($4::uuid IS NULL OR t.assigned_to = $4)
              AND ($5::text IS NULL OR t.title ILIKE $5 ESCAPE '\')
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(status)
        .bind(priority)
        .bind(assigned_to)
        .bind(&search)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("list_tasks", e))?;

        let rows = sqlx::query(
            r#"
            SELECT t.id, t.project_id, t.tenant_id, t.title, t.description, t.status,
                   t.priority, t.assigned_to, t.due_date, t.created_at, t.updated_at,
                   u.full_name AS assignee_name,
                   u.email AS assignee_email
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assigned_to
            WHERE t.project_id = $1
              AND ($2::text IS NULL OR t.status = $2)
              AND ($3::text IS NULL OR t.priority = $3)
              AND ($4::uuid IS NULL OR t.assigned_to = $4)
              AND ($5::text IS NULL OR t.title ILIKE $5 ESCAPE '\')
            ORDER BY CASE t.priority WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 END,
                     t.due_date ASC NULLS LAST,
                     t.id
            OFFSET $6 LIMIT $7
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(status)
        .bind(priority)
        .bind(assigned_to)
        .bind(&search)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let decoded = decode_row::<TaskOverviewRow>("list_tasks", row)?;
            items.push(TaskOverview::try_from(decoded)?);
        }
        Ok(Listing::new(items, total as u64, page))
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        let row = sqlx::query(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4::text ELSE description END,
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                assigned_to = CASE WHEN $7 THEN $8::uuid ELSE assigned_to END,
                due_date = CASE WHEN $9 THEN $10::date ELSE due_date END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, tenant_id, title, description, status,
                      priority, assigned_to, due_date, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.title.as_deref())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.assigned_to.is_some())
        .bind(patch.assigned_to.flatten().map(|u| *u.as_uuid()))
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_task", e))?
        .ok_or_else(|| StoreError::not_found("Task not found"))?;

        Task::try_from(decode_row::<TaskRow>("update_task", &row)?)
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Task not found"));
        }
        Ok(())
    }
}

/// Audit sink writing to the `audit_logs` table.
///
/// A failed write is logged and swallowed; the mutation it describes has
/// already committed.
#[derive(Debug, Clone)]
pub struct PostgresAuditSink {
    pool: Arc<PgPool>,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (tenant_id, user_id, action, entity_type,
                                    entity_id, ip_address, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.tenant_id.map(|id| *id.as_uuid()))
        .bind(entry.user_id.map(|id| *id.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(entry.ip_address.as_deref())
        .bind(entry.recorded_at)
        .execute(&*self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(action = entry.action.as_str(), error = %err, "audit write dropped");
        }
    }
}

/// Map SQLx errors to [`StoreError`]. Unique violations are handled at the
/// call sites that can race; everything reaching here is a backend fault.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn decode_row<R>(operation: &str, row: &PgRow) -> StoreResult<R>
where
    R: for<'r> FromRow<'r, PgRow>,
{
    R::from_row(row)
        .map_err(|e| StoreError::backend(format!("failed to decode row in {operation}: {e}")))
}

fn parse_column<T: core::str::FromStr>(column: &'static str, raw: &str) -> StoreResult<T> {
    raw.parse()
        .map_err(|_| StoreError::backend(format!("unexpected value in {column}: {raw}")))
}

// SQLx row types

#[derive(Debug)]
struct TenantRow {
    id: Uuid,
    name: String,
    subdomain: String,
    status: String,
    subscription_plan: String,
    max_users: i32,
    max_projects: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TenantRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TenantRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            subdomain: row.try_get("subdomain")?,
            status: row.try_get("status")?,
            subscription_plan: row.try_get("subscription_plan")?,
            max_users: row.try_get("max_users")?,
            max_projects: row.try_get("max_projects")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<TenantRow> for Tenant {
    type Error = StoreError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: TenantId::from_uuid(row.id),
            name: row.name,
            subdomain: row.subdomain,
            status: parse_column("tenants.status", &row.status)?,
            subscription_plan: parse_column("tenants.subscription_plan", &row.subscription_plan)?,
            max_users: row.max_users,
            max_projects: row.max_projects,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct TenantOverviewRow {
    tenant: TenantRow,
    total_users: i64,
    total_projects: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TenantOverviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TenantOverviewRow {
            tenant: TenantRow::from_row(row)?,
            total_users: row.try_get("total_users")?,
            total_projects: row.try_get("total_projects")?,
        })
    }
}

impl TryFrom<TenantOverviewRow> for TenantOverview {
    type Error = StoreError;

    fn try_from(row: TenantOverviewRow) -> Result<Self, Self::Error> {
        let tenant = Tenant::try_from(row.tenant)?;
        Ok(TenantOverview::new(
            tenant,
            row.total_users,
            row.total_projects,
        ))
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            full_name: row.try_get("full_name")?,
            role: row.try_get("role")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.id),
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            role: parse_column("users.role", &row.role)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct ProjectRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ProjectRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProjectRow {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: ProjectId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            name: row.name,
            description: row.description,
            status: row.status,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct ProjectOverviewRow {
    project: ProjectRow,
    created_by_name: Option<String>,
    task_count: i64,
    completed_task_count: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ProjectOverviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProjectOverviewRow {
            project: ProjectRow::from_row(row)?,
            created_by_name: row.try_get("created_by_name")?,
            task_count: row.try_get("task_count")?,
            completed_task_count: row.try_get("completed_task_count")?,
        })
    }
}

impl From<ProjectOverviewRow> for ProjectOverview {
    fn from(row: ProjectOverviewRow) -> Self {
        ProjectOverview::new(
            Project::from(row.project),
            row.created_by_name,
            row.task_count,
            row.completed_task_count,
        )
    }
}

#[derive(Debug)]
struct TaskRow {
    id: Uuid,
    project_id: Uuid,
    tenant_id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    assigned_to: Option<Uuid>,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TaskRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TaskRow {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            tenant_id: row.try_get("tenant_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            assigned_to: row.try_get("assigned_to")?,
            due_date: row.try_get("due_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: TaskId::from_uuid(row.id),
            project_id: ProjectId::from_uuid(row.project_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            title: row.title,
            description: row.description,
            status: parse_column("tasks.status", &row.status)?,
            priority: parse_column("tasks.priority", &row.priority)?,
            assigned_to: row.assigned_to.map(UserId::from_uuid),
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct TaskOverviewRow {
    task: TaskRow,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TaskOverviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TaskOverviewRow {
            task: TaskRow::from_row(row)?,
            assignee_name: row.try_get("assignee_name")?,
            assignee_email: row.try_get("assignee_email")?,
        })
    }
}

impl TryFrom<TaskOverviewRow> for TaskOverview {
    type Error = StoreError;

    fn try_from(row: TaskOverviewRow) -> Result<Self, Self::Error> {
        let task = Task::try_from(row.task)?;
        Ok(TaskOverview::new(
            task,
            row.assignee_name,
            row.assignee_email,
        ))
    }
}
