//! Service construction: one [`AppServices`] per process, shared via
//! `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use teamspace_audit::{AuditSink, NullSink};
use teamspace_auth::{Argon2Hasher, CredentialHasher, TokenCodec};
use teamspace_infra::lifecycle::{
    IdentityService, ProjectService, TaskService, TenantService, UserService,
};
use teamspace_infra::store::memory::MemoryStore;
use teamspace_infra::store::postgres::{PostgresAuditSink, PostgresStore};
use teamspace_infra::store::WorkspaceStore;

pub type DynStore = Arc<dyn WorkspaceStore>;
pub type DynSink = Arc<dyn AuditSink>;

/// Every lifecycle service the handlers reach for, wired over one store and
/// one audit sink.
pub struct AppServices {
    pub identity: IdentityService<DynStore, DynSink>,
    pub tenants: TenantService<DynStore, DynSink>,
    pub users: UserService<DynStore, DynSink>,
    pub projects: ProjectService<DynStore, DynSink>,
    pub tasks: TaskService<DynStore, DynSink>,
}

/// Build services against the environment's storage.
///
/// With `DATABASE_URL` set this connects to Postgres and applies the schema;
/// without it the process runs on the in-memory store, which suits local
/// development but forgets everything on restart.
pub async fn build_services(tokens: Arc<dyn TokenCodec>) -> anyhow::Result<AppServices> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url).await?;
            let store = PostgresStore::new(pool.clone());
            store.ensure_schema().await?;
            let sink = PostgresAuditSink::new(pool);
            Ok(wire(Arc::new(store), Arc::new(sink), tokens))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Ok(in_memory_services(tokens))
        }
    }
}

/// In-memory wiring. The audit sink is a no-op since nothing can read the
/// trail back in this mode.
pub fn in_memory_services(tokens: Arc<dyn TokenCodec>) -> AppServices {
    wire(Arc::new(MemoryStore::new()), Arc::new(NullSink), tokens)
}

fn wire(store: DynStore, audit: DynSink, tokens: Arc<dyn TokenCodec>) -> AppServices {
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher);

    AppServices {
        identity: IdentityService::new(
            Arc::clone(&store),
            Arc::clone(&audit),
            Arc::clone(&hasher),
            tokens,
        ),
        tenants: TenantService::new(Arc::clone(&store), Arc::clone(&audit)),
        users: UserService::new(Arc::clone(&store), Arc::clone(&audit), hasher),
        projects: ProjectService::new(Arc::clone(&store), Arc::clone(&audit)),
        tasks: TaskService::new(store, audit),
    }
}
