//! Infrastructure layer: storage adapters and lifecycle services.
//!
//! `store` holds the [`store::WorkspaceStore`] seam with Postgres and
//! in-memory implementations; `lifecycle` holds the services that run the
//! validate / authorize / store / audit flow on top of it.

pub mod lifecycle;
pub mod store;
