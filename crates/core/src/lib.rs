//! `teamspace-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod page;

pub use error::{DomainError, DomainResult, QuotaKind};
pub use id::{ProjectId, TaskId, TenantId, UserId};
pub use page::{Listing, PageRequest};
