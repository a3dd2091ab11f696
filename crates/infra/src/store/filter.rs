//! Typed filter specifications for the list surfaces.
//!
//! Filters never build SQL strings. The Postgres store binds each optional
//! field positionally into static queries (`$n IS NULL OR column = $n`);
//! the in-memory store interprets the same specs directly.

use teamspace_auth::Role;
use teamspace_core::UserId;
use teamspace_projects::{TaskPriority, TaskStatus};
use teamspace_tenancy::{SubscriptionPlan, TenantStatus};

/// Platform tenant list (super admin only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantFilter {
    pub status: Option<TenantStatus>,
    pub plan: Option<SubscriptionPlan>,
}

/// Tenant member list. `search` matches email OR full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub search: Option<String>,
}

/// Tenant project list. `search` matches the project name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Per-project task list. `search` matches the task title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<UserId>,
    pub search: Option<String>,
}

/// `%term%` pattern for an ILIKE bind, with LIKE metacharacters escaped so
/// user input only ever matches literally. Pair with `ESCAPE '\'` in the
/// query text.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring test mirroring `ILIKE '%term%'` for the
/// in-memory store.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
