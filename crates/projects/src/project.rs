use chrono::{DateTime, Utc};
use serde::Serialize;

use teamspace_core::{DomainError, DomainResult, ProjectId, TenantId, UserId};

pub const DEFAULT_PROJECT_STATUS: &str = "active";

/// A project inside one tenant. `tenant_id` is immutable after creation.
///
/// `status` is a free-form label, not an enforced state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for project creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        status: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Project name is required"));
        }
        Ok(Self {
            name,
            description,
            status: status.unwrap_or_else(|| DEFAULT_PROJECT_STATUS.to_string()),
        })
    }
}

/// Partial project update. The outer `Option` marks presence; the inner one
/// (description) distinguishes "set to null" from "leave alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Project name cannot be empty"));
            }
        }
        if let Some(status) = &self.status {
            if status.trim().is_empty() {
                return Err(DomainError::validation("Project status cannot be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_requires_a_name() {
        let err = NewProject::new("", None, None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn status_defaults_to_active() {
        let project = NewProject::new("Website", None, None).unwrap();
        assert_eq!(project.status, DEFAULT_PROJECT_STATUS);

        let project = NewProject::new("Website", None, Some("on_hold".into())).unwrap();
        assert_eq!(project.status, "on_hold");
    }

    #[test]
    fn patch_distinguishes_clearing_from_omitting_description() {
        let untouched = ProjectPatch::default();
        assert!(untouched.is_empty());
        assert_eq!(untouched.description, None);

        let cleared = ProjectPatch {
            description: Some(None),
            ..ProjectPatch::default()
        };
        assert!(!cleared.is_empty());
        assert_eq!(cleared.description, Some(None));
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = ProjectPatch {
            name: Some("   ".into()),
            ..ProjectPatch::default()
        };
        assert!(patch.validate().is_err());
    }
}
