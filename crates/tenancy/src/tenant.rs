use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use teamspace_core::{DomainError, DomainResult, TenantId};

/// Tenant account status. Only `Active` tenants accept logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Suspended,
    Cancelled,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for TenantStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            "cancelled" => Ok(TenantStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown tenant status: {other}"
            ))),
        }
    }
}

/// Subscription tier. Limits are stored per tenant, not derived from the
/// plan, so plans can be regraded without touching quota logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

impl core::str::FromStr for SubscriptionPlan {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            other => Err(DomainError::validation(format!(
                "unknown subscription plan: {other}"
            ))),
        }
    }
}

/// An organization: the isolation boundary and unit of subscription.
///
/// Never hard-deleted; deactivation goes through `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    pub max_users: i32,
    pub max_projects: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Quota defaults for self-service registration (free plan).
pub const DEFAULT_MAX_USERS: i32 = 5;
pub const DEFAULT_MAX_PROJECTS: i32 = 3;

/// Validated input for tenant registration. New tenants always start on the
/// free plan with the default limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTenant {
    pub name: String,
    pub subdomain: String,
}

impl NewTenant {
    pub fn new(name: impl Into<String>, subdomain: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let subdomain = subdomain.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Tenant name is required"));
        }
        validate_subdomain(&subdomain)?;
        Ok(Self { name, subdomain })
    }
}

/// Subdomains are lowercase alphanumeric plus hyphen, non-empty.
pub fn validate_subdomain(subdomain: &str) -> DomainResult<()> {
    let valid = !subdomain.is_empty()
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation("Invalid subdomain format"))
    }
}

/// Partial tenant update. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub status: Option<TenantStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub max_users: Option<i32>,
    pub max_projects: Option<i32>,
}

impl TenantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.subscription_plan.is_none()
            && self.max_users.is_none()
            && self.max_projects.is_none()
    }

    /// Whether the patch touches subscription-scoped fields (status, plan,
    /// limits). Those require the platform operator, not a tenant admin.
    pub fn touches_subscription(&self) -> bool {
        self.status.is_some()
            || self.subscription_plan.is_some()
            || self.max_users.is_some()
            || self.max_projects.is_some()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Tenant name cannot be empty"));
            }
        }
        if let Some(max_users) = self.max_users {
            if max_users < 1 {
                return Err(DomainError::validation("maxUsers must be at least 1"));
            }
        }
        if let Some(max_projects) = self.max_projects {
            if max_projects < 1 {
                return Err(DomainError::validation("maxProjects must be at least 1"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_alphanumeric_subdomains() {
        for candidate in ["acme", "acme-corp", "team42", "a-1-b-2"] {
            assert!(validate_subdomain(candidate).is_ok(), "rejected {candidate}");
        }
    }

    #[test]
    fn rejects_malformed_subdomains() {
        for candidate in ["", "Acme", "has space", "under_score", "dot.com", "naïve"] {
            let err = validate_subdomain(candidate).unwrap_err();
            match err {
                DomainError::Validation(_) => {}
                other => panic!("expected validation error for {candidate}, got {other:?}"),
            }
        }
    }

    #[test]
    fn registration_requires_a_name() {
        let err = NewTenant::new("  ", "acme").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TenantPatch::default().is_empty());
        let patch = TenantPatch {
            name: Some("New Name".into()),
            ..TenantPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(!patch.touches_subscription());
    }

    #[test]
    fn subscription_fields_are_flagged() {
        let patch = TenantPatch {
            max_projects: Some(10),
            ..TenantPatch::default()
        };
        assert!(patch.touches_subscription());

        let patch = TenantPatch {
            status: Some(TenantStatus::Suspended),
            ..TenantPatch::default()
        };
        assert!(patch.touches_subscription());
    }

    #[test]
    fn patch_rejects_nonpositive_limits() {
        let patch = TenantPatch {
            max_users: Some(0),
            ..TenantPatch::default()
        };
        assert!(patch.validate().is_err());

        let patch = TenantPatch {
            max_projects: Some(-3),
            ..TenantPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn statuses_and_plans_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&TenantStatus::Suspended).unwrap(),
            "\"suspended\""
        );
        assert_eq!(
            serde_json::to_string(&SubscriptionPlan::Enterprise).unwrap(),
            "\"enterprise\""
        );
    }

    #[test]
    fn statuses_and_plans_parse_their_wire_names() {
        assert_eq!("cancelled".parse::<TenantStatus>().unwrap(), TenantStatus::Cancelled);
        assert_eq!("pro".parse::<SubscriptionPlan>().unwrap(), SubscriptionPlan::Pro);
        assert!("paused".parse::<TenantStatus>().is_err());
        assert!("platinum".parse::<SubscriptionPlan>().is_err());
    }
}
