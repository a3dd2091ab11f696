//! Pure authorization decisions.
//!
//! `decide` is deterministic and touches no storage. Callers resolve the
//! target into a [`ResourceRef`] first; when part of the descriptor is not
//! known yet (the target row has not been fetched), the caller may decide
//! with what it has and decide again once the row is loaded. Rules are
//! evaluated in a fixed precedence: tenant boundary, then role gates.

use serde::Serialize;

use teamspace_core::{TenantId, UserId};

use crate::{Claims, Role};

/// What is being attempted. Sub-enums carry field-level granularity where
/// role requirements differ per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Tenant(TenantAction),
    User(UserAction),
    Project(ProjectAction),
    Task(TaskAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantAction {
    /// Enumerate every tenant on the platform.
    List,
    Read,
    UpdateName,
    /// Status, subscription plan, and quota limits.
    UpdateSubscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Create,
    List,
    /// Profile fields (full name).
    UpdateProfile,
    UpdateRole { to: Role },
    UpdateActivation,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Create,
    List,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Create,
    List,
    Read,
    Update,
    UpdateStatus,
    Delete,
}

/// Descriptor of the action's target, as far as it is known at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceRef {
    /// Owning tenant. `None` for global surfaces (the tenant list) or when
    /// the target row has not been resolved yet.
    pub tenant_id: Option<TenantId>,

    /// Creator, for ownership-based rights (project update/delete).
    pub created_by: Option<UserId>,

    /// Target user, for self-referential checks.
    pub target_user: Option<UserId>,
}

impl ResourceRef {
    /// A surface with no owning tenant (e.g. the platform tenant list).
    pub fn global() -> Self {
        Self::default()
    }

    pub fn in_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            ..Self::default()
        }
    }

    pub fn project(tenant_id: TenantId, created_by: Option<UserId>) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            created_by,
            target_user: None,
        }
    }

    pub fn user(tenant_id: Option<TenantId>, target: UserId) -> Self {
        Self {
            tenant_id,
            created_by: None,
            target_user: Some(target),
        }
    }
}

/// Why a request was denied. Closed set; the lifecycle layer maps each
/// reason onto the error surface (`forbidden` or `not_found`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    CrossTenant,
    RoleInsufficient,
    NotOwner,
    SelfActionForbidden,
    PrivilegeEscalation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `claims` may perform `action` on `resource`.
///
/// - No IO
/// - No panics
/// - No business logic beyond the role/tenant policy
pub fn decide(claims: &Claims, action: Action, resource: &ResourceRef) -> Decision {
    // Tenant boundary comes first. Super admins cross it; nobody else does.
    if claims.role != Role::SuperAdmin {
        if let Some(target_tenant) = resource.tenant_id {
            if claims.tenant_id != Some(target_tenant) {
                return Decision::Deny(DenyReason::CrossTenant);
            }
        }
    }

    match action {
        Action::Tenant(action) => decide_tenant(claims, action),
        Action::User(action) => decide_user(claims, action, resource),
        Action::Project(action) => decide_project(claims, action, resource),
        Action::Task(action) => decide_task(claims, action),
    }
}

fn decide_tenant(claims: &Claims, action: TenantAction) -> Decision {
    match action {
        TenantAction::List | TenantAction::UpdateSubscription => require_super_admin(claims),
        // The boundary rule already pinned membership for non-super roles.
        TenantAction::Read => Decision::Allow,
        TenantAction::UpdateName => match claims.role {
            Role::SuperAdmin | Role::TenantAdmin => Decision::Allow,
            Role::User => Decision::Deny(DenyReason::RoleInsufficient),
        },
    }
}

fn decide_user(claims: &Claims, action: UserAction, resource: &ResourceRef) -> Decision {
    match action {
        UserAction::Create | UserAction::List | UserAction::UpdateActivation => {
            require_tenant_admin(claims)
        }
        UserAction::UpdateProfile => {
            if resource.target_user == Some(claims.sub) {
                Decision::Allow
            } else {
                require_tenant_admin(claims)
            }
        }
        UserAction::UpdateRole { to } => {
            // Nobody mints super admins, whatever their own role.
            if to == Role::SuperAdmin {
                Decision::Deny(DenyReason::PrivilegeEscalation)
            } else {
                require_tenant_admin(claims)
            }
        }
        UserAction::Delete => match require_tenant_admin(claims) {
            Decision::Allow if resource.target_user == Some(claims.sub) => {
                Decision::Deny(DenyReason::SelfActionForbidden)
            }
            other => other,
        },
    }
}

fn decide_project(claims: &Claims, action: ProjectAction, resource: &ResourceRef) -> Decision {
    match action {
        ProjectAction::Create | ProjectAction::List | ProjectAction::Read => {
            require_member(claims)
        }
        ProjectAction::Update | ProjectAction::Delete => match claims.role {
            Role::TenantAdmin => Decision::Allow,
            Role::User => {
                if resource.created_by == Some(claims.sub) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
            Role::SuperAdmin => Decision::Deny(DenyReason::RoleInsufficient),
        },
    }
}

fn decide_task(claims: &Claims, action: TaskAction) -> Decision {
    match action {
        TaskAction::Create
        | TaskAction::List
        | TaskAction::Read
        | TaskAction::Update
        | TaskAction::UpdateStatus
        | TaskAction::Delete => require_member(claims),
    }
}

/// Tenant membership in any role. Super admins carry no membership and are
/// denied intra-tenant resource actions.
fn require_member(claims: &Claims) -> Decision {
    match claims.role {
        Role::TenantAdmin | Role::User => Decision::Allow,
        Role::SuperAdmin => Decision::Deny(DenyReason::RoleInsufficient),
    }
}

fn require_tenant_admin(claims: &Claims) -> Decision {
    if claims.role == Role::TenantAdmin {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::RoleInsufficient)
    }
}

fn require_super_admin(claims: &Claims) -> Decision {
    if claims.role == Role::SuperAdmin {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::RoleInsufficient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, tenant_id: Option<TenantId>) -> Claims {
        Claims::new(UserId::new(), tenant_id, role)
    }

    fn member(role: Role, tenant_id: TenantId) -> Claims {
        claims(role, Some(tenant_id))
    }

    fn super_admin() -> Claims {
        claims(Role::SuperAdmin, None)
    }

    #[test]
    fn cross_tenant_access_is_denied_before_role_gates() {
        let home = TenantId::new();
        let foreign = TenantId::new();

        // Even a tenant admin with an otherwise sufficient role stops at
        // the boundary.
        let admin = member(Role::TenantAdmin, home);
        let decision = decide(
            &admin,
            Action::Project(ProjectAction::Read),
            &ResourceRef::in_tenant(foreign),
        );
        assert_eq!(decision, Decision::Deny(DenyReason::CrossTenant));

        // Same for an action the role could never perform; the boundary
        // reason wins.
        let user = member(Role::User, home);
        let decision = decide(
            &user,
            Action::Tenant(TenantAction::UpdateSubscription),
            &ResourceRef::in_tenant(foreign),
        );
        assert_eq!(decision, Decision::Deny(DenyReason::CrossTenant));
    }

    #[test]
    fn super_admin_crosses_tenant_boundaries_for_tenant_surfaces() {
        let tenant = TenantId::new();
        let decision = decide(
            &super_admin(),
            Action::Tenant(TenantAction::Read),
            &ResourceRef::in_tenant(tenant),
        );
        assert_eq!(decision, Decision::Allow);

        let decision = decide(
            &super_admin(),
            Action::Tenant(TenantAction::UpdateSubscription),
            &ResourceRef::in_tenant(tenant),
        );
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn only_super_admin_lists_tenants() {
        assert_eq!(
            decide(&super_admin(), Action::Tenant(TenantAction::List), &ResourceRef::global()),
            Decision::Allow
        );

        let tenant = TenantId::new();
        for role in [Role::TenantAdmin, Role::User] {
            let decision = decide(
                &member(role, tenant),
                Action::Tenant(TenantAction::List),
                &ResourceRef::global(),
            );
            assert_eq!(decision, Decision::Deny(DenyReason::RoleInsufficient));
        }
    }

    #[test]
    fn tenant_admin_updates_name_but_not_subscription() {
        let tenant = TenantId::new();
        let admin = member(Role::TenantAdmin, tenant);
        let resource = ResourceRef::in_tenant(tenant);

        assert_eq!(
            decide(&admin, Action::Tenant(TenantAction::UpdateName), &resource),
            Decision::Allow
        );
        assert_eq!(
            decide(&admin, Action::Tenant(TenantAction::UpdateSubscription), &resource),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn plain_member_reads_but_does_not_rename_tenant() {
        let tenant = TenantId::new();
        let user = member(Role::User, tenant);
        let resource = ResourceRef::in_tenant(tenant);

        assert_eq!(
            decide(&user, Action::Tenant(TenantAction::Read), &resource),
            Decision::Allow
        );
        assert_eq!(
            decide(&user, Action::Tenant(TenantAction::UpdateName), &resource),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn user_management_requires_tenant_admin() {
        let tenant = TenantId::new();
        let resource = ResourceRef::in_tenant(tenant);

        for action in [UserAction::Create, UserAction::List, UserAction::UpdateActivation] {
            assert_eq!(
                decide(&member(Role::TenantAdmin, tenant), Action::User(action), &resource),
                Decision::Allow
            );
            assert_eq!(
                decide(&member(Role::User, tenant), Action::User(action), &resource),
                Decision::Deny(DenyReason::RoleInsufficient)
            );
            // Super admins manage tenants, not tenant rosters.
            assert_eq!(
                decide(&super_admin(), Action::User(action), &resource),
                Decision::Deny(DenyReason::RoleInsufficient)
            );
        }
    }

    #[test]
    fn tenant_admin_cannot_delete_themself() {
        let tenant = TenantId::new();
        let admin = member(Role::TenantAdmin, tenant);

        let decision = decide(
            &admin,
            Action::User(UserAction::Delete),
            &ResourceRef::user(Some(tenant), admin.sub),
        );
        assert_eq!(decision, Decision::Deny(DenyReason::SelfActionForbidden));

        let decision = decide(
            &admin,
            Action::User(UserAction::Delete),
            &ResourceRef::user(Some(tenant), UserId::new()),
        );
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn plain_member_cannot_delete_anyone() {
        let tenant = TenantId::new();
        let user = member(Role::User, tenant);

        // Including themself: the role gate fires before the self check.
        let decision = decide(
            &user,
            Action::User(UserAction::Delete),
            &ResourceRef::user(Some(tenant), user.sub),
        );
        assert_eq!(decision, Decision::Deny(DenyReason::RoleInsufficient));
    }

    #[test]
    fn profile_updates_allow_self_or_admin() {
        let tenant = TenantId::new();
        let user = member(Role::User, tenant);
        let other = UserId::new();

        assert_eq!(
            decide(
                &user,
                Action::User(UserAction::UpdateProfile),
                &ResourceRef::user(Some(tenant), user.sub),
            ),
            Decision::Allow
        );
        assert_eq!(
            decide(
                &user,
                Action::User(UserAction::UpdateProfile),
                &ResourceRef::user(Some(tenant), other),
            ),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
        assert_eq!(
            decide(
                &member(Role::TenantAdmin, tenant),
                Action::User(UserAction::UpdateProfile),
                &ResourceRef::user(Some(tenant), other),
            ),
            Decision::Allow
        );
    }

    #[test]
    fn nobody_escalates_to_super_admin() {
        let tenant = TenantId::new();
        let target = ResourceRef::user(Some(tenant), UserId::new());
        let escalate = Action::User(UserAction::UpdateRole { to: Role::SuperAdmin });

        for actor in [
            member(Role::TenantAdmin, tenant),
            member(Role::User, tenant),
        ] {
            assert_eq!(
                decide(&actor, escalate, &target),
                Decision::Deny(DenyReason::PrivilegeEscalation)
            );
        }
        // Not even a super admin mints another one through this path.
        assert_eq!(
            decide(&super_admin(), escalate, &target),
            Decision::Deny(DenyReason::PrivilegeEscalation)
        );
    }

    #[test]
    fn role_changes_below_super_admin_require_tenant_admin() {
        let tenant = TenantId::new();
        let target = ResourceRef::user(Some(tenant), UserId::new());
        let promote = Action::User(UserAction::UpdateRole { to: Role::TenantAdmin });

        assert_eq!(
            decide(&member(Role::TenantAdmin, tenant), promote, &target),
            Decision::Allow
        );
        assert_eq!(
            decide(&member(Role::User, tenant), promote, &target),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn any_member_creates_and_reads_projects() {
        let tenant = TenantId::new();
        let resource = ResourceRef::in_tenant(tenant);

        for role in [Role::TenantAdmin, Role::User] {
            for action in [ProjectAction::Create, ProjectAction::List, ProjectAction::Read] {
                assert_eq!(
                    decide(&member(role, tenant), Action::Project(action), &resource),
                    Decision::Allow
                );
            }
        }
        // Super admins have no tenant membership to act within.
        assert_eq!(
            decide(&super_admin(), Action::Project(ProjectAction::Create), &resource),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn project_writes_require_admin_or_creator() {
        let tenant = TenantId::new();
        let creator = member(Role::User, tenant);
        let bystander = member(Role::User, tenant);
        let admin = member(Role::TenantAdmin, tenant);
        let resource = ResourceRef::project(tenant, Some(creator.sub));

        for action in [ProjectAction::Update, ProjectAction::Delete] {
            assert_eq!(
                decide(&creator, Action::Project(action), &resource),
                Decision::Allow
            );
            assert_eq!(
                decide(&admin, Action::Project(action), &resource),
                Decision::Allow
            );
            assert_eq!(
                decide(&bystander, Action::Project(action), &resource),
                Decision::Deny(DenyReason::NotOwner)
            );
        }
    }

    #[test]
    fn orphaned_project_is_writable_only_by_admin() {
        let tenant = TenantId::new();
        // Creator deleted; created_by reassigned to null.
        let resource = ResourceRef::project(tenant, None);

        assert_eq!(
            decide(
                &member(Role::TenantAdmin, tenant),
                Action::Project(ProjectAction::Delete),
                &resource,
            ),
            Decision::Allow
        );
        assert_eq!(
            decide(
                &member(Role::User, tenant),
                Action::Project(ProjectAction::Delete),
                &resource,
            ),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn task_actions_are_open_to_all_members() {
        let tenant = TenantId::new();
        let resource = ResourceRef::in_tenant(tenant);

        for action in [
            TaskAction::Create,
            TaskAction::List,
            TaskAction::Read,
            TaskAction::Update,
            TaskAction::UpdateStatus,
            TaskAction::Delete,
        ] {
            for role in [Role::TenantAdmin, Role::User] {
                assert_eq!(
                    decide(&member(role, tenant), Action::Task(action), &resource),
                    Decision::Allow
                );
            }
            assert_eq!(
                decide(&super_admin(), Action::Task(action), &resource),
                Decision::Deny(DenyReason::RoleInsufficient)
            );
        }
    }

    #[test]
    fn deny_reasons_serialize_snake_case() {
        let json = serde_json::to_string(&DenyReason::CrossTenant).unwrap();
        assert_eq!(json, "\"cross_tenant\"");
        let json = serde_json::to_string(&DenyReason::PrivilegeEscalation).unwrap();
        assert_eq!(json, "\"privilege_escalation\"");
    }
}
