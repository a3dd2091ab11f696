use core::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use teamspace_auth::Role;
use teamspace_core::{DomainError, Listing, UserId};
use teamspace_infra::store::filter::{ProjectFilter, TaskFilter, TenantFilter, UserFilter};
use teamspace_infra::store::{ProjectOverview, TaskOverview, TenantOverview};
use teamspace_projects::{Project, ProjectPatch, Task, TaskPatch};
use teamspace_tenancy::{Tenant, TenantPatch, User, UserPatch};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTenantRequest {
    pub tenant_name: Option<String>,
    pub subdomain: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub tenant_subdomain: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub subscription_plan: Option<String>,
    pub max_users: Option<i32>,
    pub max_projects: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: Option<String>,
}

// -------------------------
// List query DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub subscription_plan: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
}

/// Distinguishes an absent field from an explicit `null`: absent leaves the
/// outer `Option` as `None`, `null` arrives as `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -------------------------
// Wire-to-domain parsing
// -------------------------

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    value
        .map(|s| s.parse::<T>().map_err(|err| errors::domain_error_response(&err)))
        .transpose()
}

pub fn parse_role(value: Option<&str>) -> Result<Option<Role>, axum::response::Response> {
    match value {
        Some(s) => s
            .parse::<Role>()
            .map(Some)
            .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "Invalid role")),
        None => Ok(None),
    }
}

fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>, axum::response::Response> {
    match value {
        Some(s) => s
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "Invalid due date")),
        None => Ok(None),
    }
}

pub fn tenant_filter(query: &TenantListQuery) -> Result<TenantFilter, axum::response::Response> {
    Ok(TenantFilter {
        status: parse_opt(query.status.as_deref())?,
        plan: parse_opt(query.subscription_plan.as_deref())?,
    })
}

pub fn user_filter(query: &UserListQuery) -> Result<UserFilter, axum::response::Response> {
    Ok(UserFilter {
        role: parse_role(query.role.as_deref())?,
        search: query.search.clone(),
    })
}

pub fn project_filter(query: &ProjectListQuery) -> ProjectFilter {
    ProjectFilter {
        status: query.status.clone(),
        search: query.search.clone(),
    }
}

pub fn task_filter(query: &TaskListQuery) -> Result<TaskFilter, axum::response::Response> {
    Ok(TaskFilter {
        status: parse_opt(query.status.as_deref())?,
        priority: parse_opt(query.priority.as_deref())?,
        assigned_to: parse_opt(query.assigned_to.as_deref())?,
        search: query.search.clone(),
    })
}

pub fn tenant_patch(body: UpdateTenantRequest) -> Result<TenantPatch, axum::response::Response> {
    Ok(TenantPatch {
        name: body.name,
        status: parse_opt(body.status.as_deref())?,
        subscription_plan: parse_opt(body.subscription_plan.as_deref())?,
        max_users: body.max_users,
        max_projects: body.max_projects,
    })
}

pub fn user_patch(body: UpdateUserRequest) -> Result<UserPatch, axum::response::Response> {
    Ok(UserPatch {
        full_name: body.full_name,
        role: parse_role(body.role.as_deref())?,
        is_active: body.is_active,
    })
}

pub fn project_patch(body: UpdateProjectRequest) -> ProjectPatch {
    ProjectPatch {
        name: body.name,
        description: body.description,
        status: body.status,
    }
}

pub fn task_patch(body: UpdateTaskRequest) -> Result<TaskPatch, axum::response::Response> {
    let assigned_to = match body.assigned_to {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) => Some(Some(
            raw.parse::<UserId>()
                .map_err(|err| errors::domain_error_response(&err))?,
        )),
    };

    let due_date = match body.due_date {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) => Some(parse_due_date(Some(raw.as_str()))?),
    };

    Ok(TaskPatch {
        title: body.title,
        description: body.description,
        status: parse_opt(body.status.as_deref())?,
        priority: parse_opt(body.priority.as_deref())?,
        assigned_to,
        due_date,
    })
}

// -------------------------
// Response envelope
// -------------------------

pub fn ok(message: &str, data: Value) -> axum::response::Response {
    envelope(StatusCode::OK, message, Some(data))
}

pub fn ok_message(message: &str) -> axum::response::Response {
    envelope(StatusCode::OK, message, None)
}

pub fn created(message: &str, data: Value) -> axum::response::Response {
    envelope(StatusCode::CREATED, message, Some(data))
}

fn envelope(status: StatusCode, message: &str, data: Option<Value>) -> axum::response::Response {
    let mut body = json!({
        "success": true,
        "message": message,
    });
    if let Some(data) = data {
        body["data"] = data;
    }
    (status, Json(body)).into_response()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "tenantId": user.tenant_id,
        "email": user.email,
        "fullName": user.full_name,
        "role": user.role,
        "isActive": user.is_active,
        "createdAt": user.created_at,
        "updatedAt": user.updated_at,
    })
}

pub fn tenant_to_json(tenant: &Tenant) -> Value {
    json!({
        "id": tenant.id,
        "name": tenant.name,
        "subdomain": tenant.subdomain,
        "status": tenant.status,
        "subscriptionPlan": tenant.subscription_plan,
        "maxUsers": tenant.max_users,
        "maxProjects": tenant.max_projects,
        "createdAt": tenant.created_at,
        "updatedAt": tenant.updated_at,
    })
}

pub fn project_to_json(project: &Project) -> Value {
    json!({
        "id": project.id,
        "tenantId": project.tenant_id,
        "name": project.name,
        "description": project.description,
        "status": project.status,
        "createdBy": project.created_by,
        "createdAt": project.created_at,
        "updatedAt": project.updated_at,
    })
}

pub fn task_to_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "projectId": task.project_id,
        "tenantId": task.tenant_id,
        "title": task.title,
        "description": task.description,
        "status": task.status,
        "priority": task.priority,
        "assignedTo": task.assigned_to,
        "dueDate": task.due_date,
        "createdAt": task.created_at,
        "updatedAt": task.updated_at,
    })
}

pub fn tenant_listing_to_json(listing: Listing<TenantOverview>) -> Value {
    json!({
        "tenants": listing.items,
        "total": listing.total,
        "pagination": pagination_json(&listing),
    })
}

pub fn user_listing_to_json(listing: Listing<User>) -> Value {
    json!({
        "users": listing.items.iter().map(user_to_json).collect::<Vec<_>>(),
        "total": listing.total,
        "pagination": pagination_json(&listing),
    })
}

pub fn project_listing_to_json(listing: Listing<ProjectOverview>) -> Value {
    json!({
        "projects": listing.items,
        "total": listing.total,
        "pagination": pagination_json(&listing),
    })
}

pub fn task_listing_to_json(listing: Listing<TaskOverview>) -> Value {
    json!({
        "tasks": listing.items,
        "total": listing.total,
        "pagination": pagination_json(&listing),
    })
}

fn pagination_json<T>(listing: &Listing<T>) -> Value {
    json!({
        "currentPage": listing.page,
        "totalPages": listing.total.div_ceil(u64::from(listing.page_size)),
        "limit": listing.page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use teamspace_core::{PageRequest, TenantId};

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: UpdateProjectRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);

        let null: UpdateProjectRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let set: UpdateProjectRequest =
            serde_json::from_str(r#"{"description":"launch plan"}"#).unwrap();
        assert_eq!(set.description, Some(Some("launch plan".to_string())));
    }

    #[test]
    fn user_json_is_camel_case_and_carries_no_hash() {
        let user = User {
            id: UserId::new(),
            tenant_id: Some(TenantId::new()),
            email: "a@acme.test".to_string(),
            password_hash: "secret-digest".to_string(),
            full_name: "Ada Admin".to_string(),
            role: Role::TenantAdmin,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = user_to_json(&user);
        assert_eq!(value["fullName"], "Ada Admin");
        assert_eq!(value["isActive"], true);
        assert_eq!(value["role"], "tenant_admin");
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn pagination_rounds_page_count_up() {
        let listing: Listing<TenantOverview> =
            Listing::new(Vec::new(), 45, PageRequest::clamped(Some(2), Some(20), 10));
        let value = tenant_listing_to_json(listing);

        assert_eq!(value["pagination"]["currentPage"], 2);
        assert_eq!(value["pagination"]["totalPages"], 3);
        assert_eq!(value["pagination"]["limit"], 20);
        assert_eq!(value["total"], 45);
    }

    #[test]
    fn bad_enum_values_become_bad_request() {
        let patch = task_patch(UpdateTaskRequest {
            title: None,
            description: None,
            status: Some("done".to_string()),
            priority: None,
            assigned_to: None,
            due_date: None,
        });
        assert_eq!(patch.unwrap_err().status(), StatusCode::BAD_REQUEST);

        let role = parse_role(Some("manager"));
        assert_eq!(role.unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn task_patch_keeps_explicit_nulls() {
        let body: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignedTo":null,"dueDate":null}"#).unwrap();
        let patch = task_patch(body).unwrap();

        assert_eq!(patch.assigned_to, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.title, None);
    }

    #[test]
    fn tenant_patch_parses_plan_and_status() {
        let patch = tenant_patch(UpdateTenantRequest {
            name: Some("Acme Global".to_string()),
            status: Some("suspended".to_string()),
            subscription_plan: Some("pro".to_string()),
            max_users: Some(25),
            max_projects: None,
        })
        .unwrap();

        assert_eq!(patch.name.as_deref(), Some("Acme Global"));
        assert_eq!(patch.status, Some(teamspace_tenancy::TenantStatus::Suspended));
        assert_eq!(
            patch.subscription_plan,
            Some(teamspace_tenancy::SubscriptionPlan::Pro)
        );
        assert_eq!(patch.max_users, Some(25));
    }
}
