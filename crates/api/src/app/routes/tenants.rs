use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::json;

use teamspace_audit::RequestOrigin;
use teamspace_auth::Claims;
use teamspace_core::{PageRequest, TenantId};
use teamspace_infra::lifecycle::CreateUser;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tenants))
        .route("/:tenant_id", get(get_tenant).put(update_tenant))
        .route("/:tenant_id/users", get(list_users).post(create_user))
}

fn parse_tenant_id(raw: &str) -> Result<TenantId, Response> {
    raw.parse::<TenantId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "Tenant not found"))
}

pub async fn list_tenants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<dto::TenantListQuery>,
) -> Response {
    let filter = match dto::tenant_filter(&query) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };
    let page = PageRequest::clamped(query.page, query.limit, 10);

    match services.tenants.list(&claims, &filter, page).await {
        Ok(listing) => dto::ok("Tenants list", dto::tenant_listing_to_json(listing)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn get_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(tenant_id): Path<String>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tenants.get(&claims, tenant_id).await {
        Ok((tenant, stats)) => {
            let mut data = dto::tenant_to_json(&tenant);
            data["stats"] = json!(stats);
            dto::ok("Tenant details", data)
        }
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn update_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(tenant_id): Path<String>,
    Json(body): Json<dto::UpdateTenantRequest>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match dto::tenant_patch(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };

    match services.tenants.update(&claims, tenant_id, &patch, &origin).await {
        Ok(updated) if updated.changed => {
            dto::ok("Tenant updated successfully", dto::tenant_to_json(&updated.value))
        }
        Ok(_) => dto::ok_message("No changes made"),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(tenant_id): Path<String>,
    Json(body): Json<dto::CreateUserRequest>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role = match dto::parse_role(body.role.as_deref()) {
        Ok(role) => role,
        Err(resp) => return resp,
    };

    let input = CreateUser {
        email: body.email.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        full_name: body.full_name.unwrap_or_default(),
        role,
    };

    match services.users.create(&claims, tenant_id, input, &origin).await {
        Ok(user) => dto::created("User created successfully", dto::user_to_json(&user)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(tenant_id): Path<String>,
    Query(query): Query<dto::UserListQuery>,
) -> Response {
    let tenant_id = match parse_tenant_id(&tenant_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let filter = match dto::user_filter(&query) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };
    let page = PageRequest::clamped(query.page, query.limit, 50);

    match services.users.list(&claims, tenant_id, &filter, page).await {
        Ok(listing) => dto::ok("Users list", dto::user_listing_to_json(listing)),
        Err(err) => errors::domain_error_response(&err),
    }
}
