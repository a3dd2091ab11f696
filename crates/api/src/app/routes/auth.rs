use std::sync::Arc;

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::Response,
    Json,
};
use serde_json::{json, Value};

use teamspace_audit::RequestOrigin;
use teamspace_auth::Claims;
use teamspace_infra::lifecycle::{Login, RegisterTenant};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware;

pub async fn register_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::RegisterTenantRequest>,
) -> Response {
    let origin = middleware::client_origin(&headers);
    let input = RegisterTenant {
        tenant_name: body.tenant_name.unwrap_or_default(),
        subdomain: body.subdomain.unwrap_or_default(),
        admin_email: body.admin_email.unwrap_or_default(),
        admin_password: body.admin_password.unwrap_or_default(),
        admin_name: body.admin_full_name.unwrap_or_default(),
    };

    let registered = match services.identity.register(input, &origin).await {
        Ok(registered) => registered,
        Err(err) => return errors::domain_error_response(&err),
    };

    dto::created(
        "Tenant registered successfully",
        json!({
            "tenantId": registered.tenant.id,
            "subdomain": registered.tenant.subdomain,
            "adminUser": dto::user_to_json(&registered.admin),
            "token": registered.token.token,
            "expiresIn": registered.token.expires_in,
        }),
    )
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::LoginRequest>,
) -> Response {
    let origin = middleware::client_origin(&headers);
    let input = Login {
        email: body.email.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        subdomain: body.tenant_subdomain.filter(|s| !s.trim().is_empty()),
    };

    let session = match services.identity.login(input, &origin).await {
        Ok(session) => session,
        Err(err) => return errors::domain_error_response(&err),
    };

    dto::ok(
        "Login successful",
        json!({
            "user": dto::user_to_json(&session.user),
            "token": session.token.token,
            "expiresIn": session.token.expires_in,
        }),
    )
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let current = match services.identity.current_user(&claims).await {
        Ok(current) => current,
        Err(err) => return errors::domain_error_response(&err),
    };

    let mut data = dto::user_to_json(&current.user);
    data["tenant"] = match &current.tenant {
        Some(tenant) => dto::tenant_to_json(tenant),
        None => Value::Null,
    };

    dto::ok("User profile", data)
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
) -> Response {
    services.identity.logout(&claims, &origin).await;
    dto::ok_message("Logged out successfully")
}
