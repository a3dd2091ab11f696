use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::put,
    Json, Router,
};

use teamspace_audit::RequestOrigin;
use teamspace_auth::Claims;
use teamspace_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:user_id", put(update_user).delete(delete_user))
}

fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    raw.parse::<UserId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "User not found"))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(user_id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match dto::user_patch(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };

    match services.users.update(&claims, user_id, &patch, &origin).await {
        Ok(updated) if updated.changed => {
            dto::ok("User updated successfully", dto::user_to_json(&updated.value))
        }
        Ok(_) => dto::ok_message("No changes made"),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.users.delete(&claims, user_id, &origin).await {
        Ok(()) => dto::ok_message("User deleted successfully"),
        Err(err) => errors::domain_error_response(&err),
    }
}
