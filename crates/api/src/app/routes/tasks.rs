use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{patch, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::json;

use teamspace_audit::RequestOrigin;
use teamspace_auth::Claims;
use teamspace_core::{PageRequest, TaskId, UserId};
use teamspace_infra::lifecycle::CreateTask;
use teamspace_projects::{TaskPriority, TaskStatus};

use crate::app::routes::projects::parse_project_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Routes for tasks addressed by their own id. Creation and listing live
/// under `/api/projects/:project_id/tasks`.
pub fn router() -> Router {
    Router::new()
        .route("/:task_id/status", patch(update_task_status))
        .route("/:task_id", put(update_task).delete(delete_task))
}

fn parse_task_id(raw: &str) -> Result<TaskId, Response> {
    raw.parse::<TaskId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "Task not found"))
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(project_id): Path<String>,
    Json(body): Json<dto::CreateTaskRequest>,
) -> Response {
    let project_id = match parse_project_id(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let priority = match body.priority.as_deref() {
        Some(raw) => match raw.parse::<TaskPriority>() {
            Ok(priority) => Some(priority),
            Err(err) => return errors::domain_error_response(&err),
        },
        None => None,
    };
    let assigned_to = match body.assigned_to.as_deref() {
        Some(raw) => match raw.parse::<UserId>() {
            Ok(id) => Some(id),
            Err(err) => return errors::domain_error_response(&err),
        },
        None => None,
    };
    let due_date = match body.due_date.as_deref() {
        Some(raw) => match raw.parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "Invalid due date"),
        },
        None => None,
    };

    let input = CreateTask {
        title: body.title.unwrap_or_default(),
        description: body.description,
        priority,
        assigned_to,
        due_date,
    };

    match services.tasks.create(&claims, project_id, input, &origin).await {
        Ok(task) => dto::created("Task created successfully", dto::task_to_json(&task)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<String>,
    Query(query): Query<dto::TaskListQuery>,
) -> Response {
    let project_id = match parse_project_id(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let filter = match dto::task_filter(&query) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };
    let page = PageRequest::clamped(query.page, query.limit, 50);

    match services.tasks.list(&claims, project_id, &filter, page).await {
        Ok(listing) => dto::ok("Tasks list", dto::task_listing_to_json(listing)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn update_task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(task_id): Path<String>,
    Json(body): Json<dto::UpdateTaskStatusRequest>,
) -> Response {
    let task_id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(raw) = body.status else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Status is required");
    };
    let status = match raw.parse::<TaskStatus>() {
        Ok(status) => status,
        Err(err) => return errors::domain_error_response(&err),
    };

    match services
        .tasks
        .update_status(&claims, task_id, status, &origin)
        .await
    {
        Ok(task) => dto::ok(
            "Task status updated",
            json!({
                "id": task.id,
                "status": task.status,
                "updatedAt": task.updated_at,
            }),
        ),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(task_id): Path<String>,
    Json(body): Json<dto::UpdateTaskRequest>,
) -> Response {
    let task_id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match dto::task_patch(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };

    match services.tasks.update(&claims, task_id, &patch, &origin).await {
        Ok(updated) if updated.changed => {
            dto::ok("Task updated successfully", dto::task_to_json(&updated.value))
        }
        Ok(_) => dto::ok_message("No changes made"),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(task_id): Path<String>,
) -> Response {
    let task_id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tasks.delete(&claims, task_id, &origin).await {
        Ok(()) => dto::ok_message("Task deleted successfully"),
        Err(err) => errors::domain_error_response(&err),
    }
}
