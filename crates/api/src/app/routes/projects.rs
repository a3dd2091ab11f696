use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use teamspace_audit::RequestOrigin;
use teamspace_auth::Claims;
use teamspace_core::{PageRequest, ProjectId};
use teamspace_infra::lifecycle::CreateProject;

use crate::app::routes::tasks;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/:project_id/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
}

pub(crate) fn parse_project_id(raw: &str) -> Result<ProjectId, Response> {
    raw.parse::<ProjectId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "Project not found"))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> Response {
    let input = CreateProject {
        name: body.name.unwrap_or_default(),
        description: body.description,
        status: body.status,
    };

    match services.projects.create(&claims, input, &origin).await {
        Ok(project) => {
            dto::created("Project created successfully", dto::project_to_json(&project))
        }
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<dto::ProjectListQuery>,
) -> Response {
    let filter = dto::project_filter(&query);
    let page = PageRequest::clamped(query.page, query.limit, 20);

    match services.projects.list(&claims, &filter, page).await {
        Ok(listing) => dto::ok("Projects list", dto::project_listing_to_json(listing)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<String>,
) -> Response {
    let project_id = match parse_project_id(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.projects.get(&claims, project_id).await {
        Ok(project) => dto::ok("Project details", dto::project_to_json(&project)),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(project_id): Path<String>,
    Json(body): Json<dto::UpdateProjectRequest>,
) -> Response {
    let project_id = match parse_project_id(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = dto::project_patch(body);

    match services
        .projects
        .update(&claims, project_id, &patch, &origin)
        .await
    {
        Ok(updated) if updated.changed => {
            dto::ok("Project updated successfully", dto::project_to_json(&updated.value))
        }
        Ok(_) => dto::ok_message("No changes made"),
        Err(err) => errors::domain_error_response(&err),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Extension(origin): Extension<RequestOrigin>,
    Path(project_id): Path<String>,
) -> Response {
    let project_id = match parse_project_id(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.projects.delete(&claims, project_id, &origin).await {
        Ok(()) => dto::ok_message("Project deleted successfully"),
        Err(err) => errors::domain_error_response(&err),
    }
}
