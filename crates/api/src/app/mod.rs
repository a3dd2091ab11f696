//! HTTP application wiring (axum router + service construction).
//!
//! Layout:
//! - `services.rs`: store/sink/hasher wiring behind [`services::AppServices`]
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON response mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use teamspace_auth::{Hs256TokenCodec, TokenCodec};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Storage is picked from the environment: `DATABASE_URL` selects Postgres,
/// otherwise an in-memory store backs the process.
pub async fn build_app(jwt_secret: String) -> anyhow::Result<Router> {
    let tokens: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(jwt_secret.as_bytes()));
    let services = Arc::new(services::build_services(Arc::clone(&tokens)).await?);
    Ok(router_with(services, tokens))
}

/// Router over explicit parts. Tests wire an in-memory store through here.
pub fn router_with(services: Arc<services::AppServices>, tokens: Arc<dyn TokenCodec>) -> Router {
    let auth_state = middleware::AuthState { tokens };

    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::require_auth,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
}
