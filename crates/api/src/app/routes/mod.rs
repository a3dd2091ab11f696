use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod projects;
pub mod system;
pub mod tasks;
pub mod tenants;
pub mod users;

/// Routes reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/auth/register-tenant", post(auth::register_tenant))
        .route("/api/auth/login", post(auth::login))
}

/// Routes behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .nest("/api/tenants", tenants::router())
        .nest("/api/users", users::router())
        .nest("/api/projects", projects::router())
        .nest("/api/tasks", tasks::router())
}
