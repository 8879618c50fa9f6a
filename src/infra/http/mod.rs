mod admin;
mod middleware;
mod public;

pub use admin::{
    AdminState, AuthState, LOGIN_PATH, LoginRateLimiter, SESSION_COOKIE, admin_routes,
    require_admin,
};
pub use middleware::{AdminSession, RequestContext};
pub use public::{HttpState, public_routes};

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
};

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub admin: AdminState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for AdminState {
    fn from_ref(state: &RouterState) -> Self {
        state.admin.clone()
    }
}

impl FromRef<RouterState> for AuthState {
    fn from_ref(state: &RouterState) -> Self {
        state.admin.auth.clone()
    }
}

/// Public site and admin CMS on one listener.
pub fn build_router(state: RouterState, upload_body_limit: usize) -> Router {
    let auth = state.admin.auth.clone();
    Router::new()
        .merge(public_routes())
        .merge(admin_routes(upload_body_limit))
        .fallback(public::fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(auth, require_admin))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
