//! Admin session: password login, the session cookie, and the guard that
//! keeps `/admin/*` behind it.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    Form,
    cookie::{Cookie, CookieJar, SameSite},
};
use metrics::counter;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    application::{auth::AuthError, error::ErrorReport},
    infra::http::middleware::AdminSession,
    presentation::{
        admin::views::{AdminLoginTemplate, AdminLoginView},
        views::render_template_response,
    },
};

use super::{AdminState, AuthState};

pub const SESSION_COOKIE: &str = "tsunagu_admin_session";
pub const LOGIN_PATH: &str = "/admin/login";
const DASHBOARD_PATH: &str = "/admin";
const SESSION_DAYS: i64 = 7;

fn is_admin_path(path: &str) -> bool {
    path == DASHBOARD_PATH || path.starts_with("/admin/")
}

fn has_session(auth: &AuthState, jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| auth.service.verify_session(cookie.value()))
}

/// Gate every `/admin` route on a valid session cookie. The login page is
/// open, but a signed-in visitor is sent on to the dashboard.
pub async fn require_admin(
    State(auth): State<AuthState>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !is_admin_path(&path) {
        return next.run(request).await;
    }

    let signed_in = has_session(&auth, &jar);
    if path == LOGIN_PATH {
        if signed_in {
            return Redirect::to(DASHBOARD_PATH).into_response();
        }
        return next.run(request).await;
    }
    if !signed_in {
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let mut response = next.run(request).await;
    response.extensions_mut().insert(AdminSession);
    response
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

/// Client key for login throttling: the first forwarded address, else one
/// shared bucket.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "global".to_string())
}

fn login_page(state: &AdminState, error: Option<String>, status: StatusCode) -> Response {
    let view = AdminLoginView::new(&state.site_title, error, !state.auth.service.is_enabled());
    render_template_response(AdminLoginTemplate { view }, status)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    password: String,
}

pub(super) async fn admin_login_page(State(state): State<AdminState>) -> Response {
    login_page(&state, None, StatusCode::OK)
}

pub(super) async fn admin_login(
    State(state): State<AdminState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::auth::login";

    let key = client_key(&headers);
    let (allowed, _remaining) = state.auth.limiter.allow(&key);
    if !allowed {
        counter!("tsunagu_login_failures_total", "reason" => "throttled").increment(1);
        let status = StatusCode::TOO_MANY_REQUESTS;
        let mut response = login_page(
            &state,
            Some("ログインの試行回数が多すぎます。しばらくしてから再度お試しください".to_string()),
            status,
        );
        if let Ok(value) = HeaderValue::from_str(&state.auth.limiter.retry_after_secs().to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        ErrorReport::from_message(SOURCE, status, format!("login throttled for `{key}`"))
            .attach(&mut response);
        return response;
    }

    match state.auth.service.login(&form.password) {
        Ok(token) => {
            state.auth.limiter.reset(&key);
            info!(target = "tsunagu::admin::auth", client = %key, "admin signed in");
            let jar = jar.add(session_cookie(token, state.auth.secure_cookie));
            (jar, Redirect::to(DASHBOARD_PATH)).into_response()
        }
        Err(AuthError::Disabled) => {
            let status = StatusCode::FORBIDDEN;
            let mut response = login_page(&state, None, status);
            ErrorReport::from_error(SOURCE, status, &AuthError::Disabled).attach(&mut response);
            response
        }
        Err(err @ AuthError::InvalidPassword) => {
            counter!("tsunagu_login_failures_total", "reason" => "password").increment(1);
            warn!(target = "tsunagu::admin::auth", client = %key, "admin login rejected");
            let status = StatusCode::UNAUTHORIZED;
            let mut response = login_page(&state, Some("パスワードが違います".to_string()), status);
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            response
        }
    }
}

pub(super) async fn admin_logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_paths_are_guarded() {
        assert!(is_admin_path("/admin"));
        assert!(is_admin_path("/admin/organizations"));
        assert!(!is_admin_path("/administration"));
        assert!(!is_admin_path("/organizations"));
    }

    #[test]
    fn client_key_uses_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "global");
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn session_cookie_is_locked_down() {
        let cookie = session_cookie("token".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
