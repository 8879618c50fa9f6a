#![allow(dead_code)]

use std::{path::Path, str::FromStr, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tsunagu::{
    application::{
        admin::{
            dashboard::AdminDashboardService, faqs::AdminFaqService, grants::AdminGrantService,
            interviews::AdminInterviewService, media::AdminMediaService, news::AdminNewsService,
            organizations::AdminOrganizationService, taxonomy::AdminTaxonomyService,
        },
        auth::AdminAuthService,
        ordering::SortOrderService,
        site::SiteService,
        slugs::UniqueSlugResolver,
        storage::ObjectStore,
    },
    infra::{
        db::PostgresRepositories,
        http::{self, AdminState, AuthState, HttpState, LoginRateLimiter, RouterState},
        storage::LocalObjectStore,
    },
    presentation::views::SiteIdentity,
};
use url::Url;

pub const ADMIN_PASSWORD: &str = "hanami-2025";
pub const UPLOAD_LIMIT: u64 = 1024 * 1024;

pub fn admin_state(pool: PgPool, storage_root: &Path) -> AdminState {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let storage: Arc<dyn ObjectStore> = Arc::new(
        LocalObjectStore::new(storage_root.to_path_buf()).expect("open media bucket"),
    );
    let slugs = UniqueSlugResolver::new(repos.clone());
    let ordering = SortOrderService::new(repos.clone());

    AdminState {
        site_title: Arc::from("つなぐ"),
        timezone: chrono_tz::Asia::Tokyo,
        auth: AuthState {
            service: Arc::new(AdminAuthService::new(Some(ADMIN_PASSWORD), None)),
            limiter: LoginRateLimiter::new(Duration::from_secs(60), 5),
            secure_cookie: false,
        },
        dashboard: Arc::new(AdminDashboardService::new(repos.clone())),
        organizations: Arc::new(AdminOrganizationService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            slugs.clone(),
        )),
        interviews: Arc::new(AdminInterviewService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            slugs.clone(),
            None,
        )),
        grants: Arc::new(AdminGrantService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            slugs.clone(),
        )),
        news: Arc::new(AdminNewsService::new(
            repos.clone(),
            repos.clone(),
            slugs.clone(),
        )),
        faqs: Arc::new(AdminFaqService::new(
            repos.clone(),
            repos.clone(),
            ordering.clone(),
        )),
        taxonomy: Arc::new(AdminTaxonomyService::new(
            repos.clone(),
            repos,
            slugs,
            ordering,
        )),
        media: Arc::new(AdminMediaService::new(storage, UPLOAD_LIMIT)),
    }
}

pub fn http_state(pool: PgPool, storage_root: &Path) -> HttpState {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let storage: Arc<dyn ObjectStore> = Arc::new(
        LocalObjectStore::new(storage_root.to_path_buf()).expect("open media bucket"),
    );
    let timezone = chrono_tz::Asia::Tokyo;

    HttpState {
        site: Arc::new(SiteService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            timezone,
        )),
        identity: Arc::new(SiteIdentity {
            title: "つなぐ".to_string(),
            public_site_url: Url::from_str("http://localhost:3000/").expect("valid url"),
            timezone,
        }),
        storage,
        health: repos,
    }
}

pub fn app(pool: PgPool, storage_root: &Path) -> Router {
    let state = RouterState {
        http: http_state(pool.clone(), storage_root),
        admin: admin_state(pool, storage_root),
    };
    http::build_router(state, UPLOAD_LIMIT as usize + 64 * 1024)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Sign in through the login form and return a `Cookie` header value.
pub async fn sign_in(router: &Router) -> String {
    let body = format!("password={ADMIN_PASSWORD}");
    let response = router
        .clone()
        .oneshot(post_form("/admin/login", &body, None))
        .await
        .expect("login response");
    let cookie = set_cookie(&response).expect("session cookie");
    cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .trim()
        .to_string()
}
