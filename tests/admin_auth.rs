mod support;

use axum::http::{StatusCode, header};
use sqlx::PgPool;
use tower::ServiceExt;
use tsunagu::infra::http::SESSION_COOKIE;

use support::{body_text, get, location, post_form, set_cookie, sign_in};

#[sqlx::test(migrations = "./migrations")]
async fn admin_pages_redirect_anonymous_visitors(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    for path in ["/admin", "/admin/organizations", "/admin/taxonomy/tags"] {
        let response = router
            .clone()
            .oneshot(get(path, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/admin/login"), "{path}");
    }

    let response = router
        .clone()
        .oneshot(post_form("/admin/organizations", "name=Sakura+Club", None))
        .await
        .expect("response");
    assert_eq!(location(&response), Some("/admin/login"));
}

#[sqlx::test(migrations = "./migrations")]
async fn wrong_password_is_rejected(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    let response = router
        .clone()
        .oneshot(post_form("/admin/login", "password=nope", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    assert!(body_text(response).await.contains("パスワードが違います"));
}

#[sqlx::test(migrations = "./migrations")]
async fn login_sets_session_and_opens_the_dashboard(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    let body = format!("password={}", support::ADMIN_PASSWORD);
    let response = router
        .clone()
        .oneshot(post_form("/admin/login", &body, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin"));
    let cookie = set_cookie(&response).expect("session cookie");
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let session = sign_in(&router).await;
    let response = router
        .clone()
        .oneshot(get("/admin", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get("/admin/login", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin"));
}

#[sqlx::test(migrations = "./migrations")]
async fn forged_session_is_not_accepted(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    let forged = format!("{SESSION_COOKIE}=deadbeef");
    let response = router
        .clone()
        .oneshot(get("/admin", Some(&forged)))
        .await
        .expect("response");
    assert_eq!(location(&response), Some("/admin/login"));
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_clears_the_cookie(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());
    let session = sign_in(&router).await;

    let response = router
        .clone()
        .oneshot(post_form("/admin/logout", "", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/login"));
    let cleared = set_cookie(&response).expect("removal cookie");
    assert!(cleared.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(cleared.contains("Max-Age=0"));
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_failures_are_throttled(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(post_form("/admin/login", "password=nope", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let body = format!("password={}", support::ADMIN_PASSWORD);
    let response = router
        .clone()
        .oneshot(post_form("/admin/login", &body, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[sqlx::test(migrations = "./migrations")]
async fn created_organization_stays_private_until_published(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());
    let session = sign_in(&router).await;

    let response = router
        .clone()
        .oneshot(post_form(
            "/admin/organizations",
            "name=Sakura+Club&summary=%E8%8A%B1%E8%A6%8B",
            Some(&session),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).expect("redirect");
    assert!(target.starts_with("/admin/organizations?notice="));

    let response = router
        .clone()
        .oneshot(get("/organizations/sakura-club", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn blank_organization_name_rerenders_the_form(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());
    let session = sign_in(&router).await;

    let response = router
        .clone()
        .oneshot(post_form("/admin/organizations", "name=", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_taxonomy_kind_is_not_found(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());
    let session = sign_in(&router).await;

    let response = router
        .clone()
        .oneshot(get("/admin/taxonomy/colors", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn public_site_serves_health_and_not_found(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());

    let response = router
        .clone()
        .oneshot(get("/_health/db", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(get("/no-such-page", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(get("/", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn admin_forms_render_their_fields(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = support::app(pool, dir.path());
    let session = sign_in(&router).await;

    let response = router
        .clone()
        .oneshot(get("/admin/organizations/new", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    for field in ["name=\"name\"", "name=\"slug\"", "name=\"summary\"", "name=\"contact_email\""] {
        assert!(html.contains(field), "{field}");
    }

    let response = router
        .clone()
        .oneshot(post_form(
            "/admin/faqs",
            "question=%E5%8F%82%E5%8A%A0%E8%B2%BB%E3%81%AF%EF%BC%9F&answer=%E7%84%A1%E6%96%99",
            Some(&session),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = router
        .clone()
        .oneshot(get("/admin/faqs", Some(&session)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("参加費は？"));
    assert!(html.contains("name=\"direction\" value=\"up\""));
    assert!(html.contains("削除"));
}
