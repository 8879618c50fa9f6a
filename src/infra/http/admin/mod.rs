mod auth;
mod dashboard;
mod faqs;
mod grants;
mod interviews;
mod media;
mod news;
mod organizations;
mod rate_limit;
mod shared;
mod state;
mod taxonomy;

pub use auth::{LOGIN_PATH, SESSION_COOKIE, require_admin};
pub use rate_limit::LoginRateLimiter;
pub use state::{AdminState, AuthState};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::RouterState;

/// Admin CMS routes. Session checks are applied by [`require_admin`] around
/// the whole router so that `/admin/login` can redirect signed-in visitors.
pub fn admin_routes(upload_body_limit: usize) -> Router<RouterState> {
    Router::new()
        .route("/admin", get(dashboard::admin_dashboard))
        .route(
            "/admin/login",
            get(auth::admin_login_page).post(auth::admin_login),
        )
        .route("/admin/logout", post(auth::admin_logout))
        .route(
            "/admin/organizations",
            get(organizations::admin_organizations).post(organizations::admin_organization_create),
        )
        .route(
            "/admin/organizations/new",
            get(organizations::admin_organization_new),
        )
        .route(
            "/admin/organizations/{id}",
            post(organizations::admin_organization_update),
        )
        .route(
            "/admin/organizations/{id}/edit",
            get(organizations::admin_organization_edit),
        )
        .route(
            "/admin/organizations/{id}/delete",
            post(organizations::admin_organization_delete),
        )
        .route(
            "/admin/organizations/{id}/publish",
            post(organizations::admin_organization_publish),
        )
        .route(
            "/admin/organizations/{id}/feature",
            post(organizations::admin_organization_feature),
        )
        .route(
            "/admin/interviews",
            get(interviews::admin_interviews).post(interviews::admin_interview_create),
        )
        .route("/admin/interviews/new", get(interviews::admin_interview_new))
        .route(
            "/admin/interviews/{id}",
            post(interviews::admin_interview_update),
        )
        .route(
            "/admin/interviews/{id}/edit",
            get(interviews::admin_interview_edit),
        )
        .route(
            "/admin/interviews/{id}/summary",
            post(interviews::admin_interview_summary),
        )
        .route(
            "/admin/interviews/{id}/delete",
            post(interviews::admin_interview_delete),
        )
        .route(
            "/admin/interviews/{id}/publish",
            post(interviews::admin_interview_publish),
        )
        .route(
            "/admin/interviews/{id}/feature",
            post(interviews::admin_interview_feature),
        )
        .route(
            "/admin/grants",
            get(grants::admin_grants).post(grants::admin_grant_create),
        )
        .route("/admin/grants/new", get(grants::admin_grant_new))
        .route("/admin/grants/{id}", post(grants::admin_grant_update))
        .route("/admin/grants/{id}/edit", get(grants::admin_grant_edit))
        .route("/admin/grants/{id}/delete", post(grants::admin_grant_delete))
        .route(
            "/admin/grants/{id}/publish",
            post(grants::admin_grant_publish),
        )
        .route(
            "/admin/news",
            get(news::admin_news).post(news::admin_news_create),
        )
        .route("/admin/news/new", get(news::admin_news_new))
        .route("/admin/news/{id}", post(news::admin_news_update))
        .route("/admin/news/{id}/edit", get(news::admin_news_edit))
        .route("/admin/news/{id}/delete", post(news::admin_news_delete))
        .route("/admin/news/{id}/publish", post(news::admin_news_publish))
        .route(
            "/admin/faqs",
            get(faqs::admin_faqs).post(faqs::admin_faq_create),
        )
        .route("/admin/faqs/new", get(faqs::admin_faq_new))
        .route("/admin/faqs/{id}", post(faqs::admin_faq_update))
        .route("/admin/faqs/{id}/edit", get(faqs::admin_faq_edit))
        .route("/admin/faqs/{id}/delete", post(faqs::admin_faq_delete))
        .route("/admin/faqs/{id}/publish", post(faqs::admin_faq_publish))
        .route("/admin/faqs/{id}/move", post(faqs::admin_faq_move))
        .route(
            "/admin/taxonomy/{kind}",
            get(taxonomy::admin_taxonomy).post(taxonomy::admin_taxonomy_create),
        )
        .route(
            "/admin/taxonomy/{kind}/new",
            get(taxonomy::admin_taxonomy_new),
        )
        .route(
            "/admin/taxonomy/{kind}/{id}",
            post(taxonomy::admin_taxonomy_update),
        )
        .route(
            "/admin/taxonomy/{kind}/{id}/edit",
            get(taxonomy::admin_taxonomy_edit),
        )
        .route(
            "/admin/taxonomy/{kind}/{id}/delete",
            post(taxonomy::admin_taxonomy_delete),
        )
        .route(
            "/admin/taxonomy/{kind}/{id}/move",
            post(taxonomy::admin_taxonomy_move),
        )
        .route(
            "/admin/media",
            get(media::admin_media)
                .post(media::admin_media_upload)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/admin/media/delete", post(media::admin_media_delete))
}
