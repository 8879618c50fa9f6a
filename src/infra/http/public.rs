use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        repos::{HealthRepo, OrganizationQueryFilter},
        site::{SiteError, SiteService},
        storage::{ObjectStore, StorageError},
        validation::blank_to_none,
    },
    infra::assets::{file_response, not_found_response, serve_static},
    presentation::views::{
        FaqListView, FaqTemplate, GrantCard, GrantDetailView, GrantListView,
        GrantTemplate, GrantsTemplate, HomeView, IndexTemplate, InterviewCard,
        InterviewDetailView, InterviewListView, InterviewTemplate, InterviewsTemplate,
        LayoutChrome, LayoutContext, NewsCard, NewsDetailView, NewsListView, NewsPostTemplate,
        NewsTemplate, OrganizationDetailView, OrganizationListView, OrganizationTemplate,
        OrganizationsTemplate, SiteIdentity, render_not_found_response, render_template_response,
    },
};

use super::{RouterState, db_health_response};

#[derive(Clone)]
pub struct HttpState {
    pub site: Arc<SiteService>,
    pub identity: Arc<SiteIdentity>,
    pub storage: Arc<dyn ObjectStore>,
    pub health: Arc<dyn HealthRepo>,
}

impl HttpState {
    fn chrome(&self, path: &str) -> LayoutChrome {
        self.identity.chrome(path)
    }
}

pub fn public_routes() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/organizations", get(organizations))
        .route("/organizations/{slug}", get(organization_detail))
        .route("/interviews", get(interviews))
        .route("/interviews/{slug}", get(interview_detail))
        .route("/grants", get(grants))
        .route("/grants/{slug}", get(grant_detail))
        .route("/news", get(news))
        .route("/news/{slug}", get(news_detail))
        .route("/faq", get(faq))
        .route("/storage/{*path}", get(serve_storage))
        .route("/static/{*path}", get(serve_static))
        .route("/_health/db", get(public_health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganizationsQuery {
    category: Option<String>,
    area: Option<String>,
    tag: Option<String>,
    recruiting: Option<String>,
    q: Option<String>,
    page: Option<String>,
}

impl OrganizationsQuery {
    fn into_filter(self) -> (OrganizationQueryFilter, Option<u32>) {
        let page = self.page.as_deref().and_then(|raw| raw.trim().parse().ok());
        let recruiting_only = matches!(
            self.recruiting.as_deref().map(str::trim),
            Some("1" | "true" | "on")
        );
        (
            OrganizationQueryFilter {
                category: blank_to_none(self.category),
                area: blank_to_none(self.area),
                tag: blank_to_none(self.tag),
                recruiting_only,
                search: blank_to_none(self.q),
            },
            page,
        )
    }
}

async fn index(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/");
    match state.site.home().await {
        Ok(content) => {
            let view = LayoutContext::new(
                chrome,
                HomeView::build(&content, state.site.timezone()),
            );
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn organizations(
    State(state): State<HttpState>,
    Query(query): Query<OrganizationsQuery>,
) -> Response {
    let chrome = state.chrome("/organizations").with_title("団体をさがす");
    let (filter, page) = query.into_filter();
    match state.site.organizations(filter, page).await {
        Ok(directory) => {
            let view = LayoutContext::new(chrome, OrganizationListView::build(&directory));
            render_template_response(OrganizationsTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn organization_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome(&format!("/organizations/{slug}"));
    match state.site.organization(&slug).await {
        Ok(detail) => {
            let chrome = chrome
                .with_title(&detail.organization.name)
                .with_description(detail.organization.summary.as_deref());
            let view = LayoutContext::new(
                chrome,
                OrganizationDetailView::build(&detail, state.site.timezone()),
            );
            render_template_response(OrganizationTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn interviews(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/interviews").with_title("インタビュー");
    let tz = state.site.timezone();
    match state.site.interviews().await {
        Ok(records) => {
            let content = InterviewListView {
                interviews: records
                    .iter()
                    .map(|record| InterviewCard::from_record(record, tz))
                    .collect(),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(InterviewsTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn interview_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome(&format!("/interviews/{slug}"));
    match state.site.interview(&slug).await {
        Ok(record) => {
            let chrome = chrome
                .with_title(&record.title)
                .with_description(record.lead.as_deref());
            let view = LayoutContext::new(
                chrome,
                InterviewDetailView::build(&record, state.site.timezone()),
            );
            render_template_response(InterviewTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn grants(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/grants").with_title("助成金情報");
    match state.site.grants().await {
        Ok(records) => {
            let content = GrantListView {
                grants: records.iter().map(GrantCard::from_record).collect(),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(GrantsTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn grant_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome(&format!("/grants/{slug}"));
    match state.site.grant(&slug).await {
        Ok(detail) => {
            let chrome = chrome
                .with_title(&detail.grant.title)
                .with_description(detail.grant.summary.as_deref());
            let view = LayoutContext::new(chrome, GrantDetailView::build(&detail));
            render_template_response(GrantTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn news(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/news").with_title("お知らせ");
    let tz = state.site.timezone();
    match state.site.news().await {
        Ok(records) => {
            let content = NewsListView {
                posts: records
                    .iter()
                    .map(|record| NewsCard::from_record(record, tz))
                    .collect(),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(NewsTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn news_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome(&format!("/news/{slug}"));
    match state.site.news_post(&slug).await {
        Ok(record) => {
            let chrome = chrome
                .with_title(&record.title)
                .with_description(record.excerpt.as_deref());
            let view = LayoutContext::new(
                chrome,
                NewsDetailView::build(&record, state.site.timezone()),
            );
            render_template_response(NewsPostTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn faq(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/faq").with_title("よくある質問");
    match state.site.faqs().await {
        Ok(records) => {
            let view = LayoutContext::new(chrome, FaqListView::build(&records));
            render_template_response(FaqTemplate { view }, StatusCode::OK)
        }
        Err(err) => site_error_response(err, chrome),
    }
}

async fn serve_storage(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_storage";

    match state.storage.read(&path).await {
        Ok(bytes) => file_response(
            bytes,
            mime_guess::from_path(&path).first_or_octet_stream(),
            "public, max-age=86400",
        ),
        Err(StorageError::NotFound | StorageError::InvalidPath) => {
            not_found_response(SOURCE, "Stored file not found")
        }
        Err(err) => {
            error!(
                target = "tsunagu::http::storage",
                path = %path,
                error = %err,
                "failed to read stored file"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "ファイルを読み込めませんでした",
                &err,
            )
            .into_response()
        }
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

pub(super) async fn fallback(State(state): State<HttpState>, uri: Uri) -> Response {
    render_not_found_response(state.chrome(uri.path()))
}

/// Missing records render the site's 404 page; everything else is a 500.
fn site_error_response(err: SiteError, chrome: LayoutChrome) -> Response {
    match err {
        SiteError::NotFound(inner) => {
            let mut response = render_not_found_response(chrome);
            ErrorReport::from_error(
                "infra::http::public",
                StatusCode::NOT_FOUND,
                &inner,
            )
            .attach(&mut response);
            response
        }
        err @ SiteError::Repo(_) => HttpError::from(err).into_response(),
    }
}
