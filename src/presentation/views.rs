use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Paged;
use crate::application::repos::OrganizationQueryFilter;
use crate::application::rich_text::paragraphs_from_text;
use crate::application::site::{
    GrantDetail, HomeContent, OrganizationDetail, OrganizationDirectory, TaxonomyFacets,
};
use crate::domain::entities::{
    FaqRecord, GrantRecord, InterviewRecord, NewsPostRecord, OrganizationRecord, TaxonomyRecord,
};
use crate::presentation::format::{
    format_amount_range, format_application_period, format_local_date, iso_date,
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono_tz::Tz;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "ページを表示できませんでした",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let view = LayoutContext::new(chrome.with_title("ページが見つかりません"), ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Site-wide identity shared by every public page.
#[derive(Debug, Clone)]
pub struct SiteIdentity {
    pub title: String,
    pub public_site_url: Url,
    pub timezone: Tz,
}

impl SiteIdentity {
    pub fn chrome(&self, active_path: &str) -> LayoutChrome {
        let navigation = PUBLIC_NAVIGATION
            .iter()
            .map(|(href, label)| NavigationLinkView {
                label: (*label).to_string(),
                href: (*href).to_string(),
                is_active: is_active_section(href, active_path),
            })
            .collect();

        LayoutChrome {
            site_title: self.title.clone(),
            navigation,
            meta: PageMetaView {
                title: self.title.clone(),
                description: DEFAULT_DESCRIPTION.to_string(),
                canonical: canonical_url(&self.public_site_url, active_path),
            },
        }
    }
}

const DEFAULT_DESCRIPTION: &str =
    "地域で活動する市民団体・NPOの情報、インタビュー、助成金情報をまとめたポータルサイトです。";

const PUBLIC_NAVIGATION: [(&str, &str); 5] = [
    ("/organizations", "団体をさがす"),
    ("/interviews", "インタビュー"),
    ("/grants", "助成金情報"),
    ("/news", "お知らせ"),
    ("/faq", "よくある質問"),
];

fn is_active_section(href: &str, path: &str) -> bool {
    path == href || path.starts_with(&format!("{href}/"))
}

pub fn canonical_url(base: &Url, path: &str) -> String {
    let root = base.as_str().trim_end_matches('/');
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        format!("{root}/")
    } else {
        format!("{root}/{trimmed}")
    }
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub site_title: String,
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    /// Prefix the document title with the page name.
    pub fn with_title(mut self, page_title: &str) -> Self {
        self.meta.title = format!("{page_title} | {}", self.site_title);
        self
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            self.meta.description = description.to_string();
        }
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_title: String,
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            site_title: chrome.site_title,
            navigation: chrome.navigation,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct FacetLink {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct OrganizationCard {
    pub name: String,
    pub href: String,
    pub summary: Option<String>,
    pub logo_url: Option<String>,
    pub is_recruiting: bool,
    pub is_featured: bool,
}

impl OrganizationCard {
    pub fn from_record(record: &OrganizationRecord) -> Self {
        Self {
            name: record.name.clone(),
            href: format!("/organizations/{}", record.slug),
            summary: record.summary.clone(),
            logo_url: record.logo_url.clone(),
            is_recruiting: record.is_recruiting,
            is_featured: record.is_featured,
        }
    }
}

#[derive(Clone)]
pub struct InterviewCard {
    pub title: String,
    pub href: String,
    pub lead: Option<String>,
    pub cover_image_url: Option<String>,
    pub organization_name: Option<String>,
    pub published: Option<String>,
}

impl InterviewCard {
    pub fn from_record(record: &InterviewRecord, tz: Tz) -> Self {
        Self {
            title: record.title.clone(),
            href: format!("/interviews/{}", record.slug),
            lead: record.lead.clone(),
            cover_image_url: record.cover_image_url.clone(),
            organization_name: record.organization_name.clone(),
            published: record.published_at.map(|at| format_local_date(at, tz)),
        }
    }
}

#[derive(Clone)]
pub struct GrantCard {
    pub title: String,
    pub href: String,
    pub provider_name: String,
    pub summary: Option<String>,
    pub period: Option<String>,
    pub deadline_iso: Option<String>,
    pub amount: Option<String>,
    pub target_tags: Vec<String>,
}

impl GrantCard {
    pub fn from_record(record: &GrantRecord) -> Self {
        Self {
            title: record.title.clone(),
            href: format!("/grants/{}", record.slug),
            provider_name: record.provider_name.clone(),
            summary: record.summary.clone(),
            period: format_application_period(
                record.application_start_date,
                record.application_end_date,
            ),
            deadline_iso: record.application_end_date.map(iso_date),
            amount: format_amount_range(record.amount_min, record.amount_max),
            target_tags: record.target_tags.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NewsCard {
    pub title: String,
    pub href: String,
    pub excerpt: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published: Option<String>,
}

impl NewsCard {
    pub fn from_record(record: &NewsPostRecord, tz: Tz) -> Self {
        Self {
            title: record.title.clone(),
            href: format!("/news/{}", record.slug),
            excerpt: record.excerpt.clone(),
            thumbnail_url: record.thumbnail_url.clone(),
            published: record.published_at.map(|at| format_local_date(at, tz)),
        }
    }
}

pub struct HomeView {
    pub featured: Vec<OrganizationCard>,
    pub interviews: Vec<InterviewCard>,
    pub grants: Vec<GrantCard>,
    pub news: Vec<NewsCard>,
}

impl HomeView {
    pub fn build(content: &HomeContent, tz: Tz) -> Self {
        Self {
            featured: content
                .featured_organizations
                .iter()
                .map(OrganizationCard::from_record)
                .collect(),
            interviews: content
                .interviews
                .iter()
                .map(|record| InterviewCard::from_record(record, tz))
                .collect(),
            grants: content.open_grants.iter().map(GrantCard::from_record).collect(),
            news: content
                .news
                .iter()
                .map(|record| NewsCard::from_record(record, tz))
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<HomeView>,
}

pub struct PaginationView {
    pub page: u32,
    pub total_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PaginationView {
    pub fn has_pages(&self) -> bool {
        self.total_pages > 1
    }
}

pub struct OrganizationListView {
    pub organizations: Vec<OrganizationCard>,
    pub total: u64,
    pub categories: Vec<FacetLink>,
    pub areas: Vec<FacetLink>,
    pub tags: Vec<FacetLink>,
    pub search: String,
    pub recruiting_only: bool,
    pub category: String,
    pub area: String,
    pub tag: String,
    pub all_href: String,
    pub pagination: PaginationView,
}

impl OrganizationListView {
    pub fn build(directory: &OrganizationDirectory) -> Self {
        let filter = &directory.filter;
        Self {
            organizations: directory
                .organizations
                .items
                .iter()
                .map(OrganizationCard::from_record)
                .collect(),
            total: directory.organizations.total,
            categories: facet_links(&directory.facets.categories, filter, FacetField::Category),
            areas: facet_links(&directory.facets.areas, filter, FacetField::Area),
            tags: facet_links(&directory.facets.tags, filter, FacetField::Tag),
            search: filter.search.clone().unwrap_or_default(),
            recruiting_only: filter.recruiting_only,
            category: filter.category.clone().unwrap_or_default(),
            area: filter.area.clone().unwrap_or_default(),
            tag: filter.tag.clone().unwrap_or_default(),
            all_href: "/organizations".to_string(),
            pagination: pagination_view(&directory.organizations, filter),
        }
    }
}

#[derive(Clone, Copy)]
enum FacetField {
    Category,
    Area,
    Tag,
}

/// Facet links toggle their own value and keep the other filters.
fn facet_links(
    items: &[TaxonomyRecord],
    filter: &OrganizationQueryFilter,
    field: FacetField,
) -> Vec<FacetLink> {
    items
        .iter()
        .map(|item| {
            let mut next = filter.clone();
            let slot = match field {
                FacetField::Category => &mut next.category,
                FacetField::Area => &mut next.area,
                FacetField::Tag => &mut next.tag,
            };
            let is_active = slot.as_deref() == Some(item.slug.as_str());
            *slot = if is_active {
                None
            } else {
                Some(item.slug.clone())
            };
            FacetLink {
                label: item.name.clone(),
                href: organizations_href(&next, None),
                is_active,
            }
        })
        .collect()
}

pub fn organizations_href(filter: &OrganizationQueryFilter, page: Option<u32>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(category) = filter.category.as_deref() {
        serializer.append_pair("category", category);
    }
    if let Some(area) = filter.area.as_deref() {
        serializer.append_pair("area", area);
    }
    if let Some(tag) = filter.tag.as_deref() {
        serializer.append_pair("tag", tag);
    }
    if filter.recruiting_only {
        serializer.append_pair("recruiting", "1");
    }
    if let Some(search) = filter.search.as_deref() {
        serializer.append_pair("q", search);
    }
    if let Some(page) = page.filter(|page| *page > 1) {
        serializer.append_pair("page", &page.to_string());
    }
    let query = serializer.finish();
    if query.is_empty() {
        "/organizations".to_string()
    } else {
        format!("/organizations?{query}")
    }
}

fn pagination_view<T>(paged: &Paged<T>, filter: &OrganizationQueryFilter) -> PaginationView {
    PaginationView {
        page: paged.page,
        total_pages: paged.total_pages(),
        previous_href: paged
            .has_previous()
            .then(|| organizations_href(filter, Some(paged.page - 1))),
        next_href: paged
            .has_next()
            .then(|| organizations_href(filter, Some(paged.page + 1))),
    }
}

#[derive(Template)]
#[template(path = "organizations.html")]
pub struct OrganizationsTemplate {
    pub view: LayoutContext<OrganizationListView>,
}

pub struct OrganizationDetailView {
    pub name: String,
    pub summary: Option<String>,
    pub description_html: Option<String>,
    pub activity_schedule: Option<String>,
    pub membership_info: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website_url: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_recruiting: bool,
    pub categories: Vec<FacetLink>,
    pub areas: Vec<FacetLink>,
    pub tags: Vec<FacetLink>,
    pub interviews: Vec<InterviewCard>,
}

impl OrganizationDetailView {
    pub fn build(detail: &OrganizationDetail, tz: Tz) -> Self {
        let record = &detail.organization;
        let TaxonomyFacets {
            categories,
            areas,
            tags,
        } = &detail.facets;
        Self {
            name: record.name.clone(),
            summary: record.summary.clone(),
            description_html: record.description.clone(),
            activity_schedule: record.activity_schedule.clone(),
            membership_info: record.membership_info.clone(),
            contact_name: record.contact_name.clone(),
            contact_email: record.contact_email.clone(),
            contact_phone: record.contact_phone.clone(),
            website_url: record.website_url.clone(),
            address: record.address.clone(),
            logo_url: record.logo_url.clone(),
            is_recruiting: record.is_recruiting,
            categories: filter_links(categories, "category"),
            areas: filter_links(areas, "area"),
            tags: filter_links(tags, "tag"),
            interviews: detail
                .interviews
                .iter()
                .map(|record| InterviewCard::from_record(record, tz))
                .collect(),
        }
    }
}

fn filter_links(items: &[TaxonomyRecord], param: &str) -> Vec<FacetLink> {
    items
        .iter()
        .map(|item| FacetLink {
            label: item.name.clone(),
            href: format!(
                "/organizations?{}",
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(param, &item.slug)
                    .finish()
            ),
            is_active: false,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "organization.html")]
pub struct OrganizationTemplate {
    pub view: LayoutContext<OrganizationDetailView>,
}

pub struct InterviewListView {
    pub interviews: Vec<InterviewCard>,
}

#[derive(Template)]
#[template(path = "interviews.html")]
pub struct InterviewsTemplate {
    pub view: LayoutContext<InterviewListView>,
}

pub struct InterviewDetailView {
    pub title: String,
    pub lead: Option<String>,
    pub body_html: String,
    pub interviewee: Option<String>,
    pub cover_image_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub organization_name: Option<String>,
    pub organization_href: Option<String>,
    pub published: Option<String>,
}

impl InterviewDetailView {
    pub fn build(record: &InterviewRecord, tz: Tz) -> Self {
        Self {
            title: record.title.clone(),
            lead: record.lead.clone(),
            body_html: record.body.clone(),
            interviewee: record.interviewee.clone(),
            cover_image_url: record.cover_image_url.clone(),
            gallery_urls: record.gallery_urls.clone(),
            organization_name: record.organization_name.clone(),
            organization_href: record
                .organization_slug
                .as_ref()
                .map(|slug| format!("/organizations/{slug}")),
            published: record.published_at.map(|at| format_local_date(at, tz)),
        }
    }
}

#[derive(Template)]
#[template(path = "interview.html")]
pub struct InterviewTemplate {
    pub view: LayoutContext<InterviewDetailView>,
}

pub struct GrantListView {
    pub grants: Vec<GrantCard>,
}

#[derive(Template)]
#[template(path = "grants.html")]
pub struct GrantsTemplate {
    pub view: LayoutContext<GrantListView>,
}

pub struct GrantDetailView {
    pub card: GrantCard,
    pub body_html: Option<String>,
    pub source_url: Option<String>,
    pub categories: Vec<String>,
}

impl GrantDetailView {
    pub fn build(detail: &GrantDetail) -> Self {
        Self {
            card: GrantCard::from_record(&detail.grant),
            body_html: detail.grant.body.clone(),
            source_url: detail.grant.source_url.clone(),
            categories: detail
                .categories
                .iter()
                .map(|category| category.name.clone())
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "grant.html")]
pub struct GrantTemplate {
    pub view: LayoutContext<GrantDetailView>,
}

pub struct NewsListView {
    pub posts: Vec<NewsCard>,
}

#[derive(Template)]
#[template(path = "news.html")]
pub struct NewsTemplate {
    pub view: LayoutContext<NewsListView>,
}

pub struct NewsDetailView {
    pub card: NewsCard,
    pub body_html: String,
}

impl NewsDetailView {
    pub fn build(record: &NewsPostRecord, tz: Tz) -> Self {
        Self {
            card: NewsCard::from_record(record, tz),
            body_html: record.body.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "news_post.html")]
pub struct NewsPostTemplate {
    pub view: LayoutContext<NewsDetailView>,
}

pub struct FaqItemView {
    pub question: String,
    pub answer_html: String,
}

pub struct FaqListView {
    pub items: Vec<FaqItemView>,
}

impl FaqListView {
    pub fn build(records: &[FaqRecord]) -> Self {
        Self {
            items: records
                .iter()
                .map(|record| FaqItemView {
                    question: record.question.clone(),
                    answer_html: paragraphs_from_text(&record.answer),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "faq.html")]
pub struct FaqTemplate {
    pub view: LayoutContext<FaqListView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "ページが見つかりません".to_string(),
            message: "お探しのページは移動または削除された可能性があります。".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::domain::types::TaxonomyKind;

    fn identity() -> SiteIdentity {
        SiteIdentity {
            title: "つなぐ".to_string(),
            public_site_url: Url::parse("https://tsunagu.example.jp/").expect("url"),
            timezone: chrono_tz::Asia::Tokyo,
        }
    }

    fn taxonomy(name: &str, slug: &str) -> TaxonomyRecord {
        let now = OffsetDateTime::now_utc();
        TaxonomyRecord {
            id: Uuid::new_v4(),
            kind: TaxonomyKind::Area,
            name: name.to_string(),
            slug: slug.to_string(),
            sort_order: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn chrome_marks_active_section() {
        let chrome = identity().chrome("/grants/地域活性化助成金");
        let active: Vec<_> = chrome
            .navigation
            .iter()
            .filter(|link| link.is_active)
            .map(|link| link.href.as_str())
            .collect();
        assert_eq!(active, vec!["/grants"]);
        assert_eq!(
            chrome.meta.canonical,
            "https://tsunagu.example.jp/grants/地域活性化助成金"
        );
    }

    #[test]
    fn facet_links_toggle_their_value() {
        let filter = OrganizationQueryFilter {
            area: Some("kita".to_string()),
            recruiting_only: true,
            ..Default::default()
        };
        let links = facet_links(
            &[taxonomy("北区", "kita"), taxonomy("南区", "minami")],
            &filter,
            FacetField::Area,
        );

        assert!(links[0].is_active);
        assert_eq!(links[0].href, "/organizations?recruiting=1");
        assert!(!links[1].is_active);
        assert_eq!(links[1].href, "/organizations?area=minami&recruiting=1");
    }

    #[test]
    fn organizations_href_keeps_filters_across_pages() {
        let filter = OrganizationQueryFilter {
            search: Some("子ども 食堂".to_string()),
            ..Default::default()
        };
        assert_eq!(
            organizations_href(&filter, Some(2)),
            "/organizations?q=%E5%AD%90%E3%81%A9%E3%82%82+%E9%A3%9F%E5%A0%82&page=2"
        );
        assert_eq!(organizations_href(&filter, Some(1)), "/organizations?q=%E5%AD%90%E3%81%A9%E3%82%82+%E9%A3%9F%E5%A0%82");
    }

    #[test]
    fn not_found_page_renders() {
        let response = render_not_found_response(identity().chrome("/missing"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
