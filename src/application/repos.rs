//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::application::pagination::{PageRequest, Paged};
use crate::domain::entities::{
    FaqRecord, GrantRecord, InterviewRecord, NewsPostRecord, OrganizationLinks,
    OrganizationRecord, SortPosition, TaxonomyRecord, TaxonomyWithUsage,
};
use crate::domain::types::{SlugTable, SortDirection, SortTable, TaxonomyKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which rows a read may see: the public site only sees published rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationScope {
    Public,
    Admin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationQueryFilter {
    pub category: Option<String>,
    pub area: Option<String>,
    pub tag: Option<String>,
    pub recruiting_only: bool,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationParams {
    pub slug: String,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub activity_schedule: Option<String>,
    pub membership_info: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website_url: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_recruiting: bool,
    pub links: OrganizationLinks,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewParams {
    pub slug: String,
    pub title: String,
    pub lead: Option<String>,
    pub body: String,
    pub interviewee: Option<String>,
    pub cover_image_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct GrantParams {
    pub slug: String,
    pub title: String,
    pub provider_name: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub application_start_date: Option<Date>,
    pub application_end_date: Option<Date>,
    pub amount_min: Option<i64>,
    pub amount_max: Option<i64>,
    pub target_tags: Vec<String>,
    pub source_url: Option<String>,
    pub category_ids: Vec<Uuid>,
}

/// Grant listing filter; `open_on` keeps grants whose deadline is on or
/// after the date (or that have no deadline).
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantQueryFilter {
    pub open_on: Option<Date>,
}

#[derive(Debug, Clone, Default)]
pub struct NewsParams {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateFaqParams {
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct UpdateFaqParams {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct CreateTaxonomyParams {
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct UpdateTaxonomyParams {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentCounts {
    pub organizations: u64,
    pub published_organizations: u64,
    pub featured_organizations: u64,
    pub interviews: u64,
    pub grants: u64,
    pub news: u64,
    pub faqs: u64,
}

#[async_trait]
pub trait SlugRepo: Send + Sync {
    /// Whether any row in `table` other than `exclude_id` uses `slug`.
    async fn slug_exists(
        &self,
        table: SlugTable,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait SortOrderRepo: Send + Sync {
    async fn find_position(
        &self,
        table: SortTable,
        id: Uuid,
    ) -> Result<Option<SortPosition>, RepoError>;

    /// Nearest row with a strictly smaller (`Up`) or larger (`Down`) order.
    async fn find_neighbor(
        &self,
        table: SortTable,
        sort_order: i32,
        direction: SortDirection,
    ) -> Result<Option<SortPosition>, RepoError>;

    /// Exchange the `sort_order` values of two rows atomically.
    async fn swap_sort_order(
        &self,
        table: SortTable,
        first: SortPosition,
        second: SortPosition,
    ) -> Result<(), RepoError>;

    /// `max(sort_order) + 1`, or `1` for an empty table.
    async fn next_sort_order(&self, table: SortTable) -> Result<i32, RepoError>;
}

#[async_trait]
pub trait OrganizationsRepo: Send + Sync {
    async fn list_organizations(
        &self,
        scope: PublicationScope,
        filter: &OrganizationQueryFilter,
        page: PageRequest,
    ) -> Result<Paged<OrganizationRecord>, RepoError>;

    /// Every organization ordered by name, regardless of publication.
    async fn list_all_organizations(&self) -> Result<Vec<OrganizationRecord>, RepoError>;

    async fn list_featured_organizations(
        &self,
        limit: u32,
    ) -> Result<Vec<OrganizationRecord>, RepoError>;

    async fn find_organization_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<OrganizationRecord>, RepoError>;

    async fn find_organization_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<OrganizationRecord>, RepoError>;

    async fn organization_links(&self, id: Uuid) -> Result<OrganizationLinks, RepoError>;

    async fn count_featured_organizations(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait OrganizationsWriteRepo: Send + Sync {
    /// Insert the row and its taxonomy links in one transaction.
    async fn create_organization(
        &self,
        params: OrganizationParams,
    ) -> Result<OrganizationRecord, RepoError>;

    /// Update the row and replace its taxonomy links in one transaction.
    async fn update_organization(
        &self,
        id: Uuid,
        params: OrganizationParams,
    ) -> Result<OrganizationRecord, RepoError>;

    /// Delete join rows, then the organization, in one transaction.
    async fn delete_organization(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_organization_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<OrganizationRecord, RepoError>;

    async fn set_organization_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<OrganizationRecord, RepoError>;
}

#[async_trait]
pub trait InterviewsRepo: Send + Sync {
    async fn list_interviews(
        &self,
        scope: PublicationScope,
        limit: Option<u32>,
    ) -> Result<Vec<InterviewRecord>, RepoError>;

    async fn list_interviews_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<InterviewRecord>, RepoError>;

    async fn find_interview_by_id(&self, id: Uuid) -> Result<Option<InterviewRecord>, RepoError>;

    async fn find_interview_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<InterviewRecord>, RepoError>;
}

#[async_trait]
pub trait InterviewsWriteRepo: Send + Sync {
    async fn create_interview(&self, params: InterviewParams)
    -> Result<InterviewRecord, RepoError>;

    async fn update_interview(
        &self,
        id: Uuid,
        params: InterviewParams,
    ) -> Result<InterviewRecord, RepoError>;

    async fn delete_interview(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_interview_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<InterviewRecord, RepoError>;

    async fn set_interview_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<InterviewRecord, RepoError>;
}

#[async_trait]
pub trait GrantsRepo: Send + Sync {
    /// Ordered by application end date ascending (no deadline last), then title.
    async fn list_grants(
        &self,
        scope: PublicationScope,
        filter: GrantQueryFilter,
        limit: Option<u32>,
    ) -> Result<Vec<GrantRecord>, RepoError>;

    async fn find_grant_by_id(&self, id: Uuid) -> Result<Option<GrantRecord>, RepoError>;

    async fn find_grant_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<GrantRecord>, RepoError>;

    async fn grant_category_ids(&self, id: Uuid) -> Result<Vec<Uuid>, RepoError>;
}

#[async_trait]
pub trait GrantsWriteRepo: Send + Sync {
    async fn create_grant(&self, params: GrantParams) -> Result<GrantRecord, RepoError>;

    async fn update_grant(&self, id: Uuid, params: GrantParams) -> Result<GrantRecord, RepoError>;

    async fn delete_grant(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_grant_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<GrantRecord, RepoError>;
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    async fn list_news(
        &self,
        scope: PublicationScope,
        limit: Option<u32>,
    ) -> Result<Vec<NewsPostRecord>, RepoError>;

    async fn find_news_by_id(&self, id: Uuid) -> Result<Option<NewsPostRecord>, RepoError>;

    async fn find_news_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<NewsPostRecord>, RepoError>;
}

#[async_trait]
pub trait NewsWriteRepo: Send + Sync {
    async fn create_news(&self, params: NewsParams) -> Result<NewsPostRecord, RepoError>;

    async fn update_news(&self, id: Uuid, params: NewsParams)
    -> Result<NewsPostRecord, RepoError>;

    async fn delete_news(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_news_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<NewsPostRecord, RepoError>;
}

#[async_trait]
pub trait FaqsRepo: Send + Sync {
    async fn list_faqs(&self, scope: PublicationScope) -> Result<Vec<FaqRecord>, RepoError>;

    async fn find_faq_by_id(&self, id: Uuid) -> Result<Option<FaqRecord>, RepoError>;
}

#[async_trait]
pub trait FaqsWriteRepo: Send + Sync {
    async fn create_faq(&self, params: CreateFaqParams) -> Result<FaqRecord, RepoError>;

    async fn update_faq(&self, id: Uuid, params: UpdateFaqParams) -> Result<FaqRecord, RepoError>;

    async fn delete_faq(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_faq_published(&self, id: Uuid, published: bool)
    -> Result<FaqRecord, RepoError>;
}

#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError>;

    async fn list_taxonomy_with_usage(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyWithUsage>, RepoError>;

    async fn find_taxonomy_by_id(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<Option<TaxonomyRecord>, RepoError>;

    async fn find_taxonomy_by_slug(
        &self,
        kind: TaxonomyKind,
        slug: &str,
    ) -> Result<Option<TaxonomyRecord>, RepoError>;

    /// Join rows referencing the item (organizations, plus grants for categories).
    async fn count_taxonomy_usage(&self, kind: TaxonomyKind, id: Uuid) -> Result<u64, RepoError>;

    async fn list_taxonomy_for_organization(
        &self,
        kind: TaxonomyKind,
        organization_id: Uuid,
    ) -> Result<Vec<TaxonomyRecord>, RepoError>;

    async fn list_categories_for_grant(
        &self,
        grant_id: Uuid,
    ) -> Result<Vec<TaxonomyRecord>, RepoError>;
}

#[async_trait]
pub trait TaxonomyWriteRepo: Send + Sync {
    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        params: CreateTaxonomyParams,
    ) -> Result<TaxonomyRecord, RepoError>;

    async fn update_taxonomy(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
        params: UpdateTaxonomyParams,
    ) -> Result<TaxonomyRecord, RepoError>;

    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait StatsRepo: Send + Sync {
    async fn content_counts(&self) -> Result<ContentCounts, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<(), RepoError>;
}
