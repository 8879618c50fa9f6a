//! Read-only composition of the public site pages.

use std::sync::Arc;

use chrono_tz::Tz;
use thiserror::Error;

use crate::application::pagination::{PageRequest, Paged};
use crate::application::repos::{
    FaqsRepo, GrantQueryFilter, GrantsRepo, InterviewsRepo, NewsRepo, OrganizationQueryFilter,
    OrganizationsRepo, PublicationScope, RepoError, TaxonomyRepo,
};
use crate::domain::entities::{
    FaqRecord, GrantRecord, InterviewRecord, NewsPostRecord, OrganizationRecord, TaxonomyRecord,
};
use crate::domain::error::DomainError;
use crate::domain::types::TaxonomyKind;
use crate::util::timezone::today_in;

pub const HOME_FEATURED_ORGANIZATIONS: u32 = 3;
pub const HOME_INTERVIEWS: u32 = 3;
pub const HOME_GRANTS: u32 = 3;
pub const HOME_NEWS: u32 = 5;
pub const ORGANIZATIONS_PER_PAGE: u32 = 12;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    NotFound(DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl SiteError {
    fn not_found(entity: &'static str, slug: &str) -> Self {
        SiteError::NotFound(DomainError::unknown_slug(entity, slug))
    }
}

#[derive(Debug, Clone)]
pub struct HomeContent {
    pub featured_organizations: Vec<OrganizationRecord>,
    pub interviews: Vec<InterviewRecord>,
    pub open_grants: Vec<GrantRecord>,
    pub news: Vec<NewsPostRecord>,
}

#[derive(Debug, Clone)]
pub struct TaxonomyFacets {
    pub categories: Vec<TaxonomyRecord>,
    pub areas: Vec<TaxonomyRecord>,
    pub tags: Vec<TaxonomyRecord>,
}

#[derive(Debug, Clone)]
pub struct OrganizationDirectory {
    pub organizations: Paged<OrganizationRecord>,
    pub facets: TaxonomyFacets,
    pub filter: OrganizationQueryFilter,
}

#[derive(Debug, Clone)]
pub struct OrganizationDetail {
    pub organization: OrganizationRecord,
    pub facets: TaxonomyFacets,
    pub interviews: Vec<InterviewRecord>,
}

#[derive(Debug, Clone)]
pub struct GrantDetail {
    pub grant: GrantRecord,
    pub categories: Vec<TaxonomyRecord>,
}

#[derive(Clone)]
pub struct SiteService {
    organizations: Arc<dyn OrganizationsRepo>,
    interviews: Arc<dyn InterviewsRepo>,
    grants: Arc<dyn GrantsRepo>,
    news: Arc<dyn NewsRepo>,
    faqs: Arc<dyn FaqsRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
    timezone: Tz,
}

impl SiteService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organizations: Arc<dyn OrganizationsRepo>,
        interviews: Arc<dyn InterviewsRepo>,
        grants: Arc<dyn GrantsRepo>,
        news: Arc<dyn NewsRepo>,
        faqs: Arc<dyn FaqsRepo>,
        taxonomy: Arc<dyn TaxonomyRepo>,
        timezone: Tz,
    ) -> Self {
        Self {
            organizations,
            interviews,
            grants,
            news,
            faqs,
            taxonomy,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub async fn home(&self) -> Result<HomeContent, SiteError> {
        let open = GrantQueryFilter {
            open_on: Some(today_in(self.timezone)),
        };
        let (featured_organizations, interviews, open_grants, news) = tokio::try_join!(
            self.organizations
                .list_featured_organizations(HOME_FEATURED_ORGANIZATIONS),
            self.interviews
                .list_interviews(PublicationScope::Public, Some(HOME_INTERVIEWS)),
            self.grants
                .list_grants(PublicationScope::Public, open, Some(HOME_GRANTS)),
            self.news
                .list_news(PublicationScope::Public, Some(HOME_NEWS)),
        )?;

        Ok(HomeContent {
            featured_organizations,
            interviews,
            open_grants,
            news,
        })
    }

    pub async fn organizations(
        &self,
        filter: OrganizationQueryFilter,
        page: Option<u32>,
    ) -> Result<OrganizationDirectory, SiteError> {
        let request = PageRequest::new(page, ORGANIZATIONS_PER_PAGE);
        let (organizations, facets) = tokio::try_join!(
            self.organizations
                .list_organizations(PublicationScope::Public, &filter, request),
            self.facets(),
        )?;

        Ok(OrganizationDirectory {
            organizations,
            facets,
            filter,
        })
    }

    pub async fn organization(&self, slug: &str) -> Result<OrganizationDetail, SiteError> {
        let organization = self
            .organizations
            .find_organization_by_slug(PublicationScope::Public, slug)
            .await?
            .ok_or_else(|| SiteError::not_found("organization", slug))?;

        let id = organization.id;
        let (categories, areas, tags, interviews) = tokio::try_join!(
            self.taxonomy
                .list_taxonomy_for_organization(TaxonomyKind::Category, id),
            self.taxonomy
                .list_taxonomy_for_organization(TaxonomyKind::Area, id),
            self.taxonomy
                .list_taxonomy_for_organization(TaxonomyKind::Tag, id),
            self.interviews.list_interviews_for_organization(id),
        )?;

        Ok(OrganizationDetail {
            organization,
            facets: TaxonomyFacets {
                categories,
                areas,
                tags,
            },
            interviews,
        })
    }

    pub async fn interviews(&self) -> Result<Vec<InterviewRecord>, SiteError> {
        Ok(self
            .interviews
            .list_interviews(PublicationScope::Public, None)
            .await?)
    }

    pub async fn interview(&self, slug: &str) -> Result<InterviewRecord, SiteError> {
        self.interviews
            .find_interview_by_slug(PublicationScope::Public, slug)
            .await?
            .ok_or_else(|| SiteError::not_found("interview", slug))
    }

    pub async fn grants(&self) -> Result<Vec<GrantRecord>, SiteError> {
        Ok(self
            .grants
            .list_grants(PublicationScope::Public, GrantQueryFilter::default(), None)
            .await?)
    }

    pub async fn grant(&self, slug: &str) -> Result<GrantDetail, SiteError> {
        let grant = self
            .grants
            .find_grant_by_slug(PublicationScope::Public, slug)
            .await?
            .ok_or_else(|| SiteError::not_found("grant", slug))?;
        let categories = self.taxonomy.list_categories_for_grant(grant.id).await?;
        Ok(GrantDetail { grant, categories })
    }

    pub async fn news(&self) -> Result<Vec<NewsPostRecord>, SiteError> {
        Ok(self.news.list_news(PublicationScope::Public, None).await?)
    }

    pub async fn news_post(&self, slug: &str) -> Result<NewsPostRecord, SiteError> {
        self.news
            .find_news_by_slug(PublicationScope::Public, slug)
            .await?
            .ok_or_else(|| SiteError::not_found("news post", slug))
    }

    pub async fn faqs(&self) -> Result<Vec<FaqRecord>, SiteError> {
        Ok(self.faqs.list_faqs(PublicationScope::Public).await?)
    }

    async fn facets(&self) -> Result<TaxonomyFacets, RepoError> {
        let (categories, areas, tags) = tokio::try_join!(
            self.taxonomy.list_taxonomy(TaxonomyKind::Category),
            self.taxonomy.list_taxonomy(TaxonomyKind::Area),
            self.taxonomy.list_taxonomy(TaxonomyKind::Tag),
        )?;
        Ok(TaxonomyFacets {
            categories,
            areas,
            tags,
        })
    }
}
