use std::sync::Arc;

use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::repos::{
    OrganizationParams, OrganizationsRepo, OrganizationsWriteRepo, TaxonomyRepo,
};
use crate::application::rich_text::sanitize_rich_text;
use crate::application::slugs::UniqueSlugResolver;
use crate::domain::entities::{OrganizationLinks, OrganizationRecord, TaxonomyRecord};
use crate::domain::types::{SlugTable, TaxonomyKind};

/// Featured organizations shown on the home page.
pub const MAX_FEATURED_ORGANIZATIONS: u64 = 3;

const ENTITY: &str = "organization";

/// Validated organization form input.
#[derive(Debug, Clone, Default)]
pub struct OrganizationInput {
    pub name: String,
    pub slug: Option<String>,
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

/// Taxonomy choices offered by the organization editor.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyOptions {
    pub categories: Vec<TaxonomyRecord>,
    pub areas: Vec<TaxonomyRecord>,
    pub tags: Vec<TaxonomyRecord>,
}

#[derive(Clone)]
pub struct AdminOrganizationService {
    reader: Arc<dyn OrganizationsRepo>,
    writer: Arc<dyn OrganizationsWriteRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
    slugs: UniqueSlugResolver,
}

impl AdminOrganizationService {
    pub fn new(
        reader: Arc<dyn OrganizationsRepo>,
        writer: Arc<dyn OrganizationsWriteRepo>,
        taxonomy: Arc<dyn TaxonomyRepo>,
        slugs: UniqueSlugResolver,
    ) -> Self {
        Self {
            reader,
            writer,
            taxonomy,
            slugs,
        }
    }

    pub async fn list(&self) -> Result<Vec<OrganizationRecord>, AdminError> {
        self.reader
            .list_all_organizations()
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<OrganizationRecord, AdminError> {
        self.reader
            .find_organization_by_id(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn links(&self, id: Uuid) -> Result<OrganizationLinks, AdminError> {
        self.reader
            .organization_links(id)
            .await
            .map_err(AdminError::from)
    }

    pub async fn taxonomy_options(&self) -> Result<TaxonomyOptions, AdminError> {
        let categories = self.taxonomy.list_taxonomy(TaxonomyKind::Category).await?;
        let areas = self.taxonomy.list_taxonomy(TaxonomyKind::Area).await?;
        let tags = self.taxonomy.list_taxonomy(TaxonomyKind::Tag).await?;
        Ok(TaxonomyOptions {
            categories,
            areas,
            tags,
        })
    }

    pub async fn create(&self, input: OrganizationInput) -> Result<OrganizationRecord, AdminError> {
        let slug = self
            .slugs
            .resolve(
                SlugTable::Organizations,
                input.slug.as_deref(),
                &input.name,
                None,
            )
            .await?;

        let record = self
            .writer
            .create_organization(into_params(slug, input))
            .await?;
        record_mutation(ENTITY, AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: OrganizationInput,
    ) -> Result<OrganizationRecord, AdminError> {
        self.find(id).await?;

        let slug = self
            .slugs
            .resolve(
                SlugTable::Organizations,
                input.slug.as_deref(),
                &input.name,
                Some(id),
            )
            .await?;

        let record = self
            .writer
            .update_organization(id, into_params(slug, input))
            .await?;
        record_mutation(ENTITY, AdminAction::Update, &id);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.find(id).await?;
        self.writer.delete_organization(id).await?;
        record_mutation(ENTITY, AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn toggle_published(&self, id: Uuid) -> Result<OrganizationRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_organization_published(id, !current.is_published)
            .await?;
        record_mutation(ENTITY, AdminAction::Publish, &id);
        Ok(record)
    }

    /// Flip the featured flag, refusing to exceed [`MAX_FEATURED_ORGANIZATIONS`].
    pub async fn toggle_featured(&self, id: Uuid) -> Result<OrganizationRecord, AdminError> {
        let current = self.find(id).await?;
        let featuring = !current.is_featured;

        if featuring {
            let featured = self.reader.count_featured_organizations().await?;
            if featured >= MAX_FEATURED_ORGANIZATIONS {
                return Err(AdminError::FeaturedLimit {
                    max: MAX_FEATURED_ORGANIZATIONS,
                });
            }
        }

        let record = self
            .writer
            .set_organization_featured(id, featuring)
            .await?;
        record_mutation(ENTITY, AdminAction::Feature, &id);
        Ok(record)
    }
}

fn into_params(slug: String, input: OrganizationInput) -> OrganizationParams {
    OrganizationParams {
        slug,
        name: input.name,
        summary: input.summary,
        description: input.description.as_deref().and_then(sanitize_rich_text),
        activity_schedule: input.activity_schedule,
        membership_info: input.membership_info,
        contact_name: input.contact_name,
        contact_email: input.contact_email,
        contact_phone: input.contact_phone,
        website_url: input.website_url,
        address: input.address,
        logo_url: input.logo_url,
        is_recruiting: input.is_recruiting,
        links: input.links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    use crate::application::pagination::{PageRequest, Paged};
    use crate::application::repos::{
        OrganizationQueryFilter, PublicationScope, RepoError, SlugRepo,
    };
    use crate::domain::entities::TaxonomyWithUsage;

    fn sample(name: &str, featured: bool) -> OrganizationRecord {
        let now = OffsetDateTime::now_utc();
        OrganizationRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            summary: None,
            description: None,
            activity_schedule: None,
            membership_info: None,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            website_url: None,
            address: None,
            logo_url: None,
            is_published: true,
            is_featured: featured,
            is_recruiting: false,
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[derive(Default)]
    struct StubOrganizations {
        rows: Mutex<Vec<OrganizationRecord>>,
        featured_writes: Mutex<Vec<(Uuid, bool)>>,
    }

    #[async_trait]
    impl OrganizationsRepo for StubOrganizations {
        async fn list_organizations(
            &self,
            _scope: PublicationScope,
            _filter: &OrganizationQueryFilter,
            page: PageRequest,
        ) -> Result<Paged<OrganizationRecord>, RepoError> {
            Ok(Paged::empty(page))
        }

        async fn list_all_organizations(&self) -> Result<Vec<OrganizationRecord>, RepoError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn list_featured_organizations(
            &self,
            _limit: u32,
        ) -> Result<Vec<OrganizationRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_organization_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<OrganizationRecord>, RepoError> {
            Ok(self.rows.lock().unwrap().iter().find(|o| o.id == id).cloned())
        }

        async fn find_organization_by_slug(
            &self,
            _scope: PublicationScope,
            _slug: &str,
        ) -> Result<Option<OrganizationRecord>, RepoError> {
            Ok(None)
        }

        async fn organization_links(&self, _id: Uuid) -> Result<OrganizationLinks, RepoError> {
            Ok(OrganizationLinks::default())
        }

        async fn count_featured_organizations(&self) -> Result<u64, RepoError> {
            Ok(self.rows.lock().unwrap().iter().filter(|o| o.is_featured).count() as u64)
        }
    }

    #[async_trait]
    impl OrganizationsWriteRepo for StubOrganizations {
        async fn create_organization(
            &self,
            _params: OrganizationParams,
        ) -> Result<OrganizationRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn update_organization(
            &self,
            _id: Uuid,
            _params: OrganizationParams,
        ) -> Result<OrganizationRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete_organization(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn set_organization_published(
            &self,
            _id: Uuid,
            _published: bool,
        ) -> Result<OrganizationRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn set_organization_featured(
            &self,
            id: Uuid,
            featured: bool,
        ) -> Result<OrganizationRecord, RepoError> {
            self.featured_writes.lock().unwrap().push((id, featured));
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(RepoError::NotFound)?;
            row.is_featured = featured;
            Ok(row.clone())
        }
    }

    struct NoTaxonomy;

    #[async_trait]
    impl TaxonomyRepo for NoTaxonomy {
        async fn list_taxonomy(&self, _kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_taxonomy_with_usage(
            &self,
            _kind: TaxonomyKind,
        ) -> Result<Vec<TaxonomyWithUsage>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_taxonomy_by_id(
            &self,
            _kind: TaxonomyKind,
            _id: Uuid,
        ) -> Result<Option<TaxonomyRecord>, RepoError> {
            Ok(None)
        }

        async fn find_taxonomy_by_slug(
            &self,
            _kind: TaxonomyKind,
            _slug: &str,
        ) -> Result<Option<TaxonomyRecord>, RepoError> {
            Ok(None)
        }

        async fn count_taxonomy_usage(
            &self,
            _kind: TaxonomyKind,
            _id: Uuid,
        ) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn list_taxonomy_for_organization(
            &self,
            _kind: TaxonomyKind,
            _organization_id: Uuid,
        ) -> Result<Vec<TaxonomyRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_categories_for_grant(
            &self,
            _grant_id: Uuid,
        ) -> Result<Vec<TaxonomyRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    struct FreeSlugs;

    #[async_trait]
    impl SlugRepo for FreeSlugs {
        async fn slug_exists(
            &self,
            _table: SlugTable,
            _slug: &str,
            _exclude_id: Option<Uuid>,
        ) -> Result<bool, RepoError> {
            Ok(false)
        }
    }

    fn service(repo: Arc<StubOrganizations>) -> AdminOrganizationService {
        AdminOrganizationService::new(
            repo.clone(),
            repo,
            Arc::new(NoTaxonomy),
            UniqueSlugResolver::new(Arc::new(FreeSlugs)),
        )
    }

    #[tokio::test]
    async fn featuring_fourth_organization_is_refused() {
        let repo = Arc::new(StubOrganizations::default());
        let candidate = sample("Fourth", false);
        let candidate_id = candidate.id;
        {
            let mut rows = repo.rows.lock().unwrap();
            rows.push(sample("One", true));
            rows.push(sample("Two", true));
            rows.push(sample("Three", true));
            rows.push(candidate);
        }
        let before: Vec<bool> = repo.rows.lock().unwrap().iter().map(|o| o.is_featured).collect();

        let result = service(repo.clone()).toggle_featured(candidate_id).await;

        match result {
            Err(AdminError::FeaturedLimit { max }) => assert_eq!(max, 3),
            other => panic!("unexpected result: {other:?}"),
        }
        let after: Vec<bool> = repo.rows.lock().unwrap().iter().map(|o| o.is_featured).collect();
        assert_eq!(before, after);
        assert!(repo.featured_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfeaturing_is_allowed_at_the_cap() {
        let repo = Arc::new(StubOrganizations::default());
        let featured = sample("One", true);
        let featured_id = featured.id;
        {
            let mut rows = repo.rows.lock().unwrap();
            rows.push(featured);
            rows.push(sample("Two", true));
            rows.push(sample("Three", true));
        }

        let record = service(repo.clone())
            .toggle_featured(featured_id)
            .await
            .expect("unfeature");

        assert!(!record.is_featured);
        assert_eq!(
            repo.featured_writes.lock().unwrap().as_slice(),
            &[(featured_id, false)]
        );
    }

    #[tokio::test]
    async fn featuring_below_the_cap_succeeds() {
        let repo = Arc::new(StubOrganizations::default());
        let candidate = sample("Second", false);
        let candidate_id = candidate.id;
        {
            let mut rows = repo.rows.lock().unwrap();
            rows.push(sample("First", true));
            rows.push(candidate);
        }

        let record = service(repo)
            .toggle_featured(candidate_id)
            .await
            .expect("feature");
        assert!(record.is_featured);
    }

    #[tokio::test]
    async fn toggling_unknown_organization_is_not_found() {
        let repo = Arc::new(StubOrganizations::default());
        let result = service(repo).toggle_published(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AdminError::NotFound)));
    }
}
