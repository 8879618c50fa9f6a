use std::sync::Arc;

use time::Date;
use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::repos::{
    GrantParams, GrantQueryFilter, GrantsRepo, GrantsWriteRepo, PublicationScope, TaxonomyRepo,
};
use crate::application::rich_text::sanitize_rich_text;
use crate::application::slugs::UniqueSlugResolver;
use crate::application::validation::FieldErrors;
use crate::domain::entities::{GrantRecord, TaxonomyRecord};
use crate::domain::types::{SlugTable, TaxonomyKind};

const ENTITY: &str = "grant";

#[derive(Debug, Clone, Default)]
pub struct GrantInput {
    pub title: String,
    pub slug: Option<String>,
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

#[derive(Clone)]
pub struct AdminGrantService {
    reader: Arc<dyn GrantsRepo>,
    writer: Arc<dyn GrantsWriteRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
    slugs: UniqueSlugResolver,
}

impl AdminGrantService {
    pub fn new(
        reader: Arc<dyn GrantsRepo>,
        writer: Arc<dyn GrantsWriteRepo>,
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

    pub async fn list(&self) -> Result<Vec<GrantRecord>, AdminError> {
        self.reader
            .list_grants(PublicationScope::Admin, GrantQueryFilter::default(), None)
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<GrantRecord, AdminError> {
        self.reader
            .find_grant_by_id(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn category_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AdminError> {
        self.reader
            .grant_category_ids(id)
            .await
            .map_err(AdminError::from)
    }

    pub async fn category_options(&self) -> Result<Vec<TaxonomyRecord>, AdminError> {
        self.taxonomy
            .list_taxonomy(TaxonomyKind::Category)
            .await
            .map_err(AdminError::from)
    }

    pub async fn create(&self, input: GrantInput) -> Result<GrantRecord, AdminError> {
        let slug = self
            .slugs
            .resolve(SlugTable::Grants, input.slug.as_deref(), &input.title, None)
            .await?;

        let record = self.writer.create_grant(into_params(slug, input)?).await?;
        record_mutation(ENTITY, AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, input: GrantInput) -> Result<GrantRecord, AdminError> {
        self.find(id).await?;
        let slug = self
            .slugs
            .resolve(SlugTable::Grants, input.slug.as_deref(), &input.title, Some(id))
            .await?;

        let record = self
            .writer
            .update_grant(id, into_params(slug, input)?)
            .await?;
        record_mutation(ENTITY, AdminAction::Update, &id);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.find(id).await?;
        self.writer.delete_grant(id).await?;
        record_mutation(ENTITY, AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn toggle_published(&self, id: Uuid) -> Result<GrantRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_grant_published(id, !current.is_published)
            .await?;
        record_mutation(ENTITY, AdminAction::Publish, &id);
        Ok(record)
    }
}

fn into_params(slug: String, input: GrantInput) -> Result<GrantParams, AdminError> {
    let mut errors = FieldErrors::new();
    if let (Some(start), Some(end)) = (input.application_start_date, input.application_end_date)
        && start > end
    {
        errors.add(
            "application_end_date",
            "締切日は受付開始日以降の日付を指定してください",
        );
    }
    if let (Some(min), Some(max)) = (input.amount_min, input.amount_max)
        && min > max
    {
        errors.add("amount_max", "上限額は下限額以上の金額を指定してください");
    }
    errors.finish(())?;

    Ok(GrantParams {
        slug,
        title: input.title,
        provider_name: input.provider_name,
        summary: input.summary,
        body: input.body.as_deref().and_then(sanitize_rich_text),
        application_start_date: input.application_start_date,
        application_end_date: input.application_end_date,
        amount_min: input.amount_min,
        amount_max: input.amount_max,
        target_tags: input.target_tags,
        source_url: input.source_url,
        category_ids: input.category_ids,
    })
}
