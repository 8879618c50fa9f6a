use std::sync::Arc;

use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::repos::{NewsParams, NewsRepo, NewsWriteRepo, PublicationScope};
use crate::application::rich_text::sanitize_rich_text;
use crate::application::slugs::UniqueSlugResolver;
use crate::application::validation::FieldErrors;
use crate::domain::entities::NewsPostRecord;
use crate::domain::types::SlugTable;

const ENTITY: &str = "news";

#[derive(Debug, Clone, Default)]
pub struct NewsInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct AdminNewsService {
    reader: Arc<dyn NewsRepo>,
    writer: Arc<dyn NewsWriteRepo>,
    slugs: UniqueSlugResolver,
}

impl AdminNewsService {
    pub fn new(
        reader: Arc<dyn NewsRepo>,
        writer: Arc<dyn NewsWriteRepo>,
        slugs: UniqueSlugResolver,
    ) -> Self {
        Self {
            reader,
            writer,
            slugs,
        }
    }

    pub async fn list(&self) -> Result<Vec<NewsPostRecord>, AdminError> {
        self.reader
            .list_news(PublicationScope::Admin, None)
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<NewsPostRecord, AdminError> {
        self.reader
            .find_news_by_id(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn create(&self, input: NewsInput) -> Result<NewsPostRecord, AdminError> {
        let slug = self
            .slugs
            .resolve(SlugTable::News, input.slug.as_deref(), &input.title, None)
            .await?;

        let record = self.writer.create_news(into_params(slug, input)?).await?;
        record_mutation(ENTITY, AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, input: NewsInput) -> Result<NewsPostRecord, AdminError> {
        self.find(id).await?;
        let slug = self
            .slugs
            .resolve(SlugTable::News, input.slug.as_deref(), &input.title, Some(id))
            .await?;

        let record = self
            .writer
            .update_news(id, into_params(slug, input)?)
            .await?;
        record_mutation(ENTITY, AdminAction::Update, &id);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.find(id).await?;
        self.writer.delete_news(id).await?;
        record_mutation(ENTITY, AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn toggle_published(&self, id: Uuid) -> Result<NewsPostRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_news_published(id, !current.is_published)
            .await?;
        record_mutation(ENTITY, AdminAction::Publish, &id);
        Ok(record)
    }
}

fn into_params(slug: String, input: NewsInput) -> Result<NewsParams, AdminError> {
    let body = sanitize_rich_text(&input.body)
        .ok_or_else(|| FieldErrors::single("body", "本文を入力してください"))?;

    Ok(NewsParams {
        slug,
        title: input.title,
        excerpt: input.excerpt,
        body,
        thumbnail_url: input.thumbnail_url,
    })
}
