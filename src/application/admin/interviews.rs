use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::repos::{
    InterviewParams, InterviewsRepo, InterviewsWriteRepo, OrganizationsRepo, PublicationScope,
};
use crate::application::rich_text::sanitize_rich_text;
use crate::application::slugs::UniqueSlugResolver;
use crate::application::summary::{SummaryError, SummaryGenerator, plain_text};
use crate::application::validation::FieldErrors;
use crate::domain::entities::{InterviewRecord, OrganizationRecord};
use crate::domain::types::SlugTable;

const ENTITY: &str = "interview";

#[derive(Debug, Clone, Default)]
pub struct InterviewInput {
    pub title: String,
    pub slug: Option<String>,
    pub lead: Option<String>,
    pub body: String,
    pub interviewee: Option<String>,
    pub cover_image_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub organization_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct AdminInterviewService {
    reader: Arc<dyn InterviewsRepo>,
    writer: Arc<dyn InterviewsWriteRepo>,
    organizations: Arc<dyn OrganizationsRepo>,
    slugs: UniqueSlugResolver,
    summary: Option<Arc<dyn SummaryGenerator>>,
}

impl AdminInterviewService {
    pub fn new(
        reader: Arc<dyn InterviewsRepo>,
        writer: Arc<dyn InterviewsWriteRepo>,
        organizations: Arc<dyn OrganizationsRepo>,
        slugs: UniqueSlugResolver,
        summary: Option<Arc<dyn SummaryGenerator>>,
    ) -> Self {
        Self {
            reader,
            writer,
            organizations,
            slugs,
            summary,
        }
    }

    pub fn summary_enabled(&self) -> bool {
        self.summary.is_some()
    }

    pub async fn list(&self) -> Result<Vec<InterviewRecord>, AdminError> {
        self.reader
            .list_interviews(PublicationScope::Admin, None)
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<InterviewRecord, AdminError> {
        self.reader
            .find_interview_by_id(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn organization_options(&self) -> Result<Vec<OrganizationRecord>, AdminError> {
        self.organizations
            .list_all_organizations()
            .await
            .map_err(AdminError::from)
    }

    pub async fn create(&self, input: InterviewInput) -> Result<InterviewRecord, AdminError> {
        self.ensure_organization(input.organization_id).await?;
        let slug = self
            .slugs
            .resolve(SlugTable::Interviews, input.slug.as_deref(), &input.title, None)
            .await?;

        let params = into_params(slug, input)?;
        let record = self.writer.create_interview(params).await?;
        record_mutation(ENTITY, AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, input: InterviewInput) -> Result<InterviewRecord, AdminError> {
        self.find(id).await?;
        self.ensure_organization(input.organization_id).await?;
        let slug = self
            .slugs
            .resolve(
                SlugTable::Interviews,
                input.slug.as_deref(),
                &input.title,
                Some(id),
            )
            .await?;

        let params = into_params(slug, input)?;
        let record = self.writer.update_interview(id, params).await?;
        record_mutation(ENTITY, AdminAction::Update, &id);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.find(id).await?;
        self.writer.delete_interview(id).await?;
        record_mutation(ENTITY, AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn toggle_published(&self, id: Uuid) -> Result<InterviewRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_interview_published(id, !current.is_published)
            .await?;
        record_mutation(ENTITY, AdminAction::Publish, &id);
        Ok(record)
    }

    pub async fn toggle_featured(&self, id: Uuid) -> Result<InterviewRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_interview_featured(id, !current.is_featured)
            .await?;
        record_mutation(ENTITY, AdminAction::Feature, &id);
        Ok(record)
    }

    /// Generate a lead paragraph from the stored interview body.
    pub async fn summarize(&self, id: Uuid) -> Result<String, AdminError> {
        let generator = self.summary.as_ref().ok_or(SummaryError::NotConfigured)?;
        let interview = self.find(id).await?;

        let text = plain_text(&interview.body);
        if text.is_empty() {
            return Err(SummaryError::EmptyInput.into());
        }

        let summary = generator.summarize(&text).await?;
        info!(
            target = "tsunagu::application::admin::interviews",
            id = %id,
            chars = summary.chars().count(),
            "generated interview summary"
        );
        Ok(summary)
    }

    async fn ensure_organization(&self, id: Option<Uuid>) -> Result<(), AdminError> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.organizations.find_organization_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(FieldErrors::single("organization_id", "選択した団体が見つかりません").into()),
        }
    }
}

fn into_params(slug: String, input: InterviewInput) -> Result<InterviewParams, AdminError> {
    let body = sanitize_rich_text(&input.body)
        .ok_or_else(|| FieldErrors::single("body", "本文を入力してください"))?;

    Ok(InterviewParams {
        slug,
        title: input.title,
        lead: input.lead,
        body,
        interviewee: input.interviewee,
        cover_image_url: input.cover_image_url,
        gallery_urls: input.gallery_urls,
        organization_id: input.organization_id,
    })
}
