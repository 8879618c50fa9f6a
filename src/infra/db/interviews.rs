use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        InterviewParams, InterviewsRepo, InterviewsWriteRepo, PublicationScope, RepoError,
    },
    domain::entities::InterviewRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const INTERVIEW_COLUMNS: &str = "SELECT i.id, i.title, i.slug, i.lead, i.body, i.interviewee, \
    i.cover_image_url, i.gallery_urls, {organization_id}, o.name AS organization_name, \
    o.slug AS organization_slug, i.is_published, i.is_featured, i.published_at, i.created_at, \
    i.updated_at \
    FROM interviews i LEFT JOIN organizations o ON o.id = i.organization_id";

/// Public reads only see the linked organization once it is published itself.
fn interview_select(scope: PublicationScope) -> String {
    match scope {
        PublicationScope::Admin => {
            INTERVIEW_COLUMNS.replace("{organization_id}", "i.organization_id")
        }
        PublicationScope::Public => format!(
            "{} AND o.is_published = TRUE",
            INTERVIEW_COLUMNS.replace("{organization_id}", "o.id AS organization_id")
        ),
    }
}

#[derive(sqlx::FromRow)]
struct InterviewRow {
    id: Uuid,
    title: String,
    slug: String,
    lead: Option<String>,
    body: String,
    interviewee: Option<String>,
    cover_image_url: Option<String>,
    gallery_urls: Vec<String>,
    organization_id: Option<Uuid>,
    organization_name: Option<String>,
    organization_slug: Option<String>,
    is_published: bool,
    is_featured: bool,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<InterviewRow> for InterviewRecord {
    fn from(row: InterviewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            lead: row.lead,
            body: row.body,
            interviewee: row.interviewee,
            cover_image_url: row.cover_image_url,
            gallery_urls: row.gallery_urls,
            organization_id: row.organization_id,
            organization_name: row.organization_name,
            organization_slug: row.organization_slug,
            is_published: row.is_published,
            is_featured: row.is_featured,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    /// Reload through the join so the organization name comes back with the row.
    async fn reload_interview(&self, id: Uuid) -> Result<InterviewRecord, RepoError> {
        self.find_interview_by_id(id).await?.ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl InterviewsRepo for PostgresRepositories {
    async fn list_interviews(
        &self,
        scope: PublicationScope,
        limit: Option<u32>,
    ) -> Result<Vec<InterviewRecord>, RepoError> {
        let order = match scope {
            PublicationScope::Public => {
                "WHERE i.is_published = TRUE \
                 ORDER BY i.is_featured DESC, i.published_at DESC NULLS LAST, i.id"
            }
            PublicationScope::Admin => "ORDER BY i.updated_at DESC, i.id",
        };
        let rows = sqlx::query_as::<_, InterviewRow>(&format!(
            "{} {order} LIMIT $1",
            interview_select(scope)
        ))
        .bind(limit.map(i64::from))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(InterviewRecord::from).collect())
    }

    async fn list_interviews_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<InterviewRecord>, RepoError> {
        let rows = sqlx::query_as::<_, InterviewRow>(&format!(
            "{} WHERE i.organization_id = $1 AND i.is_published = TRUE \
             ORDER BY i.published_at DESC NULLS LAST, i.id",
            interview_select(PublicationScope::Public)
        ))
        .bind(organization_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(InterviewRecord::from).collect())
    }

    async fn find_interview_by_id(&self, id: Uuid) -> Result<Option<InterviewRecord>, RepoError> {
        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "{} WHERE i.id = $1",
            interview_select(PublicationScope::Admin)
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(InterviewRecord::from))
    }

    async fn find_interview_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<InterviewRecord>, RepoError> {
        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "{} WHERE i.slug = $1 AND ($2 OR i.is_published = TRUE)",
            interview_select(scope)
        ))
        .bind(slug)
        .bind(scope == PublicationScope::Admin)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(InterviewRecord::from))
    }
}

#[async_trait]
impl InterviewsWriteRepo for PostgresRepositories {
    async fn create_interview(
        &self,
        params: InterviewParams,
    ) -> Result<InterviewRecord, RepoError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO interviews (id, title, slug, lead, body, interviewee, cover_image_url, \
             gallery_urls, organization_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.lead)
        .bind(&params.body)
        .bind(&params.interviewee)
        .bind(&params.cover_image_url)
        .bind(&params.gallery_urls)
        .bind(params.organization_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.reload_interview(id).await
    }

    async fn update_interview(
        &self,
        id: Uuid,
        params: InterviewParams,
    ) -> Result<InterviewRecord, RepoError> {
        let result = sqlx::query(
            "UPDATE interviews SET title = $2, slug = $3, lead = $4, body = $5, \
             interviewee = $6, cover_image_url = $7, gallery_urls = $8, organization_id = $9, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.lead)
        .bind(&params.body)
        .bind(&params.interviewee)
        .bind(&params.cover_image_url)
        .bind(&params.gallery_urls)
        .bind(params.organization_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.reload_interview(id).await
    }

    async fn delete_interview(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_interview_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<InterviewRecord, RepoError> {
        let result = sqlx::query(
            "UPDATE interviews SET is_published = $2, \
             published_at = CASE WHEN $2 THEN COALESCE(published_at, now()) ELSE NULL END, \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(published)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.reload_interview(id).await
    }

    async fn set_interview_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<InterviewRecord, RepoError> {
        let result = sqlx::query(
            "UPDATE interviews SET is_featured = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(featured)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.reload_interview(id).await
    }
}
