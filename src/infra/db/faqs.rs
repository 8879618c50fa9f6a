use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateFaqParams, FaqsRepo, FaqsWriteRepo, PublicationScope, RepoError, UpdateFaqParams,
    },
    domain::entities::FaqRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const FAQ_COLUMNS: &str = "id, question, answer, sort_order, is_published, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct FaqRow {
    id: Uuid,
    question: String,
    answer: String,
    sort_order: i32,
    is_published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<FaqRow> for FaqRecord {
    fn from(row: FaqRow) -> Self {
        Self {
            id: row.id,
            question: row.question,
            answer: row.answer,
            sort_order: row.sort_order,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FaqsRepo for PostgresRepositories {
    async fn list_faqs(&self, scope: PublicationScope) -> Result<Vec<FaqRecord>, RepoError> {
        let rows = sqlx::query_as::<_, FaqRow>(&format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE ($1 OR is_published = TRUE) \
             ORDER BY sort_order ASC, id"
        ))
        .bind(scope == PublicationScope::Admin)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FaqRecord::from).collect())
    }

    async fn find_faq_by_id(&self, id: Uuid) -> Result<Option<FaqRecord>, RepoError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FaqRecord::from))
    }
}

#[async_trait]
impl FaqsWriteRepo for PostgresRepositories {
    async fn create_faq(&self, params: CreateFaqParams) -> Result<FaqRecord, RepoError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            "INSERT INTO faqs (id, question, answer, sort_order) VALUES ($1, $2, $3, $4) \
             RETURNING {FAQ_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.question)
        .bind(&params.answer)
        .bind(params.sort_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(FaqRecord::from(row))
    }

    async fn update_faq(&self, id: Uuid, params: UpdateFaqParams) -> Result<FaqRecord, RepoError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            "UPDATE faqs SET question = $2, answer = $3, updated_at = now() \
             WHERE id = $1 RETURNING {FAQ_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.question)
        .bind(&params.answer)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(FaqRecord::from(row))
    }

    async fn delete_faq(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_faq_published(&self, id: Uuid, published: bool) -> Result<FaqRecord, RepoError> {
        let row = sqlx::query_as::<_, FaqRow>(&format!(
            "UPDATE faqs SET is_published = $2, updated_at = now() \
             WHERE id = $1 RETURNING {FAQ_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(FaqRecord::from(row))
    }
}
