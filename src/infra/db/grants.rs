use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    application::repos::{
        GrantParams, GrantQueryFilter, GrantsRepo, GrantsWriteRepo, PublicationScope, RepoError,
    },
    domain::entities::GrantRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const GRANT_COLUMNS: &str = "id, title, slug, provider_name, summary, body, \
    application_start_date, application_end_date, amount_min, amount_max, target_tags, \
    source_url, is_published, published_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct GrantRow {
    id: Uuid,
    title: String,
    slug: String,
    provider_name: String,
    summary: Option<String>,
    body: Option<String>,
    application_start_date: Option<Date>,
    application_end_date: Option<Date>,
    amount_min: Option<i64>,
    amount_max: Option<i64>,
    target_tags: Vec<String>,
    source_url: Option<String>,
    is_published: bool,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<GrantRow> for GrantRecord {
    fn from(row: GrantRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            provider_name: row.provider_name,
            summary: row.summary,
            body: row.body,
            application_start_date: row.application_start_date,
            application_end_date: row.application_end_date,
            amount_min: row.amount_min,
            amount_max: row.amount_max,
            target_tags: row.target_tags,
            source_url: row.source_url,
            is_published: row.is_published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn replace_grant_categories(
        tx: &mut Transaction<'_, Postgres>,
        grant_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM grant_categories WHERE grant_id = $1")
            .bind(grant_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        if !category_ids.is_empty() {
            sqlx::query(
                "INSERT INTO grant_categories (grant_id, category_id) \
                 SELECT $1, linked FROM UNNEST($2::uuid[]) AS linked \
                 ON CONFLICT DO NOTHING",
            )
            .bind(grant_id)
            .bind(category_ids)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl GrantsRepo for PostgresRepositories {
    async fn list_grants(
        &self,
        scope: PublicationScope,
        filter: GrantQueryFilter,
        limit: Option<u32>,
    ) -> Result<Vec<GrantRecord>, RepoError> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {GRANT_COLUMNS} FROM grants \
             WHERE ($1 OR is_published = TRUE) \
               AND ($2::date IS NULL OR application_end_date IS NULL OR application_end_date >= $2) \
             ORDER BY application_end_date ASC NULLS LAST, title ASC, id \
             LIMIT $3"
        ))
        .bind(scope == PublicationScope::Admin)
        .bind(filter.open_on)
        .bind(limit.map(i64::from))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GrantRecord::from).collect())
    }

    async fn find_grant_by_id(&self, id: Uuid) -> Result<Option<GrantRecord>, RepoError> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {GRANT_COLUMNS} FROM grants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(GrantRecord::from))
    }

    async fn find_grant_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<GrantRecord>, RepoError> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {GRANT_COLUMNS} FROM grants WHERE slug = $1 AND ($2 OR is_published = TRUE)"
        ))
        .bind(slug)
        .bind(scope == PublicationScope::Admin)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(GrantRecord::from))
    }

    async fn grant_category_ids(&self, id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>("SELECT category_id FROM grant_categories WHERE grant_id = $1")
            .bind(id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl GrantsWriteRepo for PostgresRepositories {
    async fn create_grant(&self, params: GrantParams) -> Result<GrantRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "INSERT INTO grants (id, title, slug, provider_name, summary, body, \
             application_start_date, application_end_date, amount_min, amount_max, target_tags, \
             source_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {GRANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.provider_name)
        .bind(&params.summary)
        .bind(&params.body)
        .bind(params.application_start_date)
        .bind(params.application_end_date)
        .bind(params.amount_min)
        .bind(params.amount_max)
        .bind(&params.target_tags)
        .bind(&params.source_url)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Self::replace_grant_categories(&mut tx, row.id, &params.category_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(GrantRecord::from(row))
    }

    async fn update_grant(&self, id: Uuid, params: GrantParams) -> Result<GrantRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "UPDATE grants SET title = $2, slug = $3, provider_name = $4, summary = $5, \
             body = $6, application_start_date = $7, application_end_date = $8, \
             amount_min = $9, amount_max = $10, target_tags = $11, source_url = $12, \
             updated_at = now() \
             WHERE id = $1 RETURNING {GRANT_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.provider_name)
        .bind(&params.summary)
        .bind(&params.body)
        .bind(params.application_start_date)
        .bind(params.application_end_date)
        .bind(params.amount_min)
        .bind(params.amount_max)
        .bind(&params.target_tags)
        .bind(&params.source_url)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Self::replace_grant_categories(&mut tx, id, &params.category_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(GrantRecord::from(row))
    }

    async fn delete_grant(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        Self::replace_grant_categories(&mut tx, id, &[]).await?;
        let result = sqlx::query("DELETE FROM grants WHERE id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_grant_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<GrantRecord, RepoError> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "UPDATE grants SET is_published = $2, \
             published_at = CASE WHEN $2 THEN COALESCE(published_at, now()) ELSE NULL END, \
             updated_at = now() \
             WHERE id = $1 RETURNING {GRANT_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(GrantRecord::from(row))
    }
}
