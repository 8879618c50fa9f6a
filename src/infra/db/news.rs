use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{NewsParams, NewsRepo, NewsWriteRepo, PublicationScope, RepoError},
    domain::entities::NewsPostRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const NEWS_COLUMNS: &str =
    "id, title, slug, excerpt, body, thumbnail_url, is_published, published_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: Uuid,
    title: String,
    slug: String,
    excerpt: Option<String>,
    body: String,
    thumbnail_url: Option<String>,
    is_published: bool,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<NewsRow> for NewsPostRecord {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            body: row.body,
            thumbnail_url: row.thumbnail_url,
            is_published: row.is_published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl NewsRepo for PostgresRepositories {
    async fn list_news(
        &self,
        scope: PublicationScope,
        limit: Option<u32>,
    ) -> Result<Vec<NewsPostRecord>, RepoError> {
        let order = match scope {
            PublicationScope::Public => {
                "WHERE is_published = TRUE ORDER BY published_at DESC NULLS LAST, id"
            }
            PublicationScope::Admin => "ORDER BY updated_at DESC, id",
        };
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news_posts {order} LIMIT $1"
        ))
        .bind(limit.map(i64::from))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NewsPostRecord::from).collect())
    }

    async fn find_news_by_id(&self, id: Uuid) -> Result<Option<NewsPostRecord>, RepoError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(NewsPostRecord::from))
    }

    async fn find_news_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<NewsPostRecord>, RepoError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news_posts WHERE slug = $1 AND ($2 OR is_published = TRUE)"
        ))
        .bind(slug)
        .bind(scope == PublicationScope::Admin)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(NewsPostRecord::from))
    }
}

#[async_trait]
impl NewsWriteRepo for PostgresRepositories {
    async fn create_news(&self, params: NewsParams) -> Result<NewsPostRecord, RepoError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "INSERT INTO news_posts (id, title, slug, excerpt, body, thumbnail_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {NEWS_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.excerpt)
        .bind(&params.body)
        .bind(&params.thumbnail_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(NewsPostRecord::from(row))
    }

    async fn update_news(
        &self,
        id: Uuid,
        params: NewsParams,
    ) -> Result<NewsPostRecord, RepoError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "UPDATE news_posts SET title = $2, slug = $3, excerpt = $4, body = $5, \
             thumbnail_url = $6, updated_at = now() \
             WHERE id = $1 RETURNING {NEWS_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.excerpt)
        .bind(&params.body)
        .bind(&params.thumbnail_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(NewsPostRecord::from(row))
    }

    async fn delete_news(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM news_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_news_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<NewsPostRecord, RepoError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "UPDATE news_posts SET is_published = $2, \
             published_at = CASE WHEN $2 THEN COALESCE(published_at, now()) ELSE NULL END, \
             updated_at = now() \
             WHERE id = $1 RETURNING {NEWS_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(NewsPostRecord::from(row))
    }
}
