use async_trait::async_trait;

use crate::application::repos::{ContentCounts, RepoError, StatsRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CountsRow {
    organizations: i64,
    published_organizations: i64,
    featured_organizations: i64,
    interviews: i64,
    grants: i64,
    news: i64,
    faqs: i64,
}

#[async_trait]
impl StatsRepo for PostgresRepositories {
    async fn content_counts(&self) -> Result<ContentCounts, RepoError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM organizations) AS organizations,
                (SELECT COUNT(*) FROM organizations WHERE is_published) AS published_organizations,
                (SELECT COUNT(*) FROM organizations WHERE is_featured) AS featured_organizations,
                (SELECT COUNT(*) FROM interviews) AS interviews,
                (SELECT COUNT(*) FROM grants) AS grants,
                (SELECT COUNT(*) FROM news_posts) AS news,
                (SELECT COUNT(*) FROM faqs) AS faqs
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContentCounts {
            organizations: Self::convert_count(row.organizations)?,
            published_organizations: Self::convert_count(row.published_organizations)?,
            featured_organizations: Self::convert_count(row.featured_organizations)?,
            interviews: Self::convert_count(row.interviews)?,
            grants: Self::convert_count(row.grants)?,
            news: Self::convert_count(row.news)?,
            faqs: Self::convert_count(row.faqs)?,
        })
    }
}
