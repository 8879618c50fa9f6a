use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{RepoError, SlugRepo};
use crate::domain::types::SlugTable;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SlugRepo for PostgresRepositories {
    async fn slug_exists(
        &self,
        table: SlugTable,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        // Table names come from a closed enum, never from input.
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
            table.table_name()
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(slug)
            .bind(exclude_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
