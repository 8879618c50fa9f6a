use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{RepoError, SortOrderRepo};
use crate::domain::entities::SortPosition;
use crate::domain::types::{SortDirection, SortTable};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PositionRow {
    id: Uuid,
    sort_order: i32,
}

impl From<PositionRow> for SortPosition {
    fn from(row: PositionRow) -> Self {
        Self {
            id: row.id,
            sort_order: row.sort_order,
        }
    }
}

#[async_trait]
impl SortOrderRepo for PostgresRepositories {
    async fn find_position(
        &self,
        table: SortTable,
        id: Uuid,
    ) -> Result<Option<SortPosition>, RepoError> {
        let sql = format!(
            "SELECT id, sort_order FROM {} WHERE id = $1",
            table.table_name()
        );
        let row = sqlx::query_as::<_, PositionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(SortPosition::from))
    }

    async fn find_neighbor(
        &self,
        table: SortTable,
        sort_order: i32,
        direction: SortDirection,
    ) -> Result<Option<SortPosition>, RepoError> {
        let (comparison, ordering) = match direction {
            SortDirection::Up => ("<", "DESC"),
            SortDirection::Down => (">", "ASC"),
        };
        let sql = format!(
            "SELECT id, sort_order FROM {} WHERE sort_order {comparison} $1 \
             ORDER BY sort_order {ordering}, id LIMIT 1",
            table.table_name()
        );
        let row = sqlx::query_as::<_, PositionRow>(&sql)
            .bind(sort_order)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(SortPosition::from))
    }

    async fn swap_sort_order(
        &self,
        table: SortTable,
        first: SortPosition,
        second: SortPosition,
    ) -> Result<(), RepoError> {
        let sql = format!(
            "UPDATE {} SET sort_order = $2, updated_at = now() WHERE id = $1",
            table.table_name()
        );

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        for (id, sort_order) in [
            (first.id, second.sort_order),
            (second.id, first.sort_order),
        ] {
            sqlx::query(&sql)
                .bind(id)
                .bind(sort_order)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn next_sort_order(&self, table: SortTable) -> Result<i32, RepoError> {
        let sql = format!(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM {}",
            table.table_name()
        );
        sqlx::query_scalar::<_, i32>(&sql)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
