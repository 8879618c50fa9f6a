//! Manual ordering by swapping `sort_order` with the adjacent sibling.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::admin::AdminError;
use crate::application::repos::{RepoError, SortOrderRepo};
use crate::domain::types::{SortDirection, SortTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Swapped,
    /// Already first (moving up) or last (moving down).
    Unchanged,
}

#[derive(Clone)]
pub struct SortOrderService {
    repo: Arc<dyn SortOrderRepo>,
}

impl SortOrderService {
    pub fn new(repo: Arc<dyn SortOrderRepo>) -> Self {
        Self { repo }
    }

    pub async fn move_item(
        &self,
        table: SortTable,
        id: Uuid,
        direction: SortDirection,
    ) -> Result<MoveOutcome, AdminError> {
        let current = self
            .repo
            .find_position(table, id)
            .await?
            .ok_or(AdminError::NotFound)?;

        let Some(neighbor) = self
            .repo
            .find_neighbor(table, current.sort_order, direction)
            .await?
        else {
            return Ok(MoveOutcome::Unchanged);
        };

        self.repo.swap_sort_order(table, current, neighbor).await?;
        info!(
            target = "tsunagu::application::ordering",
            table = table.table_name(),
            id = %id,
            neighbor = %neighbor.id,
            direction = ?direction,
            "swapped sort order"
        );
        Ok(MoveOutcome::Swapped)
    }

    pub async fn next_position(&self, table: SortTable) -> Result<i32, RepoError> {
        self.repo.next_sort_order(table).await
    }
}
