use std::sync::Arc;

use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::ordering::{MoveOutcome, SortOrderService};
use crate::application::repos::{
    CreateFaqParams, FaqsRepo, FaqsWriteRepo, PublicationScope, UpdateFaqParams,
};
use crate::domain::entities::FaqRecord;
use crate::domain::types::{SortDirection, SortTable};

const ENTITY: &str = "faq";

#[derive(Debug, Clone, Default)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
}

#[derive(Clone)]
pub struct AdminFaqService {
    reader: Arc<dyn FaqsRepo>,
    writer: Arc<dyn FaqsWriteRepo>,
    ordering: SortOrderService,
}

impl AdminFaqService {
    pub fn new(
        reader: Arc<dyn FaqsRepo>,
        writer: Arc<dyn FaqsWriteRepo>,
        ordering: SortOrderService,
    ) -> Self {
        Self {
            reader,
            writer,
            ordering,
        }
    }

    pub async fn list(&self) -> Result<Vec<FaqRecord>, AdminError> {
        self.reader
            .list_faqs(PublicationScope::Admin)
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<FaqRecord, AdminError> {
        self.reader
            .find_faq_by_id(id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    /// New entries go to the end of the list.
    pub async fn create(&self, input: FaqInput) -> Result<FaqRecord, AdminError> {
        let sort_order = self.ordering.next_position(SortTable::Faqs).await?;
        let record = self
            .writer
            .create_faq(CreateFaqParams {
                question: input.question,
                answer: input.answer,
                sort_order,
            })
            .await?;
        record_mutation(ENTITY, AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, input: FaqInput) -> Result<FaqRecord, AdminError> {
        self.find(id).await?;
        let record = self
            .writer
            .update_faq(
                id,
                UpdateFaqParams {
                    question: input.question,
                    answer: input.answer,
                },
            )
            .await?;
        record_mutation(ENTITY, AdminAction::Update, &id);
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.find(id).await?;
        self.writer.delete_faq(id).await?;
        record_mutation(ENTITY, AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn toggle_published(&self, id: Uuid) -> Result<FaqRecord, AdminError> {
        let current = self.find(id).await?;
        let record = self
            .writer
            .set_faq_published(id, !current.is_published)
            .await?;
        record_mutation(ENTITY, AdminAction::Publish, &id);
        Ok(record)
    }

    pub async fn move_item(
        &self,
        id: Uuid,
        direction: SortDirection,
    ) -> Result<MoveOutcome, AdminError> {
        let outcome = self
            .ordering
            .move_item(SortTable::Faqs, id, direction)
            .await?;
        if outcome == MoveOutcome::Swapped {
            record_mutation(ENTITY, AdminAction::Reorder, &id);
        }
        Ok(outcome)
    }
}
