//! Categories, areas and tags share one service keyed by [`TaxonomyKind`].

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::application::admin::{AdminAction, AdminError, record_mutation};
use crate::application::ordering::{MoveOutcome, SortOrderService};
use crate::application::repos::{
    CreateTaxonomyParams, TaxonomyRepo, TaxonomyWriteRepo, UpdateTaxonomyParams,
};
use crate::application::slugs::UniqueSlugResolver;
use crate::domain::entities::{TaxonomyRecord, TaxonomyWithUsage};
use crate::domain::types::{SortDirection, TaxonomyKind};

#[derive(Debug, Clone, Default)]
pub struct TaxonomyInput {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Clone)]
pub struct AdminTaxonomyService {
    reader: Arc<dyn TaxonomyRepo>,
    writer: Arc<dyn TaxonomyWriteRepo>,
    slugs: UniqueSlugResolver,
    ordering: SortOrderService,
}

impl AdminTaxonomyService {
    pub fn new(
        reader: Arc<dyn TaxonomyRepo>,
        writer: Arc<dyn TaxonomyWriteRepo>,
        slugs: UniqueSlugResolver,
        ordering: SortOrderService,
    ) -> Self {
        Self {
            reader,
            writer,
            slugs,
            ordering,
        }
    }

    pub async fn list_with_usage(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyWithUsage>, AdminError> {
        self.reader
            .list_taxonomy_with_usage(kind)
            .await
            .map_err(AdminError::from)
    }

    pub async fn find(&self, kind: TaxonomyKind, id: Uuid) -> Result<TaxonomyRecord, AdminError> {
        self.reader
            .find_taxonomy_by_id(kind, id)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn create(
        &self,
        kind: TaxonomyKind,
        input: TaxonomyInput,
    ) -> Result<TaxonomyRecord, AdminError> {
        let slug = self
            .slugs
            .resolve(kind.table(), input.slug.as_deref(), &input.name, None)
            .await?;
        let sort_order = self.ordering.next_position(kind.sort_table()).await?;

        let record = self
            .writer
            .create_taxonomy(
                kind,
                CreateTaxonomyParams {
                    name: input.name,
                    slug,
                    sort_order,
                },
            )
            .await?;
        record_mutation(kind.as_str(), AdminAction::Create, &record.id);
        Ok(record)
    }

    pub async fn update(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
        input: TaxonomyInput,
    ) -> Result<TaxonomyRecord, AdminError> {
        self.find(kind, id).await?;
        let slug = self
            .slugs
            .resolve(kind.table(), input.slug.as_deref(), &input.name, Some(id))
            .await?;

        let record = self
            .writer
            .update_taxonomy(
                kind,
                id,
                UpdateTaxonomyParams {
                    name: input.name,
                    slug,
                },
            )
            .await?;
        record_mutation(kind.as_str(), AdminAction::Update, &id);
        Ok(record)
    }

    /// Refuses while any organization or grant still references the item.
    pub async fn delete(&self, kind: TaxonomyKind, id: Uuid) -> Result<(), AdminError> {
        self.find(kind, id).await?;

        let usage = self.reader.count_taxonomy_usage(kind, id).await?;
        if usage > 0 {
            warn!(
                target = "tsunagu::application::admin::taxonomy",
                kind = kind.as_str(),
                id = %id,
                usage,
                "refusing to delete taxonomy item in use"
            );
            return Err(AdminError::InUse { count: usage });
        }

        self.writer.delete_taxonomy(kind, id).await?;
        record_mutation(kind.as_str(), AdminAction::Delete, &id);
        Ok(())
    }

    pub async fn move_item(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
        direction: SortDirection,
    ) -> Result<MoveOutcome, AdminError> {
        let outcome = self
            .ordering
            .move_item(kind.sort_table(), id, direction)
            .await?;
        if outcome == MoveOutcome::Swapped {
            record_mutation(kind.as_str(), AdminAction::Reorder, &id);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    use crate::application::repos::{RepoError, SlugRepo, SortOrderRepo};
    use crate::domain::entities::SortPosition;
    use crate::domain::types::{SlugTable, SortTable};

    struct StubTaxonomyRepo {
        usage: u64,
        record: Option<TaxonomyRecord>,
    }

    #[async_trait]
    impl TaxonomyRepo for StubTaxonomyRepo {
        async fn list_taxonomy(
            &self,
            _kind: TaxonomyKind,
        ) -> Result<Vec<TaxonomyRecord>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn list_taxonomy_with_usage(
            &self,
            _kind: TaxonomyKind,
        ) -> Result<Vec<TaxonomyWithUsage>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn find_taxonomy_by_id(
            &self,
            _kind: TaxonomyKind,
            _id: Uuid,
        ) -> Result<Option<TaxonomyRecord>, RepoError> {
            Ok(self.record.clone())
        }

        async fn find_taxonomy_by_slug(
            &self,
            _kind: TaxonomyKind,
            _slug: &str,
        ) -> Result<Option<TaxonomyRecord>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn count_taxonomy_usage(
            &self,
            _kind: TaxonomyKind,
            _id: Uuid,
        ) -> Result<u64, RepoError> {
            Ok(self.usage)
        }

        async fn list_taxonomy_for_organization(
            &self,
            _kind: TaxonomyKind,
            _organization_id: Uuid,
        ) -> Result<Vec<TaxonomyRecord>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn list_categories_for_grant(
            &self,
            _grant_id: Uuid,
        ) -> Result<Vec<TaxonomyRecord>, RepoError> {
            unreachable!("not used in these tests")
        }
    }

    #[derive(Default)]
    struct RecordingTaxonomyWriter {
        created: Mutex<Vec<CreateTaxonomyParams>>,
        deleted: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl TaxonomyWriteRepo for RecordingTaxonomyWriter {
        async fn create_taxonomy(
            &self,
            kind: TaxonomyKind,
            params: CreateTaxonomyParams,
        ) -> Result<TaxonomyRecord, RepoError> {
            let record = TaxonomyRecord {
                id: Uuid::new_v4(),
                kind,
                name: params.name.clone(),
                slug: params.slug.clone(),
                sort_order: params.sort_order,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            };
            self.created.lock().unwrap().push(params);
            Ok(record)
        }

        async fn update_taxonomy(
            &self,
            _kind: TaxonomyKind,
            _id: Uuid,
            _params: UpdateTaxonomyParams,
        ) -> Result<TaxonomyRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete_taxonomy(&self, _kind: TaxonomyKind, id: Uuid) -> Result<(), RepoError> {
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    struct FreeSlugs;

    #[async_trait]
    impl SlugRepo for FreeSlugs {
        async fn slug_exists(
            &self,
            _table: SlugTable,
            _slug: &str,
            _exclude_id: Option<Uuid>,
        ) -> Result<bool, RepoError> {
            Ok(false)
        }
    }

    struct FixedNextOrder(i32);

    #[async_trait]
    impl SortOrderRepo for FixedNextOrder {
        async fn find_position(
            &self,
            _table: SortTable,
            _id: Uuid,
        ) -> Result<Option<SortPosition>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn find_neighbor(
            &self,
            _table: SortTable,
            _sort_order: i32,
            _direction: SortDirection,
        ) -> Result<Option<SortPosition>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn swap_sort_order(
            &self,
            _table: SortTable,
            _first: SortPosition,
            _second: SortPosition,
        ) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn next_sort_order(&self, _table: SortTable) -> Result<i32, RepoError> {
            Ok(self.0)
        }
    }

    fn sample_item(id: Uuid) -> TaxonomyRecord {
        TaxonomyRecord {
            id,
            kind: TaxonomyKind::Category,
            name: "子育て".into(),
            slug: "子育て".into(),
            sort_order: 1,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn service(
        reader: StubTaxonomyRepo,
        writer: Arc<RecordingTaxonomyWriter>,
        next_order: i32,
    ) -> AdminTaxonomyService {
        AdminTaxonomyService::new(
            Arc::new(reader),
            writer,
            UniqueSlugResolver::new(Arc::new(FreeSlugs)),
            SortOrderService::new(Arc::new(FixedNextOrder(next_order))),
        )
    }

    #[tokio::test]
    async fn delete_rejects_when_in_use() {
        let id = Uuid::new_v4();
        let writer = Arc::new(RecordingTaxonomyWriter::default());
        let service = service(
            StubTaxonomyRepo {
                usage: 3,
                record: Some(sample_item(id)),
            },
            writer.clone(),
            1,
        );

        let result = service.delete(TaxonomyKind::Category, id).await;
        match result {
            Err(AdminError::InUse { count }) => assert_eq!(count, 3),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(writer.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_allows_when_unused() {
        let id = Uuid::new_v4();
        let writer = Arc::new(RecordingTaxonomyWriter::default());
        let service = service(
            StubTaxonomyRepo {
                usage: 0,
                record: Some(sample_item(id)),
            },
            writer.clone(),
            1,
        );

        service
            .delete(TaxonomyKind::Category, id)
            .await
            .expect("delete succeeds");

        assert_eq!(writer.deleted.lock().unwrap().as_slice(), &[id]);
    }

    #[tokio::test]
    async fn delete_unknown_item_is_not_found() {
        let writer = Arc::new(RecordingTaxonomyWriter::default());
        let service = service(
            StubTaxonomyRepo {
                usage: 0,
                record: None,
            },
            writer,
            1,
        );

        let result = service.delete(TaxonomyKind::Area, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AdminError::NotFound)));
    }

    #[tokio::test]
    async fn create_derives_slug_and_appends_to_the_end() {
        let writer = Arc::new(RecordingTaxonomyWriter::default());
        let service = service(
            StubTaxonomyRepo {
                usage: 0,
                record: None,
            },
            writer.clone(),
            5,
        );

        let record = service
            .create(
                TaxonomyKind::Area,
                TaxonomyInput {
                    name: "中央 地区".into(),
                    slug: None,
                },
            )
            .await
            .expect("create");

        assert_eq!(record.slug, "中央-地区");
        assert_eq!(record.sort_order, 5);
        assert_eq!(writer.created.lock().unwrap().len(), 1);
    }
}
