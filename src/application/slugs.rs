//! Table-aware unique slug resolution.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{RepoError, SlugRepo};
use crate::domain::slug::{SlugAsyncError, derive_slug, generate_unique_slug_async};
use crate::domain::types::SlugTable;

pub type SlugResolveError = SlugAsyncError<RepoError>;

#[derive(Clone)]
pub struct UniqueSlugResolver {
    repo: Arc<dyn SlugRepo>,
}

impl UniqueSlugResolver {
    pub fn new(repo: Arc<dyn SlugRepo>) -> Self {
        Self { repo }
    }

    /// Resolve a slug for `table` that no row other than `exclude_id` uses.
    ///
    /// `explicit` is the slug the admin typed, if any; otherwise the slug is
    /// derived from `fallback` (the display name or title).
    pub async fn resolve(
        &self,
        table: SlugTable,
        explicit: Option<&str>,
        fallback: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<String, SlugResolveError> {
        let source = explicit
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(fallback);

        let repo = self.repo.clone();
        let slug = generate_unique_slug_async(source, move |candidate| {
            let repo = repo.clone();
            let candidate = candidate.to_string();
            async move {
                repo.slug_exists(table, &candidate, exclude_id)
                    .await
                    .map(|exists| !exists)
            }
        })
        .await?;

        if slug != derive_slug(source) {
            counter!("tsunagu_slug_collisions_total", "table" => table.table_name()).increment(1);
            debug!(
                target = "tsunagu::application::slugs",
                table = table.table_name(),
                slug = %slug,
                "resolved slug collision with suffix"
            );
        }

        Ok(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::slug::SlugError;

    #[derive(Default)]
    struct StubSlugRepo {
        taken: Vec<(SlugTable, String, Uuid)>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SlugRepo for StubSlugRepo {
        async fn slug_exists(
            &self,
            table: SlugTable,
            slug: &str,
            exclude_id: Option<Uuid>,
        ) -> Result<bool, RepoError> {
            self.queries.lock().unwrap().push(slug.to_string());
            Ok(self.taken.iter().any(|(t, s, id)| {
                *t == table && s == slug && Some(*id) != exclude_id
            }))
        }
    }

    #[tokio::test]
    async fn resolve_suffixes_colliding_names() {
        let repo = Arc::new(StubSlugRepo {
            taken: vec![
                (SlugTable::Organizations, "sakura-club".into(), Uuid::new_v4()),
                (SlugTable::Organizations, "sakura-club-1".into(), Uuid::new_v4()),
            ],
            ..Default::default()
        });
        let resolver = UniqueSlugResolver::new(repo.clone());

        let slug = resolver
            .resolve(SlugTable::Organizations, None, "Sakura Club", None)
            .await
            .expect("slug");

        assert_eq!(slug, "sakura-club-2");
        assert_eq!(
            repo.queries.lock().unwrap().as_slice(),
            &["sakura-club", "sakura-club-1", "sakura-club-2"]
        );
    }

    #[tokio::test]
    async fn resolve_is_scoped_per_table() {
        let repo = Arc::new(StubSlugRepo {
            taken: vec![(SlugTable::News, "sakura-club".into(), Uuid::new_v4())],
            ..Default::default()
        });
        let resolver = UniqueSlugResolver::new(repo);

        let slug = resolver
            .resolve(SlugTable::Organizations, None, "Sakura Club", None)
            .await
            .expect("slug");
        assert_eq!(slug, "sakura-club");
    }

    #[tokio::test]
    async fn resolve_keeps_own_slug_when_editing() {
        let id = Uuid::new_v4();
        let repo = Arc::new(StubSlugRepo {
            taken: vec![(SlugTable::Grants, "地域活性化助成金".into(), id)],
            ..Default::default()
        });
        let resolver = UniqueSlugResolver::new(repo);

        let slug = resolver
            .resolve(SlugTable::Grants, Some("地域活性化助成金"), "ignored", Some(id))
            .await
            .expect("slug");
        assert_eq!(slug, "地域活性化助成金");
    }

    #[tokio::test]
    async fn resolve_prefers_explicit_slug() {
        let resolver = UniqueSlugResolver::new(Arc::new(StubSlugRepo::default()));
        let slug = resolver
            .resolve(SlugTable::News, Some("Spring Event"), "春のイベント", None)
            .await
            .expect("slug");
        assert_eq!(slug, "spring-event");

        let slug = resolver
            .resolve(SlugTable::News, Some("   "), "春のイベント", None)
            .await
            .expect("slug");
        assert_eq!(slug, "春のイベント");
    }

    #[tokio::test]
    async fn resolve_rejects_unrepresentable_source() {
        let resolver = UniqueSlugResolver::new(Arc::new(StubSlugRepo::default()));
        let result = resolver.resolve(SlugTable::Tags, None, "★☆★", None).await;
        assert!(matches!(
            result,
            Err(SlugAsyncError::Slug(SlugError::EmptyInput))
        ));
    }
}
