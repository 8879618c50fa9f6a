use std::sync::Arc;

use crate::application::admin::AdminError;
use crate::application::admin::organizations::MAX_FEATURED_ORGANIZATIONS;
use crate::application::repos::{ContentCounts, StatsRepo};

/// Figures shown on the admin landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOverview {
    pub counts: ContentCounts,
    pub featured_slots_left: u64,
}

#[derive(Clone)]
pub struct AdminDashboardService {
    stats: Arc<dyn StatsRepo>,
}

impl AdminDashboardService {
    pub fn new(stats: Arc<dyn StatsRepo>) -> Self {
        Self { stats }
    }

    pub async fn overview(&self) -> Result<DashboardOverview, AdminError> {
        let counts = self.stats.content_counts().await?;
        Ok(DashboardOverview {
            featured_slots_left: MAX_FEATURED_ORGANIZATIONS
                .saturating_sub(counts.featured_organizations),
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::application::repos::RepoError;

    struct FixedStats(ContentCounts);

    #[async_trait]
    impl StatsRepo for FixedStats {
        async fn content_counts(&self) -> Result<ContentCounts, RepoError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn featured_slots_never_go_negative() {
        let service = AdminDashboardService::new(Arc::new(FixedStats(ContentCounts {
            organizations: 10,
            featured_organizations: 4,
            ..ContentCounts::default()
        })));

        let overview = service.overview().await.expect("overview");
        assert_eq!(overview.featured_slots_left, 0);
        assert_eq!(overview.counts.organizations, 10);
    }
}
