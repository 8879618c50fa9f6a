use std::sync::Arc;

use crate::application::admin::{
    dashboard::AdminDashboardService, faqs::AdminFaqService, grants::AdminGrantService,
    interviews::AdminInterviewService, media::AdminMediaService, news::AdminNewsService,
    organizations::AdminOrganizationService, taxonomy::AdminTaxonomyService,
};
use crate::application::auth::AdminAuthService;

use super::rate_limit::LoginRateLimiter;

#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AdminAuthService>,
    pub limiter: LoginRateLimiter,
    pub secure_cookie: bool,
}

#[derive(Clone)]
pub struct AdminState {
    pub site_title: Arc<str>,
    pub timezone: chrono_tz::Tz,
    pub auth: AuthState,
    pub dashboard: Arc<AdminDashboardService>,
    pub organizations: Arc<AdminOrganizationService>,
    pub interviews: Arc<AdminInterviewService>,
    pub grants: Arc<AdminGrantService>,
    pub news: Arc<AdminNewsService>,
    pub faqs: Arc<AdminFaqService>,
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub media: Arc<AdminMediaService>,
}
