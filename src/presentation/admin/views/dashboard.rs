use askama::Template;

use crate::application::admin::dashboard::DashboardOverview;

use super::AdminLayout;

#[derive(Clone)]
pub struct AdminMetricView {
    pub label: String,
    pub value: u64,
    pub href: String,
    pub hint: Option<String>,
}

#[derive(Clone)]
pub struct AdminDashboardView {
    pub metrics: Vec<AdminMetricView>,
    pub featured_slots_left: u64,
}

impl AdminDashboardView {
    pub fn build(overview: &DashboardOverview) -> Self {
        let counts = &overview.counts;
        let metric = |label: &str, value: u64, href: &str, hint: Option<String>| AdminMetricView {
            label: label.to_string(),
            value,
            href: href.to_string(),
            hint,
        };

        Self {
            metrics: vec![
                metric(
                    "団体",
                    counts.organizations,
                    "/admin/organizations",
                    Some(format!(
                        "公開 {} 件 / 注目 {} 件",
                        counts.published_organizations, counts.featured_organizations
                    )),
                ),
                metric("インタビュー", counts.interviews, "/admin/interviews", None),
                metric("助成金", counts.grants, "/admin/grants", None),
                metric("お知らせ", counts.news, "/admin/news", None),
                metric("よくある質問", counts.faqs, "/admin/faqs", None),
            ],
            featured_slots_left: overview.featured_slots_left,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: AdminLayout<AdminDashboardView>,
}
