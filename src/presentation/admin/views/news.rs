use askama::Template;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::entities::NewsPostRecord;

use super::{AdminFormErrors, AdminLayout, AdminRowActions, admin_timestamp, publish_label};

#[derive(Clone)]
pub struct AdminNewsRowView {
    pub title: String,
    pub status_label: &'static str,
    pub is_published: bool,
    pub published: Option<String>,
    pub public_href: String,
    pub actions: AdminRowActions,
}

#[derive(Clone)]
pub struct AdminNewsListView {
    pub rows: Vec<AdminNewsRowView>,
    pub new_href: String,
}

impl AdminNewsListView {
    pub fn build(records: &[NewsPostRecord], tz: Tz) -> Self {
        Self {
            rows: records
                .iter()
                .map(|record| AdminNewsRowView {
                    title: record.title.clone(),
                    status_label: publish_label(record.is_published),
                    is_published: record.is_published,
                    published: record.published_at.map(|at| admin_timestamp(at, tz)),
                    public_href: format!("/news/{}", record.slug),
                    actions: AdminRowActions::for_entity("news", record.id),
                })
                .collect(),
            new_href: "/admin/news/new".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/news.html")]
pub struct AdminNewsTemplate {
    pub view: AdminLayout<AdminNewsListView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFormValues {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl NewsFormValues {
    pub fn from_record(record: &NewsPostRecord) -> Self {
        Self {
            title: record.title.clone(),
            slug: record.slug.clone(),
            excerpt: record.excerpt.clone().unwrap_or_default(),
            body: record.body.clone(),
            thumbnail_url: record.thumbnail_url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct AdminNewsEditorView {
    pub heading: String,
    pub form_action: String,
    pub submit_label: String,
    pub cancel_href: String,
    pub values: NewsFormValues,
    pub errors: AdminFormErrors,
}

impl AdminNewsEditorView {
    pub fn new(
        heading: &str,
        form_action: String,
        values: NewsFormValues,
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            submit_label: "保存する".to_string(),
            cancel_href: "/admin/news".to_string(),
            form_action,
            values,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/news_form.html")]
pub struct AdminNewsFormTemplate {
    pub view: AdminLayout<AdminNewsEditorView>,
}
