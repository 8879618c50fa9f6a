use askama::Template;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{GrantRecord, TaxonomyRecord};
use crate::presentation::format::{date_input_value, format_application_period};

use super::{AdminCheckboxOption, AdminFormErrors, AdminLayout, AdminRowActions, publish_label};

#[derive(Clone)]
pub struct AdminGrantRowView {
    pub title: String,
    pub provider_name: String,
    pub period: Option<String>,
    pub status_label: &'static str,
    pub is_published: bool,
    pub public_href: String,
    pub actions: AdminRowActions,
}

#[derive(Clone)]
pub struct AdminGrantListView {
    pub rows: Vec<AdminGrantRowView>,
    pub new_href: String,
}

impl AdminGrantListView {
    pub fn build(records: &[GrantRecord]) -> Self {
        Self {
            rows: records
                .iter()
                .map(|record| AdminGrantRowView {
                    title: record.title.clone(),
                    provider_name: record.provider_name.clone(),
                    period: format_application_period(
                        record.application_start_date,
                        record.application_end_date,
                    ),
                    status_label: publish_label(record.is_published),
                    is_published: record.is_published,
                    public_href: format!("/grants/{}", record.slug),
                    actions: AdminRowActions::for_entity("grants", record.id),
                })
                .collect(),
            new_href: "/admin/grants/new".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/grants.html")]
pub struct AdminGrantsTemplate {
    pub view: AdminLayout<AdminGrantListView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantFormValues {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub application_start_date: String,
    #[serde(default)]
    pub application_end_date: String,
    #[serde(default)]
    pub amount_min: String,
    #[serde(default)]
    pub amount_max: String,
    /// Comma separated.
    #[serde(default)]
    pub target_tags: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

impl GrantFormValues {
    pub fn from_record(record: &GrantRecord, category_ids: &[Uuid]) -> Self {
        Self {
            title: record.title.clone(),
            slug: record.slug.clone(),
            provider_name: record.provider_name.clone(),
            summary: record.summary.clone().unwrap_or_default(),
            body: record.body.clone().unwrap_or_default(),
            application_start_date: date_input_value(record.application_start_date),
            application_end_date: date_input_value(record.application_end_date),
            amount_min: record.amount_min.map(|v| v.to_string()).unwrap_or_default(),
            amount_max: record.amount_max.map(|v| v.to_string()).unwrap_or_default(),
            target_tags: record.target_tags.join(", "),
            source_url: record.source_url.clone().unwrap_or_default(),
            category_ids: category_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Clone)]
pub struct AdminGrantEditorView {
    pub heading: String,
    pub form_action: String,
    pub submit_label: String,
    pub cancel_href: String,
    pub values: GrantFormValues,
    pub categories: Vec<AdminCheckboxOption>,
    pub errors: AdminFormErrors,
}

impl AdminGrantEditorView {
    pub fn new(
        heading: &str,
        form_action: String,
        values: GrantFormValues,
        categories: &[TaxonomyRecord],
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            submit_label: "保存する".to_string(),
            cancel_href: "/admin/grants".to_string(),
            form_action,
            categories: AdminCheckboxOption::from_taxonomy(categories, &values.category_ids),
            values,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/grant_form.html")]
pub struct AdminGrantFormTemplate {
    pub view: AdminLayout<AdminGrantEditorView>,
}
