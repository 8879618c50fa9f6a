use askama::Template;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::application::admin::organizations::TaxonomyOptions;
use crate::domain::entities::{OrganizationLinks, OrganizationRecord};

use super::{
    AdminCheckboxOption, AdminFormErrors, AdminLayout, AdminRowActions, admin_timestamp,
    publish_label,
};

#[derive(Clone)]
pub struct AdminOrganizationRowView {
    pub name: String,
    pub slug: String,
    pub status_label: &'static str,
    pub is_published: bool,
    pub is_featured: bool,
    pub is_recruiting: bool,
    pub updated: String,
    pub public_href: String,
    pub actions: AdminRowActions,
}

#[derive(Clone)]
pub struct AdminOrganizationListView {
    pub rows: Vec<AdminOrganizationRowView>,
    pub new_href: String,
    pub featured_count: usize,
    pub featured_max: u64,
}

impl AdminOrganizationListView {
    pub fn build(records: &[OrganizationRecord], featured_max: u64, tz: Tz) -> Self {
        Self {
            rows: records
                .iter()
                .map(|record| AdminOrganizationRowView {
                    name: record.name.clone(),
                    slug: record.slug.clone(),
                    status_label: publish_label(record.is_published),
                    is_published: record.is_published,
                    is_featured: record.is_featured,
                    is_recruiting: record.is_recruiting,
                    updated: admin_timestamp(record.updated_at, tz),
                    public_href: format!("/organizations/{}", record.slug),
                    actions: AdminRowActions::for_entity("organizations", record.id),
                })
                .collect(),
            new_href: "/admin/organizations/new".to_string(),
            featured_count: records.iter().filter(|record| record.is_featured).count(),
            featured_max,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/organizations.html")]
pub struct AdminOrganizationsTemplate {
    pub view: AdminLayout<AdminOrganizationListView>,
}

/// Raw organization form fields as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationFormValues {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub activity_schedule: String,
    #[serde(default)]
    pub membership_info: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub is_recruiting: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub area_ids: Vec<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl OrganizationFormValues {
    pub fn from_record(record: &OrganizationRecord, links: &OrganizationLinks) -> Self {
        let ids = |ids: &[uuid::Uuid]| ids.iter().map(ToString::to_string).collect();
        Self {
            name: record.name.clone(),
            slug: record.slug.clone(),
            summary: record.summary.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            activity_schedule: record.activity_schedule.clone().unwrap_or_default(),
            membership_info: record.membership_info.clone().unwrap_or_default(),
            contact_name: record.contact_name.clone().unwrap_or_default(),
            contact_email: record.contact_email.clone().unwrap_or_default(),
            contact_phone: record.contact_phone.clone().unwrap_or_default(),
            website_url: record.website_url.clone().unwrap_or_default(),
            address: record.address.clone().unwrap_or_default(),
            logo_url: record.logo_url.clone().unwrap_or_default(),
            is_recruiting: record.is_recruiting.then(|| "on".to_string()),
            category_ids: ids(&links.category_ids),
            area_ids: ids(&links.area_ids),
            tag_ids: ids(&links.tag_ids),
        }
    }

    pub fn recruiting_checked(&self) -> bool {
        self.is_recruiting.is_some()
    }
}

#[derive(Clone)]
pub struct AdminOrganizationEditorView {
    pub heading: String,
    pub form_action: String,
    pub submit_label: String,
    pub cancel_href: String,
    pub values: OrganizationFormValues,
    pub categories: Vec<AdminCheckboxOption>,
    pub areas: Vec<AdminCheckboxOption>,
    pub tags: Vec<AdminCheckboxOption>,
    pub errors: AdminFormErrors,
}

impl AdminOrganizationEditorView {
    pub fn new(
        heading: &str,
        form_action: String,
        values: OrganizationFormValues,
        options: &TaxonomyOptions,
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            submit_label: "保存する".to_string(),
            cancel_href: "/admin/organizations".to_string(),
            form_action,
            categories: AdminCheckboxOption::from_taxonomy(&options.categories, &values.category_ids),
            areas: AdminCheckboxOption::from_taxonomy(&options.areas, &values.area_ids),
            tags: AdminCheckboxOption::from_taxonomy(&options.tags, &values.tag_ids),
            values,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/organization_form.html")]
pub struct AdminOrganizationFormTemplate {
    pub view: AdminLayout<AdminOrganizationEditorView>,
}
