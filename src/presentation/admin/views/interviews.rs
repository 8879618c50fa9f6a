use askama::Template;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::entities::{InterviewRecord, OrganizationRecord};

use super::{
    AdminFormErrors, AdminLayout, AdminRowActions, AdminSelectOption, admin_timestamp,
    publish_label,
};

#[derive(Clone)]
pub struct AdminInterviewRowView {
    pub title: String,
    pub organization_name: Option<String>,
    pub status_label: &'static str,
    pub is_published: bool,
    pub is_featured: bool,
    pub published: Option<String>,
    pub public_href: String,
    pub actions: AdminRowActions,
}

#[derive(Clone)]
pub struct AdminInterviewListView {
    pub rows: Vec<AdminInterviewRowView>,
    pub new_href: String,
}

impl AdminInterviewListView {
    pub fn build(records: &[InterviewRecord], tz: Tz) -> Self {
        Self {
            rows: records
                .iter()
                .map(|record| AdminInterviewRowView {
                    title: record.title.clone(),
                    organization_name: record.organization_name.clone(),
                    status_label: publish_label(record.is_published),
                    is_published: record.is_published,
                    is_featured: record.is_featured,
                    published: record.published_at.map(|at| admin_timestamp(at, tz)),
                    public_href: format!("/interviews/{}", record.slug),
                    actions: AdminRowActions::for_entity("interviews", record.id),
                })
                .collect(),
            new_href: "/admin/interviews/new".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/interviews.html")]
pub struct AdminInterviewsTemplate {
    pub view: AdminLayout<AdminInterviewListView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewFormValues {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub lead: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub interviewee: String,
    #[serde(default)]
    pub cover_image_url: String,
    /// One URL per line.
    #[serde(default)]
    pub gallery_urls: String,
    #[serde(default)]
    pub organization_id: String,
}

impl InterviewFormValues {
    pub fn from_record(record: &InterviewRecord) -> Self {
        Self {
            title: record.title.clone(),
            slug: record.slug.clone(),
            lead: record.lead.clone().unwrap_or_default(),
            body: record.body.clone(),
            interviewee: record.interviewee.clone().unwrap_or_default(),
            cover_image_url: record.cover_image_url.clone().unwrap_or_default(),
            gallery_urls: record.gallery_urls.join("\n"),
            organization_id: record
                .organization_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct AdminInterviewEditorView {
    pub heading: String,
    pub form_action: String,
    pub submit_label: String,
    pub cancel_href: String,
    /// Present when editing a stored interview and a summary backend is configured.
    pub summary_action: Option<String>,
    pub values: InterviewFormValues,
    pub organizations: Vec<AdminSelectOption>,
    pub errors: AdminFormErrors,
}

impl AdminInterviewEditorView {
    pub fn new(
        heading: &str,
        form_action: String,
        values: InterviewFormValues,
        organizations: &[OrganizationRecord],
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            submit_label: "保存する".to_string(),
            cancel_href: "/admin/interviews".to_string(),
            summary_action: None,
            form_action,
            organizations: organizations
                .iter()
                .map(|organization| {
                    let value = organization.id.to_string();
                    AdminSelectOption {
                        selected: value == values.organization_id,
                        label: organization.name.clone(),
                        value,
                    }
                })
                .collect(),
            values,
            errors,
        }
    }

    pub fn with_summary_action(mut self, action: Option<String>) -> Self {
        self.summary_action = action;
        self
    }
}

#[derive(Template)]
#[template(path = "admin/interview_form.html")]
pub struct AdminInterviewFormTemplate {
    pub view: AdminLayout<AdminInterviewEditorView>,
}
