//! Manually ordered lists: FAQs and the three taxonomies.

use askama::Template;
use serde::Deserialize;

use crate::domain::entities::{FaqRecord, TaxonomyRecord, TaxonomyWithUsage};
use crate::domain::types::TaxonomyKind;

use super::{AdminFormErrors, AdminLayout, AdminRowActions, publish_label};

#[derive(Clone)]
pub struct AdminFaqRowView {
    pub question: String,
    pub status_label: &'static str,
    pub is_published: bool,
    pub is_first: bool,
    pub is_last: bool,
    pub actions: AdminRowActions,
}

#[derive(Clone)]
pub struct AdminFaqListView {
    pub rows: Vec<AdminFaqRowView>,
    pub new_href: String,
}

impl AdminFaqListView {
    pub fn build(records: &[FaqRecord]) -> Self {
        let last = records.len().saturating_sub(1);
        Self {
            rows: records
                .iter()
                .enumerate()
                .map(|(index, record)| AdminFaqRowView {
                    question: record.question.clone(),
                    status_label: publish_label(record.is_published),
                    is_published: record.is_published,
                    is_first: index == 0,
                    is_last: index == last,
                    actions: AdminRowActions::for_entity("faqs", record.id),
                })
                .collect(),
            new_href: "/admin/faqs/new".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/faqs.html")]
pub struct AdminFaqsTemplate {
    pub view: AdminLayout<AdminFaqListView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqFormValues {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl FaqFormValues {
    pub fn from_record(record: &FaqRecord) -> Self {
        Self {
            question: record.question.clone(),
            answer: record.answer.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AdminFaqEditorView {
    pub heading: String,
    pub form_action: String,
    pub cancel_href: String,
    pub values: FaqFormValues,
    pub errors: AdminFormErrors,
}

impl AdminFaqEditorView {
    pub fn new(
        heading: &str,
        form_action: String,
        values: FaqFormValues,
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading: heading.to_string(),
            cancel_href: "/admin/faqs".to_string(),
            form_action,
            values,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/faq_form.html")]
pub struct AdminFaqFormTemplate {
    pub view: AdminLayout<AdminFaqEditorView>,
}

#[derive(Clone)]
pub struct AdminTaxonomyRowView {
    pub name: String,
    pub slug: String,
    pub usage: u64,
    pub is_first: bool,
    pub is_last: bool,
    pub actions: AdminRowActions,
}

impl AdminTaxonomyRowView {
    pub fn deletable(&self) -> bool {
        self.usage == 0
    }
}

#[derive(Clone)]
pub struct AdminTaxonomyListView {
    pub heading: String,
    pub rows: Vec<AdminTaxonomyRowView>,
    pub new_href: String,
}

impl AdminTaxonomyListView {
    pub fn build(kind: TaxonomyKind, items: &[TaxonomyWithUsage]) -> Self {
        let collection = taxonomy_collection(kind);
        let last = items.len().saturating_sub(1);
        Self {
            heading: kind.label().to_string(),
            rows: items
                .iter()
                .enumerate()
                .map(|(index, item)| AdminTaxonomyRowView {
                    name: item.record.name.clone(),
                    slug: item.record.slug.clone(),
                    usage: item.usage,
                    is_first: index == 0,
                    is_last: index == last,
                    actions: AdminRowActions::for_entity(&collection, item.record.id),
                })
                .collect(),
            new_href: format!("/admin/{collection}/new"),
        }
    }
}

/// Path segment under `/admin` for one taxonomy, e.g. `taxonomy/areas`.
pub fn taxonomy_collection(kind: TaxonomyKind) -> String {
    format!("taxonomy/{}", kind.segment())
}

#[derive(Template)]
#[template(path = "admin/taxonomy.html")]
pub struct AdminTaxonomyTemplate {
    pub view: AdminLayout<AdminTaxonomyListView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyFormValues {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl TaxonomyFormValues {
    pub fn from_record(record: &TaxonomyRecord) -> Self {
        Self {
            name: record.name.clone(),
            slug: record.slug.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AdminTaxonomyEditorView {
    pub heading: String,
    pub form_action: String,
    pub cancel_href: String,
    pub values: TaxonomyFormValues,
    pub errors: AdminFormErrors,
}

impl AdminTaxonomyEditorView {
    pub fn new(
        kind: TaxonomyKind,
        heading: String,
        form_action: String,
        values: TaxonomyFormValues,
        errors: AdminFormErrors,
    ) -> Self {
        Self {
            heading,
            cancel_href: format!("/admin/{}", taxonomy_collection(kind)),
            form_action,
            values,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/taxonomy_form.html")]
pub struct AdminTaxonomyFormTemplate {
    pub view: AdminLayout<AdminTaxonomyEditorView>,
}
