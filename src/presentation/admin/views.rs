mod dashboard;
mod grants;
mod interviews;
mod media;
mod news;
mod ordered;
mod organizations;
mod session;

pub use dashboard::*;
pub use grants::*;
pub use interviews::*;
pub use media::*;
pub use news::*;
pub use ordered::*;
pub use organizations::*;
pub use session::*;

use chrono_tz::Tz;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::validation::FieldErrors;
use crate::domain::entities::TaxonomyRecord;
use crate::domain::types::TaxonomyKind;
use crate::presentation::format::format_local_datetime;

#[derive(Clone)]
pub struct AdminNavigationItemView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminChrome {
    pub site_title: String,
    pub page_title: String,
    pub navigation: Vec<AdminNavigationItemView>,
}

impl AdminChrome {
    pub fn new(site_title: &str, active_path: &str, page_title: &str) -> Self {
        let mut entries: Vec<(String, &str)> = vec![
            ("/admin".to_string(), "ダッシュボード"),
            ("/admin/organizations".to_string(), "団体"),
            ("/admin/interviews".to_string(), "インタビュー"),
            ("/admin/grants".to_string(), "助成金"),
            ("/admin/news".to_string(), "お知らせ"),
            ("/admin/faqs".to_string(), "よくある質問"),
        ];
        entries.extend(
            TaxonomyKind::ALL
                .into_iter()
                .map(|kind| (format!("/admin/taxonomy/{}", kind.segment()), kind.label())),
        );
        entries.push(("/admin/media".to_string(), "メディア"));

        let navigation = entries
            .into_iter()
            .map(|(href, label)| AdminNavigationItemView {
                is_active: if href == "/admin" {
                    active_path == "/admin"
                } else {
                    active_path == href || active_path.starts_with(&format!("{href}/"))
                },
                label: label.to_string(),
                href,
            })
            .collect();

        Self {
            site_title: site_title.to_string(),
            page_title: page_title.to_string(),
            navigation,
        }
    }
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub chrome: AdminChrome,
    pub asset_version: String,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(chrome: AdminChrome, content: T) -> Self {
        Self {
            chrome,
            asset_version: asset_version(),
            notice: None,
            error: None,
            content,
        }
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

fn asset_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Clone)]
pub struct AdminCheckboxOption {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

impl AdminCheckboxOption {
    pub fn from_taxonomy(items: &[TaxonomyRecord], selected: &[String]) -> Vec<Self> {
        items
            .iter()
            .map(|item| {
                let value = item.id.to_string();
                AdminCheckboxOption {
                    checked: selected.contains(&value),
                    label: item.name.clone(),
                    value,
                }
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct AdminSelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Field errors as seen by editor templates.
#[derive(Clone, Default)]
pub struct AdminFormErrors {
    errors: FieldErrors,
}

impl AdminFormErrors {
    pub fn new(errors: FieldErrors) -> Self {
        Self { errors }
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.first(field).is_some()
    }

    pub fn message(&self, field: &str) -> &str {
        self.errors.first(field).unwrap_or_default()
    }
}

/// Hrefs for the per-row actions of a content list.
#[derive(Clone)]
pub struct AdminRowActions {
    pub edit_href: String,
    pub update_action: String,
    pub delete_action: String,
    pub publish_action: String,
    pub feature_action: String,
    pub move_action: String,
}

impl AdminRowActions {
    pub fn for_entity(collection: &str, id: Uuid) -> Self {
        let base = format!("/admin/{collection}/{id}");
        Self {
            edit_href: format!("{base}/edit"),
            delete_action: format!("{base}/delete"),
            publish_action: format!("{base}/publish"),
            feature_action: format!("{base}/feature"),
            move_action: format!("{base}/move"),
            update_action: base,
        }
    }
}

pub fn admin_timestamp(time: OffsetDateTime, tz: Tz) -> String {
    format_local_datetime(time, tz)
}

pub fn publish_label(is_published: bool) -> &'static str {
    if is_published { "公開中" } else { "下書き" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_marks_nested_paths() {
        let chrome = AdminChrome::new("つなぐ", "/admin/taxonomy/areas/new", "地域");
        let active: Vec<_> = chrome
            .navigation
            .iter()
            .filter(|item| item.is_active)
            .map(|item| item.href.as_str())
            .collect();
        assert_eq!(active, vec!["/admin/taxonomy/areas"]);
    }

    #[test]
    fn dashboard_is_only_active_on_its_own_path() {
        let chrome = AdminChrome::new("つなぐ", "/admin/organizations", "団体");
        assert!(!chrome.navigation[0].is_active);
        assert!(chrome.navigation[1].is_active);
    }

    #[test]
    fn form_errors_default_to_empty_message() {
        let errors = AdminFormErrors::new(FieldErrors::single("name", "名称を入力してください"));
        assert!(errors.has("name"));
        assert_eq!(errors.message("name"), "名称を入力してください");
        assert_eq!(errors.message("slug"), "");
    }
}
