use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError},
        error::{ErrorReport, HttpError},
        ordering::MoveOutcome,
        repos::RepoError,
        validation::{FieldErrors, blank_to_none},
    },
    domain::types::SortDirection,
    presentation::{
        admin::views::{AdminChrome, AdminFormErrors, AdminLayout},
        views::render_template_response,
    },
};

use super::AdminState;

const INVALID_INPUT: &str = "入力内容を確認してください";

/// Flash messages carried across the post/redirect/get cycle.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FlashQuery {
    pub(super) notice: Option<String>,
    pub(super) error: Option<String>,
}

impl FlashQuery {
    pub(super) fn apply<T>(self, layout: AdminLayout<T>) -> AdminLayout<T> {
        layout
            .with_notice(blank_to_none(self.notice))
            .with_error(blank_to_none(self.error))
    }
}

/// Up/down buttons on ordered lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct MoveForm {
    pub(super) direction: String,
}

impl MoveForm {
    pub(super) fn direction(&self) -> Option<SortDirection> {
        SortDirection::parse(self.direction.trim())
    }
}

/// Redirect after a reorder; a move past either end changes nothing and says nothing.
pub(super) fn move_response(
    source: &'static str,
    list_path: &str,
    outcome: Result<MoveOutcome, AdminError>,
    entity: &str,
) -> Response {
    match outcome {
        Ok(MoveOutcome::Swapped) => redirect_notice(list_path, "並び順を変更しました"),
        Ok(MoveOutcome::Unchanged) => Redirect::to(list_path).into_response(),
        Err(err) => action_failure(source, list_path, err, entity, AdminAction::Reorder),
    }
}

pub(super) fn invalid_direction(list_path: &str) -> Response {
    redirect_error(list_path, "並び替えの方向が正しくありません")
}

pub(super) fn layout<T>(state: &AdminState, path: &str, title: &str, content: T) -> AdminLayout<T> {
    AdminLayout::new(AdminChrome::new(&state.site_title, path, title), content)
}

pub(super) fn render<T: Template>(template: T) -> Response {
    render_template_response(template, StatusCode::OK)
}

/// Why a submitted form bounced back to its editor.
pub(super) struct FormFailure {
    pub(super) fields: FieldErrors,
    pub(super) message: String,
    pub(super) status: StatusCode,
}

impl FormFailure {
    pub(super) fn invalid(fields: FieldErrors) -> Self {
        Self {
            fields,
            message: INVALID_INPUT.to_string(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub(super) fn from_error(
        source: &'static str,
        err: AdminError,
        entity: &str,
        action: AdminAction,
    ) -> Self {
        let status = failure_status(&err);
        let message = failure_message(source, &err, entity, action);
        let fields = match err {
            AdminError::Validation(fields) => fields,
            AdminError::Slug(_) | AdminError::Repo(RepoError::Duplicate { .. }) => {
                FieldErrors::single("slug", message.clone())
            }
            _ => FieldErrors::new(),
        };
        Self {
            fields,
            message,
            status,
        }
    }

    pub(super) fn errors(&self) -> AdminFormErrors {
        AdminFormErrors::new(self.fields.clone())
    }

    /// Render the editor again with the failure's status.
    pub(super) fn render<T: Template>(self, source: &'static str, template: T) -> Response {
        let mut response = render_template_response(template, self.status);
        ErrorReport::from_message(source, self.status, self.message).attach(&mut response);
        response
    }
}

/// Whether an editor creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EditorTarget {
    New,
    Existing(Uuid),
}

impl EditorTarget {
    /// Page path and form action for an editor under `/admin/{collection}`.
    pub(super) fn paths(self, collection: &str) -> (String, String) {
        match self {
            EditorTarget::New => (
                format!("/admin/{collection}/new"),
                format!("/admin/{collection}"),
            ),
            EditorTarget::Existing(id) => (
                format!("/admin/{collection}/{id}/edit"),
                format!("/admin/{collection}/{id}"),
            ),
        }
    }

    pub(super) fn heading<'a>(self, new: &'a str, existing: &'a str) -> &'a str {
        match self {
            EditorTarget::New => new,
            EditorTarget::Existing(_) => existing,
        }
    }
}

/// Render an editor page, bouncing with the failure's status when present.
pub(super) fn render_editor<T, Tpl, F>(
    source: &'static str,
    view: AdminLayout<T>,
    failure: Option<FormFailure>,
    template: F,
) -> Response
where
    Tpl: Template,
    F: FnOnce(AdminLayout<T>) -> Tpl,
{
    match failure {
        None => render(template(view)),
        Some(failure) => {
            let view = view.with_error(Some(failure.message.clone()));
            failure.render(source, template(view))
        }
    }
}

pub(super) fn form_errors(failure: Option<&FormFailure>) -> AdminFormErrors {
    failure.map(FormFailure::errors).unwrap_or_default()
}

pub(super) fn redirect_with(path: &str, key: &str, message: &str) -> Response {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}{key}={encoded}")).into_response()
}

pub(super) fn redirect_notice(path: &str, message: &str) -> Response {
    redirect_with(path, "notice", message)
}

pub(super) fn redirect_error(path: &str, message: &str) -> Response {
    redirect_with(path, "error", message)
}

pub(super) fn failure_status(err: &AdminError) -> StatusCode {
    match err {
        AdminError::NotFound => StatusCode::NOT_FOUND,
        AdminError::Repo(RepoError::Duplicate { .. }) | AdminError::InUse { .. } => {
            StatusCode::CONFLICT
        }
        AdminError::FeaturedLimit { .. } => StatusCode::CONFLICT,
        err if err.is_user_error() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Localized message for a failed admin action; faults are logged here.
pub(super) fn failure_message(
    source: &'static str,
    err: &AdminError,
    entity: &str,
    action: AdminAction,
) -> String {
    if !err.is_user_error() {
        error!(
            target = "tsunagu::admin",
            source,
            entity,
            action = action.as_str(),
            error = %err,
            "admin action failed"
        );
    }
    err.user_message(entity, action)
}

/// Outcome of a list-row action (publish, feature, move, delete) that failed.
pub(super) fn action_failure(
    source: &'static str,
    list_path: &str,
    err: AdminError,
    entity: &str,
    action: AdminAction,
) -> Response {
    let message = failure_message(source, &err, entity, action);
    redirect_error(list_path, &message)
}

/// A page could not be assembled at all.
pub(super) fn load_failure(source: &'static str, err: AdminError) -> Response {
    match err {
        AdminError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "ページが見つかりません",
            "admin record not found",
        )
        .into_response(),
        err => {
            error!(target = "tsunagu::admin", source, error = %err, "failed to load admin page");
            HttpError::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                "管理画面を表示できませんでした",
                &err,
            )
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn notices_are_url_encoded() {
        let response = redirect_notice("/admin/organizations", "「さくら会」を保存しました");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(location.starts_with("/admin/organizations?notice=%E3%80%8C"));
    }

    #[test]
    fn editor_paths_follow_collection() {
        let id = Uuid::nil();
        assert_eq!(
            EditorTarget::New.paths("faqs"),
            ("/admin/faqs/new".to_string(), "/admin/faqs".to_string())
        );
        assert_eq!(
            EditorTarget::Existing(id).paths("taxonomy/areas").1,
            format!("/admin/taxonomy/areas/{id}")
        );
    }

    #[test]
    fn unchanged_move_redirects_without_notice() {
        let response = move_response("test", "/admin/faqs", Ok(MoveOutcome::Unchanged), "FAQ");
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(location, Some("/admin/faqs"));
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(failure_status(&AdminError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            failure_status(&AdminError::InUse { count: 2 }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            failure_status(&AdminError::Repo(RepoError::Timeout)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_slug_lands_on_slug_field() {
        let failure = FormFailure::from_error(
            "test",
            AdminError::Repo(RepoError::Duplicate {
                constraint: "organizations_slug_key".to_string(),
            }),
            "団体",
            AdminAction::Create,
        );
        assert_eq!(failure.status, StatusCode::CONFLICT);
        assert_eq!(failure.fields.first("slug"), Some("同じスラッグの項目が既に存在します"));
    }
}
