use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError, taxonomy::TaxonomyInput},
        error::HttpError,
        validation::{FieldErrors, blank_to_none, required},
    },
    domain::types::TaxonomyKind,
    presentation::admin::views::{
        AdminTaxonomyEditorView, AdminTaxonomyFormTemplate, AdminTaxonomyListView,
        AdminTaxonomyTemplate, TaxonomyFormValues, taxonomy_collection,
    },
};

use super::{
    AdminState,
    shared::{
        EditorTarget, FlashQuery, FormFailure, MoveForm, action_failure, form_errors,
        invalid_direction, layout, load_failure, move_response, redirect_notice, render,
        render_editor,
    },
};

fn list_path(kind: TaxonomyKind) -> String {
    format!("/admin/{}", taxonomy_collection(kind))
}

/// Resolve the `{kind}` path segment, rejecting unknown taxonomies with a 404.
fn resolve_kind(segment: &str) -> Result<TaxonomyKind, Response> {
    TaxonomyKind::from_segment(segment).ok_or_else(|| {
        HttpError::new(
            "infra::http::admin::taxonomy",
            StatusCode::NOT_FOUND,
            "ページが見つかりません",
            format!("unknown taxonomy `{segment}`"),
        )
        .into_response()
    })
}

pub(super) async fn admin_taxonomy(
    State(state): State<AdminState>,
    Path(segment): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match state.taxonomy.list_with_usage(kind).await {
        Ok(items) => {
            let content = AdminTaxonomyListView::build(kind, &items);
            let view = flash.apply(layout(&state, &list_path(kind), kind.label(), content));
            render(AdminTaxonomyTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::taxonomy::list", err),
    }
}

pub(super) async fn admin_taxonomy_new(
    State(state): State<AdminState>,
    Path(segment): Path<String>,
) -> Response {
    match resolve_kind(&segment) {
        Ok(kind) => editor_page(&state, kind, EditorTarget::New, TaxonomyFormValues::default(), None),
        Err(response) => response,
    }
}

pub(super) async fn admin_taxonomy_edit(
    State(state): State<AdminState>,
    Path((segment, id)): Path<(String, Uuid)>,
) -> Response {
    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match state.taxonomy.find(kind, id).await {
        Ok(record) => editor_page(
            &state,
            kind,
            EditorTarget::Existing(id),
            TaxonomyFormValues::from_record(&record),
            None,
        ),
        Err(err) => load_failure("infra::http::admin::taxonomy::edit", err),
    }
}

pub(super) async fn admin_taxonomy_create(
    State(state): State<AdminState>,
    Path(segment): Path<String>,
    Form(values): Form<TaxonomyFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::taxonomy::create";

    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let input = match parse_taxonomy_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            let failure = FormFailure::invalid(fields);
            return editor_page(&state, kind, EditorTarget::New, values, Some(failure));
        }
    };
    match state.taxonomy.create(kind, input).await {
        Ok(record) => redirect_notice(
            &list_path(kind),
            &format!("{}「{}」を作成しました", kind.label(), record.name),
        ),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, kind.label(), AdminAction::Create);
            editor_page(&state, kind, EditorTarget::New, values, Some(failure))
        }
    }
}

pub(super) async fn admin_taxonomy_update(
    State(state): State<AdminState>,
    Path((segment, id)): Path<(String, Uuid)>,
    Form(values): Form<TaxonomyFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::taxonomy::update";

    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let target = EditorTarget::Existing(id);
    let input = match parse_taxonomy_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            return editor_page(&state, kind, target, values, Some(FormFailure::invalid(fields)));
        }
    };
    match state.taxonomy.update(kind, id, input).await {
        Ok(record) => redirect_notice(
            &list_path(kind),
            &format!("{}「{}」を更新しました", kind.label(), record.name),
        ),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, kind.label(), AdminAction::Update);
            editor_page(&state, kind, target, values, Some(failure))
        }
    }
}

pub(super) async fn admin_taxonomy_delete(
    State(state): State<AdminState>,
    Path((segment, id)): Path<(String, Uuid)>,
) -> Response {
    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let list = list_path(kind);
    match state.taxonomy.delete(kind, id).await {
        Ok(()) => redirect_notice(&list, &format!("{}を削除しました", kind.label())),
        Err(err) => action_failure(
            "infra::http::admin::taxonomy::delete",
            &list,
            err,
            kind.label(),
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_taxonomy_move(
    State(state): State<AdminState>,
    Path((segment, id)): Path<(String, Uuid)>,
    Form(form): Form<MoveForm>,
) -> Response {
    let kind = match resolve_kind(&segment) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let list = list_path(kind);
    let Some(direction) = form.direction() else {
        return invalid_direction(&list);
    };
    move_response(
        "infra::http::admin::taxonomy::move",
        &list,
        state.taxonomy.move_item(kind, id, direction).await,
        kind.label(),
    )
}

fn editor_page(
    state: &AdminState,
    kind: TaxonomyKind,
    target: EditorTarget,
    values: TaxonomyFormValues,
    failure: Option<FormFailure>,
) -> Response {
    let (path, action) = target.paths(&taxonomy_collection(kind));
    let heading = match target {
        EditorTarget::New => format!("{}を追加", kind.label()),
        EditorTarget::Existing(_) => format!("{}を編集", kind.label()),
    };
    let errors = form_errors(failure.as_ref());
    let content = AdminTaxonomyEditorView::new(kind, heading.clone(), action, values, errors);
    let view = layout(state, &path, &heading, content);
    render_editor(
        "infra::http::admin::taxonomy::editor",
        view,
        failure,
        |view| AdminTaxonomyFormTemplate { view },
    )
}

pub(super) fn parse_taxonomy_form(values: &TaxonomyFormValues) -> Result<TaxonomyInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required(&mut errors, "name", "名前", &values.name);
    errors.finish(TaxonomyInput {
        name,
        slug: blank_to_none(Some(values.slug.clone())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_taxonomy_segment_is_not_found() {
        let response = resolve_kind("colors").unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(resolve_kind("areas").ok(), Some(TaxonomyKind::Area));
    }

    #[test]
    fn name_is_required_and_slug_optional() {
        let errors = parse_taxonomy_form(&TaxonomyFormValues::default()).unwrap_err();
        assert_eq!(errors.first("name"), Some("名前を入力してください"));

        let input = parse_taxonomy_form(&TaxonomyFormValues {
            name: "子育て".to_string(),
            slug: " ".to_string(),
        })
        .expect("valid form");
        assert_eq!(input.slug, None);
    }
}
