use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError, grants::GrantInput},
        validation::{
            FieldErrors, blank_to_none, optional_amount, optional_date, optional_url, required,
            split_tags, uuid_list,
        },
    },
    presentation::admin::views::{
        AdminGrantEditorView, AdminGrantFormTemplate, AdminGrantListView, AdminGrantsTemplate,
        GrantFormValues,
    },
};

use super::{
    AdminState,
    shared::{
        EditorTarget, FlashQuery, FormFailure, action_failure, form_errors, layout, load_failure,
        redirect_notice, render, render_editor,
    },
};

const LIST_PATH: &str = "/admin/grants";
const LABEL: &str = "助成金";

pub(super) async fn admin_grants(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.grants.list().await {
        Ok(records) => {
            let content = AdminGrantListView::build(&records);
            let view = flash.apply(layout(&state, LIST_PATH, "助成金", content));
            render(AdminGrantsTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::grants", err),
    }
}

pub(super) async fn admin_grant_new(State(state): State<AdminState>) -> Response {
    editor_page(&state, EditorTarget::New, GrantFormValues::default(), None).await
}

pub(super) async fn admin_grant_edit(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::grants::edit";

    let record = match state.grants.find(id).await {
        Ok(record) => record,
        Err(err) => return load_failure(SOURCE, err),
    };
    let category_ids = match state.grants.category_ids(id).await {
        Ok(ids) => ids,
        Err(err) => return load_failure(SOURCE, err),
    };
    let values = GrantFormValues::from_record(&record, &category_ids);
    editor_page(&state, EditorTarget::Existing(id), values, None).await
}

pub(super) async fn admin_grant_create(
    State(state): State<AdminState>,
    Form(values): Form<GrantFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::grants::create";

    let input = match parse_grant_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            let failure = FormFailure::invalid(fields);
            return editor_page(&state, EditorTarget::New, values, Some(failure)).await;
        }
    };
    match state.grants.create(input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を作成しました", record.title)),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Create);
            editor_page(&state, EditorTarget::New, values, Some(failure)).await
        }
    }
}

pub(super) async fn admin_grant_update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(values): Form<GrantFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::grants::update";

    let target = EditorTarget::Existing(id);
    let input = match parse_grant_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            let failure = FormFailure::invalid(fields);
            return editor_page(&state, target, values, Some(failure)).await;
        }
    };
    match state.grants.update(id, input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を更新しました", record.title)),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Update);
            editor_page(&state, target, values, Some(failure)).await
        }
    }
}

pub(super) async fn admin_grant_delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.grants.delete(id).await {
        Ok(()) => redirect_notice(LIST_PATH, "助成金を削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::grants::delete",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_grant_publish(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.grants.toggle_published(id).await {
        Ok(record) => {
            let verb = if record.is_published { "公開しました" } else { "非公開にしました" };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.title))
        }
        Err(err) => action_failure(
            "infra::http::admin::grants::publish",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Publish,
        ),
    }
}

async fn editor_page(
    state: &AdminState,
    target: EditorTarget,
    values: GrantFormValues,
    failure: Option<FormFailure>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::grants::editor";

    let categories = match state.grants.category_options().await {
        Ok(categories) => categories,
        Err(err) => return load_failure(SOURCE, err),
    };
    let (path, action) = target.paths("grants");
    let heading = target.heading("助成金を追加", "助成金を編集");
    let errors = form_errors(failure.as_ref());
    let content = AdminGrantEditorView::new(heading, action, values, &categories, errors);
    let view = layout(state, &path, heading, content);
    render_editor(SOURCE, view, failure, |view| AdminGrantFormTemplate { view })
}

pub(super) fn parse_grant_form(values: &GrantFormValues) -> Result<GrantInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required(&mut errors, "title", "タイトル", &values.title);
    let provider_name = required(&mut errors, "provider_name", "実施団体", &values.provider_name);
    let application_start_date = optional_date(
        &mut errors,
        "application_start_date",
        Some(values.application_start_date.clone()),
    );
    let application_end_date = optional_date(
        &mut errors,
        "application_end_date",
        Some(values.application_end_date.clone()),
    );
    let amount_min = optional_amount(&mut errors, "amount_min", Some(values.amount_min.clone()));
    let amount_max = optional_amount(&mut errors, "amount_max", Some(values.amount_max.clone()));
    let source_url = optional_url(&mut errors, "source_url", Some(values.source_url.clone()));
    let category_ids = uuid_list(&mut errors, "category_ids", &values.category_ids);

    errors.finish(GrantInput {
        title,
        slug: blank_to_none(Some(values.slug.clone())),
        provider_name,
        summary: blank_to_none(Some(values.summary.clone())),
        body: blank_to_none(Some(values.body.clone())),
        application_start_date,
        application_end_date,
        amount_min,
        amount_max,
        target_tags: split_tags(Some(&values.target_tags)),
        source_url,
        category_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dates_amounts_and_tags_are_parsed() {
        let values = GrantFormValues {
            title: "地域活性化助成金".to_string(),
            provider_name: "市民活動推進課".to_string(),
            application_start_date: "2025-04-01".to_string(),
            application_end_date: "2025-05-31".to_string(),
            amount_min: "100,000".to_string(),
            amount_max: "500000".to_string(),
            target_tags: "子育て、高齢者, 子育て".to_string(),
            ..GrantFormValues::default()
        };
        let input = parse_grant_form(&values).expect("valid form");
        assert_eq!(input.application_start_date, Some(date!(2025 - 04 - 01)));
        assert_eq!(input.application_end_date, Some(date!(2025 - 05 - 31)));
        assert_eq!(input.amount_min, Some(100_000));
        assert_eq!(input.amount_max, Some(500_000));
        assert_eq!(input.target_tags, vec!["子育て".to_string(), "高齢者".to_string()]);
    }

    #[test]
    fn malformed_dates_and_amounts_are_reported() {
        let values = GrantFormValues {
            title: "地域活性化助成金".to_string(),
            provider_name: "市".to_string(),
            application_end_date: "2025/05/31".to_string(),
            amount_min: "-1".to_string(),
            ..GrantFormValues::default()
        };
        let errors = parse_grant_form(&values).unwrap_err();
        assert!(errors.first("application_end_date").is_some());
        assert!(errors.first("amount_min").is_some());
    }
}
