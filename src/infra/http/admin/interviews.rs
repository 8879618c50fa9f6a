use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError, interviews::InterviewInput},
        validation::{
            FieldErrors, blank_to_none, optional_url, optional_uuid, required, split_lines,
        },
    },
    presentation::admin::views::{
        AdminInterviewEditorView, AdminInterviewFormTemplate, AdminInterviewListView,
        AdminInterviewsTemplate, InterviewFormValues,
    },
};

use super::{
    AdminState,
    shared::{
        EditorTarget, FlashQuery, FormFailure, action_failure, form_errors, layout, load_failure,
        redirect_notice, render, render_editor,
    },
};

const LIST_PATH: &str = "/admin/interviews";
const LABEL: &str = "インタビュー";

pub(super) async fn admin_interviews(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.interviews.list().await {
        Ok(records) => {
            let content = AdminInterviewListView::build(&records, state.timezone);
            let view = flash.apply(layout(&state, LIST_PATH, "インタビュー", content));
            render(AdminInterviewsTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::interviews", err),
    }
}

pub(super) async fn admin_interview_new(State(state): State<AdminState>) -> Response {
    editor_page(&state, EditorTarget::New, InterviewFormValues::default(), None, None).await
}

pub(super) async fn admin_interview_edit(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.interviews.find(id).await {
        Ok(record) => {
            let values = InterviewFormValues::from_record(&record);
            editor_page(&state, EditorTarget::Existing(id), values, None, flash.notice).await
        }
        Err(err) => load_failure("infra::http::admin::interviews::edit", err),
    }
}

pub(super) async fn admin_interview_create(
    State(state): State<AdminState>,
    Form(values): Form<InterviewFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::interviews::create";

    let input = match parse_interview_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            let failure = FormFailure::invalid(fields);
            return editor_page(&state, EditorTarget::New, values, Some(failure), None).await;
        }
    };
    match state.interviews.create(input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を作成しました", record.title)),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Create);
            editor_page(&state, EditorTarget::New, values, Some(failure), None).await
        }
    }
}

pub(super) async fn admin_interview_update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(values): Form<InterviewFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::interviews::update";

    let target = EditorTarget::Existing(id);
    let input = match parse_interview_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            let failure = FormFailure::invalid(fields);
            return editor_page(&state, target, values, Some(failure), None).await;
        }
    };
    match state.interviews.update(id, input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を更新しました", record.title)),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Update);
            editor_page(&state, target, values, Some(failure), None).await
        }
    }
}

/// Generate a lead from the stored body and show it in the editor for review.
/// Nothing is saved until the admin submits the form.
pub(super) async fn admin_interview_summary(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(mut values): Form<InterviewFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::interviews::summary";

    let target = EditorTarget::Existing(id);
    match state.interviews.summarize(id).await {
        Ok(summary) => {
            values.lead = summary;
            let notice = Some("要約を生成しました。内容を確認して保存してください".to_string());
            editor_page(&state, target, values, None, notice).await
        }
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Summarize);
            editor_page(&state, target, values, Some(failure), None).await
        }
    }
}

pub(super) async fn admin_interview_delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.interviews.delete(id).await {
        Ok(()) => redirect_notice(LIST_PATH, "インタビューを削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::interviews::delete",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_interview_publish(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.interviews.toggle_published(id).await {
        Ok(record) => {
            let verb = if record.is_published { "公開しました" } else { "非公開にしました" };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.title))
        }
        Err(err) => action_failure(
            "infra::http::admin::interviews::publish",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Publish,
        ),
    }
}

pub(super) async fn admin_interview_feature(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.interviews.toggle_featured(id).await {
        Ok(record) => {
            let verb = if record.is_featured {
                "注目に設定しました"
            } else {
                "注目を解除しました"
            };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.title))
        }
        Err(err) => action_failure(
            "infra::http::admin::interviews::feature",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Feature,
        ),
    }
}

async fn editor_page(
    state: &AdminState,
    target: EditorTarget,
    values: InterviewFormValues,
    failure: Option<FormFailure>,
    notice: Option<String>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::interviews::editor";

    let organizations = match state.interviews.organization_options().await {
        Ok(organizations) => organizations,
        Err(err) => return load_failure(SOURCE, err),
    };
    let (path, action) = target.paths("interviews");
    let heading = target.heading("インタビューを追加", "インタビューを編集");
    let summary_action = match target {
        EditorTarget::Existing(id) if state.interviews.summary_enabled() => {
            Some(format!("/admin/interviews/{id}/summary"))
        }
        _ => None,
    };
    let errors = form_errors(failure.as_ref());
    let content = AdminInterviewEditorView::new(heading, action, values, &organizations, errors)
        .with_summary_action(summary_action);
    let view = layout(state, &path, heading, content).with_notice(notice);
    render_editor(SOURCE, view, failure, |view| AdminInterviewFormTemplate { view })
}

pub(super) fn parse_interview_form(
    values: &InterviewFormValues,
) -> Result<InterviewInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required(&mut errors, "title", "タイトル", &values.title);
    let cover_image_url = optional_url(
        &mut errors,
        "cover_image_url",
        Some(values.cover_image_url.clone()),
    );
    let mut gallery_urls = Vec::new();
    for url in split_lines(Some(&values.gallery_urls)) {
        if let Some(url) = optional_url(&mut errors, "gallery_urls", Some(url)) {
            gallery_urls.push(url);
        }
    }
    let organization_id = optional_uuid(
        &mut errors,
        "organization_id",
        Some(values.organization_id.clone()),
    );

    errors.finish(InterviewInput {
        title,
        slug: blank_to_none(Some(values.slug.clone())),
        lead: blank_to_none(Some(values.lead.clone())),
        body: values.body.trim().to_string(),
        interviewee: blank_to_none(Some(values.interviewee.clone())),
        cover_image_url,
        gallery_urls,
        organization_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_is_one_url_per_line() {
        let values = InterviewFormValues {
            title: "地域の子ども食堂".to_string(),
            gallery_urls: "/storage/images/a.jpg\n\n https://example.jp/b.png \n".to_string(),
            ..InterviewFormValues::default()
        };
        let input = parse_interview_form(&values).expect("valid form");
        assert_eq!(
            input.gallery_urls,
            vec![
                "/storage/images/a.jpg".to_string(),
                "https://example.jp/b.png".to_string()
            ]
        );
        assert_eq!(input.organization_id, None);
    }

    #[test]
    fn bad_gallery_entry_and_missing_title_are_reported() {
        let values = InterviewFormValues {
            gallery_urls: "javascript:alert(1)".to_string(),
            organization_id: "not-a-uuid".to_string(),
            ..InterviewFormValues::default()
        };
        let errors = parse_interview_form(&values).unwrap_err();
        assert!(errors.first("title").is_some());
        assert!(errors.first("gallery_urls").is_some());
        assert!(errors.first("organization_id").is_some());
    }
}
