use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError, faqs::FaqInput},
        validation::{FieldErrors, required},
    },
    presentation::admin::views::{
        AdminFaqEditorView, AdminFaqFormTemplate, AdminFaqListView, AdminFaqsTemplate,
        FaqFormValues,
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

const LIST_PATH: &str = "/admin/faqs";
const LABEL: &str = "FAQ";

pub(super) async fn admin_faqs(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.faqs.list().await {
        Ok(records) => {
            let content = AdminFaqListView::build(&records);
            let view = flash.apply(layout(&state, LIST_PATH, "よくある質問", content));
            render(AdminFaqsTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::faqs", err),
    }
}

pub(super) async fn admin_faq_new(State(state): State<AdminState>) -> Response {
    editor_page(&state, EditorTarget::New, FaqFormValues::default(), None)
}

pub(super) async fn admin_faq_edit(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.faqs.find(id).await {
        Ok(record) => editor_page(
            &state,
            EditorTarget::Existing(id),
            FaqFormValues::from_record(&record),
            None,
        ),
        Err(err) => load_failure("infra::http::admin::faqs::edit", err),
    }
}

pub(super) async fn admin_faq_create(
    State(state): State<AdminState>,
    Form(values): Form<FaqFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::faqs::create";

    let input = match parse_faq_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            return editor_page(&state, EditorTarget::New, values, Some(FormFailure::invalid(fields)));
        }
    };
    match state.faqs.create(input).await {
        Ok(_) => redirect_notice(LIST_PATH, "FAQを作成しました"),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Create);
            editor_page(&state, EditorTarget::New, values, Some(failure))
        }
    }
}

pub(super) async fn admin_faq_update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(values): Form<FaqFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::faqs::update";

    let target = EditorTarget::Existing(id);
    let input = match parse_faq_form(&values) {
        Ok(input) => input,
        Err(fields) => return editor_page(&state, target, values, Some(FormFailure::invalid(fields))),
    };
    match state.faqs.update(id, input).await {
        Ok(_) => redirect_notice(LIST_PATH, "FAQを更新しました"),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Update);
            editor_page(&state, target, values, Some(failure))
        }
    }
}

pub(super) async fn admin_faq_delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.faqs.delete(id).await {
        Ok(()) => redirect_notice(LIST_PATH, "FAQを削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::faqs::delete",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_faq_publish(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.faqs.toggle_published(id).await {
        Ok(record) => {
            let notice = if record.is_published {
                "FAQを公開しました"
            } else {
                "FAQを非公開にしました"
            };
            redirect_notice(LIST_PATH, notice)
        }
        Err(err) => action_failure(
            "infra::http::admin::faqs::publish",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Publish,
        ),
    }
}

pub(super) async fn admin_faq_move(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(form): Form<MoveForm>,
) -> Response {
    let Some(direction) = form.direction() else {
        return invalid_direction(LIST_PATH);
    };
    move_response(
        "infra::http::admin::faqs::move",
        LIST_PATH,
        state.faqs.move_item(id, direction).await,
        LABEL,
    )
}

fn editor_page(
    state: &AdminState,
    target: EditorTarget,
    values: FaqFormValues,
    failure: Option<FormFailure>,
) -> Response {
    let (path, action) = target.paths("faqs");
    let heading = target.heading("FAQを追加", "FAQを編集");
    let content = AdminFaqEditorView::new(heading, action, values, form_errors(failure.as_ref()));
    let view = layout(state, &path, heading, content);
    render_editor(
        "infra::http::admin::faqs::editor",
        view,
        failure,
        |view| AdminFaqFormTemplate { view },
    )
}

pub(super) fn parse_faq_form(values: &FaqFormValues) -> Result<FaqInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let question = required(&mut errors, "question", "質問", &values.question);
    let answer = required(&mut errors, "answer", "回答", &values.answer);
    errors.finish(FaqInput { question, answer })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_and_answer_are_required() {
        let values = FaqFormValues {
            question: "登録に費用はかかりますか？".to_string(),
            answer: "  ".to_string(),
        };
        let errors = parse_faq_form(&values).unwrap_err();
        assert!(errors.first("question").is_none());
        assert_eq!(errors.first("answer"), Some("回答を入力してください"));
    }
}
