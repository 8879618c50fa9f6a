use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{AdminAction, AdminError, news::NewsInput},
        validation::{FieldErrors, blank_to_none, optional_url, required},
    },
    presentation::admin::views::{
        AdminNewsEditorView, AdminNewsFormTemplate, AdminNewsListView, AdminNewsTemplate,
        NewsFormValues,
    },
};

use super::{
    AdminState,
    shared::{
        EditorTarget, FlashQuery, FormFailure, action_failure, form_errors, layout, load_failure,
        redirect_notice, render, render_editor,
    },
};

const LIST_PATH: &str = "/admin/news";
const LABEL: &str = "お知らせ";

pub(super) async fn admin_news(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.news.list().await {
        Ok(records) => {
            let content = AdminNewsListView::build(&records, state.timezone);
            let view = flash.apply(layout(&state, LIST_PATH, "お知らせ", content));
            render(AdminNewsTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::news", err),
    }
}

pub(super) async fn admin_news_new(State(state): State<AdminState>) -> Response {
    editor_page(&state, EditorTarget::New, NewsFormValues::default(), None)
}

pub(super) async fn admin_news_edit(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.news.find(id).await {
        Ok(record) => editor_page(
            &state,
            EditorTarget::Existing(id),
            NewsFormValues::from_record(&record),
            None,
        ),
        Err(err) => load_failure("infra::http::admin::news::edit", err),
    }
}

pub(super) async fn admin_news_create(
    State(state): State<AdminState>,
    Form(values): Form<NewsFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::news::create";

    let input = match parse_news_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            return editor_page(&state, EditorTarget::New, values, Some(FormFailure::invalid(fields)));
        }
    };
    match state.news.create(input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を作成しました", record.title)),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Create);
            editor_page(&state, EditorTarget::New, values, Some(failure))
        }
    }
}

pub(super) async fn admin_news_update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(values): Form<NewsFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::news::update";

    let target = EditorTarget::Existing(id);
    let input = match parse_news_form(&values) {
        Ok(input) => input,
        Err(fields) => return editor_page(&state, target, values, Some(FormFailure::invalid(fields))),
    };
    match state.news.update(id, input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を更新しました", record.title)),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Update);
            editor_page(&state, target, values, Some(failure))
        }
    }
}

pub(super) async fn admin_news_delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.news.delete(id).await {
        Ok(()) => redirect_notice(LIST_PATH, "お知らせを削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::news::delete",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_news_publish(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.news.toggle_published(id).await {
        Ok(record) => {
            let verb = if record.is_published { "公開しました" } else { "非公開にしました" };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.title))
        }
        Err(err) => action_failure(
            "infra::http::admin::news::publish",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Publish,
        ),
    }
}

fn editor_page(
    state: &AdminState,
    target: EditorTarget,
    values: NewsFormValues,
    failure: Option<FormFailure>,
) -> Response {
    let (path, action) = target.paths("news");
    let heading = target.heading("お知らせを追加", "お知らせを編集");
    let content = AdminNewsEditorView::new(heading, action, values, form_errors(failure.as_ref()));
    let view = layout(state, &path, heading, content);
    render_editor(
        "infra::http::admin::news::editor",
        view,
        failure,
        |view| AdminNewsFormTemplate { view },
    )
}

pub(super) fn parse_news_form(values: &NewsFormValues) -> Result<NewsInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required(&mut errors, "title", "タイトル", &values.title);
    let body = required(&mut errors, "body", "本文", &values.body);
    let thumbnail_url = optional_url(&mut errors, "thumbnail_url", Some(values.thumbnail_url.clone()));

    errors.finish(NewsInput {
        title,
        slug: blank_to_none(Some(values.slug.clone())),
        excerpt: blank_to_none(Some(values.excerpt.clone())),
        body,
        thumbnail_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_body_are_required() {
        let errors = parse_news_form(&NewsFormValues::default()).unwrap_err();
        assert_eq!(errors.first("title"), Some("タイトルを入力してください"));
        assert_eq!(errors.first("body"), Some("本文を入力してください"));
    }

    #[test]
    fn stored_thumbnail_paths_are_accepted() {
        let values = NewsFormValues {
            title: "秋祭りのお知らせ".to_string(),
            body: "<p>今年も開催します。</p>".to_string(),
            thumbnail_url: "/storage/images/matsuri.jpg".to_string(),
            ..NewsFormValues::default()
        };
        let input = parse_news_form(&values).expect("valid form");
        assert_eq!(input.thumbnail_url.as_deref(), Some("/storage/images/matsuri.jpg"));
        assert_eq!(input.excerpt, None);
    }
}
