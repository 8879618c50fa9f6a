use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::Form;
use uuid::Uuid;

use crate::{
    application::{
        admin::{
            AdminAction, AdminError,
            organizations::{MAX_FEATURED_ORGANIZATIONS, OrganizationInput},
        },
        validation::{
            FieldErrors, blank_to_none, optional_email, optional_url, required, uuid_list,
        },
    },
    domain::entities::OrganizationLinks,
    presentation::admin::views::{
        AdminOrganizationEditorView, AdminOrganizationFormTemplate,
        AdminOrganizationListView, AdminOrganizationsTemplate, OrganizationFormValues,
    },
};

use super::{
    AdminState,
    shared::{
        EditorTarget, FlashQuery, FormFailure, action_failure, form_errors, layout, load_failure,
        redirect_notice, render, render_editor,
    },
};

const LIST_PATH: &str = "/admin/organizations";
const LABEL: &str = "団体";

pub(super) async fn admin_organizations(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.organizations.list().await {
        Ok(records) => {
            let content = AdminOrganizationListView::build(
                &records,
                MAX_FEATURED_ORGANIZATIONS,
                state.timezone,
            );
            let view = flash.apply(layout(&state, LIST_PATH, "団体", content));
            render(AdminOrganizationsTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::organizations", err),
    }
}

pub(super) async fn admin_organization_new(State(state): State<AdminState>) -> Response {
    editor_page(
        &state,
        EditorTarget::New,
        OrganizationFormValues::default(),
        None,
    )
    .await
}

pub(super) async fn admin_organization_edit(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::organizations::edit";

    let record = match state.organizations.find(id).await {
        Ok(record) => record,
        Err(err) => return load_failure(SOURCE, err),
    };
    let links = match state.organizations.links(id).await {
        Ok(links) => links,
        Err(err) => return load_failure(SOURCE, err),
    };
    let values = OrganizationFormValues::from_record(&record, &links);
    editor_page(&state, EditorTarget::Existing(id), values, None).await
}

pub(super) async fn admin_organization_create(
    State(state): State<AdminState>,
    Form(values): Form<OrganizationFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::organizations::create";

    let input = match parse_organization_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            return editor_page(&state, EditorTarget::New, values, Some(FormFailure::invalid(fields)))
                .await;
        }
    };
    match state.organizations.create(input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を作成しました", record.name)),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Create);
            editor_page(&state, EditorTarget::New, values, Some(failure)).await
        }
    }
}

pub(super) async fn admin_organization_update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Form(values): Form<OrganizationFormValues>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::organizations::update";

    let target = EditorTarget::Existing(id);
    let input = match parse_organization_form(&values) {
        Ok(input) => input,
        Err(fields) => {
            return editor_page(&state, target, values, Some(FormFailure::invalid(fields))).await;
        }
    };
    match state.organizations.update(id, input).await {
        Ok(record) => redirect_notice(LIST_PATH, &format!("「{}」を更新しました", record.name)),
        Err(AdminError::NotFound) => load_failure(SOURCE, AdminError::NotFound),
        Err(err) => {
            let failure = FormFailure::from_error(SOURCE, err, LABEL, AdminAction::Update);
            editor_page(&state, target, values, Some(failure)).await
        }
    }
}

pub(super) async fn admin_organization_delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.organizations.delete(id).await {
        Ok(()) => redirect_notice(LIST_PATH, "団体を削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::organizations::delete",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

pub(super) async fn admin_organization_publish(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.organizations.toggle_published(id).await {
        Ok(record) => {
            let verb = if record.is_published { "公開しました" } else { "非公開にしました" };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.name))
        }
        Err(err) => action_failure(
            "infra::http::admin::organizations::publish",
            LIST_PATH,
            err,
            LABEL,
            AdminAction::Publish,
        ),
    }
}

pub(super) async fn admin_organization_feature(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.organizations.toggle_featured(id).await {
        Ok(record) => {
            let verb = if record.is_featured {
                "注目に設定しました"
            } else {
                "注目を解除しました"
            };
            redirect_notice(LIST_PATH, &format!("「{}」を{verb}", record.name))
        }
        Err(err) => action_failure(
            "infra::http::admin::organizations::feature",
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
    values: OrganizationFormValues,
    failure: Option<FormFailure>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::organizations::editor";

    let options = match state.organizations.taxonomy_options().await {
        Ok(options) => options,
        Err(err) => return load_failure(SOURCE, err),
    };
    let (path, action) = target.paths("organizations");
    let heading = target.heading("団体を追加", "団体を編集");
    let errors = form_errors(failure.as_ref());
    let content = AdminOrganizationEditorView::new(heading, action, values, &options, errors);
    let view = layout(state, &path, heading, content);
    render_editor(SOURCE, view, failure, |view| AdminOrganizationFormTemplate { view })
}

pub(super) fn parse_organization_form(
    values: &OrganizationFormValues,
) -> Result<OrganizationInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required(&mut errors, "name", "団体名", &values.name);
    let contact_email = optional_email(&mut errors, "contact_email", Some(values.contact_email.clone()));
    let website_url = optional_url(&mut errors, "website_url", Some(values.website_url.clone()));
    let logo_url = optional_url(&mut errors, "logo_url", Some(values.logo_url.clone()));
    let links = OrganizationLinks {
        category_ids: uuid_list(&mut errors, "category_ids", &values.category_ids),
        area_ids: uuid_list(&mut errors, "area_ids", &values.area_ids),
        tag_ids: uuid_list(&mut errors, "tag_ids", &values.tag_ids),
    };

    errors.finish(OrganizationInput {
        name,
        slug: blank_to_none(Some(values.slug.clone())),
        summary: blank_to_none(Some(values.summary.clone())),
        description: blank_to_none(Some(values.description.clone())),
        activity_schedule: blank_to_none(Some(values.activity_schedule.clone())),
        membership_info: blank_to_none(Some(values.membership_info.clone())),
        contact_name: blank_to_none(Some(values.contact_name.clone())),
        contact_email,
        contact_phone: blank_to_none(Some(values.contact_phone.clone())),
        website_url,
        address: blank_to_none(Some(values.address.clone())),
        logo_url,
        is_recruiting: values.recruiting_checked(),
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let values = OrganizationFormValues {
            name: "   ".to_string(),
            ..OrganizationFormValues::default()
        };
        let errors = parse_organization_form(&values).unwrap_err();
        assert_eq!(errors.first("name"), Some("団体名を入力してください"));
    }

    #[test]
    fn form_values_become_trimmed_input() {
        let category = Uuid::new_v4();
        let values = OrganizationFormValues {
            name: " さくら会 ".to_string(),
            slug: String::new(),
            contact_email: "info@sakura.example.jp".to_string(),
            is_recruiting: Some("on".to_string()),
            category_ids: vec![category.to_string(), String::new()],
            ..OrganizationFormValues::default()
        };
        let input = parse_organization_form(&values).expect("valid form");
        assert_eq!(input.name, "さくら会");
        assert_eq!(input.slug, None);
        assert!(input.is_recruiting);
        assert_eq!(input.links.category_ids, vec![category]);
        assert_eq!(input.contact_email.as_deref(), Some("info@sakura.example.jp"));
    }

    #[test]
    fn malformed_contact_fields_are_reported() {
        let values = OrganizationFormValues {
            name: "さくら会".to_string(),
            contact_email: "not-an-address".to_string(),
            website_url: "ftp://example.jp".to_string(),
            ..OrganizationFormValues::default()
        };
        let errors = parse_organization_form(&values).unwrap_err();
        assert!(errors.first("contact_email").is_some());
        assert!(errors.first("website_url").is_some());
    }
}
