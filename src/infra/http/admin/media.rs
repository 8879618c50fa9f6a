use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::Form;
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::{admin::AdminAction, validation::blank_to_none},
    domain::types::MediaFolder,
    presentation::admin::views::{AdminMediaLibraryView, AdminMediaTemplate},
};

use super::{
    AdminState,
    shared::{
        action_failure, failure_message, layout, load_failure, redirect_error, redirect_with,
        render,
    },
};

const SOURCE_BASE: &str = "infra::http::admin::media";
const LABEL: &str = "ファイル";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct MediaQuery {
    folder: Option<String>,
    notice: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct MediaDeleteForm {
    path: String,
    folder: String,
}

fn folder_or_default(value: Option<&str>) -> MediaFolder {
    value
        .and_then(|value| MediaFolder::parse(value.trim()))
        .unwrap_or(MediaFolder::ALL[0])
}

fn folder_path(folder: MediaFolder) -> String {
    format!("/admin/media?folder={}", folder.as_str())
}

fn redirect_to_folder(folder: MediaFolder, key: &str, message: &str) -> Response {
    redirect_with(&folder_path(folder), key, message)
}

pub(super) async fn admin_media(
    State(state): State<AdminState>,
    Query(query): Query<MediaQuery>,
) -> Response {
    let folder = folder_or_default(query.folder.as_deref());
    match state.media.list(folder).await {
        Ok(objects) => {
            let content = AdminMediaLibraryView::build(
                folder,
                &objects,
                state.media.max_bytes(),
                state.timezone,
            );
            let view = layout(&state, "/admin/media", "メディア", content)
                .with_notice(blank_to_none(query.notice))
                .with_error(blank_to_none(query.error));
            render(AdminMediaTemplate { view })
        }
        Err(err) => load_failure(SOURCE_BASE, err),
    }
}

struct UploadPayload {
    folder: MediaFolder,
    filename: String,
    content_type: String,
    data: Bytes,
}

enum UploadPayloadError {
    Missing,
    PayloadTooLarge,
    InvalidFormData,
}

impl UploadPayloadError {
    fn message(&self) -> &'static str {
        match self {
            UploadPayloadError::Missing => "ファイルが選択されていません",
            UploadPayloadError::PayloadTooLarge => "ファイルサイズが上限を超えています",
            UploadPayloadError::InvalidFormData => "アップロード内容を読み取れませんでした",
        }
    }
}

async fn read_upload_payload(multipart: &mut Multipart) -> Result<UploadPayload, UploadPayloadError> {
    let mut folder = None;
    let mut file = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name() {
                Some("folder") => {
                    let value = field
                        .text()
                        .await
                        .map_err(|_| UploadPayloadError::InvalidFormData)?;
                    folder = MediaFolder::parse(value.trim());
                }
                Some("file") => {
                    let filename = field
                        .file_name()
                        .map(|value| value.to_string())
                        .filter(|value| !value.trim().is_empty())
                        .unwrap_or_else(|| "upload.bin".to_string());
                    let content_type = field
                        .content_type()
                        .map(|mime| mime.to_string())
                        .unwrap_or_else(|| {
                            mime_guess::from_path(&filename)
                                .first_or_octet_stream()
                                .to_string()
                        });
                    let data = field.bytes().await.map_err(|err| match err.status() {
                        StatusCode::PAYLOAD_TOO_LARGE => UploadPayloadError::PayloadTooLarge,
                        _ => UploadPayloadError::InvalidFormData,
                    })?;
                    file = Some((filename, content_type, data));
                }
                _ => continue,
            },
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                warn!(
                    target = SOURCE_BASE,
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(match status {
                    StatusCode::PAYLOAD_TOO_LARGE => UploadPayloadError::PayloadTooLarge,
                    _ => UploadPayloadError::InvalidFormData,
                });
            }
        }
    }

    let (filename, content_type, data) = file.ok_or(UploadPayloadError::Missing)?;
    Ok(UploadPayload {
        folder: folder.unwrap_or(MediaFolder::ALL[0]),
        filename,
        content_type,
        data,
    })
}

pub(super) async fn admin_media_upload(
    State(state): State<AdminState>,
    mut multipart: Multipart,
) -> Response {
    let payload = match read_upload_payload(&mut multipart).await {
        Ok(payload) => payload,
        Err(err) => return redirect_error("/admin/media", err.message()),
    };
    let folder = payload.folder;
    match state
        .media
        .upload(folder, &payload.filename, &payload.content_type, payload.data)
        .await
    {
        Ok(object) => redirect_to_folder(
            folder,
            "notice",
            &format!("「{}」をアップロードしました", object.name),
        ),
        Err(err) => {
            let message = failure_message(
                "infra::http::admin::media::upload",
                &err,
                LABEL,
                AdminAction::Upload,
            );
            redirect_to_folder(folder, "error", &message)
        }
    }
}

pub(super) async fn admin_media_delete(
    State(state): State<AdminState>,
    Form(form): Form<MediaDeleteForm>,
) -> Response {
    let folder = folder_or_default(Some(&form.folder));
    match state.media.remove(form.path.trim()).await {
        Ok(()) => redirect_to_folder(folder, "notice", "ファイルを削除しました"),
        Err(err) => action_failure(
            "infra::http::admin::media::delete",
            &folder_path(folder),
            err,
            LABEL,
            AdminAction::Delete,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_folder_falls_back_to_first() {
        assert_eq!(folder_or_default(Some("secrets")), MediaFolder::ALL[0]);
        assert_eq!(folder_or_default(None), MediaFolder::ALL[0]);
        let news = MediaFolder::ALL[MediaFolder::ALL.len() - 1];
        assert_eq!(folder_or_default(Some(news.as_str())), news);
    }

    #[test]
    fn folder_redirect_keeps_folder_and_message() {
        let response = redirect_to_folder(MediaFolder::ALL[0], "notice", "完了");
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(location.starts_with(&format!(
            "/admin/media?folder={}&notice=",
            MediaFolder::ALL[0].as_str()
        )));
    }
}
