//! Admin CMS services: one per content type, plus media and dashboard.

pub mod dashboard;
pub mod faqs;
pub mod grants;
pub mod interviews;
pub mod media;
pub mod news;
pub mod organizations;
pub mod taxonomy;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::RepoError;
use crate::application::slugs::SlugResolveError;
use crate::application::storage::StorageError;
use crate::application::summary::SummaryError;
use crate::application::validation::FieldErrors;
use crate::domain::slug::{SlugAsyncError, SlugError};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("record not found")]
    NotFound,
    #[error("record is referenced by {count} rows")]
    InUse { count: u64 },
    #[error("at most {max} organizations may be featured")]
    FeaturedLimit { max: u64 },
    #[error(transparent)]
    Slug(SlugError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<FieldErrors> for AdminError {
    fn from(errors: FieldErrors) -> Self {
        AdminError::Validation(errors)
    }
}

impl From<SlugResolveError> for AdminError {
    fn from(error: SlugResolveError) -> Self {
        match error {
            SlugAsyncError::Slug(SlugError::EmptyInput) => AdminError::Validation(
                FieldErrors::single(
                    "slug",
                    "スラッグに使える文字（英数字・ひらがな・カタカナ・漢字）が含まれていません",
                ),
            ),
            SlugAsyncError::Slug(err) => AdminError::Slug(err),
            SlugAsyncError::Predicate(err) => AdminError::Repo(err),
        }
    }
}

/// What the admin was doing when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Create,
    Update,
    Delete,
    Publish,
    Feature,
    Reorder,
    Upload,
    Summarize,
    Load,
}

impl AdminAction {
    pub fn label(self) -> &'static str {
        match self {
            AdminAction::Create => "作成",
            AdminAction::Update => "更新",
            AdminAction::Delete => "削除",
            AdminAction::Publish => "公開設定の変更",
            AdminAction::Feature => "注目設定の変更",
            AdminAction::Reorder => "並び替え",
            AdminAction::Upload => "アップロード",
            AdminAction::Summarize => "要約の生成",
            AdminAction::Load => "読み込み",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdminAction::Create => "create",
            AdminAction::Update => "update",
            AdminAction::Delete => "delete",
            AdminAction::Publish => "publish",
            AdminAction::Feature => "feature",
            AdminAction::Reorder => "reorder",
            AdminAction::Upload => "upload",
            AdminAction::Summarize => "summarize",
            AdminAction::Load => "load",
        }
    }
}

pub(crate) fn record_mutation(entity: &'static str, action: AdminAction, id: &uuid::Uuid) {
    counter!(
        "tsunagu_admin_mutations_total",
        "entity" => entity,
        "action" => action.as_str()
    )
    .increment(1);
    info!(
        target = "tsunagu::application::admin",
        entity,
        action = action.as_str(),
        id = %id,
        "admin mutation applied"
    );
}

impl AdminError {
    /// Whether the failure is a refusal or bad input rather than a fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AdminError::Validation(_)
                | AdminError::NotFound
                | AdminError::InUse { .. }
                | AdminError::FeaturedLimit { .. }
                | AdminError::Slug(_)
                | AdminError::Repo(RepoError::Duplicate { .. })
                | AdminError::Storage(
                    StorageError::UnsupportedType { .. }
                        | StorageError::EmptyPayload
                        | StorageError::TooLarge { .. }
                        | StorageError::InvalidPath
                )
                | AdminError::Summary(SummaryError::NotConfigured | SummaryError::EmptyInput)
        )
    }

    /// Localized message shown to the admin; `entity` is the content label
    /// (e.g. `団体`).
    pub fn user_message(&self, entity: &str, action: AdminAction) -> String {
        match self {
            AdminError::Validation(_) => "入力内容を確認してください".to_string(),
            AdminError::NotFound => format!("{entity}が見つかりません"),
            AdminError::InUse { count } => {
                format!("この{entity}は{count}件で使用されているため削除できません")
            }
            AdminError::FeaturedLimit { max } => {
                format!("注目団体は最大{max}件までです。先に他の団体の注目を解除してください")
            }
            AdminError::Slug(SlugError::Exhausted { base }) => {
                format!("スラッグ「{base}」は使用済みのため、別のスラッグを指定してください")
            }
            AdminError::Slug(SlugError::EmptyInput) => {
                "スラッグに使える文字が含まれていません".to_string()
            }
            AdminError::Repo(RepoError::Duplicate { .. }) => {
                "同じスラッグの項目が既に存在します".to_string()
            }
            AdminError::Storage(StorageError::UnsupportedType { .. }) => {
                "画像またはPDFのみアップロードできます".to_string()
            }
            AdminError::Storage(StorageError::EmptyPayload) => {
                "ファイルが選択されていません".to_string()
            }
            AdminError::Storage(StorageError::TooLarge { limit }) => {
                format!("ファイルサイズは{}MBまでです", limit / (1024 * 1024))
            }
            AdminError::Summary(SummaryError::NotConfigured) => {
                "要約生成のAPIキーが設定されていません".to_string()
            }
            AdminError::Summary(SummaryError::EmptyInput) => {
                "要約する本文がありません".to_string()
            }
            _ => format!("{entity}の{}に失敗しました", action.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failures_use_generic_message() {
        let err = AdminError::Repo(RepoError::from_persistence("connection reset"));
        assert!(!err.is_user_error());
        assert_eq!(
            err.user_message("団体", AdminAction::Create),
            "団体の作成に失敗しました"
        );
    }

    #[test]
    fn refusals_name_the_reason() {
        let err = AdminError::InUse { count: 4 };
        assert!(err.is_user_error());
        assert_eq!(
            err.user_message("カテゴリ", AdminAction::Delete),
            "このカテゴリは4件で使用されているため削除できません"
        );

        let err = AdminError::FeaturedLimit { max: 3 };
        assert!(err.user_message("団体", AdminAction::Feature).contains("最大3件"));
    }

    #[test]
    fn empty_slug_becomes_field_error() {
        let err = AdminError::from(SlugResolveError::Slug(SlugError::EmptyInput));
        match err {
            AdminError::Validation(fields) => assert!(fields.first("slug").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
