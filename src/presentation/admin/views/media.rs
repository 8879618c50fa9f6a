use askama::Template;
use chrono_tz::Tz;

use crate::application::storage::StoredObject;
use crate::domain::types::MediaFolder;
use crate::presentation::format::format_bytes;

use super::{AdminLayout, admin_timestamp};

#[derive(Clone)]
pub struct AdminMediaFolderTab {
    pub label: String,
    pub href: String,
    pub value: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminMediaObjectView {
    pub name: String,
    pub path: String,
    pub public_url: String,
    pub content_type: String,
    pub size: String,
    pub modified: Option<String>,
    pub is_image: bool,
}

#[derive(Clone)]
pub struct AdminMediaLibraryView {
    pub folders: Vec<AdminMediaFolderTab>,
    pub active_folder: String,
    pub objects: Vec<AdminMediaObjectView>,
    pub upload_action: String,
    pub delete_action: String,
    pub max_size: String,
}

impl AdminMediaLibraryView {
    pub fn build(active: MediaFolder, objects: &[StoredObject], max_bytes: u64, tz: Tz) -> Self {
        Self {
            folders: MediaFolder::ALL
                .into_iter()
                .map(|folder| AdminMediaFolderTab {
                    label: folder.label().to_string(),
                    href: format!("/admin/media?folder={}", folder.as_str()),
                    value: folder.as_str().to_string(),
                    is_active: folder == active,
                })
                .collect(),
            active_folder: active.as_str().to_string(),
            objects: objects
                .iter()
                .map(|object| AdminMediaObjectView {
                    name: object.name.clone(),
                    path: object.path.clone(),
                    public_url: object.public_url.clone(),
                    content_type: object.content_type.clone(),
                    size: format_bytes(object.size_bytes),
                    modified: object.modified_at.map(|at| admin_timestamp(at, tz)),
                    is_image: object.content_type.starts_with("image/"),
                })
                .collect(),
            upload_action: "/admin/media".to_string(),
            delete_action: "/admin/media/delete".to_string(),
            max_size: format_bytes(max_bytes),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/media.html")]
pub struct AdminMediaTemplate {
    pub view: AdminLayout<AdminMediaLibraryView>,
}
