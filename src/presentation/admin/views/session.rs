use askama::Template;

#[derive(Clone)]
pub struct AdminLoginView {
    pub site_title: String,
    pub asset_version: String,
    pub form_action: String,
    pub error: Option<String>,
    /// No admin password is configured, so the form is disabled.
    pub disabled: bool,
}

impl AdminLoginView {
    pub fn new(site_title: &str, error: Option<String>, disabled: bool) -> Self {
        Self {
            site_title: site_title.to_string(),
            asset_version: env!("CARGO_PKG_VERSION").to_string(),
            form_action: "/admin/login".to_string(),
            error,
            disabled,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub view: AdminLoginView,
}
