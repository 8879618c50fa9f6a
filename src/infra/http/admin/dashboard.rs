use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::presentation::admin::views::{AdminDashboardTemplate, AdminDashboardView};

use super::{
    AdminState,
    shared::{FlashQuery, layout, load_failure, render},
};

pub(super) async fn admin_dashboard(
    State(state): State<AdminState>,
    Query(flash): Query<FlashQuery>,
) -> Response {
    match state.dashboard.overview().await {
        Ok(overview) => {
            let content = AdminDashboardView::build(&overview);
            let view = flash.apply(layout(&state, "/admin", "ダッシュボード", content));
            render(AdminDashboardTemplate { view })
        }
        Err(err) => load_failure("infra::http::admin::dashboard", err),
    }
}
