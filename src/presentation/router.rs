// Route table for the REST API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_dashboard, create_from_template, delete_dashboard, get_dashboard, health_check, list_dashboards,
    list_templates, list_widgets, update_dashboard, widget_categories,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/dashboards", get(list_dashboards).post(create_dashboard))
        .route(
            "/api/dashboards/:id",
            get(get_dashboard).put(update_dashboard).delete(delete_dashboard),
        )
        .route("/api/dashboards/from-template/:template_id", post(create_from_template))
        .route("/api/widgets", get(list_widgets))
        .route("/api/widgets/categories", get(widget_categories))
        .route("/api/templates", get(list_templates))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
