// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::widget_registry::WidgetRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub registry: Arc<WidgetRegistry>,
}
