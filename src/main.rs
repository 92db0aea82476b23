// Main entry point - Dependency injection and server setup
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracker_dashboard::application::dashboard_service::{CreateDashboard, DashboardService};
use tracker_dashboard::application::layout_session::{LayoutSession, LoadSource};
use tracker_dashboard::application::persistence::{serialize_dashboard, PersistenceAdapter, RemoteDashboardSync};
use tracker_dashboard::application::widget_registry::WidgetRegistry;
use tracker_dashboard::infrastructure::config::{load_app_config, AppConfig};
use tracker_dashboard::infrastructure::json_file_repository::JsonFileRepository;
use tracker_dashboard::infrastructure::local_storage::FileStorage;
use tracker_dashboard::infrastructure::remote_sync::SimulatedRemoteSync;
use tracker_dashboard::presentation::app_state::AppState;
use tracker_dashboard::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Infrastructure
    let registry = Arc::new(WidgetRegistry::with_defaults());
    let repository = Arc::new(JsonFileRepository::open(&config.storage.dashboards_file).await?);

    // Application services
    let dashboard_service = DashboardService::new(repository, registry.clone());
    seed_from_local_layout(&config, &registry, &dashboard_service).await?;

    let state = Arc::new(AppState {
        dashboard_service,
        registry,
    });

    // Start server
    let addr = config.server.socket_addr()?;
    tracing::info!("Starting tracker-dashboard service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Make sure a local layout exists and, on first start, publish it as the default dashboard.
async fn seed_from_local_layout(
    config: &AppConfig,
    registry: &Arc<WidgetRegistry>,
    service: &DashboardService,
) -> anyhow::Result<()> {
    let local = PersistenceAdapter::new(Arc::new(FileStorage::new(&config.storage.data_dir)?));
    let remote: Option<Arc<dyn RemoteDashboardSync>> = if config.sync.remote_enabled {
        Some(Arc::new(SimulatedRemoteSync::new(local.clone(), config.sync.remote_delay())))
    } else {
        None
    };

    let mut session = LayoutSession::new(registry.clone(), local, remote);
    let source = session.load().await;
    tracing::info!("Local layout loaded from {:?}", source);
    match source {
        LoadSource::Default => session.save().await?,
        LoadSource::Rejected => tracing::warn!("Keeping the unreadable local layout in place"),
        LoadSource::Local | LoadSource::Remote => {}
    }

    if !service.list().await?.is_empty() {
        return Ok(());
    }
    let Some(dashboard) = session.store().dashboard() else {
        return Ok(());
    };
    let layout = serialize_dashboard(dashboard, session.store().widget_instances());
    let record = service
        .create(CreateDashboard {
            name: dashboard.name.clone(),
            layout: Some(serde_json::to_value(&layout)?),
            is_default: Some(true),
        })
        .await?;
    tracing::info!("Seeded dashboard {} from local layout", record.id);
    Ok(())
}
