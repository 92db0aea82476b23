// Layout session - Connects the dashboard store to local storage and remote sync
use crate::application::dashboard_store::DashboardStore;
use crate::application::persistence::{serialize_dashboard, PersistenceAdapter, RemoteDashboardSync};
use crate::application::templates::TemplateCatalog;
use crate::application::widget_registry::WidgetRegistry;
use crate::domain::dashboard::{create_default_dashboard, WidgetInstances};
use std::sync::Arc;

/// Where the state returned by [`LayoutSession::load`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Local,
    Remote,
    Default,
    /// A stored layout exists but could not be used; the default dashboard is
    /// loaded in memory and storage is left as it was.
    Rejected,
}

pub struct LayoutSession {
    store: DashboardStore,
    local: PersistenceAdapter,
    remote: Option<Arc<dyn RemoteDashboardSync>>,
}

impl LayoutSession {
    pub fn new(
        registry: Arc<WidgetRegistry>,
        local: PersistenceAdapter,
        remote: Option<Arc<dyn RemoteDashboardSync>>,
    ) -> Self {
        Self {
            store: DashboardStore::new(registry),
            local,
            remote,
        }
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DashboardStore {
        &mut self.store
    }

    /// Local storage first, then the remote copy, then a fresh default dashboard.
    pub async fn load(&mut self) -> LoadSource {
        if let Some((dashboard, instances)) = self.local.load_from_local() {
            self.store.load(dashboard, instances);
            return LoadSource::Local;
        }
        let rejected_local = self.local.has_stored_layout();

        if let Some(remote) = &self.remote {
            match remote.load_remote().await {
                Ok(Some(payload)) => {
                    let (dashboard, instances) = payload.into_parts();
                    self.store.load(dashboard, instances);
                    return LoadSource::Remote;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Remote dashboard load failed: {}", e),
            }
        }

        self.store.load(create_default_dashboard(), WidgetInstances::new());
        if rejected_local {
            tracing::warn!("Stored dashboard was rejected, using the default dashboard");
            return LoadSource::Rejected;
        }
        LoadSource::Default
    }

    /// Commit the current layout and write it locally, then remotely when configured.
    /// A remote failure is logged and does not undo the local write.
    pub async fn save(&mut self) -> anyhow::Result<()> {
        self.store.save_current_layout();
        let Some(dashboard) = self.store.dashboard() else {
            return Ok(());
        };
        let payload = serialize_dashboard(dashboard, self.store.widget_instances());
        self.local.save_serialized(&payload)?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.save_remote(&payload).await {
                tracing::warn!("Remote dashboard save failed: {}", e);
            }
        }
        tracing::info!("Saved dashboard {}", payload.dashboard.id);
        Ok(())
    }

    pub fn discard(&mut self) {
        self.store.discard_changes();
    }

    /// Replace the current dashboard with a template. Nothing is written until [`save`](Self::save).
    pub fn apply_template(&mut self, template_id: &str) -> bool {
        let Some(template) = TemplateCatalog::build(template_id, self.store.registry()) else {
            tracing::warn!("Unknown dashboard template {}", template_id);
            return false;
        };
        self.store.load(template.dashboard, template.widget_instances);
        true
    }

    /// Forget the stored layout and start from the default dashboard.
    pub fn reset_to_default(&mut self) -> anyhow::Result<()> {
        self.local.clear_local()?;
        self.store.load(create_default_dashboard(), WidgetInstances::new());
        Ok(())
    }
}
