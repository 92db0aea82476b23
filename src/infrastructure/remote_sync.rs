// Remote sync stub - Round-trips through local storage after a simulated network delay
use crate::application::persistence::{PersistenceAdapter, RemoteDashboardSync, SerializedDashboard};
use async_trait::async_trait;
use std::time::Duration;

// TODO: replace with an HTTP client against /api/dashboards once conflict handling for
// multi-device edits is designed; this stub never conflicts.
#[derive(Clone)]
pub struct SimulatedRemoteSync {
    local: PersistenceAdapter,
    delay: Duration,
}

impl SimulatedRemoteSync {
    pub fn new(local: PersistenceAdapter, delay: Duration) -> Self {
        Self { local, delay }
    }
}

#[async_trait]
impl RemoteDashboardSync for SimulatedRemoteSync {
    async fn save_remote(&self, payload: &SerializedDashboard) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        self.local.save_serialized(payload)?;
        tracing::debug!("Remote save of dashboard {} completed", payload.dashboard.id);
        Ok(())
    }

    async fn load_remote(&self) -> anyhow::Result<Option<SerializedDashboard>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.local.load_serialized())
    }
}
