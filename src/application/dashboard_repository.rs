// Repository trait for stored dashboards
use crate::application::persistence::SerializedDashboard;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dashboard as kept by the server. `version` increases by one on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRecord {
    pub id: String,
    pub name: String,
    pub layout: SerializedDashboard,
    pub is_default: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DashboardRecord {
    /// Set the default flag on the record and on its stored dashboard.
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
        self.layout.dashboard.is_default = Some(is_default);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    Replaced,
    NotFound,
    VersionMismatch { current: u64 },
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// All dashboards, oldest first
    async fn list(&self) -> anyhow::Result<Vec<DashboardRecord>>;

    async fn get(&self, id: &str) -> anyhow::Result<Option<DashboardRecord>>;

    /// Add a new record. A default record clears the default flag on all others in the same write.
    async fn insert(&self, record: DashboardRecord) -> anyhow::Result<()>;

    /// Store `record` only if the stored version still equals `expected_version`.
    /// A default record clears the default flag on all others in the same write.
    async fn replace(&self, record: DashboardRecord, expected_version: u64) -> anyhow::Result<ReplaceOutcome>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}
