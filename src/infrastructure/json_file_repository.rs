// JSON file repository - Dashboards kept in memory and written through to a single file
use crate::application::dashboard_repository::{DashboardRecord, DashboardRepository, ReplaceOutcome};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct JsonFileRepository {
    path: Option<PathBuf>,
    records: RwLock<Vec<DashboardRecord>>,
}

impl JsonFileRepository {
    /// Load existing records from `path`; a missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse dashboards file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read dashboards file {}", path.display()));
            }
        };
        tracing::info!("Loaded {} dashboards from {}", records.len(), path.display());
        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Repository that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(Vec::new()),
        }
    }

    async fn persist(&self, records: &[DashboardRecord]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, json)
            .await
            .context("Failed to write dashboards file")?;
        tokio::fs::rename(&tmp, path)
            .await
            .context("Failed to replace dashboards file")?;
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for JsonFileRepository {
    async fn list(&self) -> Result<Vec<DashboardRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<DashboardRecord>> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, record: DashboardRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            anyhow::bail!("dashboard {} already exists", record.id);
        }
        let mut next = records.clone();
        if record.is_default {
            clear_defaults(&mut next);
        }
        next.push(record);
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }

    async fn replace(&self, record: DashboardRecord, expected_version: u64) -> Result<ReplaceOutcome> {
        let mut records = self.records.write().await;
        let Some(pos) = records.iter().position(|r| r.id == record.id) else {
            return Ok(ReplaceOutcome::NotFound);
        };
        if records[pos].version != expected_version {
            return Ok(ReplaceOutcome::VersionMismatch {
                current: records[pos].version,
            });
        }
        let mut next = records.clone();
        if record.is_default {
            clear_defaults(&mut next);
        }
        next[pos] = record;
        self.persist(&next).await?;
        *records = next;
        Ok(ReplaceOutcome::Replaced)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        if !records.iter().any(|r| r.id == id) {
            return Ok(false);
        }
        let next: Vec<DashboardRecord> = records.iter().filter(|r| r.id != id).cloned().collect();
        self.persist(&next).await?;
        *records = next;
        Ok(true)
    }
}

fn clear_defaults(records: &mut [DashboardRecord]) {
    for record in records.iter_mut().filter(|r| r.is_default) {
        record.set_default(false);
    }
}
