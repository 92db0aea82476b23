// Dashboard service - Use cases for stored dashboards
use crate::application::dashboard_repository::{DashboardRecord, DashboardRepository, ReplaceOutcome};
use crate::application::persistence::{deserialize_value, serialize_dashboard, SerializedDashboard};
use crate::application::templates::TemplateCatalog;
use crate::application::widget_registry::WidgetRegistry;
use crate::domain::dashboard::{create_default_dashboard, new_id, WidgetInstances};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("dashboard {0} not found")]
    NotFound(String),
    #[error("dashboard was modified: expected version {expected}, current version {current}")]
    VersionConflict { expected: u64, current: u64 },
    #[error("{0}")]
    Validation(String),
    #[error("unknown template {0}")]
    UnknownTemplate(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDashboard {
    pub name: String,
    #[serde(default)]
    pub layout: Option<Value>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromTemplate {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDashboard {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub layout: Option<Value>,
    #[serde(default)]
    pub is_default: Option<bool>,
    pub version: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
    registry: Arc<WidgetRegistry>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn DashboardRepository>, registry: Arc<WidgetRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    pub async fn list(&self) -> Result<Vec<DashboardRecord>, DashboardError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<DashboardRecord, DashboardError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DashboardError::NotFound(id.to_string()))
    }

    /// Create a dashboard; without a layout it starts as the default single-row dashboard.
    pub async fn create(&self, request: CreateDashboard) -> Result<DashboardRecord, DashboardError> {
        let name = validate_name(&request.name)?;
        let layout = match request.layout {
            Some(value) => self.parse_layout(value)?,
            None => serialize_dashboard(&create_default_dashboard(), &WidgetInstances::new()),
        };
        self.insert(name, layout, request.is_default.unwrap_or(false)).await
    }

    pub async fn create_from_template(
        &self,
        template_id: &str,
        request: CreateFromTemplate,
    ) -> Result<DashboardRecord, DashboardError> {
        let template = TemplateCatalog::build(template_id, &self.registry)
            .ok_or_else(|| DashboardError::UnknownTemplate(template_id.to_string()))?;
        let name = match request.name {
            Some(n) => validate_name(&n)?,
            None => template.dashboard.name.clone(),
        };
        let layout = serialize_dashboard(&template.dashboard, &template.widget_instances);
        self.insert(name, layout, false).await
    }

    /// Apply changes if `request.version` matches the stored version.
    pub async fn update(&self, id: &str, request: UpdateDashboard) -> Result<DashboardRecord, DashboardError> {
        let current = self.get(id).await?;
        if current.version != request.version {
            return Err(DashboardError::VersionConflict {
                expected: request.version,
                current: current.version,
            });
        }

        let mut next = current.clone();
        if let Some(name) = &request.name {
            next.name = validate_name(name)?;
        }
        if let Some(value) = request.layout {
            next.layout = self.parse_layout(value)?;
        }
        next.set_default(request.is_default.unwrap_or(current.is_default));
        next.layout.dashboard.name = next.name.clone();
        next.version = current.version + 1;
        next.updated_at = Utc::now();

        match self.repository.replace(next.clone(), request.version).await? {
            ReplaceOutcome::Replaced => {}
            ReplaceOutcome::NotFound => return Err(DashboardError::NotFound(id.to_string())),
            ReplaceOutcome::VersionMismatch { current } => {
                return Err(DashboardError::VersionConflict {
                    expected: request.version,
                    current,
                });
            }
        }
        tracing::info!("Updated dashboard {} to version {}", id, next.version);
        Ok(next)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DashboardError> {
        if !self.repository.delete(id).await? {
            return Err(DashboardError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted dashboard {}", id);
        Ok(())
    }

    async fn insert(
        &self,
        name: String,
        mut layout: SerializedDashboard,
        is_default: bool,
    ) -> Result<DashboardRecord, DashboardError> {
        layout.dashboard.name = name.clone();
        let now = Utc::now();
        let mut record = DashboardRecord {
            id: new_id("dashboard"),
            name,
            layout,
            is_default,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        record.set_default(is_default);
        self.repository.insert(record.clone()).await?;
        tracing::info!("Created dashboard {}", record.id);
        Ok(record)
    }

    /// Structure check plus: every placed widget must be a known widget type.
    fn parse_layout(&self, value: Value) -> Result<SerializedDashboard, DashboardError> {
        let layout = deserialize_value(value)
            .ok_or_else(|| DashboardError::Validation("layout is not a valid dashboard".to_string()))?;
        if let Some(unknown) = layout
            .widget_instances
            .values()
            .find(|w| !self.registry.contains(&w.widget_type_id))
        {
            return Err(DashboardError::Validation(format!(
                "unknown widget type {}",
                unknown.widget_type_id
            )));
        }
        Ok(layout)
    }
}

fn validate_name(name: &str) -> Result<String, DashboardError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::Validation("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DashboardError::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::json_file_repository::JsonFileRepository;
    use serde_json::json;

    fn service() -> DashboardService {
        DashboardService::new(
            Arc::new(JsonFileRepository::in_memory()),
            Arc::new(WidgetRegistry::with_defaults()),
        )
    }

    fn create(name: &str) -> CreateDashboard {
        CreateDashboard {
            name: name.to_string(),
            layout: None,
            is_default: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_single_row() {
        let svc = service();
        let record = svc.create(create("  Daily  ")).await.unwrap();
        assert_eq!(record.name, "Daily");
        assert_eq!(record.version, 1);
        assert_eq!(record.layout.version, "1.0");
        assert_eq!(record.layout.dashboard.rows.len(), 1);
        assert_eq!(record.layout.dashboard.name, "Daily");
        assert_eq!(svc.get(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let svc = service();
        assert!(matches!(svc.create(create("   ")).await, Err(DashboardError::Validation(_))));
        assert!(matches!(
            svc.create(create(&"x".repeat(101))).await,
            Err(DashboardError::Validation(_))
        ));

        let mut bad_layout = create("Bad");
        bad_layout.layout = Some(json!({"version": "1.0", "dashboard": {"id": "d"}}));
        assert!(matches!(svc.create(bad_layout).await, Err(DashboardError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_widget_type() {
        let svc = service();
        let mut request = create("Custom");
        request.layout = Some(json!({
            "version": "1.0",
            "dashboard": {"id": "d", "name": "n", "rows": [
                {"id": "r", "layout": {"id": "l", "columns": [{"id": "c", "widthPercentage": 100, "widgetId": "w"}]}}
            ]},
            "widgetInstances": {"w": {"id": "w", "widgetTypeId": "bong-counter"}}
        }));
        assert!(matches!(svc.create(request).await, Err(DashboardError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_conflict() {
        let svc = service();
        let record = svc.create(create("Main")).await.unwrap();

        let updated = svc
            .update(
                &record.id,
                UpdateDashboard {
                    name: Some("Renamed".to_string()),
                    layout: None,
                    is_default: None,
                    version: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.layout.dashboard.name, "Renamed");

        let stale = svc
            .update(
                &record.id,
                UpdateDashboard {
                    name: Some("Again".to_string()),
                    layout: None,
                    is_default: None,
                    version: 1,
                },
            )
            .await;
        assert!(matches!(
            stale,
            Err(DashboardError::VersionConflict { expected: 1, current: 2 })
        ));
    }

    #[tokio::test]
    async fn test_single_default_dashboard() {
        let svc = service();
        let mut first = create("First");
        first.is_default = Some(true);
        let first = svc.create(first).await.unwrap();
        let mut second = create("Second");
        second.is_default = Some(true);
        let second = svc.create(second).await.unwrap();

        assert!(!svc.get(&first.id).await.unwrap().is_default);
        assert!(svc.get(&second.id).await.unwrap().is_default);
    }

    #[tokio::test]
    async fn test_default_flag_matches_stored_layout() {
        let svc = service();
        let plain = svc.create(create("Plain")).await.unwrap();
        assert!(!plain.is_default);
        assert_eq!(plain.layout.dashboard.is_default, Some(false));

        let mut first = create("First");
        first.is_default = Some(true);
        let first = svc.create(first).await.unwrap();
        assert_eq!(first.layout.dashboard.is_default, Some(true));

        let mut second = create("Second");
        second.is_default = Some(true);
        svc.create(second).await.unwrap();
        let first = svc.get(&first.id).await.unwrap();
        assert!(!first.is_default);
        assert_eq!(first.layout.dashboard.is_default, Some(false));

        let promoted = svc
            .update(
                &plain.id,
                UpdateDashboard {
                    name: None,
                    layout: None,
                    is_default: Some(true),
                    version: 1,
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_default);
        assert_eq!(promoted.layout.dashboard.is_default, Some(true));
    }

    #[tokio::test]
    async fn test_concurrent_default_creates_leave_one_default() {
        let svc = service();
        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                let mut request = create(&format!("Board {i}"));
                request.is_default = Some(true);
                svc.create(request).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let records = svc.list().await.unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records.iter().filter(|r| r.is_default).count(), 1);
        assert_eq!(
            records
                .iter()
                .filter(|r| r.layout.dashboard.is_default == Some(true))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_from_template_and_delete() {
        let svc = service();
        let record = svc
            .create_from_template("sessions-overview", CreateFromTemplate::default())
            .await
            .unwrap();
        assert_eq!(record.name, "Sessions Overview");
        assert_eq!(record.layout.dashboard.rows.len(), 3);
        assert!(!record.layout.widget_instances.is_empty());

        assert!(matches!(
            svc.create_from_template("nope", CreateFromTemplate::default()).await,
            Err(DashboardError::UnknownTemplate(_))
        ));

        svc.delete(&record.id).await.unwrap();
        assert!(matches!(svc.get(&record.id).await, Err(DashboardError::NotFound(_))));
        assert!(matches!(svc.delete(&record.id).await, Err(DashboardError::NotFound(_))));
    }
}
