// Persistence adapter - Versioned serialization of a dashboard and its widget instances
use crate::domain::dashboard::{Dashboard, WidgetInstances};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const STORAGE_VERSION: &str = "1.0";
pub const LAYOUT_KEY: &str = "tracker.dashboard.layout";
pub const LAST_SYNC_KEY: &str = "tracker.dashboard.lastSync";

/// Stored form: `{ version, dashboard, widgetInstances }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDashboard {
    pub version: String,
    pub dashboard: Dashboard,
    #[serde(default)]
    pub widget_instances: WidgetInstances,
}

impl SerializedDashboard {
    pub fn into_parts(self) -> (Dashboard, WidgetInstances) {
        (self.dashboard, self.widget_instances)
    }
}

/// String key-value store with browser local-storage semantics.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

/// Remote copy of the layout.
#[async_trait]
pub trait RemoteDashboardSync: Send + Sync {
    async fn save_remote(&self, payload: &SerializedDashboard) -> anyhow::Result<()>;
    async fn load_remote(&self) -> anyhow::Result<Option<SerializedDashboard>>;
}

pub fn serialize_dashboard(dashboard: &Dashboard, widget_instances: &WidgetInstances) -> SerializedDashboard {
    SerializedDashboard {
        version: STORAGE_VERSION.to_string(),
        dashboard: dashboard.clone(),
        widget_instances: widget_instances.clone(),
    }
}

/// Parse stored JSON. Malformed or structurally invalid input yields `None`.
pub fn deserialize_dashboard(json: &str) -> Option<(Dashboard, WidgetInstances)> {
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Stored dashboard is not valid JSON: {}", e);
            return None;
        }
    };
    deserialize_value(value).map(SerializedDashboard::into_parts)
}

/// Validate and decode an already parsed payload, clearing dangling widget references.
pub fn deserialize_value(value: Value) -> Option<SerializedDashboard> {
    let Some(dashboard) = value.get("dashboard") else {
        tracing::warn!("Stored dashboard payload has no dashboard field");
        return None;
    };
    if !validate_dashboard_structure(dashboard) {
        tracing::warn!("Stored dashboard failed structure validation");
        return None;
    }

    match value.get("version").and_then(Value::as_str) {
        Some(STORAGE_VERSION) => {}
        other => tracing::warn!("Stored dashboard has version {:?}, expected {}", other, STORAGE_VERSION),
    }

    let mut payload: SerializedDashboard = match serde_json::from_value(value) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Stored dashboard could not be decoded: {}", e);
            return None;
        }
    };
    for warning in sanitize_widget_refs(&mut payload.dashboard, &payload.widget_instances) {
        tracing::warn!("{}", warning);
    }
    Some(payload)
}

/// Shape check on the raw dashboard object: ids, name, rows, layouts, columns and widths.
pub fn validate_dashboard_structure(dashboard: &Value) -> bool {
    let has_str = |v: &Value, key: &str| v.get(key).map(Value::is_string).unwrap_or(false);

    if !has_str(dashboard, "id") || !has_str(dashboard, "name") {
        return false;
    }
    let Some(rows) = dashboard.get("rows").and_then(Value::as_array) else {
        return false;
    };

    rows.iter().all(|row| {
        if !has_str(row, "id") {
            return false;
        }
        let Some(layout) = row.get("layout") else {
            return false;
        };
        if !has_str(layout, "id") {
            return false;
        }
        let Some(columns) = layout.get("columns").and_then(Value::as_array) else {
            return false;
        };
        columns.iter().all(|col| {
            has_str(col, "id") && col.get("widthPercentage").map(Value::is_number).unwrap_or(false)
        })
    })
}

/// Clear column references to instances that do not exist. Returns one warning per cleared column.
pub fn sanitize_widget_refs(dashboard: &mut Dashboard, widget_instances: &WidgetInstances) -> Vec<String> {
    let mut warnings = Vec::new();
    for row in &mut dashboard.rows {
        for column in &mut row.layout.columns {
            if let Some(id) = &column.widget_id {
                if !widget_instances.contains_key(id) {
                    warnings.push(format!("column {} referenced missing widget {}", column.id, id));
                    column.widget_id = None;
                }
            }
        }
    }
    warnings
}

#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn KeyValueStorage>,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn save_to_local(&self, dashboard: &Dashboard, widget_instances: &WidgetInstances) -> anyhow::Result<()> {
        self.save_serialized(&serialize_dashboard(dashboard, widget_instances))
    }

    pub fn save_serialized(&self, payload: &SerializedDashboard) -> anyhow::Result<()> {
        let json = serde_json::to_string(payload)?;
        self.storage.set_item(LAYOUT_KEY, &json)?;
        self.storage.set_item(LAST_SYNC_KEY, &Utc::now().to_rfc3339())?;
        tracing::debug!("Saved dashboard {} to local storage", payload.dashboard.id);
        Ok(())
    }

    pub fn load_from_local(&self) -> Option<(Dashboard, WidgetInstances)> {
        self.load_serialized().map(SerializedDashboard::into_parts)
    }

    /// Read errors and invalid payloads are logged and reported as nothing stored.
    pub fn load_serialized(&self) -> Option<SerializedDashboard> {
        let json = match self.storage.get_item(LAYOUT_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read stored dashboard: {}", e);
                return None;
            }
        };
        let value = serde_json::from_str(&json)
            .map_err(|e| tracing::warn!("Stored dashboard is not valid JSON: {}", e))
            .ok()?;
        deserialize_value(value)
    }

    /// True when something is stored under the layout key, decodable or not. A read
    /// error also counts, so callers never overwrite data they could not inspect.
    pub fn has_stored_layout(&self) -> bool {
        !matches!(self.storage.get_item(LAYOUT_KEY), Ok(None))
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.storage.get_item(LAST_SYNC_KEY).ok()??;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn clear_local(&self) -> anyhow::Result<()> {
        self.storage.remove_item(LAYOUT_KEY)?;
        self.storage.remove_item(LAST_SYNC_KEY)?;
        Ok(())
    }
}
