// Widget registry - Catalog of widget types and the components that render them
use crate::domain::dashboard::WidgetInstance;
use crate::domain::widget::{WidgetCategory, WidgetType};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Renders a placed widget into a JSON view model for the client.
pub type ComponentRenderer = Arc<dyn Fn(&WidgetType, &WidgetInstance) -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    types: Vec<WidgetType>,
    components: HashMap<String, ComponentRenderer>,
}

impl WidgetRegistry {
    /// Build the registry with the built-in widget catalog and one renderer per component.
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        for widget_type in default_widget_types() {
            reg.register(widget_type);
        }
        let component_names: Vec<String> = reg.types.iter().map(|t| t.component.clone()).collect();
        for name in component_names {
            reg.register_component(&name, Arc::new(render_view_model));
        }
        tracing::debug!(
            "Widget registry initialized with {} types and {} components",
            reg.types.len(),
            reg.components.len()
        );
        reg
    }

    /// Add a widget type. A type with the same id is replaced.
    pub fn register(&mut self, widget_type: WidgetType) {
        if let Some(existing) = self.types.iter_mut().find(|t| t.id == widget_type.id) {
            *existing = widget_type;
        } else {
            self.types.push(widget_type);
        }
    }

    pub fn register_component(&mut self, name: &str, renderer: ComponentRenderer) {
        self.components.insert(name.to_string(), renderer);
    }

    pub fn get(&self, id: &str) -> Option<&WidgetType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &[WidgetType] {
        &self.types
    }

    pub fn by_category(&self, category: WidgetCategory) -> Vec<&WidgetType> {
        self.types.iter().filter(|t| t.category == category).collect()
    }

    /// Number of widget types per category. Categories without widgets are reported as 0.
    pub fn category_counts(&self) -> BTreeMap<WidgetCategory, usize> {
        let mut counts: BTreeMap<WidgetCategory, usize> =
            WidgetCategory::ALL.into_iter().map(|c| (c, 0)).collect();
        for t in &self.types {
            *counts.entry(t.category).or_default() += 1;
        }
        counts
    }

    pub fn default_props(&self, id: &str) -> Option<Value> {
        self.get(id).and_then(|t| t.default_props.clone())
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Resolve instance -> type -> component and render it.
    pub fn render(&self, instance: &WidgetInstance) -> Option<Value> {
        let widget_type = self.get(&instance.widget_type_id)?;
        let renderer = self.components.get(&widget_type.component)?;
        Some(renderer(widget_type, instance))
    }
}

/// Shallow merge of object keys; non-object updates replace the base.
pub fn merge_props(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

fn render_view_model(widget_type: &WidgetType, instance: &WidgetInstance) -> Value {
    let defaults = widget_type.default_props.clone().unwrap_or_else(|| json!({}));
    let props = match &instance.props {
        Some(p) => merge_props(&defaults, p),
        None => defaults,
    };
    json!({
        "id": instance.id,
        "component": widget_type.component,
        "title": widget_type.name,
        "showTitle": instance.show_title.unwrap_or(true),
        "props": props,
    })
}

fn default_widget_types() -> Vec<WidgetType> {
    use WidgetCategory::*;
    vec![
        WidgetType::new(
            "statistics-card",
            "Statistics",
            "Single headline number such as total sessions or average dose",
            Analytics,
            "StatisticsCard",
            Some(json!({"metric": "totalSessions", "timeRange": "30d"})),
        ),
        WidgetType::new(
            "consumption-chart",
            "Consumption Over Time",
            "Line chart of consumed amount per day",
            Analytics,
            "ConsumptionChart",
            Some(json!({"chartType": "line", "timeRange": "7d", "unit": "g"})),
        ),
        WidgetType::new(
            "strain-breakdown",
            "Strain Breakdown",
            "Share of sessions per strain",
            Analytics,
            "StrainBreakdown",
            Some(json!({"chartType": "pie", "limit": 5})),
        ),
        WidgetType::new(
            "recent-sessions",
            "Recent Sessions",
            "Latest logged sessions",
            Sessions,
            "RecentSessions",
            Some(json!({"limit": 5})),
        ),
        WidgetType::new(
            "quick-log",
            "Quick Log",
            "Log a session in one step",
            Sessions,
            "QuickLog",
            Some(json!({"defaultMethod": "flower"})),
        ),
        WidgetType::new(
            "inventory-summary",
            "Inventory Summary",
            "Stock on hand grouped by product type",
            Inventory,
            "InventorySummary",
            Some(json!({"groupBy": "type", "showValue": true})),
        ),
        WidgetType::new(
            "low-stock-alert",
            "Low Stock",
            "Products below a quantity threshold",
            Inventory,
            "LowStockAlert",
            Some(json!({"threshold": 3.5, "unit": "g"})),
        ),
        WidgetType::new(
            "mood-tracker",
            "Mood",
            "Mood entries before and after sessions",
            Wellness,
            "MoodTracker",
            Some(json!({"timeRange": "7d"})),
        ),
        WidgetType::new(
            "journal-entries",
            "Journal",
            "Most recent journal entries",
            Wellness,
            "JournalEntries",
            Some(json!({"limit": 3})),
        ),
        WidgetType::new(
            "symptom-tracker",
            "Symptoms",
            "Medical symptom severity over time",
            Medical,
            "SymptomTracker",
            Some(json!({"timeRange": "30d", "symptoms": []})),
        ),
        WidgetType::new(
            "notes",
            "Notes",
            "Free-form text block",
            Wellness,
            "Notes",
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let reg = WidgetRegistry::with_defaults();
        let stats = reg.get("statistics-card").unwrap();
        assert_eq!(stats.category, WidgetCategory::Analytics);
        assert_eq!(stats.component, "StatisticsCard");
        assert!(reg.get("does-not-exist").is_none());
    }

    #[test]
    fn test_every_type_has_component() {
        let reg = WidgetRegistry::with_defaults();
        for t in reg.all() {
            assert!(reg.has_component(&t.component), "missing component for {}", t.id);
        }
    }

    #[test]
    fn test_category_counts_cover_all_types() {
        let reg = WidgetRegistry::with_defaults();
        let counts = reg.category_counts();
        assert_eq!(counts.len(), WidgetCategory::ALL.len());
        assert_eq!(counts.values().sum::<usize>(), reg.all().len());
        assert_eq!(counts[&WidgetCategory::Inventory], reg.by_category(WidgetCategory::Inventory).len());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut reg = WidgetRegistry::with_defaults();
        let before = reg.all().len();
        reg.register(WidgetType::new(
            "notes",
            "Sticky Notes",
            "",
            WidgetCategory::Wellness,
            "Notes",
            Some(json!({"color": "yellow"})),
        ));
        assert_eq!(reg.all().len(), before);
        assert_eq!(reg.get("notes").unwrap().name, "Sticky Notes");
    }

    #[test]
    fn test_render_merges_instance_props_over_defaults() {
        let reg = WidgetRegistry::with_defaults();
        let instance = WidgetInstance::new("recent-sessions", Some(json!({"limit": 10})));
        let view = reg.render(&instance).unwrap();
        assert_eq!(view["component"], json!("RecentSessions"));
        assert_eq!(view["props"]["limit"], json!(10));
        assert_eq!(view["showTitle"], json!(true));
    }

    #[test]
    fn test_render_unknown_type_or_component() {
        let mut reg = WidgetRegistry::default();
        reg.register(WidgetType::new("orphan", "Orphan", "", WidgetCategory::Sessions, "Missing", None));
        assert!(reg.render(&WidgetInstance::new("orphan", None)).is_none());
        assert!(reg.render(&WidgetInstance::new("unknown", None)).is_none());
    }

    #[test]
    fn test_merge_props() {
        let merged = merge_props(&json!({"a": 1, "b": 2}), &json!({"b": 3, "c": 4}));
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(merge_props(&json!({"a": 1}), &json!(5)), json!(5));
    }
}
