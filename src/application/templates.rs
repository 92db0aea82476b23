// Template catalog - Pre-built dashboards with their widget instances
use crate::application::widget_registry::{merge_props, WidgetRegistry};
use crate::domain::dashboard::{create_default_dashboard, Dashboard, Layout, Row, WidgetInstance, WidgetInstances};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardTemplate {
    pub dashboard: Dashboard,
    pub widget_instances: WidgetInstances,
}

static TEMPLATES: [TemplateInfo; 4] = [
    TemplateInfo {
        id: "sessions-overview",
        name: "Sessions Overview",
        description: "Headline numbers, consumption trend and recent sessions",
    },
    TemplateInfo {
        id: "inventory-management",
        name: "Inventory Management",
        description: "Stock levels, low stock alerts and strain mix",
    },
    TemplateInfo {
        id: "wellness-journal",
        name: "Wellness Journal",
        description: "Mood, symptoms and journal side by side",
    },
    TemplateInfo {
        id: "empty",
        name: "Empty",
        description: "A single empty row to start from scratch",
    },
];

pub struct TemplateCatalog;

impl TemplateCatalog {
    pub fn list() -> &'static [TemplateInfo] {
        &TEMPLATES
    }

    pub fn build(id: &str, registry: &WidgetRegistry) -> Option<DashboardTemplate> {
        let template = match id {
            "sessions-overview" => sessions_overview(registry),
            "inventory-management" => inventory_management(registry),
            "wellness-journal" => wellness_journal(registry),
            "empty" => empty(),
            _ => return None,
        };
        Some(template)
    }
}

/// Accumulates rows and the instances placed in them.
struct TemplateBuilder<'a> {
    registry: &'a WidgetRegistry,
    rows: Vec<Row>,
    instances: WidgetInstances,
}

impl<'a> TemplateBuilder<'a> {
    fn new(registry: &'a WidgetRegistry) -> Self {
        Self {
            registry,
            rows: Vec::new(),
            instances: WidgetInstances::new(),
        }
    }

    /// Add a titled row; each cell is (width, widget type, prop overrides).
    fn row(mut self, name: &str, cells: &[(f64, &str, Option<Value>)]) -> Self {
        let widths: Vec<f64> = cells.iter().map(|(w, _, _)| *w).collect();
        let mut row = Row::new(Layout::from_widths(&widths), self.rows.len() as i64).with_name(name);

        for (column, (_, widget_type_id, overrides)) in row.layout.columns.iter_mut().zip(cells) {
            let defaults = self.registry.default_props(widget_type_id);
            let props = match (defaults, overrides) {
                (Some(d), Some(o)) => Some(merge_props(&d, o)),
                (d, o) => o.clone().or(d),
            };
            let instance = WidgetInstance::new(*widget_type_id, props);
            column.widget_id = Some(instance.id.clone());
            self.instances.insert(instance.id.clone(), instance);
        }
        self.rows.push(row);
        self
    }

    fn finish(self, name: &str) -> DashboardTemplate {
        DashboardTemplate {
            dashboard: Dashboard::new(name, self.rows),
            widget_instances: self.instances,
        }
    }
}

fn sessions_overview(registry: &WidgetRegistry) -> DashboardTemplate {
    TemplateBuilder::new(registry)
        .row(
            "At a glance",
            &[
                (33.33, "statistics-card", Some(json!({"metric": "totalSessions"}))),
                (33.33, "statistics-card", Some(json!({"metric": "averageAmount"}))),
                (33.34, "statistics-card", Some(json!({"metric": "favoriteStrain"}))),
            ],
        )
        .row(
            "Trends",
            &[
                (66.67, "consumption-chart", None),
                (33.33, "recent-sessions", None),
            ],
        )
        .row("Log", &[(100.0, "quick-log", None)])
        .finish("Sessions Overview")
}

fn inventory_management(registry: &WidgetRegistry) -> DashboardTemplate {
    TemplateBuilder::new(registry)
        .row(
            "Stock",
            &[
                (50.0, "inventory-summary", None),
                (50.0, "low-stock-alert", None),
            ],
        )
        .row("Strains", &[(100.0, "strain-breakdown", Some(json!({"limit": 10})))])
        .finish("Inventory Management")
}

fn wellness_journal(registry: &WidgetRegistry) -> DashboardTemplate {
    TemplateBuilder::new(registry)
        .row(
            "How I feel",
            &[
                (50.0, "mood-tracker", None),
                (50.0, "symptom-tracker", None),
            ],
        )
        .row("Journal", &[(100.0, "journal-entries", Some(json!({"limit": 5})))])
        .finish("Wellness Journal")
}

fn empty() -> DashboardTemplate {
    let mut dashboard = create_default_dashboard();
    dashboard.name = "Empty".to_string();
    dashboard.is_default = None;
    DashboardTemplate {
        dashboard,
        widget_instances: WidgetInstances::new(),
    }
}
