// Dashboard domain model - Rows, layouts, columns and placed widget instances
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Widget instances keyed by instance id. Columns reference entries by id only.
pub type WidgetInstances = HashMap<String, WidgetInstance>;

/// Generate an opaque id such as `row-6f1c...`.
pub fn new_id(kind: &str) -> String {
    format!("{}-{}", kind, Uuid::new_v4())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_index", skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_title: Option<bool>,
}

/// Row indexes are ordering hints only. Any integer is kept, a fractional number is
/// truncated, and anything else is dropped rather than failing the whole layout.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub width_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    pub id: String,
    pub widget_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_title: Option<bool>,
}

impl Dashboard {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            id: new_id("dashboard"),
            name: name.into(),
            rows,
            is_default: None,
        }
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn row_mut(&mut self, row_id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == row_id)
    }

    pub fn row_position(&self, row_id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id == row_id)
    }

    /// Index to give the next row: one past the highest index in use, 0 when empty.
    pub fn next_row_index(&self) -> i64 {
        self.rows
            .iter()
            .map(|r| r.index.unwrap_or(0))
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0)
    }

    /// Every widget id referenced by any column, in row/column order.
    pub fn widget_ids(&self) -> Vec<String> {
        self.rows.iter().flat_map(|r| r.widget_ids()).collect()
    }
}

impl Row {
    pub fn new(layout: Layout, index: i64) -> Self {
        Self {
            id: new_id("row"),
            layout,
            name: None,
            index: Some(index),
            show_title: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.show_title = Some(true);
        self
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.layout.columns.iter_mut().find(|c| c.id == column_id)
    }

    pub fn widget_ids(&self) -> Vec<String> {
        self.layout
            .columns
            .iter()
            .filter_map(|c| c.widget_id.clone())
            .collect()
    }
}

impl Layout {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            id: new_id("layout"),
            columns,
        }
    }

    /// Layout with one empty column per width.
    pub fn from_widths(widths: &[f64]) -> Self {
        Self::new(widths.iter().map(|w| Column::new(*w)).collect())
    }

    pub fn single_column() -> Self {
        Self::from_widths(&[100.0])
    }
}

impl Column {
    pub fn new(width_percentage: f64) -> Self {
        Self {
            id: new_id("col"),
            width_percentage,
            widget_id: None,
        }
    }
}

impl WidgetInstance {
    pub fn new(widget_type_id: impl Into<String>, props: Option<Value>) -> Self {
        Self {
            id: new_id("widget"),
            widget_type_id: widget_type_id.into(),
            props,
            show_title: None,
        }
    }

    /// Copy with a fresh id and identical type, props and title flag.
    pub fn clone_with_new_id(&self) -> Self {
        Self {
            id: new_id("widget"),
            ..self.clone()
        }
    }
}

/// One row holding one empty full-width column.
pub fn create_default_dashboard() -> Dashboard {
    let mut dashboard = Dashboard::new("My Dashboard", vec![Row::new(Layout::single_column(), 0)]);
    dashboard.is_default = Some(true);
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_dashboard_shape() {
        let dashboard = create_default_dashboard();
        assert_eq!(dashboard.rows.len(), 1);
        let columns = &dashboard.rows[0].layout.columns;
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].width_percentage, 100.0);
        assert!(columns[0].widget_id.is_none());
        assert!(dashboard.widget_ids().is_empty());
    }

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let a = new_id("row");
        let b = new_id("row");
        assert!(a.starts_with("row-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_next_row_index() {
        let mut dashboard = Dashboard::new("d", vec![]);
        assert_eq!(dashboard.next_row_index(), 0);

        dashboard.rows.push(Row::new(Layout::single_column(), 4));
        dashboard.rows.push(Row::new(Layout::single_column(), 1));
        assert_eq!(dashboard.next_row_index(), 5);
    }

    #[test]
    fn test_row_index_accepts_any_number() {
        let row = |index: Value| -> Row {
            serde_json::from_value(json!({
                "id": "r",
                "layout": {"id": "l", "columns": []},
                "index": index
            }))
            .unwrap()
        };
        assert_eq!(row(json!(-1)).index, Some(-1));
        assert_eq!(row(json!(2.5)).index, Some(2));
        assert_eq!(row(json!(7)).index, Some(7));
        assert_eq!(row(json!("3")).index, None);
        assert_eq!(row(Value::Null).index, None);

        let missing: Row = serde_json::from_value(json!({"id": "r", "layout": {"id": "l", "columns": []}})).unwrap();
        assert_eq!(missing.index, None);

        let mut dashboard = Dashboard::new("d", vec![row(json!(-3))]);
        assert_eq!(dashboard.next_row_index(), -2);
        dashboard.rows.push(row(json!(2.9)));
        assert_eq!(dashboard.next_row_index(), 3);
    }

    #[test]
    fn test_camel_case_field_names() {
        let mut column = Column::new(50.0);
        column.widget_id = Some("widget-1".to_string());
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["widthPercentage"], json!(50.0));
        assert_eq!(value["widgetId"], json!("widget-1"));

        let empty = serde_json::to_value(Column::new(25.0)).unwrap();
        assert!(empty.get("widgetId").is_none());
    }

    #[test]
    fn test_clone_with_new_id_keeps_props() {
        let original = WidgetInstance::new("statistics-card", Some(json!({"metric": "totalSessions"})));
        let copy = original.clone_with_new_id();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.widget_type_id, original.widget_type_id);
        assert_eq!(copy.props, original.props);
    }
}
