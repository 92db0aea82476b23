// Widget catalog domain model
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Sessions,
    Analytics,
    Inventory,
    Wellness,
    Medical,
}

impl WidgetCategory {
    pub const ALL: [WidgetCategory; 5] = [
        WidgetCategory::Sessions,
        WidgetCategory::Analytics,
        WidgetCategory::Inventory,
        WidgetCategory::Wellness,
        WidgetCategory::Medical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetCategory::Sessions => "sessions",
            WidgetCategory::Analytics => "analytics",
            WidgetCategory::Inventory => "inventory",
            WidgetCategory::Wellness => "wellness",
            WidgetCategory::Medical => "medical",
        }
    }
}

impl fmt::Display for WidgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown widget category '{}'", s))
    }
}

/// Catalog entry describing a kind of widget. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: WidgetCategory,
    /// Name of the component that renders this widget.
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_props: Option<Value>,
}

impl WidgetType {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        category: WidgetCategory,
        component: &str,
        default_props: Option<Value>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            component: component.to_string(),
            default_props,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("inventory".parse::<WidgetCategory>(), Ok(WidgetCategory::Inventory));
        assert_eq!("Medical".parse::<WidgetCategory>(), Ok(WidgetCategory::Medical));
        assert!("plants".parse::<WidgetCategory>().is_err());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let value = serde_json::to_value(WidgetCategory::Wellness).unwrap();
        assert_eq!(value, serde_json::json!("wellness"));
    }
}
