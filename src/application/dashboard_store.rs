// Dashboard store - Single source of truth for the active dashboard while it is edited
//
// All operations are synchronous and silently do nothing when there is no
// dashboard loaded or a referenced row/column/widget id is unknown. The store
// owns the column -> widget instance cascade: instances are created when a
// widget is placed, cloned when a row is duplicated, and deleted when the
// column or row holding them goes away.
use crate::application::widget_registry::{merge_props, WidgetRegistry};
use crate::domain::dashboard::{
    Column, Dashboard, Layout, Row, WidgetInstance, WidgetInstances, new_id,
};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDirection {
    Up,
    Down,
}

/// Column a widget picker was opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSlot {
    pub row_id: String,
    pub column_id: String,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    dashboard: Option<Dashboard>,
    widget_instances: WidgetInstances,
}

pub struct DashboardStore {
    registry: Arc<WidgetRegistry>,
    dashboard: Option<Dashboard>,
    widget_instances: WidgetInstances,
    is_editing: bool,
    snapshot: Snapshot,
    layout_picker_open: bool,
    widget_picker_open: bool,
    widget_picker_target: Option<WidgetSlot>,
}

impl DashboardStore {
    pub fn new(registry: Arc<WidgetRegistry>) -> Self {
        Self {
            registry,
            dashboard: None,
            widget_instances: WidgetInstances::new(),
            is_editing: false,
            snapshot: Snapshot::default(),
            layout_picker_open: false,
            widget_picker_open: false,
            widget_picker_target: None,
        }
    }

    /// Replace the whole state, e.g. after loading from storage or applying a template.
    /// Leaves edit mode.
    pub fn load(&mut self, dashboard: Dashboard, widget_instances: WidgetInstances) {
        self.dashboard = Some(dashboard);
        self.widget_instances = widget_instances;
        self.is_editing = false;
        self.take_snapshot();
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn widget_instances(&self) -> &WidgetInstances {
        &self.widget_instances
    }

    pub fn widget(&self, widget_id: &str) -> Option<&WidgetInstance> {
        self.widget_instances.get(widget_id)
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn layout_picker_open(&self) -> bool {
        self.layout_picker_open
    }

    pub fn widget_picker_open(&self) -> bool {
        self.widget_picker_open
    }

    pub fn widget_picker_target(&self) -> Option<&WidgetSlot> {
        self.widget_picker_target.as_ref()
    }

    // ---- rows ----

    /// Append a single-column row, or insert it right after `after_row_id` when that row exists.
    /// Returns the new row id.
    pub fn add_row(&mut self, after_row_id: Option<&str>) -> Option<String> {
        let dashboard = self.dashboard.as_mut()?;
        let row = Row::new(Layout::single_column(), dashboard.next_row_index());
        let row_id = row.id.clone();

        match after_row_id.and_then(|id| dashboard.row_position(id)) {
            Some(pos) => dashboard.rows.insert(pos + 1, row),
            None => dashboard.rows.push(row),
        }
        tracing::debug!("Added row {}", row_id);
        Some(row_id)
    }

    pub fn remove_row(&mut self, row_id: &str) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        let Some(pos) = dashboard.row_position(row_id) else {
            return;
        };
        let row = dashboard.rows.remove(pos);
        for widget_id in row.widget_ids() {
            self.widget_instances.remove(&widget_id);
        }
        tracing::debug!("Removed row {}", row_id);
    }

    pub fn move_row(&mut self, row_id: &str, direction: RowDirection) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        let Some(pos) = dashboard.row_position(row_id) else {
            return;
        };
        let target = match direction {
            RowDirection::Up if pos > 0 => pos - 1,
            RowDirection::Down if pos + 1 < dashboard.rows.len() => pos + 1,
            _ => return,
        };
        dashboard.rows.swap(pos, target);
    }

    /// Replace a row's columns. Widgets are carried over by column position; widgets no
    /// column of the new layout holds afterwards are deleted. A widget id appearing in more
    /// than one column is kept only in the first.
    pub fn update_row_layout(&mut self, row_id: &str, new_layout: Layout) {
        let Some(row) = self.dashboard.as_mut().and_then(|d| d.row_mut(row_id)) else {
            return;
        };
        let old_columns = std::mem::replace(&mut row.layout, new_layout).columns;

        let mut released = Vec::new();
        for (i, old) in old_columns.into_iter().enumerate() {
            let Some(widget_id) = old.widget_id else {
                continue;
            };
            match row.layout.columns.get_mut(i) {
                Some(column) => {
                    if let Some(replaced) = column.widget_id.replace(widget_id.clone()) {
                        if replaced != widget_id {
                            released.push(replaced);
                        }
                    }
                }
                None => released.push(widget_id),
            }
        }

        let mut seen: Vec<String> = Vec::new();
        for column in &mut row.layout.columns {
            if let Some(id) = &column.widget_id {
                if seen.contains(id) {
                    column.widget_id = None;
                } else {
                    seen.push(id.clone());
                }
            }
        }
        for id in released.into_iter().filter(|id| !seen.contains(id)) {
            self.widget_instances.remove(&id);
        }
        tracing::debug!("Updated layout of row {}", row_id);
    }

    /// Deep copy a row with fresh ids and cloned widgets, placed right after the source.
    /// Returns the new row id.
    pub fn duplicate_row(&mut self, row_id: &str) -> Option<String> {
        let dashboard = self.dashboard.as_mut()?;
        let pos = dashboard.row_position(row_id)?;
        let source = &dashboard.rows[pos];

        let mut columns = Vec::with_capacity(source.layout.columns.len());
        for column in &source.layout.columns {
            let mut copy = Column::new(column.width_percentage);
            if let Some(original) = column
                .widget_id
                .as_ref()
                .and_then(|id| self.widget_instances.get(id))
            {
                let cloned = original.clone_with_new_id();
                copy.widget_id = Some(cloned.id.clone());
                self.widget_instances.insert(cloned.id.clone(), cloned);
            }
            columns.push(copy);
        }

        let duplicate = Row {
            id: new_id("row"),
            layout: Layout::new(columns),
            name: source.name.clone(),
            index: Some(dashboard.next_row_index()),
            show_title: source.show_title,
        };
        let new_row_id = duplicate.id.clone();
        dashboard.rows.insert(pos + 1, duplicate);
        tracing::debug!("Duplicated row {} as {}", row_id, new_row_id);
        Some(new_row_id)
    }

    pub fn rename_row(&mut self, row_id: &str, name: &str) {
        if let Some(row) = self.dashboard.as_mut().and_then(|d| d.row_mut(row_id)) {
            row.name = Some(name.to_string());
        }
    }

    /// Row titles are hidden unless turned on.
    pub fn toggle_row_title(&mut self, row_id: &str) {
        if let Some(row) = self.dashboard.as_mut().and_then(|d| d.row_mut(row_id)) {
            row.show_title = Some(!row.show_title.unwrap_or(false));
        }
    }

    // ---- widgets ----

    /// Place a new instance of `widget_type_id` in the column, seeded with the type's default
    /// props. Unknown types are ignored. Returns the new instance id.
    pub fn add_widget(&mut self, row_id: &str, column_id: &str, widget_type_id: &str) -> Option<String> {
        let widget_type = self.registry.get(widget_type_id)?;
        let column = self
            .dashboard
            .as_mut()
            .and_then(|d| d.row_mut(row_id))
            .and_then(|r| r.column_mut(column_id))?;

        let instance = WidgetInstance::new(widget_type.id.clone(), widget_type.default_props.clone());
        let instance_id = instance.id.clone();
        if let Some(previous) = column.widget_id.replace(instance_id.clone()) {
            self.widget_instances.remove(&previous);
        }
        self.widget_instances.insert(instance_id.clone(), instance);
        tracing::debug!("Added {} widget {} to column {}", widget_type_id, instance_id, column_id);
        Some(instance_id)
    }

    pub fn remove_widget(&mut self, row_id: &str, column_id: &str) {
        let Some(column) = self
            .dashboard
            .as_mut()
            .and_then(|d| d.row_mut(row_id))
            .and_then(|r| r.column_mut(column_id))
        else {
            return;
        };
        if let Some(widget_id) = column.widget_id.take() {
            self.widget_instances.remove(&widget_id);
            tracing::debug!("Removed widget {} from column {}", widget_id, column_id);
        }
    }

    /// Widget titles are shown unless turned off.
    pub fn toggle_widget_title(&mut self, widget_id: &str) {
        if let Some(widget) = self.widget_instances.get_mut(widget_id) {
            widget.show_title = Some(!widget.show_title.unwrap_or(true));
        }
    }

    /// Merge `props` into the widget's existing props key by key.
    pub fn update_widget_props(&mut self, widget_id: &str, props: Value) {
        if let Some(widget) = self.widget_instances.get_mut(widget_id) {
            widget.props = Some(match &widget.props {
                Some(existing) => merge_props(existing, &props),
                None => props,
            });
        }
    }

    // ---- edit mode ----

    /// Entering edit mode remembers the current state so it can be discarded later.
    pub fn toggle_edit_mode(&mut self) {
        if !self.is_editing {
            self.take_snapshot();
        }
        self.is_editing = !self.is_editing;
    }

    /// Accept the current state as the new baseline and leave edit mode.
    pub fn save_current_layout(&mut self) {
        self.take_snapshot();
        self.is_editing = false;
    }

    /// Restore the state from when edit mode was entered and leave edit mode.
    pub fn discard_changes(&mut self) {
        let snapshot = self.snapshot.clone();
        self.dashboard = snapshot.dashboard;
        self.widget_instances = snapshot.widget_instances;
        self.is_editing = false;
        self.close_layout_picker();
        self.close_widget_picker();
    }

    fn take_snapshot(&mut self) {
        self.snapshot = Snapshot {
            dashboard: self.dashboard.clone(),
            widget_instances: self.widget_instances.clone(),
        };
    }

    // ---- pickers ----

    pub fn open_layout_picker(&mut self) {
        self.layout_picker_open = true;
    }

    pub fn close_layout_picker(&mut self) {
        self.layout_picker_open = false;
    }

    pub fn open_widget_picker(&mut self, row_id: &str, column_id: &str) {
        self.widget_picker_open = true;
        self.widget_picker_target = Some(WidgetSlot {
            row_id: row_id.to_string(),
            column_id: column_id.to_string(),
        });
    }

    pub fn close_widget_picker(&mut self) {
        self.widget_picker_open = false;
        self.widget_picker_target = None;
    }

    /// Place a widget in the slot the picker was opened for and close the picker.
    pub fn pick_widget(&mut self, widget_type_id: &str) -> Option<String> {
        let slot = self.widget_picker_target.clone()?;
        let id = self.add_widget(&slot.row_id, &slot.column_id, widget_type_id);
        self.close_widget_picker();
        id
    }

    // ---- invariants ----

    /// Column widget ids that have no backing instance.
    pub fn dangling_widget_refs(&self) -> Vec<String> {
        self.dashboard
            .iter()
            .flat_map(|d| d.widget_ids())
            .filter(|id| !self.widget_instances.contains_key(id))
            .collect()
    }

    /// Instances no column points at.
    pub fn orphaned_widgets(&self) -> Vec<String> {
        let referenced = self.dashboard.as_ref().map(|d| d.widget_ids()).unwrap_or_default();
        self.widget_instances
            .keys()
            .filter(|id| !referenced.contains(id))
            .cloned()
            .collect()
    }
}
