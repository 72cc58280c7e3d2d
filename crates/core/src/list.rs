//! Ordered, plan-capped list of editable records.
//!
//! The list is never empty: removing or clearing the last record leaves a
//! single fresh draft behind. `order` always matches the position in `items`
//! after any structural change.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::ids::ItemId;

const RESERVED_FIELDS: [&str; 2] = ["id", "order"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ListItem {
    pub fn draft(order: u32, template: &Map<String, Value>) -> Self {
        Self {
            id: ItemId::new(),
            order,
            fields: template.clone(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// True when every named field holds a non-empty value.
    pub fn is_complete(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|key| self.fields.get(key).is_some_and(is_filled))
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.fields.iter().any(|(key, value)| {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                return false;
            }
            match value {
                Value::String(s) => s.to_lowercase().contains(needle),
                Value::Number(n) => n.to_string().contains(needle),
                _ => false,
            }
        })
    }
}

/// Whether a field value counts as filled in for validation.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ItemId),
    LimitReached,
    /// The trailing item is missing required fields.
    Incomplete,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

#[derive(Debug, Clone)]
pub struct ListManager {
    items: Vec<ListItem>,
    search: String,
    sort_order: SortOrder,
    dragging_index: Option<usize>,
    show_validation_error: bool,
    scroll_target: Option<ItemId>,
    plan_limit: usize,
    validation_fields: Vec<String>,
    template: Map<String, Value>,
}

impl ListManager {
    pub fn new(plan_limit: usize, validation_fields: Vec<String>) -> Self {
        Self::with_template(plan_limit, validation_fields, Map::new())
    }

    /// New drafts start with a copy of `template` as their fields.
    pub fn with_template(
        plan_limit: usize,
        validation_fields: Vec<String>,
        template: Map<String, Value>,
    ) -> Self {
        let items = vec![ListItem::draft(0, &template)];
        Self {
            items,
            search: String::new(),
            sort_order: SortOrder::Ascending,
            dragging_index: None,
            show_validation_error: false,
            scroll_target: None,
            plan_limit: plan_limit.max(1),
            validation_fields,
            template,
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn plan_limit(&self) -> usize {
        self.plan_limit
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn dragging_index(&self) -> Option<usize> {
        self.dragging_index
    }

    pub fn show_validation_error(&self) -> bool {
        self.show_validation_error
    }

    /// The item the UI should scroll into view, consumed on read.
    pub fn take_scroll_target(&mut self) -> Option<ItemId> {
        self.scroll_target.take()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn add_item(&mut self) -> AddOutcome {
        if self.is_limit_reached() {
            return AddOutcome::LimitReached;
        }
        if !self.last_item_is_complete() {
            self.show_validation_error = true;
            return AddOutcome::Incomplete;
        }
        let item = ListItem::draft(self.items.len() as u32, &self.template);
        let id = item.id;
        self.items.push(item);
        self.show_validation_error = false;
        self.scroll_target = Some(id);
        AddOutcome::Added(id)
    }

    /// Shallow-merge `partial` into the item's fields. `id` and `order` are ignored.
    pub fn update_item(&mut self, index: usize, partial: Map<String, Value>) -> Result<(), CoreError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { index, len })?;
        for (key, value) in partial {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            item.fields.insert(key, value);
        }
        Ok(())
    }

    /// Remove an item. The sole remaining item is replaced by a fresh draft.
    pub fn remove_item(&mut self, index: usize) -> Result<(), CoreError> {
        let len = self.items.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        if len == 1 {
            self.items = vec![ListItem::draft(0, &self.template)];
        } else {
            self.items.remove(index);
            self.renumber();
        }
        self.dragging_index = None;
        Ok(())
    }

    /// Drop every item, leaving a single fresh draft.
    pub fn clear_items(&mut self) {
        self.items = vec![ListItem::draft(0, &self.template)];
        self.dragging_index = None;
    }

    /// Back to a single draft with search, sort and validation state cleared.
    pub fn reset_items(&mut self) {
        self.clear_items();
        self.search.clear();
        self.sort_order = SortOrder::Ascending;
        self.show_validation_error = false;
        self.scroll_target = None;
    }

    /// Load items from storage. Items past the plan limit are dropped and
    /// their count returned. Repeated ids are replaced with fresh ones.
    pub fn replace_items(&mut self, mut items: Vec<ListItem>) -> usize {
        items.sort_by_key(|item| item.order);
        let dropped = items.len().saturating_sub(self.plan_limit);
        items.truncate(self.plan_limit);
        let mut seen = HashSet::with_capacity(items.len());
        for item in &mut items {
            if !seen.insert(item.id) {
                item.id = ItemId::new();
                seen.insert(item.id);
            }
        }
        if items.is_empty() {
            items.push(ListItem::draft(0, &self.template));
        }
        self.items = items;
        self.renumber();
        self.dragging_index = None;
        dropped
    }

    pub fn replace_from_value(&mut self, value: &Value) -> Result<usize, CoreError> {
        let items: Vec<ListItem> = match value {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other.clone())
                .map_err(|e| CoreError::Serialization(e.to_string()))?,
        };
        Ok(self.replace_items(items))
    }

    pub fn to_value(&self) -> Result<Value, CoreError> {
        serde_json::to_value(&self.items).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggled();
    }

    // ========================================================================
    // Drag reorder
    // ========================================================================

    pub fn start_drag(&mut self, index: usize) -> Result<(), CoreError> {
        let len = self.items.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        self.dragging_index = Some(index);
        Ok(())
    }

    /// Move the dragged item to `target` and keep tracking it there.
    pub fn drag_over(&mut self, target: usize) {
        let Some(from) = self.dragging_index else {
            return;
        };
        if from == target || target >= self.items.len() {
            return;
        }
        let item = self.items.remove(from);
        self.items.insert(target, item);
        self.renumber();
        self.dragging_index = Some(target);
    }

    pub fn end_drag(&mut self) {
        self.dragging_index = None;
    }

    // ========================================================================
    // Derived state
    // ========================================================================

    pub fn filtered_items(&self) -> Vec<&ListItem> {
        let needle = self.search.to_lowercase();
        let mut out: Vec<&ListItem> = self
            .items
            .iter()
            .filter(|item| needle.is_empty() || item.matches_search(&needle))
            .collect();
        out.sort_by_key(|item| item.order);
        if self.sort_order == SortOrder::Descending {
            out.reverse();
        }
        out
    }

    /// An active search does not relax the trailing-item check.
    pub fn can_add_new_item(&self) -> bool {
        !self.is_limit_reached() && self.last_item_is_complete()
    }

    pub fn complete_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.is_complete(&self.validation_fields))
            .count()
    }

    pub fn is_limit_reached(&self) -> bool {
        self.items.len() >= self.plan_limit
    }

    fn last_item_is_complete(&self) -> bool {
        if self.validation_fields.is_empty() {
            return true;
        }
        self.items
            .last()
            .is_none_or(|item| item.is_complete(&self.validation_fields))
    }

    fn renumber(&mut self) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.order = i as u32;
        }
    }
}
