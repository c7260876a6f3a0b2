//! Column layout policy.
//!
//! Columns are keyed by field *name*, never by index: the schema is
//! re-inferred on every fetch, so index `3` may be a different field next
//! time. A user's width/visibility override for a field is reapplied only
//! when that field shows up again; every other field falls back to the
//! policy defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields shown when nothing else is known about them.
pub const DEFAULT_VISIBLE_FIELDS: &[&str] = &["asctime", "levelname", "message"];

pub const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Saved widths narrower than this are widened on load.
pub const MIN_COLUMN_WIDTH: u32 = 100;

/// A user's saved layout for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOverride {
    pub width: u32,
    pub hidden: bool,
}

impl ColumnOverride {
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(MIN_COLUMN_WIDTH),
            hidden: self.hidden,
        }
    }
}

/// Access to persisted per-field overrides. Storage is the implementor's concern.
pub trait LayoutStore {
    fn get(&self, field: &str) -> Option<ColumnOverride>;
    fn set(&mut self, field: &str, layout: ColumnOverride);
    fn remove(&mut self, field: &str) -> Option<ColumnOverride>;
}

/// In-memory [`LayoutStore`], serialised as `{field: {width, hidden}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldLayout {
    fields: BTreeMap<String, ColumnOverride>,
}

impl FieldLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnOverride)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply [`ColumnOverride::clamped`] to every entry.
    pub fn clamp_widths(&mut self) {
        for v in self.fields.values_mut() {
            *v = v.clamped();
        }
    }
}

impl LayoutStore for FieldLayout {
    fn get(&self, field: &str) -> Option<ColumnOverride> {
        self.fields.get(field).copied()
    }

    fn set(&mut self, field: &str, layout: ColumnOverride) {
        self.fields.insert(field.to_string(), layout);
    }

    fn remove(&mut self, field: &str) -> Option<ColumnOverride> {
        self.fields.remove(field)
    }
}

/// Resolved layout for one column of the current result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub field: String,
    pub width: u32,
    pub hidden: bool,
}

/// Defaults for fields the user has not customised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPolicy {
    visible: Vec<String>,
    default_width: u32,
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        Self {
            visible: DEFAULT_VISIBLE_FIELDS.iter().map(|s| s.to_string()).collect(),
            default_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

impl ColumnPolicy {
    pub fn new(visible: Vec<String>, default_width: u32) -> Self {
        Self {
            visible,
            default_width,
        }
    }

    pub fn from_config(config: &crate::config::ColumnsConfig) -> Self {
        Self::new(config.default_visible.clone(), config.default_width)
    }

    /// True only for fields on the allow-list.
    pub fn default_visibility(&self, field: &str) -> bool {
        self.visible.iter().any(|f| f == field)
    }

    pub fn default_layout(&self, field: &str) -> ColumnOverride {
        ColumnOverride {
            width: self.default_width,
            hidden: !self.default_visibility(field),
        }
    }

    /// Layout for each field in column order: saved override if one exists,
    /// policy default otherwise.
    pub fn resolve(&self, fields: &[String], store: &dyn LayoutStore) -> Vec<ColumnLayout> {
        fields
            .iter()
            .map(|field| {
                let o = store
                    .get(field)
                    .unwrap_or_else(|| self.default_layout(field));
                ColumnLayout {
                    field: field.clone(),
                    width: o.width,
                    hidden: o.hidden,
                }
            })
            .collect()
    }
}

/// Write the current columns back to the store. Fields absent from
/// `columns` keep whatever was saved for them.
pub fn record_columns(store: &mut dyn LayoutStore, columns: &[ColumnLayout]) {
    for c in columns {
        store.set(
            &c.field,
            ColumnOverride {
                width: c.width,
                hidden: c.hidden,
            },
        );
    }
}
