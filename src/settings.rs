//! Persisted inspector state.
//!
//! A small JSON file holding the per-field column layout and the last query
//! text. It is loaded once at startup and handed to whoever needs it; there
//! is no global settings object.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::FieldLayout;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub columns: FieldLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_query: Option<String>,
}

/// Load settings from `path`. A missing file yields empty settings.
///
/// Saved column widths are clamped to
/// [`MIN_COLUMN_WIDTH`](crate::layout::MIN_COLUMN_WIDTH).
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    let mut settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
    settings.columns.clamp_widths();
    Ok(settings)
}

/// Write settings to `path`, creating parent directories as needed.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
    Ok(())
}
