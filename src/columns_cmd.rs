//! `flubber columns`: inspect and edit the saved per-field layout.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::layout::{ColumnPolicy, LayoutStore};
use crate::settings::{load_settings, save_settings};

pub fn run_columns_list(config: &Config) -> Result<()> {
    let settings = load_settings(&config.settings.path)?;
    if settings.columns.is_empty() {
        println!("No saved column layout.");
        return Ok(());
    }
    println!("{:<32} {:>6}  {}", "FIELD", "WIDTH", "VISIBLE");
    for (field, layout) in settings.columns.iter() {
        println!(
            "{:<32} {:>6}  {}",
            field,
            layout.width,
            if layout.hidden { "no" } else { "yes" }
        );
    }
    Ok(())
}

/// Update one field's saved layout. Unspecified attributes keep their saved
/// value, or the policy default if the field has none yet.
pub fn run_columns_set(
    config: &Config,
    field: &str,
    width: Option<u32>,
    hidden: Option<bool>,
) -> Result<()> {
    if width.is_none() && hidden.is_none() {
        bail!("nothing to change: pass --width, --hide or --show");
    }
    let mut settings = load_settings(&config.settings.path)?;
    let policy = ColumnPolicy::from_config(&config.columns);

    let mut layout = settings
        .columns
        .get(field)
        .unwrap_or_else(|| policy.default_layout(field));
    if let Some(w) = width {
        layout.width = w;
    }
    if let Some(h) = hidden {
        layout.hidden = h;
    }
    let layout = layout.clamped();
    settings.columns.set(field, layout);
    save_settings(&config.settings.path, &settings)?;

    println!(
        "{}: width {}, {}",
        field,
        layout.width,
        if layout.hidden { "hidden" } else { "visible" }
    );
    Ok(())
}

pub fn run_columns_reset(config: &Config, field: &str) -> Result<()> {
    let mut settings = load_settings(&config.settings.path)?;
    match settings.columns.remove(field) {
        Some(_) => {
            save_settings(&config.settings.path, &settings)?;
            println!("{}: reset to defaults", field);
        }
        None => println!("{}: no saved layout", field),
    }
    Ok(())
}
