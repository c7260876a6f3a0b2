//! `flubber search`: run one query through the grid model and print it.
//!
//! The command drives the same [`ResultGridModel`] an interactive view
//! would: submit, wait for the reset notification, optionally sort by
//! column (a second, server-side fetch), then render. The query text and the
//! column layout are saved to the settings file afterwards.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::filter_term::query_from_terms;
use crate::layout::{record_columns, ColumnPolicy};
use crate::model::{GridEvent, ResultGridModel};
use crate::query::{QuerySpec, SortDirection};
use crate::render::{render_detail, render_grid};
use crate::service::{HttpQueryService, QueryService};
use crate::settings::{load_settings, save_settings, Settings};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Query file; `-` reads stdin, `None` reuses the last saved query.
    pub query_file: Option<PathBuf>,
    /// Filter terms; when non-empty they replace the query file.
    pub terms: Vec<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub size: Option<u64>,
    pub from: Option<u64>,
    pub all_columns: bool,
    pub detail: Option<usize>,
}

pub async fn run_search(config: &Config, opts: SearchOptions) -> Result<()> {
    let service = Arc::new(HttpQueryService::new(&config.backend)?);
    let output = search_with_service(config, service, &opts).await?;
    print!("{}", output);
    Ok(())
}

/// Run a search against `service` and return the rendered output.
pub async fn search_with_service(
    config: &Config,
    service: Arc<dyn QueryService>,
    opts: &SearchOptions,
) -> Result<String> {
    let mut settings = load_settings(&config.settings.path)?;

    let (text, mut spec) = if opts.terms.is_empty() {
        let text = read_query_text(opts.query_file.as_deref(), &settings)?;
        let spec = QuerySpec::parse(&text)?;
        (Some(text), spec)
    } else {
        (None, query_from_terms(&opts.terms)?)
    };
    if let Some(size) = opts.size {
        spec = spec.with_page_size(size);
    }
    if let Some(from) = opts.from {
        spec = spec.with_offset(from);
    }
    if text.is_some() {
        settings.last_query = text;
    }

    let model = ResultGridModel::new(service);
    let mut events = model.subscribe();

    model.submit(spec);
    let outcome = wait_for_reset(&mut events).await;
    let outcome = match (outcome, &opts.sort) {
        (Ok(()), Some(field)) => sort_by_field(&model, &mut events, field, opts.descending).await,
        (other, _) => other,
    };

    // Persist the query even when the fetch failed.
    let rendered = outcome.and_then(|()| render(config, &model, &mut settings, opts));
    save_settings(&config.settings.path, &settings)?;
    rendered
}

async fn sort_by_field(
    model: &ResultGridModel,
    events: &mut broadcast::Receiver<GridEvent>,
    field: &str,
    descending: bool,
) -> Result<()> {
    let column = model
        .result_set()
        .and_then(|r| r.column_of(field))
        .with_context(|| format!("cannot sort by '{}': no result carries that field", field))?;
    let direction = if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    model.set_sort(column, direction);
    wait_for_reset(events).await
}

fn render(
    config: &Config,
    model: &ResultGridModel,
    settings: &mut Settings,
    opts: &SearchOptions,
) -> Result<String> {
    let results = model
        .result_set()
        .context("no results after a successful fetch")?;
    let policy = ColumnPolicy::from_config(&config.columns);
    let columns = policy.resolve(results.fields(), &settings.columns);
    record_columns(&mut settings.columns, &columns);

    let shown = if opts.all_columns {
        columns
            .iter()
            .cloned()
            .map(|mut c| {
                c.hidden = false;
                c
            })
            .collect::<Vec<_>>()
    } else {
        columns
    };

    let mut out = render_grid(&results, &shown, model.sort_state());
    if let Some(row) = opts.detail {
        match render_detail(&results, row) {
            Some(detail) => {
                out.push('\n');
                out.push_str(&detail);
            }
            None => bail!(
                "row {} out of range ({} rows)",
                row,
                results.row_count()
            ),
        }
    }
    Ok(out)
}

/// Wait for the outcome of the most recent request.
async fn wait_for_reset(events: &mut broadcast::Receiver<GridEvent>) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(GridEvent::Reset) => return Ok(()),
            Ok(GridEvent::QueryError { kind, message }) => bail!("{} ({})", message, kind),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "grid events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => bail!("grid event channel closed"),
        }
    }
}

fn read_query_text(path: Option<&Path>, settings: &Settings) -> Result<String> {
    match path {
        Some(p) if p == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read query from stdin")?;
            Ok(text)
        }
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read query file: {}", p.display())),
        None => settings
            .last_query
            .clone()
            .context("no query file given and no previous query saved"),
    }
}
