//! # Flubber CLI (`flubber`)
//!
//! Terminal front end for the result grid.
//!
//! ## Usage
//!
//! ```bash
//! flubber --config ./config/flubber.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `flubber search [FILE]` | Run a query and print the result grid |
//! | `flubber term <TERM>...` | Print the query body built from filter terms |
//! | `flubber columns list` | Show saved column layout |
//! | `flubber columns set <FIELD>` | Change a field's saved width / visibility |
//! | `flubber columns reset <FIELD>` | Forget a field's saved layout |
//!
//! ## Examples
//!
//! ```bash
//! # Query from a file, newest first
//! flubber search queries/errors.json --sort asctime --desc
//!
//! # Build the query from filter terms
//! flubber search --term "term levelname ERROR" --term 'query message "disk full"'
//!
//! # Re-run the last query, next page, with the detail of row 3
//! flubber search --from 100 --detail 3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flubber::config;
use flubber::filter_term::query_from_terms;
use flubber::logging::init_tracing;
use flubber::search::SearchOptions;
use flubber::{columns_cmd, search};

/// Flubber: inspect a document search backend as a sortable table.
///
/// All commands except `term` read a TOML configuration file given by
/// `--config`.
#[derive(Parser)]
#[command(
    name = "flubber",
    about = "Flubber: inspect a document search backend as a sortable table",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/flubber.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the result grid.
    ///
    /// Columns are the union of fields across the returned documents.
    /// Sorting is performed by the backend: `--sort` issues a second,
    /// sorted query.
    Search {
        /// Query file (JSON, `#` comments allowed). `-` reads stdin.
        /// Defaults to the last query run.
        query_file: Option<PathBuf>,

        /// Filter term `<type> <field> <value>...`; repeatable. Replaces the query file.
        #[arg(long = "term")]
        terms: Vec<String>,

        /// Field to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending.
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Page size (overrides the query's `size`).
        #[arg(long)]
        size: Option<u64>,

        /// Offset of the first hit (overrides the query's `from`).
        #[arg(long)]
        from: Option<u64>,

        /// Show every column, ignoring saved and default visibility.
        #[arg(long)]
        all_columns: bool,

        /// Also print the full source record of this row.
        #[arg(long)]
        detail: Option<usize>,
    },

    /// Print the query body built from filter terms.
    Term {
        /// Filter terms, e.g. `"term levelname ERROR"`.
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Manage saved column layout.
    Columns {
        #[command(subcommand)]
        action: ColumnsAction,
    },
}

#[derive(Subcommand)]
enum ColumnsAction {
    /// List saved per-field layout.
    List,
    /// Set a field's width and/or visibility.
    Set {
        field: String,
        /// Column width in pixels (minimum 100).
        #[arg(long)]
        width: Option<u32>,
        /// Hide the column.
        #[arg(long, conflicts_with = "show")]
        hide: bool,
        /// Show the column.
        #[arg(long)]
        show: bool,
    },
    /// Forget a field's saved layout.
    Reset { field: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Term { terms } = &cli.command {
        let spec = query_from_terms(terms)?;
        println!("{}", serde_json::to_string_pretty(&spec.serialize())?);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.logging);

    match cli.command {
        Commands::Search {
            query_file,
            terms,
            sort,
            desc,
            size,
            from,
            all_columns,
            detail,
        } => {
            let opts = SearchOptions {
                query_file,
                terms,
                sort,
                descending: desc,
                size,
                from,
                all_columns,
                detail,
            };
            search::run_search(&cfg, opts).await?;
        }
        Commands::Columns { action } => match action {
            ColumnsAction::List => columns_cmd::run_columns_list(&cfg)?,
            ColumnsAction::Set {
                field,
                width,
                hide,
                show,
            } => {
                let hidden = match (hide, show) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                columns_cmd::run_columns_set(&cfg, &field, width, hidden)?;
            }
            ColumnsAction::Reset { field } => columns_cmd::run_columns_reset(&cfg, &field)?,
        },
        Commands::Term { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
