//! The result grid model.
//!
//! [`ResultGridModel`] owns the current [`QuerySpec`] and [`ResultSet`],
//! exposes them to views as a read-only table, and turns sort and query
//! changes into backend fetches.
//!
//! # States
//!
//! ```text
//!            set_query              success
//!   Empty ─────────────▶ Loading ───────────▶ Ready
//!                          ▲  │                 │
//!                          │  │ failure         │ set_query / set_sort / set_offset
//!                          │  ▼                 │
//!                          └─ Failed ◀──────────┘ (via Loading)
//! ```
//!
//! Sorting is always a server-side re-query: [`set_sort`](ResultGridModel::set_sort)
//! rewrites the spec's sort and fetches again, so ordering stays consistent
//! with the backend's pagination.
//!
//! # Concurrency
//!
//! Calls return immediately; the fetch runs on a spawned tokio task and the
//! outcome is published as a [`GridEvent`]. Every request is stamped with a
//! generation number. Applying a completion happens under the state lock and
//! only if its generation is still the latest, so a late response from a
//! superseded request is dropped. Superseded requests are not aborted.
//!
//! A failed fetch keeps the previous [`ResultSet`] so views can keep showing
//! the last good rows next to the error.
//!
//! Fetches are spawned on the tokio runtime that was current when the model
//! was built, or failing that the one current at the call. With neither, the
//! request fails with [`GridError::TransportFailure`] instead of panicking.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::error::{ErrorKind, GridError};
use crate::query::{QuerySpec, SortDirection};
use crate::result_set::ResultSet;
use crate::service::QueryService;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    Empty,
    Loading,
    Ready,
    Failed,
}

/// Notification published to every subscribed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// The result set was replaced. All row and column indices a view
    /// holds are invalid from here on.
    Reset,
    QueryError { kind: ErrorKind, message: String },
}

/// Sort as the view sees it: the column that holds the sorted field in the
/// result set shown right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

struct GridState {
    status: GridStatus,
    query: Option<QuerySpec>,
    results: Option<Arc<ResultSet>>,
    last_error: Option<GridError>,
    generation: u64,
}

struct Inner {
    service: Arc<dyn QueryService>,
    runtime: Option<Handle>,
    state: Mutex<GridState>,
    events: broadcast::Sender<GridEvent>,
}

/// Cheaply cloneable handle to one grid; clones share state.
#[derive(Clone)]
pub struct ResultGridModel {
    inner: Arc<Inner>,
}

impl ResultGridModel {
    pub fn new(service: Arc<dyn QueryService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                service,
                runtime: Handle::try_current().ok(),
                state: Mutex::new(GridState {
                    status: GridStatus::Empty,
                    query: None,
                    results: None,
                    last_error: None,
                    generation: 0,
                }),
                events,
            }),
        }
    }

    /// Receive every [`GridEvent`] published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.inner.events.subscribe()
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Parse `raw` and fetch it with no sort override.
    ///
    /// On a parse failure a [`GridEvent::QueryError`] with
    /// [`ErrorKind::MalformedQuery`] is published and nothing else changes.
    pub fn set_query(&self, raw: &str) {
        match QuerySpec::parse(raw) {
            Ok(spec) => {
                let mut state = self.inner.state.lock();
                self.start_fetch(&mut state, spec.clear_sort());
            }
            Err(err) => {
                tracing::info!(error = %err, "rejected malformed query");
                self.publish(GridEvent::QueryError {
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Fetch an already-built spec as-is, including its sort.
    pub fn submit(&self, spec: QuerySpec) {
        let mut state = self.inner.state.lock();
        self.start_fetch(&mut state, spec);
    }

    /// Sort by the field currently shown in `column` and fetch again.
    ///
    /// No-op when there is no result yet or `column` is out of range. The
    /// column is translated to a field name against the result set held
    /// right now.
    pub fn set_sort(&self, column: usize, direction: SortDirection) {
        let mut state = self.inner.state.lock();
        let field = match state.results.as_ref().and_then(|r| r.field(column)) {
            Some(f) => f.to_string(),
            None => {
                tracing::debug!(column, "sort ignored: no such column");
                return;
            }
        };
        let spec = match state.query.clone() {
            Some(q) => q.with_sort(field, direction),
            None => return,
        };
        self.start_fetch(&mut state, spec);
    }

    /// Fetch the page starting at `offset` with the current spec.
    /// No-op before the first query.
    pub fn set_offset(&self, offset: u64) {
        let mut state = self.inner.state.lock();
        let spec = match state.query.clone() {
            Some(q) => q.with_offset(offset),
            None => return,
        };
        self.start_fetch(&mut state, spec);
    }

    fn start_fetch(&self, state: &mut GridState, spec: QuerySpec) {
        state.generation += 1;
        state.status = GridStatus::Loading;
        state.query = Some(spec.clone());
        let generation = state.generation;

        tracing::info!(
            generation,
            sort = ?spec.sort().map(|s| (&s.field, s.direction)),
            size = spec.page_size(),
            from = spec.offset(),
            "fetching"
        );

        let runtime = match self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        {
            Some(handle) => handle,
            None => {
                let err = GridError::TransportFailure("no async runtime to run the fetch on".into());
                tracing::error!(generation, error = %err, "fetch not started");
                self.fail(state, generation, err);
                return;
            }
        };

        let model = self.clone();
        runtime.spawn(async move {
            let outcome = model.inner.service.execute(&spec).await;
            model.apply_completion(generation, outcome);
        });
    }

    fn apply_completion(&self, generation: u64, outcome: Result<ResultSet, GridError>) {
        let mut state = self.inner.state.lock();
        if generation != state.generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "dropping superseded response"
            );
            return;
        }

        match outcome {
            Ok(results) => {
                tracing::info!(
                    generation,
                    rows = results.row_count(),
                    columns = results.column_count(),
                    total = results.total(),
                    "results applied"
                );
                state.results = Some(Arc::new(results));
                state.status = GridStatus::Ready;
                state.last_error = None;
                self.publish(GridEvent::Reset);
            }
            Err(err) => self.fail(&mut state, generation, err),
        }
    }

    fn fail(&self, state: &mut GridState, generation: u64, err: GridError) {
        tracing::warn!(generation, kind = %err.kind(), error = %err, "fetch failed");
        state.status = GridStatus::Failed;
        self.publish(GridEvent::QueryError {
            kind: err.kind(),
            message: err.to_string(),
        });
        state.last_error = Some(err);
    }

    fn publish(&self, event: GridEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // ─── Read-only projections ──────────────────────────────────────

    pub fn status(&self) -> GridStatus {
        self.inner.state.lock().status
    }

    /// Snapshot of the current result set, shareable across threads.
    pub fn result_set(&self) -> Option<Arc<ResultSet>> {
        self.inner.state.lock().results.clone()
    }

    pub fn query(&self) -> Option<QuerySpec> {
        self.inner.state.lock().query.clone()
    }

    /// Column and direction of the current sort override.
    ///
    /// The column is looked up by field name in the current result set on
    /// every call, so it follows the field when a re-fetch shifts columns.
    /// `None` when there is no override or the field is not in the results.
    pub fn sort_state(&self) -> Option<SortState> {
        let state = self.inner.state.lock();
        let key = state.query.as_ref()?.sort()?;
        let column = state.results.as_ref()?.column_of(&key.field)?;
        Some(SortState {
            column,
            direction: key.direction,
        })
    }

    /// Error from the most recent failed fetch, cleared on success.
    pub fn last_error(&self) -> Option<GridError> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn row_count(&self) -> usize {
        self.result_set().map_or(0, |r| r.row_count())
    }

    pub fn column_count(&self) -> usize {
        self.result_set().map_or(0, |r| r.column_count())
    }

    pub fn fields(&self) -> Vec<String> {
        self.result_set()
            .map(|r| r.fields().to_vec())
            .unwrap_or_default()
    }

    pub fn header(&self, column: usize) -> Option<String> {
        self.result_set()?.field(column).map(str::to_string)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Value> {
        self.result_set()?.cell(row, column).cloned()
    }

    /// Grid text for a cell; see [`ResultSet::display_cell`].
    pub fn display(&self, row: usize, column: usize) -> Option<String> {
        self.result_set()?.display_cell(row, column).map(str::to_string)
    }

    /// Full detail text for a row; see [`ResultSet::row_detail_text`].
    pub fn detail(&self, row: usize) -> Option<String> {
        self.result_set()?.row_detail_text(row)
    }
}
