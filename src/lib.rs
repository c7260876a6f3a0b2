//! # Flubber
//!
//! An inspector for document search backends: run a query, browse the hits
//! as a table whose columns are discovered from the documents, and drill
//! into any row.
//!
//! ## Architecture
//!
//! ```text
//!  query text ──▶ ┌───────────┐  execute   ┌──────────────┐  POST /_search  ┌─────────┐
//!                 │ QuerySpec │──────────▶ │ QueryService │ ──────────────▶ │ backend │
//!                 └───────────┘            └──────┬───────┘                 └─────────┘
//!                       ▲                         │ ResultSet
//!          set_sort /   │                         ▼
//!          set_query    │              ┌──────────────────┐  GridEvent   ┌───────┐
//!                       └───────────── │ ResultGridModel  │ ───────────▶ │ views │
//!                                      └──────────────────┘              └───────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy shared by all layers |
//! | [`query`] | Query body builder |
//! | [`filter_term`] | Shell-style filter term shorthand |
//! | [`result_set`] | One response as a dynamic-schema table |
//! | [`service`] | Backend execution (HTTP) |
//! | [`model`] | Grid state machine and notifications |
//! | [`layout`] | Per-field column visibility and width |
//! | [`settings`] | Persisted layout and last query |
//! | [`render`] | Terminal rendering |
//! | [`search`] | `flubber search` command |
//! | [`columns_cmd`] | `flubber columns` command |
//! | [`logging`] | Log subscriber setup |

pub mod columns_cmd;
pub mod config;
pub mod error;
pub mod filter_term;
pub mod layout;
pub mod logging;
pub mod model;
pub mod query;
pub mod render;
pub mod result_set;
pub mod search;
pub mod service;
pub mod settings;
