//! # DevToolBox
//!
//! Single-purpose developer utilities (encoders, formatters, a regex tester,
//! a lorem ipsum generator, a favicon generator) served as a CLI and a JSON
//! HTTP API, with bookmarks and feedback kept in a local document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────┐   ┌──────────┐
//! │ devtoolbox-core  │──▶│ ToolRegistry │──▶│   HTTP   │
//! │ pure transforms  │   │  (traits)    │   │  (axum)  │
//! └────────┬─────────┘   └──────────────┘   └──────────┘
//!          │
//!          ▼
//!     ┌──────────┐        ┌──────────────────────────┐
//!     │   CLI    │───────▶│ SQLite: documents,       │
//!     │  (dtb)   │        │ tool_state               │
//!     └──────────┘        └──────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dtb init
//! echo '{"a":1}' | dtb json format --indent four
//! dtb regex '(\w+)@' 'ada@example.com'
//! dtb lorem --unit words --count 20
//! dtb serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite document store |
//! | [`tool_state`] | Remembered per-tool inputs |
//! | [`files`] | File reads and download writes |
//! | [`favicon`] | Favicon set generation |
//! | [`traits`] | `Tool` trait and registry |
//! | [`tools`] | Built-in tools |
//! | [`app`] | Application context |
//! | [`commands`] | CLI command runners |
//! | [`server`] | HTTP server |

pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod favicon;
pub mod files;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod tool_state;
pub mod tools;
pub mod traits;
