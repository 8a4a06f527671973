//! # DevToolBox Core
//!
//! Pure, WASM-safe logic for DevToolBox: the lorem ipsum engine, the regex
//! match evaluator, the format converters, the timestamp converter, and the
//! collaborator traits (document store, auth provider) with in-memory
//! implementations.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Every converter follows the same contract:
//! the whole input parses and a full output is produced, or an error is
//! returned and nothing is produced.

pub mod auth;
pub mod base64_codec;
pub mod error;
pub mod html_entities;
pub mod json;
pub mod jsx;
pub mod lorem;
pub mod models;
pub mod regex_eval;
pub mod services;
pub mod store;
pub mod timestamp;
pub mod yaml;
