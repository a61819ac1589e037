//! Canvas LMS data-access layer for LLM agents.
//!
//! Wraps the Canvas REST API in a typed client ([`api::CanvasClient`]) that
//! normalizes Canvas's uneven JSON into simplified records, plus a
//! transport-agnostic tool surface ([`tools`]) an agent orchestrator can
//! call by name with plain JSON arguments.

pub mod api;
pub mod config;
pub mod format;
pub mod models;
pub mod records;
pub mod tools;

pub use api::{CanvasClient, CanvasError};
pub use config::Config;
