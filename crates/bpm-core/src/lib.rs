pub mod config;
pub mod connect;
pub mod decor;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod id;
pub mod model;
pub mod resolve;

pub use config::GeometryConfig;
pub use connect::validate_connection;
pub use decor::{EdgeDecoration, decorate};
pub use document::{GraphDocument, legacy_fallback};
pub use error::{ConnectionError, DocumentError, ModelViolation};
pub use export::{ExportPayload, apply_default_conditions, export_payload, legacy_xml, validate_model};
pub use id::ElementId;
pub use model::*;
pub use resolve::normalize;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
