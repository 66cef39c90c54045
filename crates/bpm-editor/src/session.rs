//! Load/save lifecycle against the process-model backend.
//!
//! The host performs the HTTP calls; this module owns the wire bodies and
//! the `Idle` → `Saving` → `Idle` state that keeps a second save from
//! starting while one is in flight.

use bpm_core::config::GeometryConfig;
use bpm_core::document::GraphDocument;
use bpm_core::error::{DocumentError, ModelViolation};
use bpm_core::export::{ExportPayload, export_payload, legacy_xml, validate_model};
use bpm_core::model::ProcessGraph;
use bpm_core::legacy_fallback;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `GET /process-models/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bpmn_xml: Option<String>,
    /// Persisted document; any `export` key is ignored on load.
    #[serde(default)]
    pub data: Option<GraphDocument>,
}

impl ModelRecord {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the editable graph.
    ///
    /// Records saved before the graph format carry only `bpmnXml`; those
    /// open on the fixed fallback process. A record with neither opens empty.
    pub fn into_graph(self, config: &GeometryConfig) -> Result<ProcessGraph, DocumentError> {
        match self.data {
            Some(doc) if !doc.nodes.is_empty() => doc.into_graph(config),
            _ if self.bpmn_xml.as_deref().is_some_and(|x| !x.trim().is_empty()) => {
                log::info!("model has no graph data, seeding fallback process");
                Ok(legacy_fallback())
            }
            _ => Ok(ProcessGraph::new()),
        }
    }
}

/// `data` field of a save: the document plus its export payload.
#[derive(Debug, Clone, Serialize)]
pub struct SaveData {
    #[serde(flatten)]
    pub document: GraphDocument,
    pub export: ExportPayload,
}

/// Body of `PUT /process-models/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub bpmn_xml: String,
    pub data: SaveData,
}

impl SaveRequest {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("a save is already in progress")]
    InFlight,

    #[error("the model cannot be saved: {}", summary(.0))]
    Invalid(Vec<ModelViolation>),

    #[error("failed to encode the save request: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn summary(violations: &[ModelViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transient message shown after a save attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum Feedback {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
}

#[derive(Debug, Clone)]
pub struct SaveSession {
    model_id: String,
    state: SaveState,
}

impl SaveSession {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            state: SaveState::Idle,
        }
    }

    /// REST path for both the load and the save call.
    pub fn model_path(&self) -> String {
        format!("/process-models/{}", self.model_id)
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_saving(&self) -> bool {
        self.state == SaveState::Saving
    }

    /// Validate `graph` and build the save body, entering `Saving`.
    ///
    /// Blank exclusive-gateway conditions must already be filled.
    pub fn begin_save(
        &mut self,
        graph: &ProcessGraph,
        name: &str,
        description: &str,
    ) -> Result<SaveRequest, SaveError> {
        if self.is_saving() {
            return Err(SaveError::InFlight);
        }
        validate_model(graph).map_err(SaveError::Invalid)?;

        let request = SaveRequest {
            name: name.to_string(),
            description: description.to_string(),
            status: "draft",
            bpmn_xml: legacy_xml(graph),
            data: SaveData {
                document: GraphDocument::from_graph(graph),
                export: export_payload(graph),
            },
        };
        self.state = SaveState::Saving;
        log::info!(
            "saving {}: {} nodes, {} edges",
            self.model_path(),
            graph.node_count(),
            graph.edges.len()
        );
        Ok(request)
    }

    /// Record the outcome of the PUT and leave `Saving`.
    pub fn finish_save(&mut self, result: Result<(), String>) -> Feedback {
        self.state = SaveState::Idle;
        match result {
            Ok(()) => {
                log::info!("saved {}", self.model_path());
                Feedback::Success("Model saved".to_string())
            }
            Err(message) => {
                log::warn!("save of {} failed: {message}", self.model_path());
                Feedback::Error(format!("Failed to save the model: {message}"))
            }
        }
    }
}
