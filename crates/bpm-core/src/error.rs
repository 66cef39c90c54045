//! Error types for process documents.

use crate::id::ElementId;
use crate::model::EdgeType;
use thiserror::Error;

/// Why a prospective edge was rejected. `Display` is the user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("unknown endpoint {0}")]
    UnknownEndpoint(ElementId),

    #[error("a node cannot be connected to itself")]
    SelfConnection,

    #[error("{flow} can only connect flow objects; {id} is a {kind}")]
    NotFlowObject {
        flow: &'static str,
        id: ElementId,
        kind: &'static str,
    },

    #[error("sequence flow must stay within the same pool")]
    CrossPool,

    #[error("a start event cannot have incoming sequence flow")]
    IntoStartEvent,

    #[error("an end event cannot have outgoing sequence flow")]
    FromEndEvent,

    #[error("message flow must connect nodes in different pools")]
    SamePool,

    #[error("association must link exactly one data object with a task or subprocess")]
    AssociationEndpoints,

    #[error("a {} already connects these nodes", .0.as_str())]
    Duplicate(EdgeType),
}

/// Failure to turn a persisted document into a process graph.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate element id {0}")]
    DuplicateId(ElementId),

    #[error("lane {lane} must belong to a pool, found {parent:?}")]
    LaneWithoutPool {
        lane: ElementId,
        parent: Option<ElementId>,
    },

    #[error("{child} cannot be placed inside {parent}")]
    InvalidContainer { child: ElementId, parent: ElementId },
}

/// A finding of `validate_model`. `Display` is the message shown to the
/// user; all findings are reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelViolation {
    #[error("the model needs at least one pool")]
    NoPool,

    #[error("the model needs at least one start event")]
    NoStartEvent,

    #[error("the model needs at least one end event")]
    NoEndEvent,

    #[error("{label} ({id}) has no role")]
    MissingRole { id: ElementId, label: String },

    #[error("exclusive gateway {label} ({id}) needs at least two outgoing sequence flows, found {count}")]
    GatewayBranches {
        id: ElementId,
        label: String,
        count: usize,
    },

    #[error("sequence flow {edge} leaves an exclusive gateway without a condition")]
    MissingCondition { edge: ElementId },

    #[error("edge {edge}: {reason}")]
    InvalidEdge {
        edge: ElementId,
        reason: ConnectionError,
    },
}
