//! Connection rules: decides whether a prospective edge is legal.
//!
//! Rules are checked in order and the first failure wins:
//!
//! 1. Both endpoints exist.
//! 2. Source and target differ.
//! 3. Sequence flow: flow objects only, same enclosing pool, never into a
//!    start event, never out of an end event.
//! 4. Message flow: flow objects only, different pools.
//! 5. Association: one data object and one task/subprocess.
//! 6. No second edge of the same type between the same ordered pair.
//!
//! Pool membership: a node outside every pool counts as being in no pool.
//! Two such nodes share "the same pool" for sequence flow (a pool-less
//! diagram is one implicit process), and a message flow with an unassigned
//! endpoint is accepted since it cannot be in the same pool as the other end.

use crate::error::ConnectionError;
use crate::id::ElementId;
use crate::model::*;
use petgraph::graph::NodeIndex;

/// Check a candidate `source → target` edge of type `ty` against `graph`.
pub fn validate_connection(
    graph: &ProcessGraph,
    source: ElementId,
    target: ElementId,
    ty: EdgeType,
) -> Result<(), ConnectionError> {
    let src = graph
        .index_of(source)
        .ok_or(ConnectionError::UnknownEndpoint(source))?;
    let dst = graph
        .index_of(target)
        .ok_or(ConnectionError::UnknownEndpoint(target))?;

    if source == target {
        return Err(ConnectionError::SelfConnection);
    }

    let src_ty = graph.node(src).node_type();
    let dst_ty = graph.node(dst).node_type();

    match ty {
        EdgeType::SequenceFlow => {
            require_flow_objects(graph, ty, &[src, dst])?;
            if graph.pool_of(src) != graph.pool_of(dst) {
                return Err(ConnectionError::CrossPool);
            }
            if dst_ty == NodeType::Start {
                return Err(ConnectionError::IntoStartEvent);
            }
            if src_ty == NodeType::End {
                return Err(ConnectionError::FromEndEvent);
            }
        }
        EdgeType::MessageFlow => {
            require_flow_objects(graph, ty, &[src, dst])?;
            if let (Some(a), Some(b)) = (graph.pool_of(src), graph.pool_of(dst))
                && a == b
            {
                return Err(ConnectionError::SamePool);
            }
        }
        EdgeType::Association => {
            let ok = (src_ty == NodeType::DataObject && dst_ty.is_activity())
                || (dst_ty == NodeType::DataObject && src_ty.is_activity());
            if !ok {
                return Err(ConnectionError::AssociationEndpoints);
            }
        }
    }

    let duplicate = graph
        .outgoing(source)
        .any(|e| e.target == target && e.edge_type() == ty);
    if duplicate {
        return Err(ConnectionError::Duplicate(ty));
    }

    Ok(())
}

fn require_flow_objects(
    graph: &ProcessGraph,
    ty: EdgeType,
    ends: &[NodeIndex],
) -> Result<(), ConnectionError> {
    for &idx in ends {
        let node = graph.node(idx);
        if !node.node_type().is_flow_object() {
            return Err(ConnectionError::NotFlowObject {
                flow: flow_name(ty),
                id: node.id,
                kind: node.node_type().as_str(),
            });
        }
    }
    Ok(())
}

fn flow_name(ty: EdgeType) -> &'static str {
    match ty {
        EdgeType::SequenceFlow => "sequence flow",
        EdgeType::MessageFlow => "message flow",
        EdgeType::Association => "association",
    }
}
