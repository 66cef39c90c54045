//! Export: flattens the graph into the payload the backend persists and
//! simulates, and gates saving behind `validate_model`.

use crate::connect::validate_connection;
use crate::error::{ConnectionError, ModelViolation};
use crate::id::ElementId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt::Write;

/// Condition written into exclusive-gateway branches left blank. The
/// simulator evaluates `${...}` expressions; this one is always true.
pub const DEFAULT_CONDITION: &str = "${True}";

// ─── Payload ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub pools: Vec<PoolRecord>,
    pub nodes: Vec<FlowNodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub start_events: Vec<ElementId>,
    pub end_events: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub id: ElementId,
    pub name: String,
    pub owner: String,
    pub lanes: Vec<LaneRecord>,
    /// Direct members outside every lane.
    pub members: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneRecord {
    pub id: ElementId,
    pub name: String,
    pub role: String,
    pub color: String,
    pub members: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNodeRecord {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<ElementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<ElementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(
        rename = "expected_duration_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_duration_minutes: Option<u32>,
    #[serde(rename = "cost_per_hour", skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<Level>,
    #[serde(rename = "ml_prediction", skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_type: Option<GatewayKind>,
    /// Data objects linked to this activity by associations.
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub data_objects: SmallVec<[ElementId; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: ElementId,
    pub source: ElementId,
    pub target: ElementId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ─── Building ────────────────────────────────────────────────────────────

/// Flatten `graph` into the persistence payload.
pub fn export_payload(graph: &ProcessGraph) -> ExportPayload {
    let pools = graph
        .pools()
        .into_iter()
        .map(|pool| pool_record(graph, pool))
        .collect();

    let mut nodes = Vec::new();
    let mut start_events = Vec::new();
    let mut end_events = Vec::new();
    for idx in graph.node_indices() {
        let node = graph.node(idx);
        match node.node_type() {
            ty if ty.is_container() => continue,
            NodeType::Start => start_events.push(node.id),
            NodeType::End => end_events.push(node.id),
            _ => {}
        }
        nodes.push(node_record(graph, idx));
    }

    let edges = graph
        .edges
        .iter()
        .map(|edge| edge_record(graph, edge))
        .collect();

    ExportPayload {
        pools,
        nodes,
        edges,
        start_events,
        end_events,
    }
}

fn pool_record(graph: &ProcessGraph, pool: NodeIndex) -> PoolRecord {
    let node = graph.node(pool);
    let mut lanes = Vec::new();
    let mut members = Vec::new();
    for child in graph.children(pool) {
        let member = graph.node(child);
        match &member.kind {
            NodeKind::Lane(attrs) => lanes.push(LaneRecord {
                id: member.id,
                name: member.label.clone(),
                role: attrs.role.clone(),
                color: attrs.color.clone(),
                members: graph
                    .children(child)
                    .into_iter()
                    .map(|m| graph.node(m).id)
                    .collect(),
            }),
            _ => members.push(member.id),
        }
    }
    PoolRecord {
        id: node.id,
        name: node.label.clone(),
        owner: match &node.kind {
            NodeKind::Pool(attrs) => attrs.owner.clone(),
            _ => String::new(),
        },
        lanes,
        members,
    }
}

fn node_record(graph: &ProcessGraph, idx: NodeIndex) -> FlowNodeRecord {
    let node = graph.node(idx);
    let lane = graph
        .container(idx)
        .filter(|&c| graph.node(c).node_type() == NodeType::Lane)
        .map(|c| graph.node(c).id);

    let mut record = FlowNodeRecord {
        id: node.id,
        node_type: node.node_type(),
        label: node.label.clone(),
        pool: graph.pool_of(idx).map(|p| graph.node(p).id),
        lane,
        role: node.role().map(str::to_string),
        employee: None,
        expected_duration_minutes: None,
        cost_per_hour: None,
        priority: None,
        risk_level: None,
        ml_prediction: None,
        gateway_type: node.gateway_kind(),
        data_objects: SmallVec::new(),
    };

    match &node.kind {
        NodeKind::Task(t) => {
            record.employee = t.employee.clone();
            record.expected_duration_minutes = Some(t.expected_duration_minutes);
            record.cost_per_hour = Some(t.cost_per_hour);
            record.priority = Some(t.priority);
            record.risk_level = Some(t.risk_level);
            record.ml_prediction = Some(t.ml_prediction);
        }
        NodeKind::Subprocess(s) => {
            record.employee = s.employee.clone();
            record.priority = Some(s.priority);
            record.risk_level = Some(s.risk_level);
        }
        _ => {}
    }

    if node.node_type().is_activity() {
        record.data_objects = graph
            .edges_touching(node.id)
            .filter(|e| e.edge_type() == EdgeType::Association)
            .map(|e| if e.source == node.id { e.target } else { e.source })
            .filter(|&other| graph.node_type_of(other) == Some(NodeType::DataObject))
            .collect();
    }
    record
}

fn edge_record(graph: &ProcessGraph, edge: &ProcessEdge) -> EdgeRecord {
    let mut record = EdgeRecord {
        id: edge.id,
        source: edge.source,
        target: edge.target,
        edge_type: edge.edge_type(),
        label: edge.label.clone(),
        condition: None,
        probability: None,
        content: None,
    };
    match &edge.kind {
        EdgeKind::Sequence { probability, .. } => {
            record.condition = match edge.condition() {
                Some(c) => Some(c.to_string()),
                None if leaves_exclusive_gateway(graph, edge) => {
                    Some(DEFAULT_CONDITION.to_string())
                }
                None => None,
            };
            record.probability = probability.clone();
        }
        EdgeKind::Message { content } => record.content = content.clone(),
        EdgeKind::Association => {}
    }
    record
}

fn leaves_exclusive_gateway(graph: &ProcessGraph, edge: &ProcessEdge) -> bool {
    edge.edge_type() == EdgeType::SequenceFlow
        && graph
            .get_by_id(edge.source)
            .and_then(ProcessNode::gateway_kind)
            == Some(GatewayKind::Exclusive)
}

/// Write `DEFAULT_CONDITION` into every blank exclusive-gateway branch.
/// Returns the number of edges changed.
pub fn apply_default_conditions(graph: &mut ProcessGraph) -> usize {
    let blank: Vec<ElementId> = graph
        .edges
        .iter()
        .filter(|e| e.condition().is_none() && leaves_exclusive_gateway(graph, e))
        .map(|e| e.id)
        .collect();
    for id in &blank {
        if let Some(edge) = graph.edge_mut(*id)
            && let EdgeKind::Sequence { condition, .. } = &mut edge.kind
        {
            *condition = Some(DEFAULT_CONDITION.to_string());
        }
    }
    if !blank.is_empty() {
        log::debug!("filled {} default gateway conditions", blank.len());
    }
    blank.len()
}

// ─── Validation ──────────────────────────────────────────────────────────

/// Check the model against the save rules. Every violation is reported.
pub fn validate_model(graph: &ProcessGraph) -> Result<(), Vec<ModelViolation>> {
    let mut violations = Vec::new();

    if graph.pools().is_empty() {
        violations.push(ModelViolation::NoPool);
    }
    if graph.of_type(NodeType::Start).is_empty() {
        violations.push(ModelViolation::NoStartEvent);
    }
    if graph.of_type(NodeType::End).is_empty() {
        violations.push(ModelViolation::NoEndEvent);
    }

    for idx in graph.node_indices() {
        let node = graph.node(idx);
        let blank_role = node.role().is_none_or(|r| r.trim().is_empty());
        if node.node_type().is_activity() && blank_role {
            violations.push(ModelViolation::MissingRole {
                id: node.id,
                label: node.label.clone(),
            });
        }
        if node.gateway_kind() == Some(GatewayKind::Exclusive) {
            let count = graph
                .outgoing(node.id)
                .filter(|e| e.edge_type() == EdgeType::SequenceFlow)
                .count();
            if count < 2 {
                violations.push(ModelViolation::GatewayBranches {
                    id: node.id,
                    label: node.label.clone(),
                    count,
                });
            }
        }
    }

    for edge in &graph.edges {
        if edge.condition().is_none() && leaves_exclusive_gateway(graph, edge) {
            violations.push(ModelViolation::MissingCondition { edge: edge.id });
        }
        if let Some(reason) = edge_violation(graph, edge) {
            violations.push(ModelViolation::InvalidEdge {
                edge: edge.id,
                reason,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Re-check a stored edge against the connection rules. The edge itself is
/// in the graph, so the duplicate rule only counts when it has a twin.
fn edge_violation(graph: &ProcessGraph, edge: &ProcessEdge) -> Option<ConnectionError> {
    let ty = edge.edge_type();
    match validate_connection(graph, edge.source, edge.target, ty) {
        Ok(()) => None,
        Err(ConnectionError::Duplicate(_)) => {
            let twins = graph
                .outgoing(edge.source)
                .filter(|e| e.target == edge.target && e.edge_type() == ty)
                .count();
            (twins > 1).then_some(ConnectionError::Duplicate(ty))
        }
        Err(err) => Some(err),
    }
}

// ─── Legacy XML mirror ───────────────────────────────────────────────────

/// The simplified `bpmnXml` string still sent alongside the document for
/// older consumers.
pub fn legacy_xml(graph: &ProcessGraph) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<bpmn:definitions>\n  <bpmn:process id=\"Process_1\">\n");
    for idx in graph.node_indices() {
        let node = graph.node(idx);
        let _ = writeln!(
            out,
            "    <node id=\"{}\" type=\"{}\" label=\"{}\" />",
            escape(node.id.as_str()),
            node.node_type().as_str(),
            escape(&node.label)
        );
    }
    for edge in &graph.edges {
        let _ = writeln!(
            out,
            "    <edge id=\"{}\" source=\"{}\" target=\"{}\" type=\"{}\" label=\"{}\" />",
            escape(edge.id.as_str()),
            escape(edge.source.as_str()),
            escape(edge.target.as_str()),
            edge.edge_type().as_str(),
            escape(edge.label.as_deref().unwrap_or(""))
        );
    }
    out.push_str("  </bpmn:process>\n</bpmn:definitions>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
