//! Persisted graph document: the `{ nodes, edges }` JSON stored by the
//! process-model backend.
//!
//! On the wire each node carries a flat, all-optional `data` bag; loading
//! folds it into the typed `NodeKind` variants and saving flattens it back.
//! Positions are absolute canvas coordinates; containment is expressed by
//! `parentNode`.

use crate::config::GeometryConfig;
use crate::decor::{Marker, StrokeStyle, decorate};
use crate::error::DocumentError;
use crate::id::ElementId;
use crate::model::*;
use crate::resolve::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    #[serde(default)]
    pub edges: Vec<DocEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocNode {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Owning lane or pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<ElementId>,
    #[serde(default)]
    pub data: NodeData,
}

/// Flat attribute bag of a persisted node. Keys match what the browser
/// editor has always stored, including the snake_case simulation fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(
        rename = "expected_duration_minutes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_duration_minutes: Option<f64>,
    #[serde(rename = "cost_per_hour", default, skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<Level>,
    #[serde(rename = "ml_prediction", default, skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_type: Option<GatewayKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEdge {
    pub id: ElementId,
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default)]
    pub data: EdgeData,
    /// Derived from the edge type; ignored on load.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Marker>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub style: Option<StrokeStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ─── Graph → document ────────────────────────────────────────────────────

impl GraphDocument {
    /// Flatten `graph` into its persisted form.
    pub fn from_graph(graph: &ProcessGraph) -> Self {
        let nodes = graph
            .node_indices()
            .into_iter()
            .map(|idx| {
                let node = graph.node(idx);
                DocNode {
                    id: node.id,
                    node_type: node.node_type(),
                    position: node.position,
                    width: Some(node.size.width),
                    height: Some(node.size.height),
                    parent_node: graph.container(idx).map(|c| graph.node(c).id),
                    data: flatten_node(node),
                }
            })
            .collect();

        let edges = graph.edges.iter().map(flatten_edge).collect();
        Self { nodes, edges }
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn flatten_node(node: &ProcessNode) -> NodeData {
    let mut data = NodeData {
        label: node.label.clone(),
        description: node.description.clone(),
        ..NodeData::default()
    };
    match &node.kind {
        NodeKind::Task(t) => {
            data.role = t.role.clone();
            data.employee = t.employee.clone();
            data.expected_duration_minutes = Some(f64::from(t.expected_duration_minutes));
            data.cost_per_hour = Some(t.cost_per_hour);
            data.priority = Some(t.priority);
            data.risk_level = Some(t.risk_level);
            data.ml_prediction = Some(t.ml_prediction);
            data.assigned_to = t.assigned_to.clone();
            data.due_date = t.due_date.clone();
            data.lane_color = t.lane_color.clone();
        }
        NodeKind::Subprocess(s) => {
            data.role = s.role.clone();
            data.employee = s.employee.clone();
            data.owner = s.owner.clone();
            data.priority = Some(s.priority);
            data.risk_level = Some(s.risk_level);
            data.lane_color = s.lane_color.clone();
        }
        NodeKind::Gateway(kind) => data.gateway_type = Some(*kind),
        NodeKind::Start | NodeKind::End => {}
        NodeKind::Message(m) => {
            data.recipient = Some(m.recipient.clone());
            data.channel = Some(m.channel.clone());
        }
        NodeKind::DataObject(d) => {
            data.data_type = Some(d.data_type.clone());
            data.source = Some(d.source.clone());
            data.destination = Some(d.destination.clone());
        }
        NodeKind::Lane(l) => {
            data.role = Some(l.role.clone());
            data.color = Some(l.color.clone());
        }
        NodeKind::Pool(p) => data.owner = Some(p.owner.clone()),
    }
    data
}

fn flatten_edge(edge: &ProcessEdge) -> DocEdge {
    let ty = edge.edge_type();
    let mut data = EdgeData {
        edge_type: ty,
        label: edge.label.clone(),
        ..EdgeData::default()
    };
    match &edge.kind {
        EdgeKind::Sequence {
            condition,
            probability,
        } => {
            data.condition = condition.clone();
            data.probability = probability.clone();
        }
        EdgeKind::Message { content } => data.content = content.clone(),
        EdgeKind::Association => {}
    }
    let decoration = decorate(ty);
    DocEdge {
        id: edge.id,
        source: edge.source,
        target: edge.target,
        data,
        marker_end: decoration.marker_end,
        style: Some(decoration.style),
    }
}

// ─── Document → graph ────────────────────────────────────────────────────

impl GraphDocument {
    /// Build a normalized graph from the persisted form.
    ///
    /// Unknown `parentNode` references are cleared and edges with a missing
    /// endpoint are dropped, both with a warning. A lane that ends up outside
    /// every pool, a pool with a parent, or a duplicate id is an error.
    pub fn into_graph(self, config: &GeometryConfig) -> Result<ProcessGraph, DocumentError> {
        let mut seen = HashSet::new();
        for id in self
            .nodes
            .iter()
            .map(|n| n.id)
            .chain(self.edges.iter().map(|e| e.id))
        {
            if !seen.insert(id) {
                return Err(DocumentError::DuplicateId(id));
            }
        }

        let mut graph = ProcessGraph::new();
        for doc in &self.nodes {
            graph.add_node(None, typed_node(doc));
        }

        for doc in &self.nodes {
            let Some(parent_id) = doc.parent_node else {
                continue;
            };
            let Some(parent) = graph.index_of(parent_id) else {
                log::warn!("{} refers to missing container {parent_id}; kept top-level", doc.id);
                continue;
            };
            let parent_ty = graph.node(parent).node_type();
            let legal = match doc.node_type {
                NodeType::Pool => false,
                NodeType::Lane => parent_ty == NodeType::Pool,
                _ => parent_ty.is_container(),
            };
            if !legal {
                return Err(if doc.node_type == NodeType::Lane {
                    DocumentError::LaneWithoutPool {
                        lane: doc.id,
                        parent: Some(parent_id),
                    }
                } else {
                    DocumentError::InvalidContainer {
                        child: doc.id,
                        parent: parent_id,
                    }
                });
            }
            if let Some(child) = graph.index_of(doc.id) {
                graph.set_container(child, Some(parent));
            }
        }

        for doc in self.edges {
            if !graph.contains(doc.source) || !graph.contains(doc.target) {
                log::warn!(
                    "dropping edge {} with missing endpoint ({} -> {})",
                    doc.id,
                    doc.source,
                    doc.target
                );
                continue;
            }
            graph.add_edge(typed_edge(doc));
        }

        normalize(&mut graph, config);

        for lane in graph.of_type(NodeType::Lane) {
            let owned = graph
                .container(lane)
                .is_some_and(|c| graph.node(c).node_type() == NodeType::Pool);
            if !owned {
                return Err(DocumentError::LaneWithoutPool {
                    lane: graph.node(lane).id,
                    parent: graph.container(lane).map(|c| graph.node(c).id),
                });
            }
        }

        log::debug!(
            "loaded document: {} nodes, {} edges",
            graph.node_count(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

fn typed_node(doc: &DocNode) -> ProcessNode {
    let d = &doc.data;
    let ty = doc.node_type;
    let text = |v: &Option<String>, fallback: &str| v.clone().unwrap_or_else(|| fallback.to_string());

    let kind = match ty {
        NodeType::Task => {
            let defaults = TaskAttrs::default();
            NodeKind::Task(TaskAttrs {
                role: d.role.clone(),
                employee: d.employee.clone(),
                expected_duration_minutes: d
                    .expected_duration_minutes
                    .map(|m| m.max(0.0).round() as u32)
                    .unwrap_or(defaults.expected_duration_minutes),
                cost_per_hour: d.cost_per_hour.unwrap_or(defaults.cost_per_hour),
                priority: d.priority.unwrap_or(defaults.priority),
                risk_level: d.risk_level.unwrap_or(defaults.risk_level),
                ml_prediction: d.ml_prediction.unwrap_or(defaults.ml_prediction),
                assigned_to: d.assigned_to.clone(),
                due_date: d.due_date.clone(),
                lane_color: d.lane_color.clone(),
            })
        }
        NodeType::Subprocess => {
            let defaults = SubprocessAttrs::default();
            NodeKind::Subprocess(SubprocessAttrs {
                role: d.role.clone(),
                employee: d.employee.clone(),
                owner: d.owner.clone().or(defaults.owner),
                priority: d.priority.unwrap_or(defaults.priority),
                risk_level: d.risk_level.unwrap_or(defaults.risk_level),
                lane_color: d.lane_color.clone(),
            })
        }
        NodeType::Gateway => NodeKind::Gateway(d.gateway_type.unwrap_or_default()),
        NodeType::Start => NodeKind::Start,
        NodeType::End => NodeKind::End,
        NodeType::Message => {
            let defaults = MessageAttrs::default();
            NodeKind::Message(MessageAttrs {
                recipient: text(&d.recipient, &defaults.recipient),
                channel: text(&d.channel, &defaults.channel),
            })
        }
        NodeType::DataObject => {
            let defaults = DataObjectAttrs::default();
            NodeKind::DataObject(DataObjectAttrs {
                data_type: text(&d.data_type, &defaults.data_type),
                source: text(&d.source, &defaults.source),
                destination: text(&d.destination, &defaults.destination),
            })
        }
        NodeType::Lane => {
            let defaults = LaneAttrs::default();
            NodeKind::Lane(LaneAttrs {
                role: text(&d.role, &defaults.role),
                color: text(&d.color, &defaults.color),
            })
        }
        NodeType::Pool => NodeKind::Pool(PoolAttrs {
            owner: d.owner.clone().unwrap_or_default(),
        }),
    };

    let default_size = ty.default_size();
    ProcessNode {
        id: doc.id,
        label: if d.label.is_empty() {
            ty.default_label().to_string()
        } else {
            d.label.clone()
        },
        description: d.description.clone(),
        kind,
        position: doc.position,
        size: Size::new(
            doc.width.unwrap_or(default_size.width),
            doc.height.unwrap_or(default_size.height),
        ),
    }
}

fn typed_edge(doc: DocEdge) -> ProcessEdge {
    let EdgeData {
        edge_type,
        label,
        condition,
        probability,
        content,
    } = doc.data;
    let kind = match edge_type {
        EdgeType::SequenceFlow => EdgeKind::Sequence {
            condition,
            probability,
        },
        EdgeType::MessageFlow => EdgeKind::Message { content },
        EdgeType::Association => EdgeKind::Association,
    };
    ProcessEdge {
        id: doc.id,
        source: doc.source,
        target: doc.target,
        label,
        kind,
    }
}

// ─── Legacy fallback ─────────────────────────────────────────────────────

/// The graph seeded for records that predate the node/edge document and
/// only carry `bpmnXml`: start → task → end, no pools.
pub fn legacy_fallback() -> ProcessGraph {
    let mut graph = ProcessGraph::new();
    let seeds = [
        ("1", NodeType::Start, 100.0, "Начало"),
        ("2", NodeType::Task, 300.0, "Задача 1"),
        ("3", NodeType::End, 500.0, "Конец"),
    ];
    for (id, ty, x, label) in seeds {
        let mut node = ProcessNode::new(ElementId::intern(id), ty, Point::new(x, 100.0));
        node.label = label.to_string();
        if let NodeKind::Task(attrs) = &mut node.kind {
            attrs.role = None;
        }
        graph.add_node(None, node);
    }
    for (id, source, target) in [("e1-2", "1", "2"), ("e2-3", "2", "3")] {
        graph.add_edge(ProcessEdge::new(
            ElementId::intern(id),
            ElementId::intern(source),
            ElementId::intern(target),
            EdgeType::SequenceFlow,
        ));
    }
    graph
}
