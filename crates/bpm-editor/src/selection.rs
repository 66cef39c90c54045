//! Selection state and the properties panel.
//!
//! At most one node or one edge is selected. The panel field set depends on
//! the selected element's kind, and every field edit is written straight
//! through to the store as an `UpdateNode` / `UpdateEdge` mutation.

use crate::store::{EdgePatch, EditError, GraphMutation, NodePatch};
use bpm_core::id::ElementId;
use bpm_core::model::*;
use serde::Serialize;

/// Exclusive selection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(ElementId),
    Edge(ElementId),
}

impl Selection {
    pub fn node(&self) -> Option<ElementId> {
        match self {
            Selection::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<ElementId> {
        match self {
            Selection::Edge(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Selection::None
    }

    /// Drop the selection if it points at something no longer in `graph`.
    pub fn retain_existing(&mut self, graph: &ProcessGraph) {
        let alive = match self {
            Selection::None => true,
            Selection::Node(id) => graph.contains(*id),
            Selection::Edge(id) => graph.edge(*id).is_some(),
        };
        if !alive {
            *self = Selection::None;
        }
    }
}

/// JSON view of the selection for the host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionView {
    None,
    Node {
        id: ElementId,
        #[serde(rename = "type")]
        node_type: NodeType,
    },
    Edge {
        id: ElementId,
        #[serde(rename = "type")]
        edge_type: &'static str,
    },
}

impl SelectionView {
    pub fn of(graph: &ProcessGraph, selection: Selection) -> Self {
        match selection {
            Selection::Node(id) => graph
                .node_type_of(id)
                .map_or(SelectionView::None, |node_type| SelectionView::Node { id, node_type }),
            Selection::Edge(id) => graph.edge(id).map_or(SelectionView::None, |e| SelectionView::Edge {
                id,
                edge_type: e.edge_type().as_str(),
            }),
            Selection::None => SelectionView::None,
        }
    }
}

// ─── Properties panel ────────────────────────────────────────────────────

/// Input widget for a panel field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "input", rename_all = "camelCase")]
pub enum FieldInput {
    Text,
    TextArea,
    Number,
    Toggle,
    Select { options: &'static [&'static str] },
    ReadOnly,
}

/// One row of the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyField {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub input: FieldInput,
    pub value: String,
}

const LEVELS: &[&str] = &["low", "medium", "high"];
const GATEWAY_KINDS: &[&str] = &["exclusive", "parallel"];

fn field(key: &'static str, label: &'static str, input: FieldInput, value: impl Into<String>) -> PropertyField {
    PropertyField {
        key,
        label,
        input,
        value: value.into(),
    }
}

fn text(key: &'static str, label: &'static str, value: Option<&str>) -> PropertyField {
    field(key, label, FieldInput::Text, value.unwrap_or_default())
}

fn select(key: &'static str, label: &'static str, options: &'static [&'static str], value: &str) -> PropertyField {
    field(key, label, FieldInput::Select { options }, value)
}

/// The panel rows for the current selection.
pub fn properties(graph: &ProcessGraph, selection: Selection) -> Vec<PropertyField> {
    match selection {
        Selection::Node(id) => graph.get_by_id(id).map(node_fields).unwrap_or_default(),
        Selection::Edge(id) => graph.edge(id).map(edge_fields).unwrap_or_default(),
        Selection::None => Vec::new(),
    }
}

fn node_fields(node: &ProcessNode) -> Vec<PropertyField> {
    let mut fields = vec![
        field("type", "Type", FieldInput::ReadOnly, node.node_type().as_str()),
        text("label", "Label", Some(&node.label)),
        field(
            "description",
            "Description",
            FieldInput::TextArea,
            node.description.as_deref().unwrap_or_default(),
        ),
    ];

    match &node.kind {
        NodeKind::Task(t) => fields.extend([
            select("role", "Role", &ROLE_OPTIONS, t.role.as_deref().unwrap_or_default()),
            text("employee", "Employee", t.employee.as_deref()),
            field(
                "expected_duration_minutes",
                "Duration (min)",
                FieldInput::Number,
                t.expected_duration_minutes.to_string(),
            ),
            field("cost_per_hour", "Cost per hour", FieldInput::Number, t.cost_per_hour.to_string()),
            select("priority", "Priority", LEVELS, t.priority.as_str()),
            select("riskLevel", "Risk", LEVELS, t.risk_level.as_str()),
            field(
                "ml_prediction",
                "ML prediction",
                FieldInput::Toggle,
                t.ml_prediction.to_string(),
            ),
            text("assignedTo", "Assigned to", t.assigned_to.as_deref()),
            text("dueDate", "Due date", t.due_date.as_deref()),
        ]),
        NodeKind::Subprocess(s) => fields.extend([
            select("role", "Role", &ROLE_OPTIONS, s.role.as_deref().unwrap_or_default()),
            text("employee", "Employee", s.employee.as_deref()),
            text("owner", "Owner", s.owner.as_deref()),
            select("priority", "Priority", LEVELS, s.priority.as_str()),
            select("riskLevel", "Risk", LEVELS, s.risk_level.as_str()),
        ]),
        NodeKind::Gateway(kind) => {
            fields.push(select("gatewayType", "Gateway type", GATEWAY_KINDS, kind.as_str()));
        }
        NodeKind::Message(m) => fields.extend([
            text("recipient", "Recipient", Some(&m.recipient)),
            text("channel", "Channel", Some(&m.channel)),
        ]),
        NodeKind::DataObject(d) => fields.extend([
            text("dataType", "Data type", Some(&d.data_type)),
            text("source", "Source", Some(&d.source)),
            text("destination", "Destination", Some(&d.destination)),
        ]),
        NodeKind::Lane(l) => fields.extend([
            select("role", "Responsibility", &ROLE_OPTIONS, &l.role),
            select("color", "Color", &LANE_COLORS, &l.color),
        ]),
        NodeKind::Pool(p) => fields.push(text("owner", "Owner", Some(&p.owner))),
        NodeKind::Start | NodeKind::End => {}
    }
    fields
}

fn edge_fields(edge: &ProcessEdge) -> Vec<PropertyField> {
    let mut fields = vec![
        field("type", "Type", FieldInput::ReadOnly, edge.edge_type().as_str()),
        text("label", "Label", edge.label.as_deref()),
    ];
    match &edge.kind {
        EdgeKind::Sequence {
            condition,
            probability,
        } => fields.extend([
            text("condition", "Condition", condition.as_deref()),
            text("probability", "Probability", probability.as_deref()),
        ]),
        EdgeKind::Message { content } => {
            fields.push(text("content", "Content", content.as_deref()));
        }
        EdgeKind::Association => {}
    }
    fields
}

// ─── Write-through ───────────────────────────────────────────────────────

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn invalid(key: &str, value: &str) -> EditError {
    EditError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Turn a panel edit into the mutation that applies it.
pub fn property_mutation(
    graph: &ProcessGraph,
    selection: Selection,
    key: &str,
    value: &str,
) -> Result<GraphMutation, EditError> {
    match selection {
        Selection::Node(id) => {
            if !graph.contains(id) {
                return Err(EditError::UnknownNode(id));
            }
            Ok(GraphMutation::UpdateNode {
                id,
                patch: Box::new(node_patch(key, value)?),
            })
        }
        Selection::Edge(id) => {
            if graph.edge(id).is_none() {
                return Err(EditError::UnknownEdge(id));
            }
            Ok(GraphMutation::UpdateEdge {
                id,
                patch: edge_patch(key, value)?,
            })
        }
        Selection::None => Err(invalid(key, value)),
    }
}

fn node_patch(key: &str, value: &str) -> Result<NodePatch, EditError> {
    let mut patch = NodePatch::default();
    let level = || Level::parse(value).ok_or_else(|| invalid(key, value));
    match key {
        "label" => patch.label = Some(value.to_string()),
        "description" => patch.description = Some(optional(value)),
        "role" => patch.role = Some(optional(value)),
        "employee" => patch.employee = Some(optional(value)),
        "expected_duration_minutes" => {
            let minutes = value.trim().parse::<f64>().map_err(|_| invalid(key, value))?;
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(invalid(key, value));
            }
            patch.expected_duration_minutes = Some(minutes.round() as u32);
        }
        "cost_per_hour" => {
            let cost = value.trim().parse::<f64>().map_err(|_| invalid(key, value))?;
            if !cost.is_finite() {
                return Err(invalid(key, value));
            }
            patch.cost_per_hour = Some(cost);
        }
        "priority" => patch.priority = Some(level()?),
        "riskLevel" => patch.risk_level = Some(level()?),
        "ml_prediction" => {
            patch.ml_prediction = Some(value.parse::<bool>().map_err(|_| invalid(key, value))?)
        }
        "assignedTo" => patch.assigned_to = Some(optional(value)),
        "dueDate" => patch.due_date = Some(optional(value)),
        "owner" => patch.owner = Some(value.trim().to_string()),
        "recipient" => patch.recipient = Some(value.to_string()),
        "channel" => patch.channel = Some(value.to_string()),
        "dataType" => patch.data_type = Some(value.to_string()),
        "source" => patch.source = Some(value.to_string()),
        "destination" => patch.destination = Some(value.to_string()),
        "color" => patch.color = Some(value.to_string()),
        "gatewayType" => {
            patch.gateway = Some(GatewayKind::parse(value).ok_or_else(|| invalid(key, value))?)
        }
        _ => return Err(invalid(key, value)),
    }
    Ok(patch)
}

fn edge_patch(key: &str, value: &str) -> Result<EdgePatch, EditError> {
    let mut patch = EdgePatch::default();
    let slot = match key {
        "label" => &mut patch.label,
        "condition" => &mut patch.condition,
        "probability" => &mut patch.probability,
        "content" => &mut patch.content,
        _ => return Err(invalid(key, value)),
    };
    *slot = Some(optional(value));
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ProcessGraph, ElementId, ElementId) {
        let mut g = ProcessGraph::new();
        let task = ElementId::intern("sel_task");
        let end = ElementId::intern("sel_end");
        g.add_node(None, ProcessNode::new(task, NodeType::Task, Point::default()));
        g.add_node(None, ProcessNode::new(end, NodeType::End, Point::new(300.0, 0.0)));
        let edge = ElementId::intern("sel_edge");
        g.add_edge(ProcessEdge::new(edge, task, end, EdgeType::SequenceFlow));
        (g, task, edge)
    }

    fn keys(fields: &[PropertyField]) -> Vec<&'static str> {
        fields.iter().map(|f| f.key).collect()
    }

    #[test]
    fn task_panel_fields() {
        let (g, task, _) = sample();
        let fields = properties(&g, Selection::Node(task));
        assert_eq!(
            keys(&fields),
            vec![
                "type",
                "label",
                "description",
                "role",
                "employee",
                "expected_duration_minutes",
                "cost_per_hour",
                "priority",
                "riskLevel",
                "ml_prediction",
                "assignedTo",
                "dueDate",
            ]
        );
        assert_eq!(fields[3].value, "Procurement");
        assert_eq!(fields[5].value, "60");
    }

    #[test]
    fn edge_panel_fields() {
        let (g, _, edge) = sample();
        let fields = properties(&g, Selection::Edge(edge));
        assert_eq!(keys(&fields), vec!["type", "label", "condition", "probability"]);
        assert!(properties(&g, Selection::None).is_empty());
    }

    #[test]
    fn field_json_shape() {
        let (g, task, _) = sample();
        let fields = properties(&g, Selection::Node(task));
        let json = serde_json::to_value(&fields[3]).unwrap();
        assert_eq!(json["key"], "role");
        assert_eq!(json["input"], "select");
        assert_eq!(json["options"][1], "Finance");
    }

    #[test]
    fn numeric_edits_are_parsed() {
        let (g, task, _) = sample();
        let mutation = property_mutation(&g, Selection::Node(task), "expected_duration_minutes", "44.6").unwrap();
        match mutation {
            GraphMutation::UpdateNode { patch, .. } => {
                assert_eq!(patch.expected_duration_minutes, Some(45));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            property_mutation(&g, Selection::Node(task), "cost_per_hour", "lots"),
            Err(EditError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn blank_text_clears_optional_fields() {
        let (g, _, edge) = sample();
        match property_mutation(&g, Selection::Edge(edge), "condition", "  ").unwrap() {
            GraphMutation::UpdateEdge { patch, .. } => assert_eq!(patch.condition, Some(None)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stale_selection_is_dropped() {
        let (mut g, task, edge) = sample();
        let mut selection = Selection::Edge(edge);
        g.remove_edge(edge);
        selection.retain_existing(&g);
        assert!(selection.is_none());

        let mut selection = Selection::Node(task);
        selection.retain_existing(&g);
        assert_eq!(selection.node(), Some(task));
    }
}
