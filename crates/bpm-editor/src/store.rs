//! Document store: the single writer of the process graph.
//!
//! Every canvas or panel interaction is expressed as a `GraphMutation` and
//! applied here. The store keeps the containment invariants (lanes always in
//! a pool, members settled into the container they were dropped on), runs
//! `normalize` after structural changes, and notifies subscribers with a
//! `Change` after each successful mutation.

use bpm_core::config::GeometryConfig;
use bpm_core::document::GraphDocument;
use bpm_core::error::{ConnectionError, DocumentError};
use bpm_core::export::apply_default_conditions;
use bpm_core::geometry::{clamp_to_container, find_drop_container, translate_subtree};
use bpm_core::id::ElementId;
use bpm_core::model::*;
use bpm_core::{NodeIndex, normalize, validate_connection};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

/// Why an edit was refused.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("select a pool before adding a lane")]
    NoContainerSelected,

    #[error("unknown node {0}")]
    UnknownNode(ElementId),

    #[error("unknown edge {0}")]
    UnknownEdge(ElementId),

    #[error("invalid value {value:?} for {key}")]
    InvalidProperty { key: String, value: String },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("undo snapshot failed: {0}")]
    Snapshot(String),
}

/// Ids touched by one mutation.
pub type Touched = SmallVec<[ElementId; 4]>;

/// Notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    NodesAdded(Touched),
    NodesUpdated(Touched),
    Removed {
        nodes: Vec<ElementId>,
        edges: Vec<ElementId>,
    },
    EdgeAdded(ElementId),
    EdgeUpdated(ElementId),
    /// Derived geometry or lane colors were recomputed.
    Normalized,
    /// The whole document was swapped (load, undo snapshot).
    Replaced,
}

pub type Listener = Box<dyn FnMut(&Change)>;

// ─── Mutations ───────────────────────────────────────────────────────────

/// A mutation of the process graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    /// Insert a node. A top-level non-pool node is settled into whatever
    /// container it lands on.
    AddNode {
        container: Option<ElementId>,
        node: Box<ProcessNode>,
    },
    /// Shallow-merge attributes into a node.
    UpdateNode { id: ElementId, patch: Box<NodePatch> },
    /// Remove a node, its members, and every touching edge.
    RemoveNode { id: ElementId },
    /// Drag step: translate a node and everything it owns.
    MoveNode { id: ElementId, dx: f32, dy: f32 },
    /// Drag stop: settle containment and inherit the lane role.
    DropNode { id: ElementId },
    /// Append an edge after the connection rules accept it.
    AddEdge { edge: Box<ProcessEdge> },
    UpdateEdge { id: ElementId, patch: EdgePatch },
    RemoveEdge { id: ElementId },
    Normalize,
}

/// Partial node attributes. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears it. Fields that do not apply to the node's
/// kind are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<Option<String>>,
    pub size: Option<Size>,
    /// Activity role or lane responsibility. A changed activity role clears
    /// the employee.
    pub role: Option<Option<String>>,
    pub employee: Option<Option<String>>,
    pub expected_duration_minutes: Option<u32>,
    pub cost_per_hour: Option<f64>,
    pub priority: Option<Level>,
    pub risk_level: Option<Level>,
    pub ml_prediction: Option<bool>,
    pub assigned_to: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    /// Subprocess or pool owner.
    pub owner: Option<String>,
    pub recipient: Option<String>,
    pub channel: Option<String>,
    pub data_type: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Lane color.
    pub color: Option<String>,
    pub gateway: Option<GatewayKind>,
}

fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

impl NodePatch {
    /// Apply to `node`. Returns `true` if the node changed.
    pub fn apply_to(&self, node: &mut ProcessNode) -> bool {
        let before = node.clone();
        merge(&mut node.label, &self.label);
        merge(&mut node.description, &self.description);
        merge(&mut node.size, &self.size);
        if let Some(role) = &self.role {
            node.set_activity_role(role.clone());
        }

        match &mut node.kind {
            NodeKind::Task(t) => {
                merge(&mut t.employee, &self.employee);
                merge(&mut t.expected_duration_minutes, &self.expected_duration_minutes);
                merge(&mut t.cost_per_hour, &self.cost_per_hour);
                merge(&mut t.priority, &self.priority);
                merge(&mut t.risk_level, &self.risk_level);
                merge(&mut t.ml_prediction, &self.ml_prediction);
                merge(&mut t.assigned_to, &self.assigned_to);
                merge(&mut t.due_date, &self.due_date);
            }
            NodeKind::Subprocess(s) => {
                merge(&mut s.employee, &self.employee);
                merge(&mut s.priority, &self.priority);
                merge(&mut s.risk_level, &self.risk_level);
                if let Some(owner) = &self.owner {
                    s.owner = Some(owner.clone()).filter(|o| !o.is_empty());
                }
            }
            NodeKind::Gateway(kind) => merge(kind, &self.gateway),
            NodeKind::Message(m) => {
                merge(&mut m.recipient, &self.recipient);
                merge(&mut m.channel, &self.channel);
            }
            NodeKind::DataObject(d) => {
                merge(&mut d.data_type, &self.data_type);
                merge(&mut d.source, &self.source);
                merge(&mut d.destination, &self.destination);
            }
            NodeKind::Lane(l) => {
                if let Some(Some(role)) = &self.role {
                    l.role = role.clone();
                }
                merge(&mut l.color, &self.color);
            }
            NodeKind::Pool(p) => merge(&mut p.owner, &self.owner),
            NodeKind::Start | NodeKind::End => {}
        }
        *node != before
    }
}

/// Partial edge attributes; same conventions as `NodePatch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePatch {
    pub label: Option<Option<String>>,
    pub condition: Option<Option<String>>,
    pub probability: Option<Option<String>>,
    pub content: Option<Option<String>>,
}

impl EdgePatch {
    /// The patch that restores `edge` to its current values.
    pub fn capture(edge: &ProcessEdge) -> Self {
        let mut patch = EdgePatch {
            label: Some(edge.label.clone()),
            ..EdgePatch::default()
        };
        match &edge.kind {
            EdgeKind::Sequence {
                condition,
                probability,
            } => {
                patch.condition = Some(condition.clone());
                patch.probability = Some(probability.clone());
            }
            EdgeKind::Message { content } => patch.content = Some(content.clone()),
            EdgeKind::Association => {}
        }
        patch
    }

    pub fn apply_to(&self, edge: &mut ProcessEdge) -> bool {
        let before = edge.clone();
        merge(&mut edge.label, &self.label);
        match &mut edge.kind {
            EdgeKind::Sequence {
                condition,
                probability,
            } => {
                merge(condition, &self.condition);
                merge(probability, &self.probability);
            }
            EdgeKind::Message { content } => merge(content, &self.content),
            EdgeKind::Association => {}
        }
        *edge != before
    }
}

// ─── Store ───────────────────────────────────────────────────────────────

/// Owns the process graph and applies every mutation to it.
pub struct DocumentStore {
    pub graph: ProcessGraph,
    pub config: GeometryConfig,
    listeners: Vec<Listener>,
}

impl DocumentStore {
    pub fn new(config: GeometryConfig) -> Self {
        Self {
            graph: ProcessGraph::new(),
            config,
            listeners: Vec::new(),
        }
    }

    /// Register a listener called after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, change: Change) {
        for listener in &mut self.listeners {
            listener(&change);
        }
    }

    fn normalize_and_emit(&mut self) {
        if normalize(&mut self.graph, &self.config) {
            self.emit(Change::Normalized);
        }
    }

    /// Swap in a whole new graph.
    pub fn replace(&mut self, graph: ProcessGraph) {
        self.graph = graph;
        normalize(&mut self.graph, &self.config);
        log::debug!(
            "document replaced: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edges.len()
        );
        self.emit(Change::Replaced);
    }

    pub fn document(&self) -> GraphDocument {
        GraphDocument::from_graph(&self.graph)
    }

    /// Compact MessagePack snapshot of the document, for undo.
    pub fn snapshot(&self) -> Result<Vec<u8>, EditError> {
        rmp_serde::to_vec_named(&self.document()).map_err(|e| EditError::Snapshot(e.to_string()))
    }

    pub fn restore(&mut self, snapshot: &[u8]) -> Result<(), EditError> {
        let doc: GraphDocument =
            rmp_serde::from_slice(snapshot).map_err(|e| EditError::Snapshot(e.to_string()))?;
        let graph = doc.into_graph(&self.config)?;
        self.replace(graph);
        Ok(())
    }

    fn index(&self, id: ElementId) -> Result<NodeIndex, EditError> {
        self.graph.index_of(id).ok_or(EditError::UnknownNode(id))
    }

    // ─── Planning ────────────────────────────────────────────────────────

    /// Build the mutation that adds a palette node of kind `ty` at `at`,
    /// along with the new node's id.
    ///
    /// A lane needs a pool: `selected` must be the pool or something inside
    /// it. The lane goes to the bottom of the pool and takes the next color
    /// of the lane palette.
    pub fn plan_add_node(
        &mut self,
        ty: NodeType,
        at: Point,
        selected: Option<ElementId>,
    ) -> Result<(ElementId, GraphMutation), EditError> {
        if ty != NodeType::Lane {
            let id = self.graph.fresh_id(ty.as_str());
            let mutation = GraphMutation::AddNode {
                container: None,
                node: Box::new(ProcessNode::new(id, ty, at)),
            };
            return Ok((id, mutation));
        }

        let pool = selected
            .and_then(|s| self.graph.index_of(s))
            .and_then(|idx| self.graph.pool_of(idx))
            .ok_or(EditError::NoContainerSelected)?;
        let pool_node = self.graph.node(pool);
        let bottom = pool_node.bounds().bottom();
        let position = Point::new(pool_node.position.x + self.config.padding, bottom);
        let pool_id = pool_node.id;
        let lane_count = self.graph.lanes_of(pool).len();

        let id = self.graph.fresh_id(ty.as_str());
        let mut node = ProcessNode::new(id, ty, position);
        if let NodeKind::Lane(attrs) = &mut node.kind {
            attrs.color = LANE_COLORS[lane_count % LANE_COLORS.len()].to_string();
        }
        node.label = format!("{} {}", ty.default_label(), lane_count + 1);
        let mutation = GraphMutation::AddNode {
            container: Some(pool_id),
            node: Box::new(node),
        };
        Ok((id, mutation))
    }

    /// Build the mutation for a new `ty` edge and its id, or say why the
    /// edge is illegal.
    pub fn plan_connect(
        &mut self,
        source: ElementId,
        target: ElementId,
        ty: EdgeType,
    ) -> Result<(ElementId, GraphMutation), EditError> {
        validate_connection(&self.graph, source, target, ty)?;
        let id = self.graph.fresh_id("edge");
        let mutation = GraphMutation::AddEdge {
            edge: Box::new(ProcessEdge::new(id, source, target, ty)),
        };
        Ok((id, mutation))
    }

    // ─── Applying ────────────────────────────────────────────────────────

    /// Apply `mutation`. Nothing changes when an error is returned.
    pub fn apply(&mut self, mutation: GraphMutation) -> Result<(), EditError> {
        match mutation {
            GraphMutation::AddNode { container, node } => self.add_node(container, *node),
            GraphMutation::UpdateNode { id, patch } => self.update_node(id, &patch),
            GraphMutation::RemoveNode { id } => {
                let idx = self.index(id)?;
                let (nodes, edges) = self.graph.remove_cascade(idx);
                log::debug!("removed {id}: {} nodes, {} edges", nodes.len(), edges.len());
                self.emit(Change::Removed { nodes, edges });
                self.normalize_and_emit();
                Ok(())
            }
            GraphMutation::MoveNode { id, dx, dy } => {
                let idx = self.index(id)?;
                translate_subtree(&mut self.graph, idx, dx, dy);
                log::trace!("moved {id} by ({dx}, {dy})");
                self.emit(Change::NodesUpdated(smallvec![id]));
                Ok(())
            }
            GraphMutation::DropNode { id } => {
                let idx = self.index(id)?;
                if self.settle(idx) {
                    self.emit(Change::NodesUpdated(smallvec![id]));
                }
                self.normalize_and_emit();
                Ok(())
            }
            GraphMutation::AddEdge { edge } => {
                validate_connection(&self.graph, edge.source, edge.target, edge.edge_type())?;
                if self.graph.edge(edge.id).is_some() || self.graph.contains(edge.id) {
                    return Err(DocumentError::DuplicateId(edge.id).into());
                }
                let id = edge.id;
                log::debug!(
                    "connected {} -> {} ({})",
                    edge.source,
                    edge.target,
                    edge.edge_type().as_str()
                );
                self.graph.add_edge(*edge);
                self.emit(Change::EdgeAdded(id));
                Ok(())
            }
            GraphMutation::UpdateEdge { id, patch } => {
                let edge = self.graph.edge_mut(id).ok_or(EditError::UnknownEdge(id))?;
                if patch.apply_to(edge) {
                    self.emit(Change::EdgeUpdated(id));
                }
                Ok(())
            }
            GraphMutation::RemoveEdge { id } => {
                self.graph.remove_edge(id).ok_or(EditError::UnknownEdge(id))?;
                self.emit(Change::Removed {
                    nodes: Vec::new(),
                    edges: vec![id],
                });
                Ok(())
            }
            GraphMutation::Normalize => {
                self.normalize_and_emit();
                Ok(())
            }
        }
    }

    fn add_node(&mut self, container: Option<ElementId>, node: ProcessNode) -> Result<(), EditError> {
        let id = node.id;
        if self.graph.contains(id) || self.graph.edge(id).is_some() {
            return Err(DocumentError::DuplicateId(id).into());
        }
        let parent = container.map(|c| self.index(c)).transpose()?;
        let parent_ty = parent.map(|p| self.graph.node(p).node_type());
        match node.node_type() {
            NodeType::Lane if parent_ty != Some(NodeType::Pool) => {
                return Err(EditError::NoContainerSelected);
            }
            NodeType::Pool if parent.is_some() => {
                return Err(DocumentError::InvalidContainer {
                    child: id,
                    parent: container.unwrap_or(id),
                }
                .into());
            }
            ty if !ty.is_container() && parent_ty.is_some_and(|t| !t.is_container()) => {
                return Err(DocumentError::InvalidContainer {
                    child: id,
                    parent: container.unwrap_or(id),
                }
                .into());
            }
            _ => {}
        }

        let ty = node.node_type();
        let idx = self.graph.add_node(parent, node);
        if parent.is_none() && ty != NodeType::Pool {
            self.settle(idx);
        }
        log::debug!("added {} {id}", ty.as_str());
        self.emit(Change::NodesAdded(smallvec![id]));
        self.normalize_and_emit();
        Ok(())
    }

    fn update_node(&mut self, id: ElementId, patch: &NodePatch) -> Result<(), EditError> {
        let idx = self.index(id)?;
        if !patch.apply_to(self.graph.node_mut(idx)) {
            return Ok(());
        }

        let mut touched: Touched = smallvec![id];
        // A lane's responsibility role is handed down to its activities.
        if let NodeKind::Lane(lane) = &self.graph.node(idx).kind
            && patch.role.is_some()
        {
            let role = lane.role.clone();
            for member in self.graph.children(idx) {
                if self.graph.node_mut(member).set_activity_role(Some(role.clone())) {
                    touched.push(self.graph.node(member).id);
                }
            }
        }
        self.emit(Change::NodesUpdated(touched));
        self.normalize_and_emit();
        Ok(())
    }

    /// Settle a dropped node into the container under it.
    ///
    /// Pools stay top-level and a lane never leaves its pool unless dropped
    /// on another one. A member is clamped into its new container's
    /// interior, and an activity dropped into a lane takes the lane's role.
    fn settle(&mut self, idx: NodeIndex) -> bool {
        let ty = self.graph.node(idx).node_type();
        if ty == NodeType::Pool {
            return false;
        }
        let current = self.graph.container(idx);
        let target = match find_drop_container(&self.graph, idx, &self.config) {
            None if ty == NodeType::Lane => current,
            found => found,
        };

        let mut changed = false;
        if target != current {
            log::debug!(
                "{} now in {}",
                self.graph.node(idx).id,
                target.map_or("(canvas)".to_string(), |c| self.graph.node(c).id.to_string())
            );
            self.graph.set_container(idx, target);
            changed = true;
        }

        let Some(container) = target else {
            return changed;
        };
        if ty != NodeType::Lane {
            let node = self.graph.node(idx);
            let clamped =
                clamp_to_container(node.position, node.size, self.graph.node(container), &self.config);
            let (dx, dy) = (clamped.x - node.position.x, clamped.y - node.position.y);
            if dx != 0.0 || dy != 0.0 {
                translate_subtree(&mut self.graph, idx, dx, dy);
                changed = true;
            }
        }
        if let NodeKind::Lane(lane) = &self.graph.node(container).kind
            && ty.is_activity()
        {
            let role = lane.role.clone();
            changed |= self.graph.node_mut(idx).set_activity_role(Some(role));
        }
        changed
    }

    /// Fill blank exclusive-gateway conditions before a save.
    pub fn fill_default_conditions(&mut self) -> usize {
        let before: Vec<(ElementId, Option<String>)> = self
            .graph
            .edges
            .iter()
            .map(|e| (e.id, e.condition().map(str::to_string)))
            .collect();
        let filled = apply_default_conditions(&mut self.graph);
        if filled > 0 {
            let changed: Vec<ElementId> = before
                .into_iter()
                .filter(|(id, old)| {
                    self.graph.edge(*id).and_then(ProcessEdge::condition) != old.as_deref()
                })
                .map(|(id, _)| id)
                .collect();
            for id in changed {
                self.emit(Change::EdgeUpdated(id));
            }
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> DocumentStore {
        DocumentStore::new(GeometryConfig::default())
    }

    fn add(store: &mut DocumentStore, ty: NodeType, at: (f32, f32), selected: Option<ElementId>) -> ElementId {
        let (id, mutation) = store
            .plan_add_node(ty, Point::new(at.0, at.1), selected)
            .unwrap();
        store.apply(mutation).unwrap();
        id
    }

    #[test]
    fn lane_without_selected_pool_is_refused() {
        let mut s = store();
        let err = s.plan_add_node(NodeType::Lane, Point::default(), None).unwrap_err();
        assert!(matches!(err, EditError::NoContainerSelected));
        assert_eq!(err.to_string(), "select a pool before adding a lane");
    }

    #[test]
    fn lanes_stack_with_cycling_colors() {
        let mut s = store();
        let pool = add(&mut s, NodeType::Pool, (0.0, 0.0), None);
        let l1 = add(&mut s, NodeType::Lane, (0.0, 0.0), Some(pool));
        // Selecting the first lane still targets its pool.
        let l2 = add(&mut s, NodeType::Lane, (0.0, 0.0), Some(l1));

        let g = &s.graph;
        assert_eq!(g.container_id(l2), Some(pool));
        let (a, b) = (g.get_by_id(l1).unwrap(), g.get_by_id(l2).unwrap());
        assert_eq!(a.position, Point::new(20.0, 40.0));
        assert_eq!(b.position, Point::new(20.0, 200.0));
        match (&a.kind, &b.kind) {
            (NodeKind::Lane(x), NodeKind::Lane(y)) => {
                assert_eq!(x.color, LANE_COLORS[0]);
                assert_eq!(y.color, LANE_COLORS[1]);
            }
            _ => panic!("expected lanes"),
        }
    }

    #[test]
    fn dropped_task_joins_lane_and_takes_role() {
        let mut s = store();
        let pool = add(&mut s, NodeType::Pool, (0.0, 0.0), None);
        let lane = add(&mut s, NodeType::Lane, (0.0, 0.0), Some(pool));
        s.apply(GraphMutation::UpdateNode {
            id: lane,
            patch: Box::new(NodePatch {
                role: Some(Some("Finance".into())),
                ..NodePatch::default()
            }),
        })
        .unwrap();

        let task = add(&mut s, NodeType::Task, (100.0, 70.0), None);
        let node = s.graph.get_by_id(task).unwrap();
        assert_eq!(s.graph.container_id(task), Some(lane));
        assert_eq!(node.role(), Some("Finance"));
    }

    #[test]
    fn lane_role_edit_propagates_to_members() {
        let mut s = store();
        let pool = add(&mut s, NodeType::Pool, (0.0, 0.0), None);
        let lane = add(&mut s, NodeType::Lane, (0.0, 0.0), Some(pool));
        let task = add(&mut s, NodeType::Task, (100.0, 70.0), None);
        if let Some(NodeKind::Task(t)) = s.graph.get_by_id_mut(task).map(|n| &mut n.kind) {
            t.employee = Some("Petrov".into());
        }

        s.apply(GraphMutation::UpdateNode {
            id: lane,
            patch: Box::new(NodePatch {
                role: Some(Some("Director".into())),
                ..NodePatch::default()
            }),
        })
        .unwrap();

        match &s.graph.get_by_id(task).unwrap().kind {
            NodeKind::Task(t) => {
                assert_eq!(t.role.as_deref(), Some("Director"));
                assert_eq!(t.employee, None);
            }
            _ => panic!("expected task"),
        }
    }

    #[test]
    fn removing_a_pool_cascades() {
        let mut s = store();
        let pool = add(&mut s, NodeType::Pool, (0.0, 0.0), None);
        add(&mut s, NodeType::Lane, (0.0, 0.0), Some(pool));
        let inside = add(&mut s, NodeType::Task, (100.0, 70.0), None);
        let outside = add(&mut s, NodeType::Message, (1000.0, 70.0), None);
        let (_, connect) = s.plan_connect(outside, inside, EdgeType::MessageFlow).unwrap();
        s.apply(connect).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        s.subscribe(move |c| sink.borrow_mut().push(c.clone()));

        s.apply(GraphMutation::RemoveNode { id: pool }).unwrap();
        assert_eq!(s.graph.node_count(), 1);
        assert!(s.graph.edges.is_empty());
        match &log.borrow()[0] {
            Change::Removed { nodes, edges } => {
                assert_eq!(nodes.len(), 3);
                assert_eq!(edges.len(), 1);
            }
            other => panic!("expected Removed, got {other:?}"),
        }
    }

    #[test]
    fn illegal_edges_are_rejected_without_mutation() {
        let mut s = store();
        let start = add(&mut s, NodeType::Start, (0.0, 0.0), None);
        let task = add(&mut s, NodeType::Task, (200.0, 0.0), None);
        let err = s.plan_connect(task, start, EdgeType::SequenceFlow).unwrap_err();
        assert!(matches!(
            err,
            EditError::Connection(ConnectionError::IntoStartEvent)
        ));
        assert!(s.graph.edges.is_empty());
    }

    #[test]
    fn unknown_ids_are_errors_not_panics() {
        let mut s = store();
        let ghost = ElementId::intern("store_ghost");
        assert!(matches!(
            s.apply(GraphMutation::MoveNode { id: ghost, dx: 1.0, dy: 1.0 }),
            Err(EditError::UnknownNode(_))
        ));
        assert!(matches!(
            s.apply(GraphMutation::RemoveEdge { id: ghost }),
            Err(EditError::UnknownEdge(_))
        ));
    }

    #[test]
    fn snapshot_restores_document() {
        let mut s = store();
        let pool = add(&mut s, NodeType::Pool, (0.0, 0.0), None);
        add(&mut s, NodeType::Lane, (0.0, 0.0), Some(pool));
        let snapshot = s.snapshot().unwrap();
        let before = s.document();

        s.apply(GraphMutation::RemoveNode { id: pool }).unwrap();
        assert_eq!(s.graph.node_count(), 0);

        s.restore(&snapshot).unwrap();
        assert_eq!(s.document(), before);
    }

    #[test]
    fn edge_patch_capture_round_trips() {
        let mut edge = ProcessEdge::new(
            ElementId::intern("patch_e"),
            ElementId::intern("patch_a"),
            ElementId::intern("patch_b"),
            EdgeType::SequenceFlow,
        );
        let original = edge.clone();
        let undo = EdgePatch::capture(&edge);
        let edit = EdgePatch {
            condition: Some(Some("${approved}".into())),
            label: Some(Some("yes".into())),
            ..EdgePatch::default()
        };
        assert!(edit.apply_to(&mut edge));
        assert_eq!(edge.condition(), Some("${approved}"));
        assert!(undo.apply_to(&mut edge));
        assert_eq!(edge, original);
    }
}
