//! Process graph data model.
//!
//! A document is a set of typed BPMN-like nodes plus a list of flow edges.
//! Containment (pool → lane → flow node) is stored as parent→child links in a
//! `StableDiGraph` arena with an id → index map, so drag propagation and
//! cascade deletes walk the arena instead of chasing ids through the node list.
//! Positions are absolute canvas coordinates.

use crate::id::ElementId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ─── Geometry primitives ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow the rectangle by `by` on every side.
    pub fn inflate(&self, by: f32) -> Self {
        Self {
            x: self.x - by,
            y: self.y - by,
            width: self.width + 2.0 * by,
            height: self.height + 2.0 * by,
        }
    }
}

// ─── Attribute vocabularies ──────────────────────────────────────────────

/// Responsibility roles offered by the properties panel.
pub const ROLE_OPTIONS: [&str; 4] = ["Procurement", "Finance", "IT Operations", "Director"];

/// Lane fill colors, cycled by lane count within a pool.
pub const LANE_COLORS: [&str; 6] = [
    "#DBEAFE", "#DCFCE7", "#FEF3C7", "#FCE7F3", "#E0E7FF", "#F3E8FF",
];

/// Low / medium / high scale used for priority and risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Level::Low),
            "medium" => Some(Level::Medium),
            "high" => Some(Level::High),
            _ => None,
        }
    }
}

/// Gateway routing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Exactly one outgoing branch is taken; branches carry conditions.
    #[default]
    Exclusive,
    /// All outgoing branches are taken.
    Parallel,
}

impl GatewayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayKind::Exclusive => "exclusive",
            GatewayKind::Parallel => "parallel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exclusive" => Some(GatewayKind::Exclusive),
            "parallel" => Some(GatewayKind::Parallel),
            _ => None,
        }
    }
}

// ─── Per-kind attributes ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TaskAttrs {
    pub role: Option<String>,
    /// Concrete person picked for `role`; cleared whenever the role changes.
    pub employee: Option<String>,
    pub expected_duration_minutes: u32,
    pub cost_per_hour: f64,
    pub priority: Level,
    pub risk_level: Level,
    /// Ask the analytics backend for a risk prediction during simulation.
    pub ml_prediction: bool,
    pub assigned_to: Option<String>,
    pub due_date: Option<String>,
    /// Derived from the owning lane by `normalize`.
    pub lane_color: Option<String>,
}

impl Default for TaskAttrs {
    fn default() -> Self {
        Self {
            role: Some(ROLE_OPTIONS[0].to_string()),
            employee: None,
            expected_duration_minutes: 60,
            cost_per_hour: 500.0,
            priority: Level::Medium,
            risk_level: Level::Low,
            ml_prediction: false,
            assigned_to: None,
            due_date: None,
            lane_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubprocessAttrs {
    pub role: Option<String>,
    pub employee: Option<String>,
    pub owner: Option<String>,
    pub priority: Level,
    pub risk_level: Level,
    pub lane_color: Option<String>,
}

impl Default for SubprocessAttrs {
    fn default() -> Self {
        Self {
            role: None,
            employee: None,
            owner: Some("Команда".to_string()),
            priority: Level::Medium,
            risk_level: Level::Medium,
            lane_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageAttrs {
    pub recipient: String,
    pub channel: String,
}

impl Default for MessageAttrs {
    fn default() -> Self {
        Self {
            recipient: "Получатель".to_string(),
            channel: "Email".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataObjectAttrs {
    pub data_type: String,
    pub source: String,
    pub destination: String,
}

impl Default for DataObjectAttrs {
    fn default() -> Self {
        Self {
            data_type: "Документ".to_string(),
            source: "Источник".to_string(),
            destination: "Назначение".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneAttrs {
    /// Responsibility role; members dropped into the lane inherit it.
    pub role: String,
    pub color: String,
}

impl Default for LaneAttrs {
    fn default() -> Self {
        Self {
            role: ROLE_OPTIONS[0].to_string(),
            color: LANE_COLORS[0].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoolAttrs {
    pub owner: String,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Node kind tag without attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Task,
    Subprocess,
    Gateway,
    Start,
    End,
    Message,
    DataObject,
    Lane,
    Pool,
}

impl NodeType {
    pub const ALL: [NodeType; 9] = [
        NodeType::Task,
        NodeType::Subprocess,
        NodeType::Gateway,
        NodeType::Start,
        NodeType::End,
        NodeType::Message,
        NodeType::DataObject,
        NodeType::Lane,
        NodeType::Pool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Task => "task",
            NodeType::Subprocess => "subprocess",
            NodeType::Gateway => "gateway",
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Message => "message",
            NodeType::DataObject => "dataObject",
            NodeType::Lane => "lane",
            NodeType::Pool => "pool",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Lane | NodeType::Pool)
    }

    /// Kinds that may take part in a sequence or message flow.
    pub fn is_flow_object(self) -> bool {
        matches!(
            self,
            NodeType::Task
                | NodeType::Subprocess
                | NodeType::Gateway
                | NodeType::Start
                | NodeType::End
                | NodeType::Message
        )
    }

    /// Tasks and subprocesses: the kinds that carry a role.
    pub fn is_activity(self) -> bool {
        matches!(self, NodeType::Task | NodeType::Subprocess)
    }

    pub fn default_size(self) -> Size {
        match self {
            NodeType::Task => Size::new(160.0, 60.0),
            NodeType::Subprocess => Size::new(180.0, 80.0),
            NodeType::Gateway => Size::new(60.0, 60.0),
            NodeType::Start | NodeType::End => Size::new(48.0, 48.0),
            NodeType::Message => Size::new(140.0, 60.0),
            NodeType::DataObject => Size::new(100.0, 70.0),
            NodeType::Lane => Size::new(560.0, 150.0),
            NodeType::Pool => Size::new(600.0, 250.0),
        }
    }

    /// Palette label for a freshly placed node.
    pub fn default_label(self) -> &'static str {
        match self {
            NodeType::Task => "Задача",
            NodeType::Subprocess => "Подпроцесс",
            NodeType::Gateway => "Шлюз",
            NodeType::Start => "Начало",
            NodeType::End => "Конец",
            NodeType::Message => "Сообщение",
            NodeType::DataObject => "Объект данных",
            NodeType::Lane => "Дорожка",
            NodeType::Pool => "Пул",
        }
    }
}

/// Node kind with the attributes that kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Task(TaskAttrs),
    Subprocess(SubprocessAttrs),
    Gateway(GatewayKind),
    Start,
    End,
    Message(MessageAttrs),
    DataObject(DataObjectAttrs),
    Lane(LaneAttrs),
    Pool(PoolAttrs),
}

impl NodeKind {
    /// The palette defaults for `ty`.
    pub fn default_for(ty: NodeType) -> Self {
        match ty {
            NodeType::Task => NodeKind::Task(TaskAttrs::default()),
            NodeType::Subprocess => NodeKind::Subprocess(SubprocessAttrs::default()),
            NodeType::Gateway => NodeKind::Gateway(GatewayKind::default()),
            NodeType::Start => NodeKind::Start,
            NodeType::End => NodeKind::End,
            NodeType::Message => NodeKind::Message(MessageAttrs::default()),
            NodeType::DataObject => NodeKind::DataObject(DataObjectAttrs::default()),
            NodeType::Lane => NodeKind::Lane(LaneAttrs::default()),
            NodeType::Pool => NodeKind::Pool(PoolAttrs::default()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Task(_) => NodeType::Task,
            NodeKind::Subprocess(_) => NodeType::Subprocess,
            NodeKind::Gateway(_) => NodeType::Gateway,
            NodeKind::Start => NodeType::Start,
            NodeKind::End => NodeType::End,
            NodeKind::Message(_) => NodeType::Message,
            NodeKind::DataObject(_) => NodeType::DataObject,
            NodeKind::Lane(_) => NodeType::Lane,
            NodeKind::Pool(_) => NodeType::Pool,
        }
    }
}

/// A single node of the process diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessNode {
    pub id: ElementId,
    pub label: String,
    pub description: Option<String>,
    pub kind: NodeKind,
    /// Top-left corner, canvas space.
    pub position: Point,
    pub size: Size,
}

impl ProcessNode {
    /// A node with the palette defaults (label, size, attributes) for `ty`.
    pub fn new(id: ElementId, ty: NodeType, position: Point) -> Self {
        Self {
            id,
            label: ty.default_label().to_string(),
            description: None,
            kind: NodeKind::default_for(ty),
            position,
            size: ty.default_size(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Role of an activity, or the responsibility role of a lane.
    pub fn role(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Task(t) => t.role.as_deref(),
            NodeKind::Subprocess(s) => s.role.as_deref(),
            NodeKind::Lane(l) => Some(&l.role),
            _ => None,
        }
    }

    /// Set the role of an activity. A changed role clears `employee`.
    ///
    /// Returns `true` if the role actually changed. No-op on other kinds.
    pub fn set_activity_role(&mut self, role: Option<String>) -> bool {
        let (slot, employee) = match &mut self.kind {
            NodeKind::Task(t) => (&mut t.role, &mut t.employee),
            NodeKind::Subprocess(s) => (&mut s.role, &mut s.employee),
            _ => return false,
        };
        if *slot == role {
            return false;
        }
        *slot = role;
        *employee = None;
        true
    }

    pub fn lane_color(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Task(t) => t.lane_color.as_deref(),
            NodeKind::Subprocess(s) => s.lane_color.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the stored color changed.
    pub fn set_lane_color(&mut self, color: Option<&str>) -> bool {
        let slot = match &mut self.kind {
            NodeKind::Task(t) => &mut t.lane_color,
            NodeKind::Subprocess(s) => &mut s.lane_color,
            _ => return false,
        };
        if slot.as_deref() == color {
            return false;
        }
        *slot = color.map(str::to_string);
        true
    }

    pub fn gateway_kind(&self) -> Option<GatewayKind> {
        match self.kind {
            NodeKind::Gateway(kind) => Some(kind),
            _ => None,
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Edge kind tag without attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeType {
    #[default]
    #[serde(rename = "sequence")]
    SequenceFlow,
    #[serde(rename = "message")]
    MessageFlow,
    #[serde(rename = "association")]
    Association,
}

impl EdgeType {
    pub const ALL: [EdgeType; 3] = [
        EdgeType::SequenceFlow,
        EdgeType::MessageFlow,
        EdgeType::Association,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::SequenceFlow => "sequence",
            EdgeType::MessageFlow => "message",
            EdgeType::Association => "association",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Edge kind with its kind-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Sequence {
        /// Branch condition, e.g. `${budget > 1000000}`.
        condition: Option<String>,
        /// Free-form branch probability, e.g. `65%`.
        probability: Option<String>,
    },
    Message {
        content: Option<String>,
    },
    Association,
}

impl EdgeKind {
    pub fn empty(ty: EdgeType) -> Self {
        match ty {
            EdgeType::SequenceFlow => EdgeKind::Sequence {
                condition: None,
                probability: None,
            },
            EdgeType::MessageFlow => EdgeKind::Message { content: None },
            EdgeType::Association => EdgeKind::Association,
        }
    }

    pub fn edge_type(&self) -> EdgeType {
        match self {
            EdgeKind::Sequence { .. } => EdgeType::SequenceFlow,
            EdgeKind::Message { .. } => EdgeType::MessageFlow,
            EdgeKind::Association => EdgeType::Association,
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEdge {
    pub id: ElementId,
    pub source: ElementId,
    pub target: ElementId,
    /// Flow name; the association label for associations.
    pub label: Option<String>,
    pub kind: EdgeKind,
}

impl ProcessEdge {
    pub fn new(id: ElementId, source: ElementId, target: ElementId, ty: EdgeType) -> Self {
        Self {
            id,
            source,
            target,
            label: None,
            kind: EdgeKind::empty(ty),
        }
    }

    pub fn edge_type(&self) -> EdgeType {
        self.kind.edge_type()
    }

    pub fn touches(&self, id: ElementId) -> bool {
        self.source == id || self.target == id
    }

    /// Condition text of a sequence flow, if any non-blank one is set.
    pub fn condition(&self) -> Option<&str> {
        match &self.kind {
            EdgeKind::Sequence { condition, .. } => condition
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty()),
            _ => None,
        }
    }
}

// ─── Process graph ───────────────────────────────────────────────────────

/// The complete process document.
///
/// Arena edges go from container → member: pool → lane, pool → node,
/// lane → node. A node with no incoming arena edge is top-level.
#[derive(Debug, Clone, Default)]
pub struct ProcessGraph {
    /// Containment arena.
    pub graph: StableDiGraph<ProcessNode, ()>,

    /// Id → arena index, kept in sync by `add_node` / `remove_node`.
    pub id_index: HashMap<ElementId, NodeIndex>,

    /// Flow edges in creation order.
    pub edges: Vec<ProcessEdge>,

    /// Insertion rank of every live node. Arena slots are reused after a
    /// removal, so indices alone do not give insertion order.
    order: HashMap<NodeIndex, u64>,
    next_order: u64,

    /// Counter behind `fresh_id`.
    next_serial: u64,
}

impl ProcessGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` under `container` (or top-level). Returns its index.
    pub fn add_node(&mut self, container: Option<NodeIndex>, node: ProcessNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        if let Some(parent) = container {
            self.graph.add_edge(parent, idx, ());
        }
        self.id_index.insert(id, idx);
        self.order.insert(idx, self.next_order);
        self.next_order += 1;
        idx
    }

    /// Remove a single arena node, keeping `id_index` synchronized.
    ///
    /// Members of the removed node become top-level; cascading is the
    /// caller's job.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<ProcessNode> {
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
            self.order.remove(&idx);
        }
        removed
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ProcessNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut ProcessNode {
        &mut self.graph[idx]
    }

    pub fn get_by_id(&self, id: ElementId) -> Option<&ProcessNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: ElementId) -> Option<&mut ProcessNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn node_type_of(&self, id: ElementId) -> Option<NodeType> {
        self.get_by_id(id).map(ProcessNode::node_type)
    }

    /// All live indices in insertion order.
    pub fn node_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        self.sort_by_insertion(&mut indices);
        indices
    }

    fn sort_by_insertion(&self, indices: &mut [NodeIndex]) {
        indices.sort_by_key(|idx| (self.order.get(idx).copied().unwrap_or(u64::MAX), *idx));
    }

    /// The owning lane or pool of `idx`.
    pub fn container(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// `containerRef` of a node, by id.
    pub fn container_id(&self, id: ElementId) -> Option<ElementId> {
        self.index_of(id)
            .and_then(|idx| self.container(idx))
            .map(|c| self.graph[c].id)
    }

    /// Move `child` under `container` (or make it top-level).
    pub fn set_container(&mut self, child: NodeIndex, container: Option<NodeIndex>) {
        if self.container(child) == container {
            return;
        }
        if let Some(old) = self.container(child)
            && let Some(edge) = self.graph.find_edge(old, child)
        {
            self.graph.remove_edge(edge);
        }
        if let Some(parent) = container {
            self.graph.add_edge(parent, child, ());
        }
    }

    /// Direct members of a container in insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        self.sort_by_insertion(&mut children);
        children
    }

    /// Nodes without a container, in insertion order.
    pub fn top_level(&self) -> Vec<NodeIndex> {
        self.node_indices()
            .into_iter()
            .filter(|&idx| self.container(idx).is_none())
            .collect()
    }

    /// Every transitive member of `idx` (not including `idx`), pre-order.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(idx).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// The enclosing pool of `idx`; a pool is its own enclosing pool.
    pub fn pool_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let mut current = Some(idx);
        while let Some(c) = current {
            if self.graph[c].node_type() == NodeType::Pool {
                return Some(c);
            }
            current = self.container(c);
        }
        None
    }

    pub fn pools(&self) -> Vec<NodeIndex> {
        self.of_type(NodeType::Pool)
    }

    /// Lanes directly owned by `pool`, in insertion order.
    pub fn lanes_of(&self, pool: NodeIndex) -> Vec<NodeIndex> {
        self.children(pool)
            .into_iter()
            .filter(|&c| self.graph[c].node_type() == NodeType::Lane)
            .collect()
    }

    pub fn of_type(&self, ty: NodeType) -> Vec<NodeIndex> {
        self.node_indices()
            .into_iter()
            .filter(|&idx| self.graph[idx].node_type() == ty)
            .collect()
    }

    /// Mint an id `prefix_n` not used by any node or edge of this document.
    pub fn fresh_id(&mut self, prefix: &str) -> ElementId {
        loop {
            self.next_serial += 1;
            let candidate = ElementId::numbered(prefix, self.next_serial);
            if !self.contains(candidate) && self.edge(candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Remove `idx`, everything it transitively owns, and every edge that
    /// touches a removed node. Returns the removed node and edge ids.
    pub fn remove_cascade(&mut self, idx: NodeIndex) -> (Vec<ElementId>, Vec<ElementId>) {
        let mut doomed = vec![idx];
        doomed.extend(self.descendants(idx));
        let removed: HashSet<ElementId> = doomed.iter().map(|&i| self.graph[i].id).collect();
        let nodes: Vec<ElementId> = doomed.iter().map(|&i| self.graph[i].id).collect();
        for i in doomed {
            self.remove_node(i);
        }

        let mut edges = Vec::new();
        self.edges.retain(|e| {
            let dangling = removed.contains(&e.source) || removed.contains(&e.target);
            if dangling {
                edges.push(e.id);
            }
            !dangling
        });
        (nodes, edges)
    }

    /// Rebuild `id_index` from the arena.
    pub fn rebuild_index(&mut self) {
        self.id_index.clear();
        for idx in self.graph.node_indices() {
            let id = self.graph[idx].id;
            self.id_index.insert(id, idx);
        }
    }

    // ─── Edge list ───────────────────────────────────────────────────────

    pub fn add_edge(&mut self, edge: ProcessEdge) {
        self.edges.push(edge);
    }

    pub fn edge(&self, id: ElementId) -> Option<&ProcessEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: ElementId) -> Option<&mut ProcessEdge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn remove_edge(&mut self, id: ElementId) -> Option<ProcessEdge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    /// Edges leaving `id`, in creation order.
    pub fn outgoing(&self, id: ElementId) -> impl Iterator<Item = &ProcessEdge> {
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn edges_touching(&self, id: ElementId) -> impl Iterator<Item = &ProcessEdge> {
        self.edges.iter().filter(move |e| e.touches(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(graph: &mut ProcessGraph, ty: NodeType, at: (f32, f32)) -> ProcessNode {
        let id = graph.fresh_id(ty.as_str());
        ProcessNode::new(id, ty, Point::new(at.0, at.1))
    }

    #[test]
    fn containment_links_and_pool_lookup() {
        let mut g = ProcessGraph::new();
        let pool = node(&mut g, NodeType::Pool, (0.0, 0.0));
        let pool_idx = g.add_node(None, pool);
        let lane = node(&mut g, NodeType::Lane, (20.0, 40.0));
        let lane_idx = g.add_node(Some(pool_idx), lane);
        let task = node(&mut g, NodeType::Task, (60.0, 80.0));
        let task_idx = g.add_node(Some(lane_idx), task);

        assert_eq!(g.container(task_idx), Some(lane_idx));
        assert_eq!(g.pool_of(task_idx), Some(pool_idx));
        assert_eq!(g.pool_of(pool_idx), Some(pool_idx));
        assert_eq!(g.lanes_of(pool_idx), vec![lane_idx]);
        assert_eq!(g.descendants(pool_idx), vec![lane_idx, task_idx]);
        assert_eq!(g.top_level(), vec![pool_idx]);
    }

    #[test]
    fn set_container_replaces_previous_link() {
        let mut g = ProcessGraph::new();
        let a = node(&mut g, NodeType::Pool, (0.0, 0.0));
        let a = g.add_node(None, a);
        let b = node(&mut g, NodeType::Pool, (0.0, 400.0));
        let b = g.add_node(None, b);
        let t = node(&mut g, NodeType::Task, (40.0, 60.0));
        let t = g.add_node(Some(a), t);

        g.set_container(t, Some(b));
        assert_eq!(g.container(t), Some(b));
        assert!(g.children(a).is_empty());

        g.set_container(t, None);
        assert_eq!(g.container(t), None);
    }

    #[test]
    fn cascade_removes_members_and_their_edges() {
        let mut g = ProcessGraph::new();
        let pool = node(&mut g, NodeType::Pool, (0.0, 0.0));
        let pool = g.add_node(None, pool);
        let lane = node(&mut g, NodeType::Lane, (20.0, 40.0));
        let lane = g.add_node(Some(pool), lane);
        let inner = node(&mut g, NodeType::Task, (60.0, 80.0));
        let inner_id = inner.id;
        g.add_node(Some(lane), inner);
        let outer = node(&mut g, NodeType::Task, (900.0, 80.0));
        let outer_id = outer.id;
        g.add_node(None, outer);
        let edge_id = g.fresh_id("edge");
        g.add_edge(ProcessEdge::new(edge_id, outer_id, inner_id, EdgeType::MessageFlow));

        let (nodes, edges) = g.remove_cascade(pool);
        assert_eq!(nodes.len(), 3);
        assert_eq!(edges, vec![edge_id]);
        assert_eq!(g.node_count(), 1);
        assert!(g.contains(outer_id));
        assert!(!g.contains(inner_id));
        assert!(g.edges.is_empty());
    }

    #[test]
    fn insertion_order_survives_slot_reuse() {
        let mut g = ProcessGraph::new();
        let names = |g: &ProcessGraph, list: Vec<NodeIndex>| -> Vec<String> {
            list.into_iter().map(|i| g.node(i).id.to_string()).collect()
        };
        let a = ProcessNode::new(ElementId::intern("order_a"), NodeType::Pool, Point::default());
        let a = g.add_node(None, a);
        let b = ProcessNode::new(ElementId::intern("order_b"), NodeType::Pool, Point::new(0.0, 300.0));
        let b = g.add_node(None, b);
        g.remove_cascade(a);
        // Lands in the freed slot, ahead of `order_b` by index.
        let c = ProcessNode::new(ElementId::intern("order_c"), NodeType::Pool, Point::new(0.0, 600.0));
        g.add_node(None, c);
        assert_eq!(names(&g, g.node_indices()), ["order_b", "order_c"]);

        let first = ProcessNode::new(ElementId::intern("order_l1"), NodeType::Lane, Point::default());
        let first = g.add_node(Some(b), first);
        let second = ProcessNode::new(ElementId::intern("order_l2"), NodeType::Lane, Point::default());
        g.add_node(Some(b), second);
        g.remove_node(first);
        let third = ProcessNode::new(ElementId::intern("order_l3"), NodeType::Lane, Point::default());
        g.add_node(Some(b), third);
        assert_eq!(names(&g, g.lanes_of(b)), ["order_l2", "order_l3"]);
        assert_eq!(names(&g, g.top_level()), ["order_b", "order_c"]);
    }

    #[test]
    fn fresh_ids_skip_taken_names() {
        let mut g = ProcessGraph::new();
        let taken = ProcessNode::new(ElementId::intern("task_1"), NodeType::Task, Point::default());
        g.add_node(None, taken);
        let id = g.fresh_id("task");
        assert_ne!(id.as_str(), "task_1");
        assert!(!g.contains(id));
    }

    #[test]
    fn role_change_clears_employee() {
        let mut task = ProcessNode::new(ElementId::intern("t"), NodeType::Task, Point::default());
        if let NodeKind::Task(attrs) = &mut task.kind {
            attrs.employee = Some("Ivanov".into());
        }
        assert!(!task.set_activity_role(Some("Procurement".into())));
        assert!(task.set_activity_role(Some("Finance".into())));
        match &task.kind {
            NodeKind::Task(attrs) => {
                assert_eq!(attrs.role.as_deref(), Some("Finance"));
                assert_eq!(attrs.employee, None);
            }
            _ => panic!("expected Task"),
        }
    }

    #[test]
    fn blank_condition_reads_as_none() {
        let mut edge = ProcessEdge::new(
            ElementId::intern("e"),
            ElementId::intern("a"),
            ElementId::intern("b"),
            EdgeType::SequenceFlow,
        );
        assert_eq!(edge.condition(), None);
        edge.kind = EdgeKind::Sequence {
            condition: Some("   ".into()),
            probability: None,
        };
        assert_eq!(edge.condition(), None);
        edge.kind = EdgeKind::Sequence {
            condition: Some("${budget > 10}".into()),
            probability: None,
        };
        assert_eq!(edge.condition(), Some("${budget > 10}"));
    }

    #[test]
    fn rect_containment_is_inclusive() {
        let r = Rect::new(Point::new(10.0, 10.0), Size::new(100.0, 50.0));
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(110.0, 60.0));
        assert!(!r.contains(110.1, 30.0));
        assert_eq!(r.center(), Point::new(60.0, 35.0));
    }
}
