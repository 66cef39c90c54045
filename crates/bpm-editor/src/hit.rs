//! Hit testing: point → node or edge lookup.
//!
//! Flow nodes are painted above edges, edges above lanes, lanes above
//! pools, so hits are resolved in that order. Within a tier the most
//! recently added element is topmost.

use bpm_core::config::GeometryConfig;
use bpm_core::id::ElementId;
use bpm_core::model::*;

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Node(ElementId),
    Edge(ElementId),
}

/// Find the topmost element at `(px, py)`. `None` means empty canvas.
pub fn hit_test(graph: &ProcessGraph, px: f32, py: f32, config: &GeometryConfig) -> Option<Hit> {
    let order = graph.node_indices();
    let node_at = |pred: &dyn Fn(NodeType) -> bool| {
        order
            .iter()
            .rev()
            .map(|&idx| graph.node(idx))
            .find(|n| pred(n.node_type()) && n.bounds().contains(px, py))
            .map(|n| Hit::Node(n.id))
    };

    node_at(&|t| !t.is_container())
        .or_else(|| hit_edge(graph, px, py, config.edge_hit_tolerance))
        .or_else(|| node_at(&|t| t == NodeType::Lane))
        .or_else(|| node_at(&|t| t == NodeType::Pool))
}

/// Straight segment between the centers of an edge's endpoints.
pub fn edge_segment(graph: &ProcessGraph, edge: &ProcessEdge) -> Option<(Point, Point)> {
    let source = graph.get_by_id(edge.source)?;
    let target = graph.get_by_id(edge.target)?;
    Some((source.center(), target.center()))
}

fn hit_edge(graph: &ProcessGraph, px: f32, py: f32, tolerance: f32) -> Option<Hit> {
    graph
        .edges
        .iter()
        .rev()
        .find(|edge| {
            edge_segment(graph, edge)
                .is_some_and(|(a, b)| distance_to_segment(Point::new(px, py), a, b) <= tolerance)
        })
        .map(|edge| Hit::Edge(edge.id))
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
