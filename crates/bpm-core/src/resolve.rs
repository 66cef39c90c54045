//! Derived-state resolution pass.
//!
//! `normalize` recomputes everything that is derived from the containment
//! tree: lane → pool ownership, member lane colors, and pool/lane geometry.
//! It is run after every structural change and is idempotent:
//! `normalize(normalize(g)) == normalize(g)`.

use crate::config::GeometryConfig;
use crate::geometry::{find_drop_container, rebalance_pool};
use crate::model::*;
use petgraph::graph::NodeIndex;

/// Bring derived state in line with the containment tree.
///
/// 1. Every lane is owned by a pool: a lane found outside a pool is
///    attached to the pool enclosing its old container, or else to the pool
///    under its center.
/// 2. Every task/subprocess takes `laneColor` from its lane (none outside a
///    lane).
/// 3. Every pool is rebalanced.
///
/// Returns `true` if the graph changed.
pub fn normalize(graph: &mut ProcessGraph, config: &GeometryConfig) -> bool {
    let mut changed = resolve_lane_pools(graph, config);
    changed |= resolve_lane_colors(graph);
    for pool in graph.pools() {
        changed |= rebalance_pool(graph, pool, config);
    }
    changed
}

fn resolve_lane_pools(graph: &mut ProcessGraph, config: &GeometryConfig) -> bool {
    let mut changed = false;
    for lane in graph.of_type(NodeType::Lane) {
        let container = graph.container(lane);
        if container.is_some_and(|c| graph.node(c).node_type() == NodeType::Pool) {
            continue;
        }
        let pool = container
            .and_then(|c| graph.pool_of(c))
            .or_else(|| find_drop_container(graph, lane, config));
        if let Some(pool) = pool {
            log::debug!(
                "lane {} re-attached to pool {}",
                graph.node(lane).id,
                graph.node(pool).id
            );
            graph.set_container(lane, Some(pool));
            changed = true;
        } else {
            log::warn!("lane {} has no enclosing pool", graph.node(lane).id);
        }
    }
    changed
}

fn resolve_lane_colors(graph: &mut ProcessGraph) -> bool {
    let mut changed = false;
    let activities: Vec<NodeIndex> = graph
        .node_indices()
        .into_iter()
        .filter(|&i| graph.node(i).node_type().is_activity())
        .collect();
    for idx in activities {
        let color = graph
            .container(idx)
            .and_then(|c| match &graph.node(c).kind {
                NodeKind::Lane(lane) => Some(lane.color.clone()),
                _ => None,
            });
        changed |= graph.node_mut(idx).set_lane_color(color.as_deref());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(
        g: &mut ProcessGraph,
        container: Option<NodeIndex>,
        ty: NodeType,
        x: f32,
        y: f32,
    ) -> NodeIndex {
        let id = g.fresh_id(ty.as_str());
        g.add_node(container, ProcessNode::new(id, ty, Point::new(x, y)))
    }

    #[test]
    fn members_take_lane_color() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let lane = add(&mut g, Some(pool), NodeType::Lane, 20.0, 40.0);
        if let NodeKind::Lane(attrs) = &mut g.node_mut(lane).kind {
            attrs.color = "#FEF3C7".into();
        }
        let task = add(&mut g, Some(lane), NodeType::Task, 60.0, 60.0);
        let loose = add(&mut g, None, NodeType::Subprocess, 900.0, 0.0);

        assert!(normalize(&mut g, &config));
        assert_eq!(g.node(task).lane_color(), Some("#FEF3C7"));
        assert_eq!(g.node(loose).lane_color(), None);
    }

    #[test]
    fn stray_lane_is_attached_to_pool_under_it() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let lane = add(&mut g, None, NodeType::Lane, 20.0, 40.0);

        normalize(&mut g, &config);
        assert_eq!(g.container(lane), Some(pool));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let l1 = add(&mut g, Some(pool), NodeType::Lane, 0.0, 300.0);
        add(&mut g, Some(pool), NodeType::Lane, 0.0, 0.0);
        add(&mut g, Some(l1), NodeType::Task, 5.0, 305.0);

        normalize(&mut g, &config);
        assert!(!normalize(&mut g, &config));
    }
}
