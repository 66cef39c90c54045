//! Containment geometry: keeps pool/lane sizing and member positions
//! consistent.
//!
//! Pools stack their lanes top-to-bottom below a label header. Lanes span the
//! pool's inner width and grow to fit their members. Moving a container moves
//! everything it owns by the same delta. All functions here are linear in the
//! number of nodes involved; they run on every drag event.

use crate::config::GeometryConfig;
use crate::model::*;
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;

/// True if the center of a `size` box at `position` lies within `container`.
pub fn is_inside(container: &Rect, position: Point, size: Size) -> bool {
    let center = Rect::new(position, size).center();
    container.contains(center.x, center.y)
}

/// Project a candidate top-left `position` into the interior of `container`.
///
/// The interior is inset by `padding` on every side, and by the header
/// height at the top of a pool. A box larger than the interior is pinned to
/// the interior's top-left corner.
pub fn clamp_to_container(
    position: Point,
    size: Size,
    container: &ProcessNode,
    config: &GeometryConfig,
) -> Point {
    let c = container.bounds();
    let top = config.top_inset(container.node_type() == NodeType::Pool);

    let min_x = c.x + config.padding;
    let max_x = c.right() - config.padding - size.width;
    let min_y = c.y + top;
    let max_y = c.bottom() - config.padding - size.height;

    Point::new(
        clamp_or_min(position.x, min_x, max_x),
        clamp_or_min(position.y, min_y, max_y),
    )
}

fn clamp_or_min(v: f32, min: f32, max: f32) -> f32 {
    if max < min { min } else { v.clamp(min, max) }
}

/// Shift `idx` and every node it transitively owns by `(dx, dy)`.
pub fn translate_subtree(graph: &mut ProcessGraph, idx: NodeIndex, dx: f32, dy: f32) {
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    let mut moved = graph.descendants(idx);
    moved.push(idx);
    for i in moved {
        let node = graph.node_mut(i);
        node.position = node.position.offset(dx, dy);
    }
}

/// Recompute a pool's size and restack its lanes.
///
/// - Members of each lane (and direct members of the pool) are pulled right
///   and down past the container's top-left inset.
/// - Each lane's height fits its lowest member plus padding, never below
///   the lane minimum. All lanes share the pool's inner width.
/// - Lanes are stacked in order of their current `y` below the header with
///   `lane_gap` between them; each lane's members travel with it.
/// - The pool's width fits the widest lane content; its height is the max of
///   the pool minimum, the lane stack, and the lowest direct member.
///
/// Deterministic for a given input ordering and a no-op on a balanced pool.
/// Returns `true` if anything moved or resized.
pub fn rebalance_pool(graph: &mut ProcessGraph, pool: NodeIndex, config: &GeometryConfig) -> bool {
    let pad = config.padding;
    let mut changed = false;

    let mut lanes = graph.lanes_of(pool);
    lanes.sort_by(|&a, &b| {
        let (ya, yb) = (graph.node(a).position.y, graph.node(b).position.y);
        ya.total_cmp(&yb).then(a.cmp(&b))
    });

    // Lane content extents, relative to each lane's origin.
    let mut lane_heights = Vec::with_capacity(lanes.len());
    let mut content_width = config.lane_min_width;
    for &lane in &lanes {
        changed |= pull_members_inside(graph, lane, pad, pad);
        let (right, bottom) = member_extent(graph, lane);
        content_width = content_width.max(right + pad);
        lane_heights.push(config.lane_min_height.max(bottom + pad));
    }

    // Pool members outside any lane.
    changed |= pull_members_inside(graph, pool, pad, config.pool_header_height);
    let (direct_right, direct_bottom) = member_extent(graph, pool);

    let origin = graph.node(pool).position;
    let pool_width = config
        .pool_min_width
        .max(content_width + 2.0 * pad)
        .max(direct_right + pad);
    let lane_width = pool_width - 2.0 * pad;

    let mut cursor = origin.y + config.pool_header_height;
    for (&lane, &height) in lanes.iter().zip(&lane_heights) {
        let target = Point::new(origin.x + pad, cursor);
        changed |= place_subtree(graph, lane, target);
        changed |= resize(graph.node_mut(lane), Size::new(lane_width, height));
        cursor += height + config.lane_gap;
    }
    if !lanes.is_empty() {
        cursor -= config.lane_gap;
    }

    let stack_height = cursor - origin.y + pad;
    let pool_height = config
        .pool_min_height
        .max(stack_height)
        .max(direct_bottom + pad);
    changed |= resize(graph.node_mut(pool), Size::new(pool_width, pool_height));

    if changed {
        log::trace!(
            "rebalanced pool {} to {pool_width}x{pool_height} ({} lanes)",
            graph.node(pool).id,
            lanes.len()
        );
    }
    changed
}

/// Move `idx` to exactly `target`, carrying its members by the same delta.
fn place_subtree(graph: &mut ProcessGraph, idx: NodeIndex, target: Point) -> bool {
    let current = graph.node(idx).position;
    if current == target {
        return false;
    }
    for member in graph.descendants(idx) {
        let node = graph.node_mut(member);
        node.position = node.position.offset(target.x - current.x, target.y - current.y);
    }
    graph.node_mut(idx).position = target;
    true
}

fn resize(node: &mut ProcessNode, size: Size) -> bool {
    if node.size == size {
        return false;
    }
    node.size = size;
    true
}

/// Push non-lane members of `container` that sit above or left of the
/// interior inset back inside it.
fn pull_members_inside(graph: &mut ProcessGraph, container: NodeIndex, left: f32, top: f32) -> bool {
    let origin = graph.node(container).position;
    let mut changed = false;
    for member in graph.children(container) {
        let node = graph.node(member);
        if node.node_type() == NodeType::Lane {
            continue;
        }
        let target = Point::new(
            node.position.x.max(origin.x + left),
            node.position.y.max(origin.y + top),
        );
        changed |= place_subtree(graph, member, target);
    }
    changed
}

/// Right/bottom extent of the non-lane members of `container`, relative to
/// its origin. `(0, 0)` for a container without such members.
fn member_extent(graph: &ProcessGraph, container: NodeIndex) -> (f32, f32) {
    let origin = graph.node(container).position;
    graph
        .children(container)
        .into_iter()
        .map(|m| graph.node(m))
        .filter(|n| n.node_type() != NodeType::Lane)
        .fold((0.0f32, 0.0f32), |(r, b), n| {
            let bounds = n.bounds();
            (r.max(bounds.right() - origin.x), b.max(bounds.bottom() - origin.y))
        })
}

/// Find the container a node should belong to after it is dropped.
///
/// Lanes accept only pools. Other flow nodes prefer a lane over a pool. A
/// candidate qualifies when the node's center lies within the container
/// grown by `drop_tolerance`; the closest candidate wins, ties go to the
/// most recently added (topmost) container. Pools are never contained.
pub fn find_drop_container(
    graph: &ProcessGraph,
    idx: NodeIndex,
    config: &GeometryConfig,
) -> Option<NodeIndex> {
    let node = graph.node(idx);
    let center = node.center();
    let tiers: &[NodeType] = match node.node_type() {
        NodeType::Pool => return None,
        NodeType::Lane => &[NodeType::Pool],
        _ => &[NodeType::Lane, NodeType::Pool],
    };

    for &tier in tiers {
        let best = graph
            .of_type(tier)
            .into_iter()
            .filter(|&c| c != idx)
            .map(|c| (c, distance_to_rect(&graph.node(c).bounds(), center)))
            .filter(|&(_, d)| d <= config.drop_tolerance)
            .min_by(|a, b| match a.1.total_cmp(&b.1) {
                Ordering::Equal => b.0.cmp(&a.0),
                other => other,
            });
        if let Some((container, _)) = best {
            return Some(container);
        }
    }
    None
}

/// Euclidean distance from `p` to the nearest point of `r`; 0 inside.
fn distance_to_rect(r: &Rect, p: Point) -> f32 {
    let dx = (r.x - p.x).max(0.0).max(p.x - r.right());
    let dy = (r.y - p.y).max(0.0).max(p.y - r.bottom());
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;

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
    fn inside_uses_box_center() {
        let lane = Rect::new(Point::new(0.0, 0.0), Size::new(200.0, 100.0));
        // Top-left outside, center inside.
        assert!(is_inside(&lane, Point::new(-20.0, -10.0), Size::new(60.0, 40.0)));
        // Top-left inside, center outside.
        assert!(!is_inside(&lane, Point::new(180.0, 20.0), Size::new(60.0, 40.0)));
    }

    #[test]
    fn clamp_respects_pool_header() {
        let config = GeometryConfig::default();
        let pool = ProcessNode::new(ElementId::intern("p"), NodeType::Pool, Point::new(100.0, 100.0));
        let size = NodeType::Task.default_size();

        let p = clamp_to_container(Point::new(0.0, 0.0), size, &pool, &config);
        assert_eq!(p, Point::new(120.0, 140.0));

        let p = clamp_to_container(Point::new(10_000.0, 10_000.0), size, &pool, &config);
        assert_eq!(p.x, 100.0 + 600.0 - 20.0 - size.width);
        assert_eq!(p.y, 100.0 + 250.0 - 20.0 - size.height);
    }

    #[test]
    fn clamp_inside_lane_uses_plain_padding() {
        let config = GeometryConfig::default();
        let lane = ProcessNode::new(ElementId::intern("l"), NodeType::Lane, Point::new(0.0, 0.0));
        let p = clamp_to_container(Point::new(-5.0, -5.0), Size::new(10.0, 10.0), &lane, &config);
        assert_eq!(p, Point::new(20.0, 20.0));
    }

    #[test]
    fn rebalance_stacks_lanes_and_carries_members() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        // Inserted out of vertical order.
        let lower = add(&mut g, Some(pool), NodeType::Lane, 30.0, 500.0);
        let upper = add(&mut g, Some(pool), NodeType::Lane, 30.0, 100.0);
        let task = add(&mut g, Some(lower), NodeType::Task, 80.0, 540.0);

        assert!(rebalance_pool(&mut g, pool, &config));

        assert_eq!(g.node(upper).position, Point::new(20.0, 40.0));
        assert_eq!(g.node(lower).position, Point::new(20.0, 40.0 + 150.0 + 10.0));
        // Task moved by the same delta as its lane: (-10, -300).
        assert_eq!(g.node(task).position, Point::new(70.0, 240.0));

        let pool_node = g.node(pool);
        assert_eq!(pool_node.size.width, 600.0);
        assert_eq!(pool_node.size.height, 40.0 + 150.0 + 10.0 + 150.0 + 20.0);
        assert_eq!(g.node(upper).size.width, 560.0);
    }

    #[test]
    fn rebalance_is_idempotent() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 50.0, 50.0);
        let lane = add(&mut g, Some(pool), NodeType::Lane, 0.0, 0.0);
        add(&mut g, Some(lane), NodeType::Task, 700.0, 300.0);
        add(&mut g, Some(pool), NodeType::DataObject, 10.0, 10.0);

        rebalance_pool(&mut g, pool, &config);
        let snapshot: Vec<_> = g.node_indices().iter().map(|&i| g.node(i).clone()).collect();
        assert!(!rebalance_pool(&mut g, pool, &config));
        let again: Vec<_> = g.node_indices().iter().map(|&i| g.node(i).clone()).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn lanes_grow_to_fit_members() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let lane = add(&mut g, Some(pool), NodeType::Lane, 20.0, 40.0);
        let task = add(&mut g, Some(lane), NodeType::Task, 700.0, 200.0);

        rebalance_pool(&mut g, pool, &config);

        let lane_b = g.node(lane).bounds();
        let task_b = g.node(task).bounds();
        assert!(lane_b.right() >= task_b.right() + config.padding);
        assert!(lane_b.bottom() >= task_b.bottom() + config.padding);
        assert!(g.node(pool).bounds().right() >= lane_b.right() + config.padding);
    }

    #[test]
    fn translate_moves_whole_subtree() {
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let lane = add(&mut g, Some(pool), NodeType::Lane, 20.0, 40.0);
        let task = add(&mut g, Some(lane), NodeType::Task, 60.0, 70.0);
        let outside = add(&mut g, None, NodeType::Task, 900.0, 900.0);

        translate_subtree(&mut g, pool, 15.0, -5.0);

        assert_eq!(g.node(pool).position, Point::new(15.0, -5.0));
        assert_eq!(g.node(lane).position, Point::new(35.0, 35.0));
        assert_eq!(g.node(task).position, Point::new(75.0, 65.0));
        assert_eq!(g.node(outside).position, Point::new(900.0, 900.0));
    }

    #[test]
    fn drop_prefers_lane_over_pool() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let lane = add(&mut g, Some(pool), NodeType::Lane, 20.0, 40.0);
        rebalance_pool(&mut g, pool, &config);

        let in_lane = add(&mut g, None, NodeType::Task, 100.0, 60.0);
        assert_eq!(find_drop_container(&g, in_lane, &config), Some(lane));

        // Below the lane but inside the pool.
        let in_pool = add(&mut g, None, NodeType::Gateway, 100.0, 200.0);
        assert_eq!(find_drop_container(&g, in_pool, &config), Some(pool));

        let far = add(&mut g, None, NodeType::Task, 2000.0, 2000.0);
        assert_eq!(find_drop_container(&g, far, &config), None);
    }

    #[test]
    fn drop_tolerance_catches_near_misses() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let pool = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        // Center at x = 615: 15px right of the pool edge.
        let near = add(&mut g, None, NodeType::Start, 591.0, 100.0);
        assert_eq!(find_drop_container(&g, near, &config), Some(pool));
    }

    #[test]
    fn lanes_only_drop_into_pools_and_pools_never_drop() {
        let config = GeometryConfig::default();
        let mut g = ProcessGraph::new();
        let a = add(&mut g, None, NodeType::Pool, 0.0, 0.0);
        let b = add(&mut g, None, NodeType::Pool, 0.0, 400.0);
        let lane = add(&mut g, Some(a), NodeType::Lane, 20.0, 420.0);
        assert_eq!(find_drop_container(&g, lane, &config), Some(b));
        assert_eq!(find_drop_container(&g, b, &config), None);
    }
}
