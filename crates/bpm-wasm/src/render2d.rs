//! Canvas2D renderer.
//!
//! Paints the process graph to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`: pools, then lanes, then edges, then flow
//! nodes, so the paint order matches hit-test priority.

use bpm_core::decor::decorate;
use bpm_core::model::*;
use bpm_core::{EdgeDecoration, GeometryConfig, NodeIndex};
use bpm_editor::Selection;
use bpm_editor::hit::edge_segment;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const BG: &str = "#F8FAFC";
const GRID: &str = "rgba(15, 23, 42, 0.06)";
const SELECTED: &str = "#2563EB";
const NODE_STROKE: &str = "#334155";
const NODE_FILL: &str = "#FFFFFF";
const LABEL: &str = "#0F172A";
const FONT: &str = "Inter, system-ui, sans-serif";

/// Everything the renderer needs for one frame.
pub struct Frame<'a> {
    pub graph: &'a ProcessGraph,
    pub config: &'a GeometryConfig,
    pub selection: Selection,
    /// Rubber-band line of the connect tool.
    pub preview: Option<(Point, Point)>,
    pub width: f64,
    pub height: f64,
}

/// Render the whole diagram.
pub fn render_frame(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
    ctx.set_fill_style_str(BG);
    ctx.fill_rect(0.0, 0.0, frame.width, frame.height);
    draw_grid(ctx, frame.width, frame.height);

    let graph = frame.graph;
    let indices = graph.node_indices();
    let (containers, flow): (Vec<NodeIndex>, Vec<NodeIndex>) = indices
        .iter()
        .partition(|&&idx| graph.node(idx).node_type().is_container());

    for &idx in containers.iter().filter(|&&i| graph.node(i).node_type() == NodeType::Pool) {
        draw_pool(ctx, graph.node(idx), frame);
    }
    for &idx in containers.iter().filter(|&&i| graph.node(i).node_type() == NodeType::Lane) {
        draw_lane(ctx, graph.node(idx), frame);
    }

    for edge in &graph.edges {
        let Some((from, to)) = edge_segment(graph, edge) else {
            continue;
        };
        let selected = frame.selection == Selection::Edge(edge.id);
        draw_edge(ctx, from, to, &decorate(edge.edge_type()), edge.label.as_deref(), selected);
    }

    for &idx in &flow {
        draw_flow_node(ctx, graph.node(idx), frame.selection == Selection::Node(graph.node(idx).id));
    }

    if let Some((from, to)) = frame.preview {
        draw_preview(ctx, from, to);
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
    let spacing = 20.0;
    ctx.set_fill_style_str(GRID);
    let mut y = 0.0;
    while y < height {
        let mut x = 0.0;
        while x < width {
            ctx.fill_rect(x, y, 1.0, 1.0);
            x += spacing;
        }
        y += spacing;
    }
}

// ─── Containers ──────────────────────────────────────────────────────────

fn rect_of(node: &ProcessNode) -> (f64, f64, f64, f64) {
    (
        node.position.x as f64,
        node.position.y as f64,
        node.size.width as f64,
        node.size.height as f64,
    )
}

fn draw_pool(ctx: &CanvasRenderingContext2d, node: &ProcessNode, frame: &Frame<'_>) {
    let (x, y, w, h) = rect_of(node);
    let header = frame.config.pool_header_height as f64;
    let selected = frame.selection == Selection::Node(node.id);

    ctx.save();
    ctx.set_fill_style_str(NODE_FILL);
    ctx.fill_rect(x, y, w, h);
    ctx.set_fill_style_str("#F1F5F9");
    ctx.fill_rect(x, y, w, header);
    ctx.set_stroke_style_str(if selected { SELECTED } else { NODE_STROKE });
    ctx.set_line_width(if selected { 2.0 } else { 1.5 });
    ctx.stroke_rect(x, y, w, h);
    ctx.begin_path();
    ctx.move_to(x, y + header);
    ctx.line_to(x + w, y + header);
    ctx.stroke();

    ctx.set_font(&format!("600 13px {FONT}"));
    ctx.set_fill_style_str(LABEL);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&node.label, x + 12.0, y + header / 2.0);
    ctx.restore();
}

fn draw_lane(ctx: &CanvasRenderingContext2d, node: &ProcessNode, frame: &Frame<'_>) {
    let (x, y, w, h) = rect_of(node);
    let selected = frame.selection == Selection::Node(node.id);
    let color = match &node.kind {
        NodeKind::Lane(lane) => lane.color.as_str(),
        _ => NODE_FILL,
    };

    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(if selected { SELECTED } else { "#94A3B8" });
    ctx.set_line_width(if selected { 2.0 } else { 1.0 });
    ctx.stroke_rect(x, y, w, h);

    ctx.set_font(&format!("500 12px {FONT}"));
    ctx.set_fill_style_str(LABEL);
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    let _ = ctx.fill_text(&node.label, x + 8.0, y + 6.0);
    if let Some(role) = node.role() {
        ctx.set_font(&format!("11px {FONT}"));
        ctx.set_fill_style_str("#475569");
        let _ = ctx.fill_text(role, x + 8.0, y + 22.0);
    }
    ctx.restore();
}

// ─── Flow nodes ──────────────────────────────────────────────────────────

fn draw_flow_node(ctx: &CanvasRenderingContext2d, node: &ProcessNode, selected: bool) {
    let (x, y, w, h) = rect_of(node);
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let stroke = if selected { SELECTED } else { NODE_STROKE };

    ctx.save();
    ctx.set_stroke_style_str(stroke);
    ctx.set_line_width(if selected { 2.5 } else { 1.5 });
    match &node.kind {
        NodeKind::Task(_) | NodeKind::Subprocess(_) | NodeKind::Message(_) => {
            let fill = node.lane_color().unwrap_or(NODE_FILL);
            rounded_rect_path(ctx, x, y, w, h, 10.0);
            ctx.set_fill_style_str(fill);
            ctx.fill();
            ctx.stroke();
            if node.node_type() == NodeType::Subprocess {
                // Collapsed-subprocess marker.
                ctx.stroke_rect(cx - 7.0, y + h - 16.0, 14.0, 12.0);
                ctx.begin_path();
                ctx.move_to(cx - 4.0, y + h - 10.0);
                ctx.line_to(cx + 4.0, y + h - 10.0);
                ctx.move_to(cx, y + h - 14.0);
                ctx.line_to(cx, y + h - 6.0);
                ctx.stroke();
            }
            if node.node_type() == NodeType::Message {
                draw_envelope(ctx, x + 8.0, y + 8.0);
            }
        }
        NodeKind::Gateway(kind) => {
            ctx.begin_path();
            ctx.move_to(cx, y);
            ctx.line_to(x + w, cy);
            ctx.line_to(cx, y + h);
            ctx.line_to(x, cy);
            ctx.close_path();
            ctx.set_fill_style_str(NODE_FILL);
            ctx.fill();
            ctx.stroke();
            draw_gateway_marker(ctx, *kind, cx, cy, w.min(h) / 5.0);
        }
        NodeKind::Start | NodeKind::End => {
            let end = node.node_type() == NodeType::End;
            ctx.begin_path();
            let _ = ctx.ellipse(cx, cy, w / 2.0, h / 2.0, 0.0, 0.0, std::f64::consts::TAU);
            ctx.set_fill_style_str(if end { "#FEE2E2" } else { "#DCFCE7" });
            ctx.fill();
            ctx.set_line_width(if end { 3.5 } else { 1.5 });
            ctx.stroke();
        }
        NodeKind::DataObject(_) => {
            let fold = 14.0;
            ctx.begin_path();
            ctx.move_to(x, y);
            ctx.line_to(x + w - fold, y);
            ctx.line_to(x + w, y + fold);
            ctx.line_to(x + w, y + h);
            ctx.line_to(x, y + h);
            ctx.close_path();
            ctx.set_fill_style_str(NODE_FILL);
            ctx.fill();
            ctx.stroke();
            ctx.begin_path();
            ctx.move_to(x + w - fold, y);
            ctx.line_to(x + w - fold, y + fold);
            ctx.line_to(x + w, y + fold);
            ctx.stroke();
        }
        NodeKind::Lane(_) | NodeKind::Pool(_) => {}
    }
    ctx.restore();

    draw_node_label(ctx, node, (x, y, w, h));
}

/// Events and gateways are labeled below the shape, boxes inside it.
fn draw_node_label(ctx: &CanvasRenderingContext2d, node: &ProcessNode, (x, y, w, h): (f64, f64, f64, f64)) {
    if node.label.is_empty() {
        return;
    }
    ctx.save();
    ctx.set_font(&format!("500 12px {FONT}"));
    ctx.set_fill_style_str(LABEL);
    ctx.set_text_align("center");
    match node.node_type() {
        NodeType::Start | NodeType::End | NodeType::Gateway => {
            ctx.set_text_baseline("top");
            let _ = ctx.fill_text(&node.label, x + w / 2.0, y + h + 4.0);
        }
        _ => {
            ctx.set_text_baseline("middle");
            let _ = ctx.fill_text_with_max_width(&node.label, x + w / 2.0, y + h / 2.0, w - 12.0);
        }
    }
    ctx.restore();
}

fn draw_gateway_marker(ctx: &CanvasRenderingContext2d, kind: GatewayKind, cx: f64, cy: f64, r: f64) {
    ctx.begin_path();
    match kind {
        GatewayKind::Exclusive => {
            ctx.move_to(cx - r, cy - r);
            ctx.line_to(cx + r, cy + r);
            ctx.move_to(cx + r, cy - r);
            ctx.line_to(cx - r, cy + r);
        }
        GatewayKind::Parallel => {
            ctx.move_to(cx - r, cy);
            ctx.line_to(cx + r, cy);
            ctx.move_to(cx, cy - r);
            ctx.line_to(cx, cy + r);
        }
    }
    ctx.set_line_width(3.0);
    ctx.stroke();
}

fn draw_envelope(ctx: &CanvasRenderingContext2d, x: f64, y: f64) {
    let (w, h) = (18.0, 12.0);
    ctx.stroke_rect(x, y, w, h);
    ctx.begin_path();
    ctx.move_to(x, y);
    ctx.line_to(x + w / 2.0, y + h / 2.0);
    ctx.line_to(x + w, y);
    ctx.stroke();
}

// ─── Edges ───────────────────────────────────────────────────────────────

fn set_line_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let array = js_sys::Array::new();
    for s in segments {
        array.push(&JsValue::from_f64(*s));
    }
    let _ = ctx.set_line_dash(&array);
}

fn draw_edge(
    ctx: &CanvasRenderingContext2d,
    from: Point,
    to: Point,
    decor: &EdgeDecoration,
    label: Option<&str>,
    selected: bool,
) {
    let (x1, y1, x2, y2) = (from.x as f64, from.y as f64, to.x as f64, to.y as f64);
    let color = if selected { SELECTED } else { decor.style.stroke };
    let width = decor.style.stroke_width as f64 + if selected { 1.0 } else { 0.0 };

    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    set_line_dash(ctx, &decor.dash_segments());
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
    set_line_dash(ctx, &[]);

    if let Some(marker) = decor.marker_end {
        let marker_color = if selected { SELECTED } else { marker.color };
        draw_arrowhead(ctx, (x1, y1), (x2, y2), marker_color, marker.kind == "arrowclosed");
    }

    if let Some(label) = label.filter(|l| !l.is_empty()) {
        ctx.set_font(&format!("11px {FONT}"));
        ctx.set_fill_style_str(color);
        ctx.set_text_align("center");
        ctx.set_text_baseline("bottom");
        let _ = ctx.fill_text(label, (x1 + x2) / 2.0, (y1 + y2) / 2.0 - 4.0);
    }
    ctx.restore();
}

fn draw_arrowhead(ctx: &CanvasRenderingContext2d, (x1, y1): (f64, f64), (x2, y2): (f64, f64), color: &str, filled: bool) {
    let angle = (y2 - y1).atan2(x2 - x1);
    let len = 10.0;
    let spread = 0.45_f64;
    let (ax, ay) = (x2 - len * (angle - spread).cos(), y2 - len * (angle - spread).sin());
    let (bx, by) = (x2 - len * (angle + spread).cos(), y2 - len * (angle + spread).sin());

    ctx.begin_path();
    ctx.move_to(ax, ay);
    ctx.line_to(x2, y2);
    ctx.line_to(bx, by);
    if filled {
        ctx.close_path();
        ctx.set_fill_style_str(color);
        ctx.fill();
    } else {
        ctx.set_stroke_style_str(color);
        ctx.stroke();
    }
}

fn draw_preview(ctx: &CanvasRenderingContext2d, from: Point, to: Point) {
    ctx.save();
    ctx.set_stroke_style_str(SELECTED);
    ctx.set_line_width(1.5);
    set_line_dash(ctx, &[6.0, 4.0]);
    ctx.begin_path();
    ctx.move_to(from.x as f64, from.y as f64);
    ctx.line_to(to.x as f64, to.y as f64);
    ctx.stroke();
    ctx.restore();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
