//! Edge decorations: the visual contract (stroke, dash, arrowhead) of each
//! edge type.
//!
//! Serialized into the persisted document as the `style` / `markerEnd`
//! fields the browser canvas reads, and used directly by the Canvas2D
//! renderer.

use crate::model::EdgeType;
use serde::Serialize;

/// Arrowhead at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    /// `arrowclosed` (filled) or `arrow` (open).
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub stroke: &'static str,
    pub stroke_width: f32,
    /// SVG dash pattern, e.g. `"8 4"`. Solid when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDecoration {
    pub style: StrokeStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Marker>,
}

impl EdgeDecoration {
    /// Dash segment lengths for `setLineDash`; empty for a solid line.
    pub fn dash_segments(&self) -> Vec<f64> {
        self.style
            .stroke_dasharray
            .map(|d| {
                d.split_whitespace()
                    .filter_map(|s| s.parse::<f64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

const SEQUENCE_COLOR: &str = "#0f172a";
const MESSAGE_COLOR: &str = "#0ea5e9";
const ASSOCIATION_COLOR: &str = "#64748b";

/// The rendering contract for an edge of type `ty`.
pub fn decorate(ty: EdgeType) -> EdgeDecoration {
    match ty {
        // Solid line, filled arrowhead.
        EdgeType::SequenceFlow => EdgeDecoration {
            style: StrokeStyle {
                stroke: SEQUENCE_COLOR,
                stroke_width: 2.0,
                stroke_dasharray: None,
            },
            marker_end: Some(Marker {
                kind: "arrowclosed",
                color: SEQUENCE_COLOR,
            }),
        },
        // Dashed line, filled arrowhead.
        EdgeType::MessageFlow => EdgeDecoration {
            style: StrokeStyle {
                stroke: MESSAGE_COLOR,
                stroke_width: 2.0,
                stroke_dasharray: Some("8 4"),
            },
            marker_end: Some(Marker {
                kind: "arrowclosed",
                color: MESSAGE_COLOR,
            }),
        },
        // Dotted line, no arrowhead.
        EdgeType::Association => EdgeDecoration {
            style: StrokeStyle {
                stroke: ASSOCIATION_COLOR,
                stroke_width: 1.5,
                stroke_dasharray: Some("2 4"),
            },
            marker_end: None,
        },
    }
}
