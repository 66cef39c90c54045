//! Geometry configuration shared by containment, hit testing, and rendering.

/// Layout constants for pools, lanes, and drop handling.
///
/// All values are canvas pixels. `Default` matches the browser editor.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    /// Inner padding between a container edge and its members.
    pub padding: f32,

    /// Band at the top of a pool reserved for the pool label.
    pub pool_header_height: f32,

    /// Vertical gap between stacked lanes.
    pub lane_gap: f32,

    pub pool_min_width: f32,
    pub pool_min_height: f32,
    pub lane_min_width: f32,
    pub lane_min_height: f32,

    /// A dropped node whose center lands this close to a container counts
    /// as dropped into it.
    pub drop_tolerance: f32,

    /// Max distance from an edge segment that still hits the edge.
    pub edge_hit_tolerance: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            pool_header_height: 40.0,
            lane_gap: 10.0,
            pool_min_width: 600.0,
            pool_min_height: 250.0,
            lane_min_width: 560.0,
            lane_min_height: 150.0,
            drop_tolerance: 20.0,
            edge_hit_tolerance: 6.0,
        }
    }
}

impl GeometryConfig {
    /// Offset from a container's top edge to its usable interior.
    pub fn top_inset(&self, is_pool: bool) -> f32 {
        if is_pool {
            self.pool_header_height
        } else {
            self.padding
        }
    }
}
