//! Parameters structure for path drawing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drawing paths with the arm, loaded from `draw.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawParams {
    // ---- PLANE ----
    /// Depth of the drawing surface, written into the target's `x`.
    ///
    /// Units: meters
    pub draw_depth_m: f64,

    /// Distance the pen is pulled back from the surface while moving between strokes.
    ///
    /// Units: meters
    pub lift_height_m: f64,

    /// Scale applied to path coordinates before the offset.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Offset added to scaled path coordinates, `[y, z]` in the arm's frame.
    ///
    /// Units: meters
    #[serde(default)]
    pub offset_m: [f64; 2],

    // ---- PATH ----
    /// Maximum distance between a curve and its flattened line segments, in path units.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Time waited after each point so the arm can keep up.
    ///
    /// Units: milliseconds
    pub point_delay_ms: u64,

    /// Claw angle held for the whole drawing.
    ///
    /// Units: degrees
    pub claw_deg: f64,

    /// SVG path data to draw.
    pub path: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_scale() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    0.01
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            draw_depth_m: 0.8,
            lift_height_m: 0.1,
            scale: default_scale(),
            offset_m: [0.0, 0.0],
            tolerance: default_tolerance(),
            point_delay_ms: 200,
            claw_deg: 45.0,
            path: String::new(),
        }
    }
}
