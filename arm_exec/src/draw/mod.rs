//! # Drawing module
//!
//! Turns 2D vector paths into arm targets. Paths are flattened into straight line segments and
//! fed to a [`Drawer`]. The arm drawer places each point on a vertical drawing plane at a fixed
//! depth in front of the arm, pulling the pen back off the plane while it moves between strokes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::tc::Target;
use kurbo::{BezPath, PathEl, Point};
use log::{debug, trace};
use std::{sync::Arc, thread, time::Duration};

// Internal
pub use params::*;
use crate::target_chan::TargetState;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can draw straight-line paths.
pub trait Drawer {
    /// Start a new stroke at a point without drawing.
    fn move_to(&mut self, x: f64, y: f64);

    /// Draw a straight line from the current point.
    fn line_to(&mut self, x: f64, y: f64);

    /// The path is finished.
    fn end(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drawer publishing one arm target per point.
pub struct ArmDrawer {
    state: Arc<TargetState>,

    params: DrawParams,

    num_points: usize,
}

/// Feeds flattened path elements to a drawer, turning closes into lines back to the start of the
/// sub-path.
pub struct LineBuilder<'d, D: Drawer + ?Sized> {
    drawer: &'d mut D,

    start: Option<Point>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("Could not parse the SVG path: {0}")]
    InvalidPath(String),

    #[error("The flattening tolerance must be positive, got {0}")]
    InvalidTolerance(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmDrawer {
    pub fn new(state: Arc<TargetState>, params: DrawParams) -> Self {
        Self {
            state,
            params,
            num_points: 0,
        }
    }

    /// The target for a point of the path, on the plane if `down`, otherwise lifted off it.
    pub fn target_for(&self, x: f64, y: f64, down: bool) -> Target {
        let p = &self.params;

        let depth = match down {
            true => p.draw_depth_m,
            false => p.draw_depth_m - p.lift_height_m,
        };

        Target::new(
            depth,
            p.scale * x + p.offset_m[0],
            p.scale * y + p.offset_m[1],
            p.claw_deg,
        )
    }

    /// Number of targets published so far.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    fn emit(&mut self, target: Target) {
        trace!("Drawing target {:?}", target);

        self.state.set(target);
        self.num_points += 1;

        if self.params.point_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.params.point_delay_ms));
        }
    }
}

impl Drawer for ArmDrawer {
    fn move_to(&mut self, x: f64, y: f64) {
        let t = self.target_for(x, y, false);
        self.emit(t);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let t = self.target_for(x, y, true);
        self.emit(t);
    }

    fn end(&mut self) {
        debug!("Path finished after {} points", self.num_points);
    }
}

impl<'d, D: Drawer + ?Sized> LineBuilder<'d, D> {
    pub fn new(drawer: &'d mut D) -> Self {
        Self {
            drawer,
            start: None,
        }
    }

    /// Pass a single flattened element to the drawer.
    ///
    /// Curves are not expected here, they are drawn as a line to their end point.
    pub fn push(&mut self, el: PathEl) {
        match el {
            PathEl::MoveTo(p) => {
                self.start = Some(p);
                self.drawer.move_to(p.x, p.y);
            }
            PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
                self.drawer.line_to(p.x, p.y)
            }
            PathEl::ClosePath => {
                if let Some(s) = self.start {
                    self.drawer.line_to(s.x, s.y);
                }
            }
        }
    }

    pub fn end(&mut self) {
        self.drawer.end();
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse SVG path data, e.g. `"M0,0.5 L0.2,0.5"`.
pub fn parse_svg_path(data: &str) -> Result<BezPath, DrawError> {
    BezPath::from_svg(data).map_err(|e| DrawError::InvalidPath(e.to_string()))
}

/// Flatten a path into straight lines and draw it, finishing with [`Drawer::end`].
pub fn flatten_path<D: Drawer + ?Sized>(
    path: &BezPath,
    tolerance: f64,
    drawer: &mut D,
) -> Result<(), DrawError> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(DrawError::InvalidTolerance(tolerance));
    }

    let mut builder = LineBuilder::new(drawer);
    kurbo::flatten(path.iter(), tolerance, |el| builder.push(el));
    builder.end();

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::{ArmCtrl, InputData, Params};
    use crate::target_chan::TargetChannel;
    use util::module::State;

    #[derive(Debug, PartialEq)]
    enum Op {
        Move(f64, f64),
        Line(f64, f64),
        End,
    }

    #[derive(Default)]
    struct RecordingDrawer(Vec<Op>);

    impl Drawer for RecordingDrawer {
        fn move_to(&mut self, x: f64, y: f64) {
            self.0.push(Op::Move(x, y));
        }

        fn line_to(&mut self, x: f64, y: f64) {
            self.0.push(Op::Line(x, y));
        }

        fn end(&mut self) {
            self.0.push(Op::End);
        }
    }

    fn arm_drawer() -> (ArmDrawer, Arc<TargetChannel>) {
        let chan = Arc::new(TargetChannel::new());
        let state = Arc::new(TargetState::new(Target::default(), chan.clone()));
        let params = DrawParams {
            point_delay_ms: 0,
            ..DrawParams::default()
        };

        (ArmDrawer::new(state, params), chan)
    }

    #[test]
    fn test_move_line_end() {
        let (mut d, chan) = arm_drawer();
        let p = DrawParams::default();

        d.move_to(0.0, 0.5);
        let first = chan.try_recv().unwrap();
        d.line_to(0.2, 0.5);
        let second = chan.try_recv().unwrap();
        d.end();

        assert_eq!(d.num_points(), 2);
        assert_eq!(chan.try_recv(), None);

        assert!((first.x - (p.draw_depth_m - p.lift_height_m)).abs() < 1e-12);
        assert_eq!((first.y, first.z), (0.0, 0.5));
        assert_eq!(first.claw, p.claw_deg);

        assert!((second.x - p.draw_depth_m).abs() < 1e-12);
        assert_eq!((second.y, second.z), (0.2, 0.5));
    }

    #[test]
    fn test_scale_and_offset() {
        let chan = Arc::new(TargetChannel::new());
        let state = Arc::new(TargetState::new(Target::default(), chan));
        let d = ArmDrawer::new(
            state,
            DrawParams {
                scale: 2.0,
                offset_m: [0.1, 1.0],
                ..DrawParams::default()
            },
        );

        let t = d.target_for(0.5, 0.25, true);
        assert!((t.y - 1.1).abs() < 1e-12);
        assert!((t.z - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_flatten_lines() {
        let path = parse_svg_path("M0,0.5 L0.2,0.5").unwrap();
        let mut d = RecordingDrawer::default();

        flatten_path(&path, 0.01, &mut d).unwrap();

        assert_eq!(d.0, vec![Op::Move(0.0, 0.5), Op::Line(0.2, 0.5), Op::End]);
    }

    #[test]
    fn test_close_returns_to_start() {
        let path = parse_svg_path("M0,0 L1,0 L1,1 Z").unwrap();
        let mut d = RecordingDrawer::default();

        flatten_path(&path, 0.01, &mut d).unwrap();

        assert_eq!(d.0.first(), Some(&Op::Move(0.0, 0.0)));
        assert_eq!(d.0[d.0.len() - 2], Op::Line(0.0, 0.0));
        assert_eq!(d.0.last(), Some(&Op::End));
    }

    #[test]
    fn test_flatten_curve() {
        let path = parse_svg_path("M0,0 Q0.5,1 1,0").unwrap();
        let mut d = RecordingDrawer::default();

        flatten_path(&path, 0.001, &mut d).unwrap();

        // A curve becomes several lines ending on its end point
        let lines = d.0.iter().filter(|op| matches!(op, Op::Line(..))).count();
        assert!(lines > 2);
        match d.0[d.0.len() - 2] {
            Op::Line(x, y) => assert!((x - 1.0).abs() < 1e-9 && y.abs() < 1e-9),
            ref op => panic!("Expected a line, got {:?}", op),
        }
    }

    #[test]
    fn test_errors() {
        assert!(parse_svg_path("M0,0 X").is_err());

        let path = parse_svg_path("M0,0 L1,1").unwrap();
        match flatten_path(&path, 0.0, &mut RecordingDrawer::default()) {
            Err(DrawError::InvalidTolerance(_)) => (),
            _ => panic!("Expected an invalid tolerance error"),
        }
    }

    #[test]
    fn test_workspace_params_file() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../params/draw.toml");
        let p: DrawParams = util::params::load_from_path(path).unwrap();

        let bez = parse_svg_path(&p.path).unwrap();
        let mut d = RecordingDrawer::default();
        flatten_path(&bez, p.tolerance, &mut d).unwrap();

        assert_eq!(d.0.first(), Some(&Op::Move(0.0, 0.0)));
        assert_eq!(d.0.last(), Some(&Op::End));

        // Every point of the figure must be within the arm's reach, solved in drawing order
        let chan = Arc::new(TargetChannel::new());
        let state = Arc::new(TargetState::new(Target::default(), chan));
        let drawer = ArmDrawer::new(state, p);
        let mut arm = ArmCtrl::from_params(Params::default()).unwrap();

        for op in d.0.iter() {
            let target = match *op {
                Op::Move(x, y) => drawer.target_for(x, y, false),
                Op::Line(x, y) => drawer.target_for(x, y, true),
                Op::End => continue,
            };

            let (_, report) = arm.proc(&InputData { target }).unwrap();
            assert!(
                report.reached,
                "({:.3}, {:.3}, {:.3}) not reached, {:.4} m away",
                target.x, target.y, target.z, report.distance_m
            );
        }
    }
}
