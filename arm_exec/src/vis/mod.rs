//! # Visualisation module
//!
//! A node hierarchy mirroring the arm's chain plus a marker for the current target. The control
//! loop writes joint rotations into the scene through [`VisSink`], a render thread reads
//! consistent snapshots of it and hands them to a [`Renderer`].
//!
//! The scene sits behind an `RwLock` so the render thread never sees a half-written pose. A frame
//! is at most one control cycle stale.
//!
//! [`LogRenderer`] is always available. With the `window` feature [`WindowRenderer`] draws the
//! links as boxes in a kiss3d window and takes target keys from it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::{Point3, UnitQuaternion};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    thread,
    time::{Duration, Instant},
};

// Internal
use crate::{
    chain::{Chain, Euler, JointTransform},
    ctrl_loop::VisSink,
};

#[cfg(feature = "window")]
mod window;
#[cfg(feature = "window")]
pub use window::WindowRenderer;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Names given to the scene nodes of the joints, in chain order.
pub const JOINT_NODE_NAMES: [&str; 3] = ["base", "right", "left"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The scene: one node per chain segment and a target marker.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// Geometry of the arm, the rotations in the chain itself are not used.
    chain: Chain,

    nodes: Vec<SceneNode>,

    marker_m: Point3<f64>,

    /// Incremented on every completed update.
    version: u64,
}

/// A single joint node of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,

    /// Index of the parent node, `None` for the root.
    pub parent: Option<usize>,

    pub rotation: Euler,

    /// Length of the link mesh drawn from this node's joint.
    ///
    /// Units: meters
    pub link_length_m: f64,
}

/// Scene shared between the control loop and a render thread.
///
/// Joint rotations and the marker are staged in this handle and only written into the shared
/// scene, under a single lock, on [`VisSink::update`].
#[derive(Debug, Clone)]
pub struct SharedScene {
    scene: Arc<RwLock<SceneGraph>>,

    pending_joints: Vec<(usize, Euler)>,

    pending_marker: Option<[f64; 3]>,
}

/// Snapshot of the scene with world transforms resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub version: u64,

    /// World placement of each node, root first.
    pub nodes: Vec<(String, JointTransform)>,

    pub marker_m: Point3<f64>,
}

/// World placement of a link, for renderers which draw the link as a mesh along its local +Y.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPose {
    pub name: String,

    /// Midpoint between the link's joint and its endpoint.
    ///
    /// Units: meters
    pub centre_m: Point3<f64>,

    pub rotation: UnitQuaternion<f64>,

    /// Units: meters
    pub length_m: f64,
}

/// Renderer which logs frames instead of drawing them.
#[derive(Debug, Default)]
pub struct LogRenderer {
    last_version: Option<u64>,

    num_frames: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can be raised by a renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("The renderer's window was closed")]
    WindowClosed,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can draw frames of the scene.
///
/// Returning [`RenderError::WindowClosed`] ends the render loop normally.
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SceneGraph {
    /// Build a scene mirroring the chain, with every joint at the chain's current rotation.
    pub fn from_chain(chain: &Chain) -> Self {
        let nodes = chain
            .segments()
            .iter()
            .enumerate()
            .map(|(i, seg)| SceneNode {
                name: match i {
                    0 => String::from("root"),
                    _ => JOINT_NODE_NAMES
                        .get(i - 1)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("joint_{}", i - 1)),
                },
                parent: seg.parent(),
                rotation: *seg.rotation(),
                link_length_m: seg.length_m(),
            })
            .collect();

        Self {
            chain: chain.clone(),
            nodes,
            marker_m: Point3::origin(),
            version: 0,
        }
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn marker_m(&self) -> Point3<f64> {
        self.marker_m
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Resolve the world transforms of every node.
    pub fn frame(&self) -> Frame {
        let rotations: Vec<Euler> = self.nodes.iter().skip(1).map(|n| n.rotation).collect();

        let nodes = self
            .nodes
            .iter()
            .zip(self.chain.forward_transform_with(&rotations))
            .map(|(n, t)| (n.name.clone(), t))
            .collect();

        Frame {
            version: self.version,
            nodes,
            marker_m: self.marker_m,
        }
    }
}

impl VisSink for SceneGraph {
    fn set_joint_rotation(&mut self, joint: usize, rotation: &Euler) {
        // Node 0 is the root, joints follow it
        match self.nodes.get_mut(joint + 1) {
            Some(n) => n.rotation = *rotation,
            None => debug!("Ignoring rotation for unknown joint {}", joint),
        }
    }

    fn set_marker_position(&mut self, position: [f64; 3]) {
        self.marker_m = Point3::new(position[0], position[1], position[2]);
    }

    fn update(&mut self) {
        self.version += 1;
    }
}

impl SharedScene {
    pub fn new(scene: SceneGraph) -> Self {
        Self {
            scene: Arc::new(RwLock::new(scene)),
            pending_joints: Vec::new(),
            pending_marker: None,
        }
    }

    /// Consistent snapshot of the scene.
    pub fn snapshot(&self) -> Frame {
        self.read().frame()
    }

    pub fn version(&self) -> u64 {
        self.read().version()
    }

    fn read(&self) -> RwLockReadGuard<'_, SceneGraph> {
        self.scene.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SceneGraph> {
        self.scene.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl VisSink for SharedScene {
    fn set_joint_rotation(&mut self, joint: usize, rotation: &Euler) {
        self.pending_joints.push((joint, *rotation));
    }

    fn set_marker_position(&mut self, position: [f64; 3]) {
        self.pending_marker = Some(position);
    }

    fn update(&mut self) {
        let joints = std::mem::take(&mut self.pending_joints);
        let marker = self.pending_marker.take();

        let mut scene = self.write();
        for (j, r) in joints.iter() {
            scene.set_joint_rotation(*j, r);
        }
        if let Some(m) = marker {
            scene.set_marker_position(m);
        }
        scene.update();
    }
}

impl Frame {
    /// Position of the end of the last node.
    pub fn end_effector_m(&self) -> Point3<f64> {
        match self.nodes.last() {
            Some((_, t)) => t.end,
            None => Point3::origin(),
        }
    }

    /// Placement of every node with a non-zero length.
    pub fn link_poses(&self) -> Vec<LinkPose> {
        self.nodes
            .iter()
            .filter_map(|(name, t)| {
                let length_m = (t.end - t.origin).norm();

                match length_m > f64::EPSILON {
                    true => Some(LinkPose {
                        name: name.clone(),
                        centre_m: t.origin + (t.end - t.origin) * 0.5,
                        rotation: UnitQuaternion::from_rotation_matrix(&t.orientation),
                        length_m,
                    }),
                    false => None,
                }
            })
            .collect()
    }
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of new frames logged.
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        // Only log frames which changed
        if self.last_version == Some(frame.version) {
            return Ok(());
        }

        let joints: Vec<String> = frame
            .nodes
            .iter()
            .map(|(name, t)| format!("{} ({:.3}, {:.3}, {:.3})", name, t.end.x, t.end.y, t.end.z))
            .collect();

        let end = frame.end_effector_m();
        info!(
            "[frame {}] {} | marker ({:.3}, {:.3}, {:.3}) | error {:.3} m",
            frame.version,
            joints.join(", "),
            frame.marker_m.x,
            frame.marker_m.y,
            frame.marker_m.z,
            (end - frame.marker_m).norm()
        );

        self.last_version = Some(frame.version);
        self.num_frames += 1;

        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        (**self).render(frame)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Render snapshots of the scene at a fixed period until `run` is cleared or the renderer's window
/// is closed.
///
/// `before_frame` is called at the start of every frame, before the snapshot is taken.
///
/// Returns the number of frames rendered.
pub fn render_loop<R, F>(
    scene: &SharedScene,
    renderer: &mut R,
    period: Duration,
    run: &AtomicBool,
    mut before_frame: F,
) -> Result<u64, RenderError>
where
    R: Renderer + ?Sized,
    F: FnMut(),
{
    let mut num_frames = 0;

    while run.load(Ordering::Relaxed) {
        let start = Instant::now();

        before_frame();
        match renderer.render(&scene.snapshot()) {
            Ok(()) => num_frames += 1,
            Err(RenderError::WindowClosed) => {
                info!("Render window closed after {} frames", num_frames);
                break;
            }
        }

        match period.checked_sub(start.elapsed()) {
            Some(d) => thread::sleep(d),
            None => trace!("Frame {} overran the frame period", num_frames),
        }
    }

    Ok(num_frames)
}
