//! kiss3d window renderer
//!
//! Links are unit cubes stretched along their local +Y to the link length, the target is a small
//! sphere. Key presses in the window drive the target through the same bindings as the terminal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use kiss3d::{
    camera::ArcBall,
    event::{Action, Key, WindowEvent},
    light::Light,
    nalgebra as na,
    scene::SceneNode,
    window::Window,
};
use log::{debug, info};
use nalgebra::{Point3, UnitQuaternion};
use std::sync::Arc;

// Internal
use super::{Frame, RenderError, Renderer};
use crate::{
    input::{self, QUIT_KEY},
    target_chan::TargetState,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Width and depth of the link boxes.
///
/// Units: meters
const LINK_WIDTH_M: f32 = 0.08;

/// Units: meters
const MARKER_RADIUS_M: f32 = 0.04;

/// Length of the world axes drawn at the origin.
///
/// Units: meters
const AXIS_LENGTH_M: f32 = 0.5;

const LINK_COLOUR: [f32; 3] = [0.8, 0.8, 0.85];
const MARKER_COLOUR: [f32; 3] = [1.0, 0.6, 0.0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Renderer drawing the arm in a kiss3d window.
///
/// The window must live on the thread which created it, so this renderer is driven from the main
/// thread.
pub struct WindowRenderer {
    window: Window,

    camera: ArcBall,

    links: Vec<SceneNode>,

    marker: SceneNode,

    /// Target moved by key presses in the window, `None` to ignore keys.
    input: Option<Arc<TargetState>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WindowRenderer {
    pub fn new(title: &str, input: Option<Arc<TargetState>>) -> Self {
        let mut window = Window::new(title);
        window.set_light(Light::StickToCamera);
        window.set_background_color(0.1, 0.1, 0.12);

        let mut marker = window.add_sphere(MARKER_RADIUS_M);
        marker.set_color(MARKER_COLOUR[0], MARKER_COLOUR[1], MARKER_COLOUR[2]);

        let camera = ArcBall::new(na::Point3::new(2.0, 1.5, 2.5), na::Point3::new(0.3, 0.6, 0.0));

        if input.is_some() {
            info!(
                "Window keys: h/l x-/x+, j/k y-/y+, i/m z-/z+, -/+ claw-/claw+, {} to quit",
                QUIT_KEY
            );
        }

        Self {
            window,
            camera,
            links: Vec::new(),
            marker,
            input,
        }
    }

    fn place_links(&mut self, frame: &Frame) {
        let poses = frame.link_poses();

        while self.links.len() < poses.len() {
            let mut node = self.window.add_cube(LINK_WIDTH_M, 1.0, LINK_WIDTH_M);
            node.set_color(LINK_COLOUR[0], LINK_COLOUR[1], LINK_COLOUR[2]);
            self.links.push(node);
        }

        for (node, pose) in self.links.iter_mut().zip(poses.iter()) {
            node.set_local_transformation(isometry(&pose.centre_m, &pose.rotation));
            node.set_local_scale(1.0, pose.length_m as f32, 1.0);
        }

        let m = point(&frame.marker_m);
        self.marker.set_local_translation(na::Translation3::new(m.x, m.y, m.z));

        // Error between the end effector and the target
        let end = point(&frame.end_effector_m());
        self.window.draw_line(&end, &m, &na::Point3::new(1.0, 0.3, 0.3));
    }

    fn draw_axes(&mut self) {
        let o = na::Point3::origin();
        let axes = [
            (na::Point3::new(AXIS_LENGTH_M, 0.0, 0.0), na::Point3::new(1.0, 0.0, 0.0)),
            (na::Point3::new(0.0, AXIS_LENGTH_M, 0.0), na::Point3::new(0.0, 1.0, 0.0)),
            (na::Point3::new(0.0, 0.0, AXIS_LENGTH_M), na::Point3::new(0.0, 0.0, 1.0)),
        ];

        for (end, colour) in axes.iter() {
            self.window.draw_line(&o, end, colour);
        }
    }

    /// Apply the key presses since the last frame, returns true if one asked to quit.
    fn handle_keys(&mut self) -> bool {
        let keys: Vec<char> = self
            .window
            .events()
            .iter()
            .filter_map(|event| match event.value {
                WindowEvent::Key(key, Action::Press, _) => key_char(key),
                _ => None,
            })
            .collect();

        let state = match &self.input {
            Some(s) => s,
            None => return false,
        };

        keys.into_iter().any(|k| {
            let event = input::parse_key(k);
            debug!("Window key '{}' -> {:?}", k, event);
            input::apply_event(state, event)
        })
    }
}

impl Renderer for WindowRenderer {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.place_links(frame);
        self.draw_axes();

        if !self.window.render_with_camera(&mut self.camera) {
            return Err(RenderError::WindowClosed);
        }

        match self.handle_keys() {
            true => {
                self.window.close();
                Err(RenderError::WindowClosed)
            }
            false => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The terminal character bound to a window key.
fn key_char(key: Key) -> Option<char> {
    match key {
        Key::H => Some('h'),
        Key::J => Some('j'),
        Key::K => Some('k'),
        Key::L => Some('l'),
        Key::I => Some('i'),
        Key::M => Some('m'),
        Key::Q => Some(QUIT_KEY),
        Key::Equals | Key::Add => Some('+'),
        Key::Minus | Key::Subtract => Some('-'),
        _ => None,
    }
}

fn point(p: &Point3<f64>) -> na::Point3<f32> {
    na::Point3::new(p.x as f32, p.y as f32, p.z as f32)
}

/// The scene's f64 placement in kiss3d's own nalgebra types.
fn isometry(centre: &Point3<f64>, rotation: &UnitQuaternion<f64>) -> na::Isometry3<f32> {
    let q = rotation.quaternion();
    let c = point(centre);

    na::Isometry3::from_parts(
        na::Translation3::new(c.x, c.y, c.z),
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(
            q.w as f32, q.i as f32, q.j as f32, q.k as f32,
        )),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input::KeyEvent;
    use arm_if::tc::KeyCmd;

    #[test]
    fn test_key_bindings() {
        let event = |k| key_char(k).map(input::parse_key);

        assert_eq!(event(Key::L), Some(KeyEvent::Cmd(KeyCmd::XInc)));
        assert_eq!(event(Key::M), Some(KeyEvent::Cmd(KeyCmd::ZInc)));
        assert_eq!(event(Key::Q), Some(KeyEvent::Quit));

        // Both plus keys and both minus keys move the claw
        assert_eq!(event(Key::Equals), event(Key::Add));
        assert_eq!(event(Key::Minus), event(Key::Subtract));
        assert_eq!(event(Key::Add), Some(KeyEvent::Cmd(KeyCmd::ClawInc)));

        assert_eq!(key_char(Key::Space), None);
    }

    #[test]
    fn test_isometry() {
        let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, -std::f64::consts::FRAC_PI_2);
        let iso = isometry(&Point3::new(0.4, 1.1, 0.0), &rotation);

        let y = iso.rotation * na::Vector3::y();
        assert!((y - na::Vector3::x()).norm() < 1e-6);
        assert!((iso.translation.vector - na::Vector3::new(0.4, 1.1, 0.0)).norm() < 1e-6);
    }
}
