//! # Arm Visualisation Executable
//!
//! Shows the arm without any hardware attached. The arm is re-solved from the latest target before
//! every frame.
//!
//! By default frames are logged from a render thread while keys typed in the terminal move the
//! target. With `--window` (needs the `window` feature) the arm is drawn in a window on the main
//! thread and keys pressed in the window move the target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::ArmCtrl,
    ctrl_loop::ControlLoop,
    input,
    target_chan::{TargetChannel, TargetState},
    vis::{render_loop, LogRenderer, SceneGraph, SharedScene},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_vis", about = "MeArm visualisation without hardware")]
struct Opt {
    /// Period between rendered frames, in milliseconds
    #[structopt(long, default_value = "50")]
    frame_period_ms: u64,

    /// Draw the arm in a window instead of logging frames
    #[structopt(long)]
    window: bool,

    /// Minimum level of log messages, at least `info`
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("arm_vis", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("MeArm Visualisation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- MODULE INITIALISATION ----

    let mut arm = ArmCtrl::new();
    arm.init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;

    let scene = SharedScene::new(SceneGraph::from_chain(
        arm.chain().ok_or_else(|| eyre!("ArmCtrl has no chain after init"))?,
    ));

    // Nothing consumes the channel, the renderer reads the current target directly
    let state = Arc::new(TargetState::new(
        arm.params().initial_target,
        Arc::new(TargetChannel::new()),
    ));

    // No actuation, the scene is the only sink
    let mut ctrl_loop = ControlLoop::new(arm, (), scene.clone());

    let before_frame = {
        let state = state.clone();
        let mut last_target = None;

        move || {
            let target = state.snapshot();

            // Re-solving an unchanged target gives the same pose
            if last_target == Some(target) {
                return;
            }

            match ctrl_loop.process(target) {
                Ok(_) => last_target = Some(target),
                Err(e) => warn!("Could not solve for {:?}: {}", target, e),
            }
        }
    };

    let period = Duration::from_millis(opt.frame_period_ms);

    // ---- RENDER ----

    let num_frames = match opt.window {
        true => run_window(&scene, state, period, before_frame)?,
        false => run_terminal(scene, state, period, before_frame)?,
    };

    info!("End of execution, {} frames rendered", num_frames);

    Ok(())
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Log frames from a render thread while the terminal moves the target.
fn run_terminal<F>(
    scene: SharedScene,
    state: Arc<TargetState>,
    period: Duration,
    before_frame: F,
) -> Result<u64>
where
    F: FnMut() + Send + 'static,
{
    let run = Arc::new(AtomicBool::new(true));

    let render_jh = {
        let run = run.clone();

        thread::Builder::new()
            .name("render".into())
            .spawn(move || render_loop(&scene, &mut LogRenderer::new(), period, &run, before_frame))
            .wrap_err("Failed to start the render thread")?
    };

    let input_result = input::terminal_loop(&state);

    // ---- SHUTDOWN ----

    run.store(false, Ordering::Relaxed);

    let num_frames = render_jh
        .join()
        .map_err(|_| eyre!("The render thread panicked"))?
        .wrap_err("The render loop failed")?;

    input_result.wrap_err("Interactive input failed")?;

    Ok(num_frames)
}

/// Draw the arm in a window until it is closed or the quit key is pressed in it.
#[cfg(feature = "window")]
fn run_window<F: FnMut()>(
    scene: &SharedScene,
    state: Arc<TargetState>,
    period: Duration,
    before_frame: F,
) -> Result<u64> {
    let mut renderer = arm_lib::vis::WindowRenderer::new("MeArm", Some(state));

    render_loop(
        scene,
        &mut renderer,
        period,
        &AtomicBool::new(true),
        before_frame,
    )
    .wrap_err("The render loop failed")
}

#[cfg(not(feature = "window"))]
fn run_window<F: FnMut()>(
    _scene: &SharedScene,
    _state: Arc<TargetState>,
    _period: Duration,
    _before_frame: F,
) -> Result<u64> {
    Err(eyre!(
        "arm_vis was built without the `window` feature, rebuild with `--features window`"
    ))
}
