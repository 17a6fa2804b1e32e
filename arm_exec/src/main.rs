//! # Arm Control Executable
//!
//! Interactive control of the MeArm from the terminal.
//!
//! # Architecture
//!
//! Three threads share the work:
//!
//!     - Input (main thread): reads keys from the terminal, adjusts the current target and
//!       publishes it to the target channel.
//!     - Control loop: takes the latest target, solves it, drives the servos and updates the
//!       scene.
//!     - Render (with `--vis` only): draws snapshots of the scene at a fixed rate.
//!
//! Quitting the input closes the target channel, which stops the control loop once it has
//! finished with any pending target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::info;
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
    ctrl_loop::{ControlLoop, VisSink},
    input,
    servo_ctrl::{self, Backend, ControllerConfig},
    target_chan::{TargetChannel, TargetState},
    vis::{render_loop, LogRenderer, SceneGraph, SharedScene},
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Interactive MeArm control")]
struct Opt {
    /// Log servo demands instead of driving the hardware, overriding servo_ctrl.toml
    #[structopt(long)]
    sim: bool,

    /// Run a render thread showing the arm
    #[structopt(long)]
    vis: bool,

    /// Period between rendered frames, in milliseconds
    #[structopt(long, default_value = "50")]
    frame_period_ms: u64,

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

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("MeArm Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- MODULE INITIALISATION ----

    let mut arm = ArmCtrl::new();
    arm.init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl initialised");

    let mut servo_config: ControllerConfig =
        util::params::load("servo_ctrl.toml").wrap_err("Could not load servo params")?;
    if opt.sim {
        servo_config.backend = Backend::Sim;
    }
    let servos =
        servo_ctrl::from_config(servo_config).wrap_err("Failed to initialise the servos")?;
    info!("Servos initialised");

    let scene = SharedScene::new(SceneGraph::from_chain(
        arm.chain().ok_or_else(|| eyre!("ArmCtrl has no chain after init"))?,
    ));
    let vis_sink: Box<dyn VisSink + Send> = match opt.vis {
        true => Box::new(scene.clone()),
        false => Box::new(()),
    };

    let archiver = Archiver::from_path(&session, "ctrl_loop.csv")
        .wrap_err("Failed to create the control loop archive")?;

    let chan = Arc::new(TargetChannel::new());
    let state = TargetState::new(arm.params().initial_target, chan.clone());

    let mut ctrl_loop = ControlLoop::new(arm, servos, vis_sink).with_archiver(archiver);

    // ---- START THREADS ----

    let ctrl_jh = {
        let chan = chan.clone();
        thread::Builder::new()
            .name("ctrl_loop".into())
            .spawn(move || ctrl_loop.run(&chan))
            .wrap_err("Failed to start the control loop thread")?
    };

    let render_run = Arc::new(AtomicBool::new(true));
    let render_jh = match opt.vis {
        true => {
            let scene = scene.clone();
            let run = render_run.clone();
            let period = Duration::from_millis(opt.frame_period_ms);

            Some(
                thread::Builder::new()
                    .name("render".into())
                    .spawn(move || {
                        render_loop(&scene, &mut LogRenderer::new(), period, &run, || ())
                    })
                    .wrap_err("Failed to start the render thread")?,
            )
        }
        false => None,
    };

    info!("Initialisation complete, moving to the initial target");

    // ---- INPUT ----

    state.republish();
    let input_result = input::terminal_loop(&state);

    // ---- SHUTDOWN ----

    chan.close();
    render_run.store(false, Ordering::Relaxed);

    let num_cycles = ctrl_jh
        .join()
        .map_err(|_| eyre!("The control loop thread panicked"))?;

    if let Some(jh) = render_jh {
        let num_frames = jh
            .join()
            .map_err(|_| eyre!("The render thread panicked"))?
            .wrap_err("The render loop failed")?;
        info!("{} frames rendered", num_frames);
    }

    input_result.wrap_err("Interactive input failed")?;

    info!("End of execution, {} control cycles run", num_cycles);

    Ok(())
}
