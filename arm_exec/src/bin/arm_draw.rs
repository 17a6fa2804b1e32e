//! # Arm Drawing Executable
//!
//! Replays a vector path with the arm. The path is flattened into lines and each point is
//! published as a target, paced so the control loop and servos can keep up.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::info;
use std::{sync::Arc, thread};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::ArmCtrl,
    ctrl_loop::ControlLoop,
    draw::{flatten_path, parse_svg_path, ArmDrawer, DrawParams},
    servo_ctrl::{self, Backend, ControllerConfig},
    target_chan::{TargetChannel, TargetState},
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
#[structopt(name = "arm_draw", about = "Draw a vector path with the MeArm")]
struct Opt {
    /// Log servo demands instead of driving the hardware, overriding servo_ctrl.toml
    #[structopt(long)]
    sim: bool,

    /// SVG path data to draw instead of the path in draw.toml
    #[structopt(long)]
    path: Option<String>,

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

    let session = Session::new("arm_draw", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("MeArm Drawing Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut draw_params: DrawParams =
        util::params::load("draw.toml").wrap_err("Could not load draw params")?;
    if let Some(p) = opt.path {
        draw_params.path = p;
    }

    let path = parse_svg_path(&draw_params.path).wrap_err("Invalid path to draw")?;
    info!("Path with {} elements loaded", path.elements().len());

    // ---- MODULE INITIALISATION ----

    let mut arm = ArmCtrl::new();
    arm.init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;

    let mut servo_config: ControllerConfig =
        util::params::load("servo_ctrl.toml").wrap_err("Could not load servo params")?;
    if opt.sim {
        servo_config.backend = Backend::Sim;
    }
    let servos =
        servo_ctrl::from_config(servo_config).wrap_err("Failed to initialise the servos")?;

    let archiver = Archiver::from_path(&session, "ctrl_loop.csv")
        .wrap_err("Failed to create the control loop archive")?;

    let chan = Arc::new(TargetChannel::new());
    let state = Arc::new(TargetState::new(arm.params().initial_target, chan.clone()));

    let mut ctrl_loop = ControlLoop::new(arm, servos, ()).with_archiver(archiver);

    let ctrl_jh = {
        let chan = chan.clone();
        thread::Builder::new()
            .name("ctrl_loop".into())
            .spawn(move || ctrl_loop.run(&chan))
            .wrap_err("Failed to start the control loop thread")?
    };

    // ---- DRAW ----

    info!("Initialisation complete, drawing");

    let tolerance = draw_params.tolerance;
    let mut drawer = ArmDrawer::new(state, draw_params);
    let draw_result = flatten_path(&path, tolerance, &mut drawer);

    // ---- SHUTDOWN ----

    chan.close();

    let num_cycles = ctrl_jh
        .join()
        .map_err(|_| eyre!("The control loop thread panicked"))?;

    draw_result.wrap_err("Failed to draw the path")?;

    info!(
        "End of execution, {} points drawn in {} control cycles",
        drawer.num_points(),
        num_cycles
    );

    Ok(())
}
