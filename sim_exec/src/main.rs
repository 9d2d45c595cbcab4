//! Simulation executable entry point.
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Creates the session and initialises logging
//!     - Loads the parameters and starts the simulation loop on its own thread
//!     - Produces commands for the loop, either:
//!         - From a drawing file given with `--drawing`, or
//!         - From an interactive prompt
//!     - Stops the loop on exit or on Ctrl-C

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod prompt;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use structopt::StructOpt;

// Internal
use comms_if::tc::Command;
use prompt::{PromptCmd, PromptError, PromptLine};
use sim_lib::{
    drawing::Drawing,
    params::SimExecParams,
    simulation::{Simulation, SimulationError},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Time to wait before resubmitting a command the queue rejected.
const SUBMIT_RETRY_PERIOD: Duration = Duration::from_millis(10);

/// Period at which the loop is checked while waiting for it to go idle.
const IDLE_POLL_PERIOD: Duration = Duration::from_millis(10);

/// Longest wait for idle between checks of the stop flag.
const IDLE_WAIT_SLICE: Duration = Duration::from_millis(500);

const PROMPT: &str = "fivebar $ ";

/// Prompt history file, relative to the software root.
const HISTORY_PATH: &str = "data/history.txt";

// ---------------------------------------------------------------------------
// STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec", about = "Five-bar parallel robot simulation")]
struct Args {
    /// Parameter file, relative to the params directory.
    #[structopt(long, default_value = "sim_exec.toml")]
    params: String,

    /// CSV drawing to execute. If not given an interactive prompt is started.
    #[structopt(long, parse(from_os_str))]
    drawing: Option<PathBuf>,

    /// Minimum level of messages to log, must be at least `info`.
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("sim_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(args.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Five-Bar Simulation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let params: SimExecParams =
        util::params::load(&args.params).wrap_err("Could not load sim_exec params")?;

    info!("Exec parameters loaded");
    debug!("{:#?}", params);

    // ---- SIGNAL HANDLING ----

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            stop.store(true, Ordering::SeqCst);
        })
        .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- START SIMULATION ----

    let mut sim =
        Simulation::start(params.init_data()).wrap_err("Failed to start the simulation")?;

    // ---- PRODUCE COMMANDS ----

    let result = match args.drawing {
        Some(ref path) => run_drawing(&sim, &params, path, &stop),
        None => run_prompt(&sim, &stop),
    };

    // ---- SHUTDOWN ----

    let stats = sim.stop().wrap_err("Failed to stop the simulation")?;

    info!(
        "Simulation ran {} cycles with {} overruns",
        stats.num_ticks, stats.num_overruns
    );
    info!("End of execution");

    result
}

/// Submit every point of a drawing and wait for the robot to finish it.
fn run_drawing(
    sim: &Simulation,
    params: &SimExecParams,
    path: &Path,
    stop: &AtomicBool,
) -> Result<(), Report> {
    info!("Loading drawing from {:?}", path);

    let cmds = Drawing::load(path)
        .and_then(|d| d.to_commands(&params.robot))
        .wrap_err("Failed to load the drawing")?;

    info!("Drawing contains {} points", cmds.len());

    for (i, cmd) in cmds.into_iter().enumerate() {
        // The queue may be smaller than the drawing, back off until there's
        // room
        while !sim.submit(cmd) {
            if !sim.is_running() {
                return Err(eyre!(
                    "The simulation stopped before point {} could be submitted",
                    i
                ));
            }
            if stop.load(Ordering::SeqCst) {
                info!("Drawing interrupted at point {}", i);
                return Ok(());
            }

            thread::sleep(SUBMIT_RETRY_PERIOD);
        }
    }

    info!("All points submitted, waiting for the drawing to complete");

    loop {
        match sim.wait_until_idle(IDLE_POLL_PERIOD, IDLE_WAIT_SLICE) {
            Ok(()) => break,
            Err(SimulationError::Timeout(_)) if !stop.load(Ordering::SeqCst) => continue,
            Err(SimulationError::Timeout(_)) => {
                info!(
                    "Drawing interrupted with {} points pending",
                    sim.pending_commands()
                );
                return Ok(());
            }
            Err(e) => return Err(e).wrap_err("Failed waiting for the drawing to complete"),
        }
    }

    info!("Drawing complete");

    Ok(())
}

/// Run the interactive prompt until `quit`, Ctrl-C or Ctrl-D.
fn run_prompt(sim: &Simulation, stop: &AtomicBool) -> Result<(), Report> {
    let mut rl = DefaultEditor::new().wrap_err("Failed to create the prompt")?;

    let history_path = host::get_sw_root()
        .map(|root| root.join(HISTORY_PATH))
        .wrap_err("Failed to find the software root")?;

    if rl.load_history(&history_path).is_err() {
        info!("No prompt history found");
    }

    println!("Enter `help` for the list of commands, `json <command>` to send a JSON command");

    while !stop.load(Ordering::SeqCst) && sim.is_running() {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Failed to read from the prompt"),
        };

        let _ = rl.add_history_entry(line.as_str());

        let cmd = match prompt::parse_line(&line) {
            Ok(PromptLine::Empty) => continue,
            Ok(PromptLine::Json(cmd)) => cmd,
            Ok(PromptLine::Cmd(PromptCmd::Move { x_m, y_m, draw })) => Command::new(x_m, y_m, draw),
            Ok(PromptLine::Cmd(PromptCmd::Tm)) => {
                match sim.read() {
                    Some(tm) => println!("{:#?}", tm),
                    None => println!("No telemetry yet"),
                }
                continue;
            }
            Ok(PromptLine::Cmd(PromptCmd::Pending)) => {
                println!("{} pending commands", sim.pending_commands());
                continue;
            }
            Ok(PromptLine::Cmd(PromptCmd::Status)) => {
                println!("{:#?}", sim.status());
                continue;
            }
            Ok(PromptLine::Cmd(PromptCmd::Quit)) => break,
            Err(PromptError::InvalidArgs(e)) => {
                // Includes the help message
                println!("{}", e.message);
                continue;
            }
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if !sim.kinematics().in_workspace(&cmd.target_m) {
            warn!(
                "Target ({:.4}, {:.4}) is outside the workspace, the robot will stop at its edge",
                cmd.target_m.x, cmd.target_m.y
            );
        }

        if sim.submit(cmd) {
            debug!("Submitted {:?}", cmd);
        } else {
            warn!("Command queue full, {:?} rejected", cmd);
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save the prompt history: {}", e);
    }

    Ok(())
}
