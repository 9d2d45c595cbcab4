//! # Simulation
//!
//! Owns the control loop thread and the shared command queue and telemetry
//! mailbox. Producers submit commands and consumers read telemetry through
//! this handle from any thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    rate::{Clock, RateStats, SystemClock},
    robot::Kinematics,
    sim_ctrl::{ControlLoop, InitData, LoopStatus, SharedStatus, SimCtrl, SimCtrlError},
};
use comms_if::{
    sync::{CommandQueue, QueueError, TelemetryMailbox},
    tc::Command,
    tm::Telemetry,
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to a running simulation.
///
/// Dropping the handle stops the simulation.
pub struct Simulation {
    bg_jh: Option<JoinHandle<RateStats>>,
    bg_run: Arc<AtomicBool>,
    cmd_queue: Arc<CommandQueue>,
    tm_mailbox: Arc<TelemetryMailbox>,
    status: Arc<SharedStatus>,
    kinematics: Kinematics,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Could not initialise SimCtrl: {0}")]
    InitError(SimCtrlError),

    #[error("Could not create the command queue: {0}")]
    QueueError(QueueError),

    #[error("Could not start the control loop thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The simulation is not running")]
    NotRunning,

    #[error("The control loop thread panicked")]
    LoopPanicked,

    #[error("The simulation was still busy after {0:?}")]
    Timeout(Duration),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Simulation {
    /// Start a new simulation running in real time.
    pub fn start(init_data: InitData) -> Result<Self, SimulationError> {
        Self::start_with_clock(init_data, SystemClock::new())
    }

    /// Start a new simulation whose loop is timed by the given clock.
    pub fn start_with_clock<C: Clock>(
        init_data: InitData,
        clock: C,
    ) -> Result<Self, SimulationError> {
        let mut sim_ctrl = SimCtrl::default();
        sim_ctrl
            .init(init_data)
            .map_err(SimulationError::InitError)?;

        let kinematics = *sim_ctrl
            .robot()
            .ok_or(SimulationError::InitError(SimCtrlError::NotInit))?
            .kinematics();

        // Create the data shared objects
        let bg_run = Arc::new(AtomicBool::new(true));
        let cmd_queue = Arc::new(
            CommandQueue::new(init_data.params.command_queue_capacity)
                .map_err(SimulationError::QueueError)?,
        );
        let tm_mailbox = Arc::new(TelemetryMailbox::new());

        let ctrl_loop = ControlLoop::new(
            sim_ctrl,
            clock,
            cmd_queue.clone(),
            tm_mailbox.clone(),
            bg_run.clone(),
        );
        let status = ctrl_loop.status();

        // Start BG thread
        let bg_jh = thread::Builder::new()
            .name("sim_ctrl".into())
            .spawn(move || ctrl_loop.run())
            .map_err(SimulationError::SpawnError)?;

        info!("Simulation started");

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            cmd_queue,
            tm_mailbox,
            status,
            kinematics,
        })
    }

    /// Stop the loop and wait for its thread to exit.
    ///
    /// Returns the loop's rate statistics.
    pub fn stop(&mut self) -> Result<RateStats, SimulationError> {
        self.bg_run.store(false, Ordering::SeqCst);

        let jh = self.bg_jh.take().ok_or(SimulationError::NotRunning)?;
        let stats = jh.join().map_err(|_| SimulationError::LoopPanicked)?;

        info!("Simulation stopped");

        Ok(stats)
    }

    /// True until the loop has been stopped or has stopped itself.
    pub fn is_running(&self) -> bool {
        self.bg_jh.is_some() && self.bg_run.load(Ordering::SeqCst)
    }

    /// Submit a command to the loop.
    ///
    /// Returns `false` if the command queue is full or the simulation is not
    /// running, in which case the command is dropped.
    pub fn submit(&self, cmd: Command) -> bool {
        if !self.is_running() {
            debug!("Simulation not running, rejecting {:?}", cmd);
            return false;
        }

        self.cmd_queue.enqueue(cmd)
    }

    /// Latest telemetry published by the loop, or `None` if the loop hasn't
    /// run a cycle yet.
    pub fn read(&self) -> Option<Telemetry> {
        self.tm_mailbox.read()
    }

    /// Number of commands waiting for the loop.
    pub fn pending_commands(&self) -> usize {
        self.cmd_queue.len()
    }

    pub fn status(&self) -> LoopStatus {
        self.status.snapshot()
    }

    /// Kinematics of the simulated robot.
    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Block the caller until every submitted command has been executed.
    ///
    /// On success the final state of the last command has been published, so
    /// [`Simulation::read`] returns it. The queue and loop state are checked
    /// every `poll`. Fails if the loop stops or `timeout` elapses first.
    pub fn wait_until_idle(&self, poll: Duration, timeout: Duration) -> Result<(), SimulationError> {
        let start = Instant::now();

        loop {
            if !self.is_running() {
                return Err(SimulationError::NotRunning);
            }

            // The queue must be read before the loop status, the loop marks
            // itself busy before taking a command
            if self.cmd_queue.is_empty() && !self.status.snapshot().tracking {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(SimulationError::Timeout(timeout));
            }

            thread::sleep(poll);
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if self.bg_jh.is_some() {
            if let Err(e) = self.stop() {
                warn!("Error stopping the simulation: {}", e);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{rate::ManualClock, robot::RobotConfig};
    use comms_if::pos::CartesianPosition;

    const POLL: Duration = Duration::from_millis(1);
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn init_data() -> InitData {
        InitData::new(RobotConfig::new(0.08, 0.08, 0.12))
    }

    #[test]
    fn test_move_end_to_end() {
        let mut sim = Simulation::start_with_clock(init_data(), ManualClock::new()).unwrap();
        let target = CartesianPosition::new(0.0, 0.12);

        assert!(sim.is_running());
        assert!(sim.submit(Command::new(0.0, 0.12, false)));

        sim.wait_until_idle(POLL, TIMEOUT).unwrap();

        let tm = sim.read().unwrap();
        assert!((tm.cartesian_position_m - target).norm() < 1e-9);
        assert!(
            (sim.kinematics().forward(&tm.joint_position).unwrap() - target).norm() < 1e-9
        );
        assert!(!tm.drawing);

        let stats = sim.stop().unwrap();
        assert!(stats.num_ticks >= 731);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_commands_run_in_order() {
        let sim = Simulation::start_with_clock(init_data(), ManualClock::new()).unwrap();

        assert!(sim.submit(Command::new(0.02, 0.15, true)));
        assert!(sim.submit(Command::new(0.06, 0.14, false)));
        sim.wait_until_idle(POLL, TIMEOUT).unwrap();

        let tm = sim.read().unwrap();
        assert!((tm.cartesian_position_m - CartesianPosition::new(0.06, 0.14)).norm() < 1e-9);
        assert!(!tm.drawing);
        assert_eq!(sim.pending_commands(), 0);
    }

    #[test]
    fn test_stop() {
        let mut sim = Simulation::start(init_data()).unwrap();

        sim.stop().unwrap();

        assert!(!sim.is_running());
        assert!(!sim.submit(Command::new(0.0, 0.12, false)));
        assert!(matches!(sim.stop(), Err(SimulationError::NotRunning)));
        assert!(matches!(
            sim.wait_until_idle(POLL, TIMEOUT),
            Err(SimulationError::NotRunning)
        ));
    }

    #[test]
    fn test_wait_timeout() {
        // Real time, a 7 cm move takes the best part of a second
        let sim = Simulation::start(init_data()).unwrap();

        assert!(sim.submit(Command::new(0.0, 0.12, false)));
        assert!(matches!(
            sim.wait_until_idle(POLL, Duration::from_millis(20)),
            Err(SimulationError::Timeout(_))
        ));
        assert!(sim.status().tracking || sim.pending_commands() == 1);
    }

    #[test]
    fn test_queue_full() {
        let mut data = init_data();
        data.params.command_queue_capacity = 1;

        let sim = Simulation::start(data).unwrap();

        // The loop may take the first command at any time, but three in a
        // row can't all fit
        let accepted = (0..3)
            .filter(|_| sim.submit(Command::new(0.0, 0.12, false)))
            .count();
        assert!(accepted < 3);
    }

    #[test]
    fn test_invalid_config() {
        let mut data = init_data();
        data.robot.base_arm_length_m = 0.0;

        assert!(matches!(
            Simulation::start(data),
            Err(SimulationError::InitError(SimCtrlError::InvalidRobotConfig(_)))
        ));
    }
}
