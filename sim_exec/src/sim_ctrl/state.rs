//! Implementations for the SimCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;

// Internal
use super::{Params, SimCtrlError};
use crate::{
    robot::{BranchPolicy, Kinematics, RobotConfig, RobotState},
    traj::{self, Trajectory},
};
use comms_if::{tc::Command, tm::Telemetry};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation control module state
#[derive(Debug, Default)]
pub struct SimCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// `None` until initialised
    pub(crate) robot: Option<RobotState>,

    pub(crate) mode: Mode,
}

/// Data required to initialise SimCtrl.
#[derive(Debug, Clone, Copy)]
pub struct InitData {
    pub robot: RobotConfig,
    pub branches: BranchPolicy,
    pub params: Params,
}

/// Input data to SimCtrl.
#[derive(Debug, Default)]
pub struct InputData {
    /// The command to start executing, or `None` if there is no new command
    /// on this cycle.
    pub cmd: Option<Command>,
}

/// Status report for SimCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// A trajectory is still being followed at the end of the cycle
    pub tracking: bool,

    /// A new command was turned into a trajectory on this cycle
    pub cmd_accepted: bool,

    /// A new command could not be planned and was dropped
    pub plan_failed: bool,

    /// This cycle's waypoint was outside the workspace or had no inverse
    /// solution, so the robot did not move
    pub waypoint_skipped: bool,

    /// The last waypoint of the trajectory was consumed on this cycle
    pub traj_complete: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the loop is currently doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Waiting for a command
    Idle,

    /// Following a trajectory, `index` is the next waypoint to move to
    Tracking { traj: Trajectory, index: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Mode {
    fn default() -> Self {
        Mode::Idle
    }
}

impl InitData {
    /// Init data for the given robot with the default branch policy and
    /// loop parameters.
    pub fn new(robot: RobotConfig) -> Self {
        Self {
            robot,
            branches: BranchPolicy::default(),
            params: Params::default(),
        }
    }
}

impl State for SimCtrl {
    type InitData = InitData;
    type InitError = SimCtrlError;

    type InputData = InputData;
    type OutputData = Telemetry;
    type StatusReport = StatusReport;
    type ProcError = SimCtrlError;

    /// Initialise the SimCtrl module.
    ///
    /// The robot is placed at the configured initial joint position.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data
            .robot
            .validate()
            .map_err(SimCtrlError::InvalidRobotConfig)?;
        init_data
            .params
            .validate()
            .map_err(SimCtrlError::InvalidParams)?;

        let kinematics = Kinematics::with_branches(init_data.robot, init_data.branches);

        self.robot =
            Some(RobotState::new(kinematics).map_err(SimCtrlError::InvalidInitialPosition)?);
        self.params = init_data.params;
        self.mode = Mode::Idle;
        self.report = StatusReport::default();

        Ok(())
    }

    /// Perform cyclic processing of SimCtrl.
    ///
    /// A new command may only be given while idle. It is planned from the
    /// current position and its first waypoint is executed on the same
    /// cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let robot = self.robot.as_mut().ok_or(SimCtrlError::NotInit)?;

        // ---- NEW COMMAND ----

        if let Some(cmd) = input_data.cmd {
            if let Mode::Tracking { .. } = self.mode {
                return Err(SimCtrlError::CommandWhileTracking(cmd));
            }

            debug!("New SimCtrl command: {:?}", cmd);

            match traj::plan(
                &robot.cartesian_position(),
                &cmd.target_m,
                self.params.max_velocity_ms,
                self.params.sampling_period_s,
                self.params.arrival_policy,
            ) {
                Ok(traj) => {
                    debug!("Planned trajectory of {} waypoints", traj.len());

                    robot.set_drawing(cmd.drawing);
                    self.mode = Mode::Tracking { traj, index: 0 };
                    self.report.cmd_accepted = true;
                }
                Err(e) => {
                    warn!("Could not plan a trajectory for {:?}: {}", cmd, e);
                    self.report.plan_failed = true;
                }
            }
        }

        // ---- TRACKING ----

        if let Mode::Tracking { traj, index } = &mut self.mode {
            if let Some(waypoint) = traj.get(*index) {
                let kin = robot.kinematics();

                if !kin.in_workspace(&waypoint) {
                    warn!(
                        "Waypoint {} ({:.6}, {:.6}) is outside the workspace, skipping",
                        index, waypoint.x, waypoint.y
                    );
                    self.report.waypoint_skipped = true;
                } else if let Err(e) = robot.set_cartesian_position(waypoint) {
                    warn!(
                        "Waypoint {} ({:.6}, {:.6}) has no inverse solution, skipping: {}",
                        index, waypoint.x, waypoint.y, e
                    );
                    self.report.waypoint_skipped = true;
                }
            }

            *index += 1;

            if *index >= traj.len() {
                debug!("Trajectory complete");
                self.mode = Mode::Idle;
                self.report.traj_complete = true;
            }
        }

        self.report.tracking = matches!(self.mode, Mode::Tracking { .. });

        Ok((robot.telemetry(), self.report))
    }
}

impl SimCtrl {
    pub fn is_tracking(&self) -> bool {
        matches!(self.mode, Mode::Tracking { .. })
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current state of the robot, or `None` if not initialised.
    pub fn robot(&self) -> Option<&RobotState> {
        self.robot.as_ref()
    }

    /// Snapshot of the robot state, or `None` if not initialised.
    pub fn telemetry(&self) -> Option<Telemetry> {
        self.robot.as_ref().map(RobotState::telemetry)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
