//! # Control loop
//!
//! Runs [`SimCtrl`] at the sampling period. Each cycle:
//!
//! 1. Publish the current robot state to the telemetry mailbox.
//! 2. If idle, take at most one command from the command queue.
//! 3. Process SimCtrl, which plans any new command and steps the trajectory.
//! 4. Sleep for the rest of the period.
//!
//! The loop runs until its run flag is cleared. A SimCtrl error or a panic
//! inside a cycle, sleep included, is logged, clears the run flag and ends
//! the loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use log::{error, info, trace};

use super::{InputData, SimCtrl, SimCtrlError, StatusReport};
use crate::rate::{Clock, RateController, RateStats};
use comms_if::sync::{CommandQueue, TelemetryMailbox};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A SimCtrl instance driven at a fixed rate against the shared queue and
/// mailbox.
pub struct ControlLoop<C: Clock> {
    sim_ctrl: SimCtrl,
    rate: RateController<C>,
    cmd_queue: Arc<CommandQueue>,
    tm_mailbox: Arc<TelemetryMailbox>,
    run: Arc<AtomicBool>,
    status: Arc<SharedStatus>,
}

/// Loop status shared with other threads.
#[derive(Debug, Default)]
pub struct SharedStatus {
    num_ticks: AtomicU64,

    /// Set before a command is taken from the queue, cleared once the loop
    /// is idle and the final state of the last command has been published
    busy: AtomicBool,
}

/// Snapshot of the loop's status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStatus {
    /// Number of cycles completed
    pub num_ticks: u64,

    /// The loop is executing a command, or has yet to publish where the last
    /// one left the robot
    pub tracking: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SharedStatus {
    pub fn snapshot(&self) -> LoopStatus {
        LoopStatus {
            num_ticks: self.num_ticks.load(Ordering::SeqCst),
            tracking: self.busy.load(Ordering::SeqCst),
        }
    }
}

impl<C: Clock> ControlLoop<C> {
    /// Create a new loop around an initialised SimCtrl.
    ///
    /// The rate controller's period is taken from the SimCtrl parameters.
    pub fn new(
        sim_ctrl: SimCtrl,
        clock: C,
        cmd_queue: Arc<CommandQueue>,
        tm_mailbox: Arc<TelemetryMailbox>,
        run: Arc<AtomicBool>,
    ) -> Self {
        let rate = RateController::new(clock, sim_ctrl.params().sampling_period());

        Self {
            sim_ctrl,
            rate,
            cmd_queue,
            tm_mailbox,
            run,
            status: Arc::new(SharedStatus::default()),
        }
    }

    /// Handle to the loop's status, readable from other threads.
    pub fn status(&self) -> Arc<SharedStatus> {
        self.status.clone()
    }

    pub fn sim_ctrl(&self) -> &SimCtrl {
        &self.sim_ctrl
    }

    /// Execute one cycle without sleeping.
    pub fn tick(&mut self) -> Result<StatusReport, SimCtrlError> {
        let tm = self.sim_ctrl.telemetry().ok_or(SimCtrlError::NotInit)?;
        self.tm_mailbox.publish(tm);

        let mut input = InputData::default();
        if !self.sim_ctrl.is_tracking() {
            // Mark busy before taking the command so that an empty queue and
            // an idle flag are never seen together while a command is in
            // flight. The state published above is final, so the flag drops
            // if there's nothing more to do.
            self.status.busy.store(true, Ordering::SeqCst);
            input.cmd = self.cmd_queue.dequeue();
            if input.cmd.is_none() {
                self.status.busy.store(false, Ordering::SeqCst);
            }
        }

        let (_, report) = self.sim_ctrl.proc(&input)?;

        if report != StatusReport::default() {
            trace!("SimCtrl status: {:?}", report);
        }

        self.status.num_ticks.fetch_add(1, Ordering::SeqCst);

        Ok(report)
    }

    /// Run until the run flag is cleared or a cycle fails.
    ///
    /// On exit the run flag is always cleared. Returns the rate statistics.
    pub fn run(mut self) -> RateStats {
        info!(
            "Control loop started, period {:.06} s",
            self.rate.period().as_secs_f64()
        );

        while self.run.load(Ordering::SeqCst) {
            let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                let report = self.tick()?;
                self.rate.wait_for_next_tick();
                Ok::<_, SimCtrlError>(report)
            }));

            match cycle {
                Ok(Ok(_)) => (),
                Ok(Err(e)) => {
                    error!("Control loop error, stopping: {}", e);
                    break;
                }
                Err(payload) => {
                    error!(
                        "Control loop panicked, stopping: {}",
                        panic_message(payload.as_ref())
                    );
                    break;
                }
            }
        }

        self.run.store(false, Ordering::SeqCst);
        self.status.busy.store(false, Ordering::SeqCst);

        let stats = *self.rate.stats();
        info!(
            "Control loop stopped after {} cycles in {:.03} s, {} overruns (max {:.06} s)",
            stats.num_ticks,
            self.rate.elapsed().as_secs_f64(),
            stats.num_overruns,
            stats.max_overrun.as_secs_f64()
        );

        stats
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        rate::ManualClock,
        robot::{Kinematics, RobotConfig},
        sim_ctrl::InitData,
    };
    use comms_if::tc::Command;
    use std::{thread, time::Duration};

    /// Manual clock which panics on one chosen call to `now`.
    #[derive(Clone)]
    struct FaultyClock {
        inner: ManualClock,
        calls: Arc<AtomicU64>,
        fault_at: u64,
    }

    impl Clock for FaultyClock {
        fn now(&self) -> Duration {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fault_at {
                panic!("clock fault");
            }
            self.inner.now()
        }

        fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration)
        }
    }

    fn config() -> RobotConfig {
        RobotConfig::new(0.08, 0.08, 0.12)
    }

    struct Fixture {
        ctrl_loop: ControlLoop<ManualClock>,
        clock: ManualClock,
        cmd_queue: Arc<CommandQueue>,
        tm_mailbox: Arc<TelemetryMailbox>,
        run: Arc<AtomicBool>,
    }

    fn fixture() -> Fixture {
        let mut sim_ctrl = SimCtrl::default();
        sim_ctrl
            .init(InitData::new(config()))
            .unwrap();

        let clock = ManualClock::new();
        let cmd_queue = Arc::new(CommandQueue::new(2).unwrap());
        let tm_mailbox = Arc::new(TelemetryMailbox::new());
        let run = Arc::new(AtomicBool::new(true));

        Fixture {
            ctrl_loop: ControlLoop::new(
                sim_ctrl,
                clock.clone(),
                cmd_queue.clone(),
                tm_mailbox.clone(),
                run.clone(),
            ),
            clock,
            cmd_queue,
            tm_mailbox,
            run,
        }
    }

    #[test]
    fn test_tick_publishes_before_step() {
        let mut f = fixture();
        let initial = f.ctrl_loop.sim_ctrl().telemetry().unwrap();

        assert!(f.tm_mailbox.read().is_none());
        assert!(f.cmd_queue.enqueue(Command::new(0.0, 0.12, false)));

        let report = f.ctrl_loop.tick().unwrap();
        assert!(report.cmd_accepted);
        assert!(f.cmd_queue.is_empty());

        // The mailbox holds the state from the start of the cycle
        assert_eq!(f.tm_mailbox.read(), Some(initial));
        assert!(f.ctrl_loop.status().snapshot().tracking);
        assert_eq!(f.ctrl_loop.status().snapshot().num_ticks, 1);
    }

    #[test]
    fn test_one_command_per_idle_cycle() {
        let mut f = fixture();
        let here = f.ctrl_loop.sim_ctrl().telemetry().unwrap().cartesian_position_m;

        // Two commands that complete in a single cycle each
        let cmd = Command {
            target_m: here,
            drawing: true,
        };
        assert!(f.cmd_queue.enqueue(cmd));
        assert!(f.cmd_queue.enqueue(cmd));

        f.ctrl_loop.tick().unwrap();
        assert_eq!(f.cmd_queue.len(), 1);
        f.ctrl_loop.tick().unwrap();
        assert!(f.cmd_queue.is_empty());

        // Busy until the end point has been published
        assert!(f.ctrl_loop.status().snapshot().tracking);
        f.ctrl_loop.tick().unwrap();
        assert!(!f.ctrl_loop.status().snapshot().tracking);
        assert_eq!(f.tm_mailbox.read().map(|tm| tm.drawing), Some(true));
    }

    #[test]
    fn test_queue_not_drained_while_tracking() {
        let mut f = fixture();

        assert!(f.cmd_queue.enqueue(Command::new(0.0, 0.12, false)));
        assert!(f.cmd_queue.enqueue(Command::new(0.04, 0.15, false)));

        for _ in 0..10 {
            f.ctrl_loop.tick().unwrap();
        }

        assert_eq!(f.cmd_queue.len(), 1);
    }

    #[test]
    fn test_run_until_stopped() {
        let f = fixture();
        let run = f.run.clone();
        let clock = f.clock.clone();

        assert!(f.cmd_queue.enqueue(Command::new(0.0, 0.12, true)));

        let jh = thread::spawn(move || f.ctrl_loop.run());

        // Wait for the clamped end point to be published
        let mut tm = None;
        for _ in 0..10_000 {
            tm = f.tm_mailbox.read();
            if matches!(tm, Some(t) if t.cartesian_position_m.x == 0.0) {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }

        run.store(false, Ordering::SeqCst);
        let stats = jh.join().unwrap();

        let tm = tm.unwrap();
        assert!(tm.drawing);
        assert!((tm.cartesian_position_m.y - 0.12).abs() < 1e-12);

        // Every cycle slept a full period on the manual clock
        assert_eq!(stats.num_overruns, 0);
        assert_eq!(clock.now(), Duration::from_millis(stats.num_ticks));
    }

    #[test]
    fn test_unplannable_target_keeps_running() {
        let f = fixture();
        let run = f.run.clone();

        // Finite but too far away to count the waypoints
        assert!(f.cmd_queue.enqueue(Command::new(1e300, 0.1, false)));
        assert!(f.cmd_queue.enqueue(Command::new(0.0, 0.12, false)));

        let jh = thread::spawn(move || f.ctrl_loop.run());

        let mut reached = false;
        for _ in 0..10_000 {
            if matches!(f.tm_mailbox.read(), Some(t) if t.cartesian_position_m.x == 0.0) {
                reached = true;
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }

        assert!(run.load(Ordering::SeqCst));
        run.store(false, Ordering::SeqCst);
        jh.join().unwrap();

        assert!(reached);
    }

    #[test]
    fn test_panic_stops_loop() {
        let mut sim_ctrl = SimCtrl::default();
        sim_ctrl.init(InitData::new(config())).unwrap();

        let cmd_queue = Arc::new(CommandQueue::new(1).unwrap());
        let tm_mailbox = Arc::new(TelemetryMailbox::new());
        let run = Arc::new(AtomicBool::new(true));

        // Call 0 is made on creation, call n by the sleep of cycle n
        let clock = FaultyClock {
            inner: ManualClock::new(),
            calls: Arc::new(AtomicU64::new(0)),
            fault_at: 50,
        };

        let ctrl_loop = ControlLoop::new(
            sim_ctrl,
            clock,
            cmd_queue.clone(),
            tm_mailbox.clone(),
            run.clone(),
        );
        let status = ctrl_loop.status();
        let initial = ctrl_loop.sim_ctrl().telemetry().unwrap();

        assert!(cmd_queue.enqueue(Command::new(0.0, 0.12, true)));

        let stats = thread::spawn(move || ctrl_loop.run()).join().unwrap();

        assert!(!run.load(Ordering::SeqCst));
        assert_eq!(stats.num_ticks, 49);
        assert_eq!(
            status.snapshot(),
            LoopStatus {
                num_ticks: 50,
                tracking: false
            }
        );

        // Published at the start of the failed cycle, mid trajectory
        let tm = tm_mailbox.read().unwrap();
        assert!(tm.drawing);
        assert_ne!(tm.cartesian_position_m, initial.cartesian_position_m);

        let kin = Kinematics::new(config());
        assert!(
            (kin.forward(&tm.joint_position).unwrap() - tm.cartesian_position_m).norm() < 1e-9
        );
    }

    #[test]
    fn test_error_stops_loop() {
        let cmd_queue = Arc::new(CommandQueue::new(1).unwrap());
        let run = Arc::new(AtomicBool::new(true));

        // Never initialised
        let ctrl_loop = ControlLoop::new(
            SimCtrl::default(),
            ManualClock::new(),
            cmd_queue,
            Arc::new(TelemetryMailbox::new()),
            run.clone(),
        );

        let stats = ctrl_loop.run();

        assert!(!run.load(Ordering::SeqCst));
        assert_eq!(stats.num_ticks, 0);
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("cycle fault")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "cycle fault");

        let payload = panic::catch_unwind(|| panic!("fault {}", 2)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "fault 2");
    }
}
