//! Constant velocity trajectory planner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{ArrivalPolicy, TrajError, Trajectory};
use comms_if::pos::CartesianPosition;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Plan a straight line trajectory from `start_m` to `end_m`.
///
/// The axis with the largest displacement moves at `max_velocity_ms`, the
/// other axis is scaled so both arrive together. One waypoint is produced
/// per `period_s`, the number of waypoints being the floor of the travel
/// time over the period. If the travel time is no longer than a single
/// period the trajectory is just the end point.
pub fn plan(
    start_m: &CartesianPosition,
    end_m: &CartesianPosition,
    max_velocity_ms: f64,
    period_s: f64,
    arrival: ArrivalPolicy,
) -> Result<Trajectory, TrajError> {
    if !(max_velocity_ms.is_finite() && max_velocity_ms > 0.0) {
        return Err(TrajError::InvalidVelocity(max_velocity_ms));
    }
    if !(period_s.is_finite() && period_s > 0.0) {
        return Err(TrajError::InvalidPeriod(period_s));
    }
    if !(start_m.iter().all(|v| v.is_finite()) && end_m.iter().all(|v| v.is_finite())) {
        return Err(TrajError::NonFiniteEndPoint(
            [start_m.x, start_m.y],
            [end_m.x, end_m.y],
        ));
    }

    let diff_m = end_m - start_m;
    let time_to_target_s = diff_m.amax() / max_velocity_ms;

    if time_to_target_s <= period_s {
        return Ok(Trajectory::single(*end_m));
    }

    let velocity_ms = diff_m / time_to_target_s;

    // At least one as the travel time is longer than one period
    let num_periods = (time_to_target_s / period_s).floor();
    if num_periods >= usize::MAX as f64 {
        return Err(TrajError::TooManyWaypoints(num_periods));
    }
    let len = num_periods as usize;

    let last_m = match arrival {
        ArrivalPolicy::ClampToTarget => *end_m,
        ArrivalPolicy::Unclamped => start_m + velocity_ms * (len as f64 * period_s),
    };

    Ok(Trajectory {
        start_m: *start_m,
        velocity_ms,
        period_s,
        len,
        last_m,
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_length_and_spacing() {
        let start = CartesianPosition::new(0.0, 0.0);
        let end = CartesianPosition::new(3.0, -1.5);

        // T = 1.5 s, 12 periods
        let traj = plan(&start, &end, 2.0, 0.125, ArrivalPolicy::Unclamped).unwrap();
        assert_eq!(traj.len(), 12);

        // Uniform steps of v dt along the segment
        let step = CartesianPosition::new(0.25, -0.125);
        let mut prev = start;
        for p in traj.iter() {
            assert!((p - prev - step).norm() < TOL);
            prev = p;
        }

        assert!((traj.end().unwrap() - end).norm() < TOL);
    }

    #[test]
    fn test_floor_of_periods() {
        let start = CartesianPosition::new(0.0, 0.0);
        let end = CartesianPosition::new(1.0, 0.0);

        // T / dt = 3.33..
        let unclamped = plan(&start, &end, 1.0, 0.3, ArrivalPolicy::Unclamped).unwrap();
        let clamped = plan(&start, &end, 1.0, 0.3, ArrivalPolicy::ClampToTarget).unwrap();

        assert_eq!(unclamped.len(), 3);
        assert_eq!(clamped.len(), 3);

        // Unclamped falls short by the fractional period
        assert!((unclamped.end().unwrap().x - 0.9).abs() < TOL);
        assert_eq!(clamped.end(), Some(end));

        // Only the last waypoint differs
        for i in 0..2 {
            assert_eq!(unclamped.get(i), clamped.get(i));
        }
        assert_eq!(clamped.get(3), None);
    }

    #[test]
    fn test_slowest_axis_scaled() {
        let start = CartesianPosition::new(1.0, 1.0);
        let end = CartesianPosition::new(0.0, 3.0);

        // y moves furthest so sets the time, T = 2 s
        let traj = plan(&start, &end, 1.0, 0.5, ArrivalPolicy::Unclamped).unwrap();

        assert_eq!(traj.len(), 4);
        assert!((traj.get(0).unwrap() - CartesianPosition::new(0.75, 1.5)).norm() < TOL);
    }

    #[test]
    fn test_degenerate() {
        let p = CartesianPosition::new(0.04, 0.12);

        let traj = plan(&p, &p, 0.1, 0.001, ArrivalPolicy::ClampToTarget).unwrap();
        assert_eq!(traj.iter().collect::<Vec<_>>(), vec![p]);

        // Reachable within one period
        let near = CartesianPosition::new(0.04, 0.12005);
        let traj = plan(&p, &near, 0.1, 0.001, ArrivalPolicy::Unclamped).unwrap();
        assert_eq!(traj.iter().collect::<Vec<_>>(), vec![near]);
    }

    #[test]
    fn test_invalid_inputs() {
        let a = CartesianPosition::new(0.0, 0.0);
        let b = CartesianPosition::new(1.0, 0.0);
        let policy = ArrivalPolicy::ClampToTarget;

        assert_eq!(
            plan(&a, &b, 0.0, 0.001, policy),
            Err(TrajError::InvalidVelocity(0.0))
        );
        assert_eq!(
            plan(&a, &b, 0.1, -1.0, policy),
            Err(TrajError::InvalidPeriod(-1.0))
        );
        assert!(matches!(
            plan(&a, &CartesianPosition::new(f64::NAN, 0.0), 0.1, 0.001, policy),
            Err(TrajError::NonFiniteEndPoint(..))
        ));
    }

    #[test]
    fn test_far_target() {
        let start = CartesianPosition::new(0.04, 0.19);

        // Around 10^10 waypoints, none of them stored
        let traj = plan(
            &start,
            &CartesianPosition::new(1e6, 0.19),
            0.1,
            0.001,
            ArrivalPolicy::ClampToTarget,
        )
        .unwrap();
        assert_eq!(traj.len(), 9_999_999_600);
        assert!((traj.get(0).unwrap() - start - CartesianPosition::new(1e-4, 0.0)).norm() < 1e-9);
        assert_eq!(traj.end(), Some(CartesianPosition::new(1e6, 0.19)));

        // Too many to count
        assert!(matches!(
            plan(
                &start,
                &CartesianPosition::new(1e300, 0.1),
                0.1,
                0.001,
                ArrivalPolicy::ClampToTarget
            ),
            Err(TrajError::TooManyWaypoints(_))
        ));
    }
}
