//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Real roots of `a x^2 + b x + c = 0`, largest first.
///
/// Returns `None` if `a` is zero or the roots are complex. The smaller
/// magnitude root is recovered from the product of the roots to avoid
/// cancellation.
pub fn quadratic_roots<T>(a: T, b: T, c: T) -> Option<(T, T)>
where
    T: Float,
{
    let two = T::one() + T::one();
    let four = two + two;

    if a == T::zero() {
        return None;
    }

    let disc = b * b - four * a * c;
    if disc < T::zero() {
        return None;
    }

    // q = -(b + sign(b) sqrt(disc)) / 2
    let q = -(b + b.signum() * disc.sqrt()) / two;

    let r0 = q / a;
    let r1 = if q == T::zero() { r0 } else { c / q };

    Some((r0.max(r1), r0.min(r1)))
}

/// Get the signed angular distance between two angles in the range of [0, 2pi].
///
/// This function will return the shortest signed distance between a and b accounting for wrapping
/// between 0 and 2pi.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap_or_else(T::nan);

    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    } else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist_2pi() {
        const TAU: f64 = std::f64::consts::TAU;

        assert_eq!(get_ang_dist_2pi(1f64, 2f64), 1f64);
        assert_eq!(get_ang_dist_2pi(2f64, 1f64), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU), 0f64);
        assert_eq!(get_ang_dist_2pi(TAU, 0f64), 0f64);
        assert_eq!(get_ang_dist_2pi(1f64, TAU), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU - 1f64), -1f64);
        assert_eq!(get_ang_dist_2pi(TAU - 1f64, 1f64), 2f64);
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0.0, 10.0), (0.0, 1.0), 5.0), 0.5);
        assert_eq!(lin_map((2.0, 4.0), (-1.0, 1.0), 2.0), -1.0);
    }

    #[test]
    fn test_quadratic_roots() {
        // (x - 2)(x + 3) = x^2 + x - 6
        let (r0, r1) = quadratic_roots(1.0f64, 1.0, -6.0).unwrap();
        assert!((r0 - 2.0).abs() < 1e-12);
        assert!((r1 + 3.0).abs() < 1e-12);

        assert!(quadratic_roots(1.0f64, 0.0, 1.0).is_none());
        assert!(quadratic_roots(0.0f64, 1.0, 1.0).is_none());
    }
}
