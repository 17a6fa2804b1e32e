//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, in which case `min` wins.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0.0, 180.0), (500.0, 2500.0), 90.0), 1500.0);
        assert_eq!(lin_map((0.0, 180.0), (500.0, 2500.0), 0.0), 500.0);
        assert_eq!(lin_map((0.0, 1.0), (1.0, 0.0), 0.25), 0.75);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&270.0, &0.0, &180.0), 180.0);
        assert_eq!(clamp(&-3.0, &0.0, &180.0), 0.0);
        assert_eq!(clamp(&42.0, &0.0, &180.0), 42.0);

        // Inverted limits resolve to the minimum
        assert_eq!(clamp(&5.0, &10.0, &0.0), 10.0);
    }
}
