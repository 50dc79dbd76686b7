/// Round to the nearest multiple of `granularity` (0.5 for review scores).
pub fn round_to_granularity(value: f64, granularity: f64) -> f64 {
    (value / granularity).round() * granularity
}

/// Round to two decimal places (chance percentages).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// True if `value` lies on the granularity grid (within float tolerance).
pub fn is_on_grid(value: f64, granularity: f64) -> bool {
    let steps = value / granularity;
    (steps - steps.round()).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_granularity() {
        assert_eq!(round_to_granularity(7.3, 0.5), 7.5);
        assert_eq!(round_to_granularity(7.24, 0.5), 7.0);
        assert_eq!(round_to_granularity(6.75, 0.5), 7.0);
        assert_eq!(round_to_granularity(0.0, 0.5), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_is_on_grid() {
        assert!(is_on_grid(7.5, 0.5));
        assert!(is_on_grid(0.0, 0.5));
        assert!(is_on_grid(10.0, 0.5));
        assert!(!is_on_grid(7.3, 0.5));
    }
}
