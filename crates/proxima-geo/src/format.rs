//! Human-readable distances.

/// Format a distance in kilometres for display.
///
/// Sub-kilometre distances are shown in whole metres, distances below ten
/// kilometres with one decimal, anything further in whole kilometres.
#[must_use]
pub fn format_distance(km: f64) -> String {
    // Bands are chosen on the rounded value so 999.6 m reads "1.0 km".
    let meters = (km * 1000.0).round();
    if meters < 1000.0 {
        return format!("{} m", meters as i64);
    }

    let tenths = (km * 10.0).round() / 10.0;
    if tenths < 10.0 {
        format!("{tenths:.1} km")
    } else {
        format!("{} km", km.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(0.3504), "350 m");
        assert_eq!(format_distance(1.0), "1.0 km");
        assert_eq!(format_distance(2.44), "2.4 km");
        assert_eq!(format_distance(42.4), "42 km");
        assert_eq!(format_distance(877.6), "878 km");
    }

    #[test]
    fn test_format_distance_rounds_across_units() {
        assert_eq!(format_distance(0.9994), "999 m");
        assert_eq!(format_distance(0.9996), "1.0 km");
        assert_eq!(format_distance(9.94), "9.9 km");
        assert_eq!(format_distance(9.96), "10 km");
    }
}
