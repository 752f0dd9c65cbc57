//! Human-readable renderings of analysis metrics.

/// Placeholder for metrics that could not be computed.
pub const MISSING: &str = "--";

pub fn format_distance(meters: f64) -> String {
    format!("{:.2} km", meters / 1000.0)
}

/// `m:ss` below an hour, `h:mm:ss` from there on.
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds >= 0.0 { seconds } else { 0.0 };
    let total = seconds.round() as i64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn format_pace(minutes_per_km: f64) -> String {
    let total = (minutes_per_km * 60.0).round() as i64;
    format!("{}:{:02} /km", total / 60, total % 60)
}

pub fn format_elevation(meters: f64) -> String {
    format!("{meters:.0} m")
}

pub fn format_optional(value: Option<f64>, render: fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0.00 km");
        assert_eq!(format_distance(5_236.0), "5.24 km");
        assert_eq!(format_distance(999.4), "1.00 km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(59.6), "1:00");
        assert_eq!(format_duration(1862.0), "31:02");
        assert_eq!(format_duration(3723.0), "1:02:03");
        assert_eq!(format_duration(36_000.0), "10:00:00");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(10.0), "10:00 /km");
        assert_eq!(format_pace(5.5), "5:30 /km");
        // 5:59.8 rounds up into the next minute
        assert_eq!(format_pace(5.0 + 59.8 / 60.0), "6:00 /km");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(None, format_pace), MISSING);
        assert_eq!(format_optional(Some(90.0), format_duration), "1:30");
        assert_eq!(format_elevation(42.4), "42 m");
    }
}
