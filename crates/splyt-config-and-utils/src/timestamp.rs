//! Wall-clock timestamps in the collector's format.

use chrono::Utc;

/// Current Unix time in seconds with microsecond precision.
pub fn micro_timestamp() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_close_to_system_time() {
        let system = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let ts = micro_timestamp();
        assert!((ts - system).abs() < 5.0);
    }

    #[test]
    fn timestamp_carries_fractional_seconds() {
        let samples: Vec<f64> = (0..5).map(|_| micro_timestamp()).collect();
        assert!(samples.iter().any(|ts| ts.fract() != 0.0));
        assert!(samples.windows(2).all(|w| w[1] >= w[0]));
    }
}
