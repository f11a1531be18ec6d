//! PM2.5 Breakpoint Table and Interpolation

/// One segment of the piecewise-linear AQI mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Lowest concentration of the segment (μg/m³)
    pub c_low: f64,
    /// Highest concentration of the segment (μg/m³)
    pub c_high: f64,
    /// AQI at `c_low`
    pub i_low: u32,
    /// AQI at `c_high`
    pub i_high: u32,
}

impl Breakpoint {
    const fn new(c_low: f64, c_high: f64, i_low: u32, i_high: u32) -> Self {
        Self {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }

    fn contains(&self, concentration: f64) -> bool {
        concentration >= self.c_low && concentration <= self.c_high
    }

    fn interpolate(&self, concentration: f64) -> f64 {
        let slope = f64::from(self.i_high - self.i_low) / (self.c_high - self.c_low);
        slope * (concentration - self.c_low) + f64::from(self.i_low)
    }
}

/// US EPA 24-hour PM2.5 breakpoints
pub const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint::new(0.0, 12.0, 0, 50),
    Breakpoint::new(12.1, 35.4, 51, 100),
    Breakpoint::new(35.5, 55.4, 101, 150),
    Breakpoint::new(55.5, 150.4, 151, 200),
    Breakpoint::new(150.5, 250.4, 201, 300),
    Breakpoint::new(250.5, 500.4, 301, 500),
];

/// Upper end of the table; anything above reports the maximum index
const MAX_CONCENTRATION: f64 = 500.4;
const MAX_AQI: u32 = 500;

/// Calculate AQI from a PM2.5 concentration (μg/m³)
///
/// The concentration is truncated to 0.1 μg/m³ before lookup, so values
/// falling between two segments (e.g. 12.05) land in the lower one.
/// Negative and NaN inputs yield 0, anything above 500.4 yields 500.
pub fn calculate_aqi(pm25: f64) -> u32 {
    if pm25.is_nan() || pm25 < 0.0 {
        return 0;
    }
    if pm25 > MAX_CONCENTRATION {
        return MAX_AQI;
    }

    let concentration = truncate_tenth(pm25);

    PM25_BREAKPOINTS
        .iter()
        .find(|bp| bp.contains(concentration))
        .map(|bp| bp.interpolate(concentration).round() as u32)
        .unwrap_or(0)
}

/// Truncate to one decimal place; the epsilon absorbs representation error
/// so that 12.1 stays 12.1 instead of becoming 12.0.
fn truncate_tenth(value: f64) -> f64 {
    (value * 10.0 + 1e-9).floor() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_points() {
        assert_eq!(calculate_aqi(0.0), 0);
        assert_eq!(calculate_aqi(12.0), 50);
        assert_eq!(calculate_aqi(12.1), 51);
        assert_eq!(calculate_aqi(35.4), 100);
        assert_eq!(calculate_aqi(35.5), 101);
        assert_eq!(calculate_aqi(55.4), 150);
        assert_eq!(calculate_aqi(150.4), 200);
        assert_eq!(calculate_aqi(250.4), 300);
        assert_eq!(calculate_aqi(500.4), 500);
    }

    #[test]
    fn test_clamp_above_table() {
        assert_eq!(calculate_aqi(500.5), 500);
        assert_eq!(calculate_aqi(1200.0), 500);
        assert_eq!(calculate_aqi(f64::INFINITY), 500);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(calculate_aqi(-1.0), 0);
        assert_eq!(calculate_aqi(f64::NAN), 0);
    }

    #[test]
    fn test_midpoint_interpolation() {
        // 50/12 * 6 = 25
        assert_eq!(calculate_aqi(6.0), 25);
        // (100-51)/(35.4-12.1) * (32.0-12.1) + 51 = 92.85
        assert_eq!(calculate_aqi(32.0), 93);
    }

    #[test]
    fn test_gap_between_segments_truncates_down() {
        assert_eq!(calculate_aqi(12.05), 50);
        assert_eq!(calculate_aqi(35.45), 100);
        assert_eq!(calculate_aqi(500.44), 500);
    }

    proptest! {
        #[test]
        fn prop_aqi_bounded(pm25 in 0.0f64..2000.0) {
            let aqi = calculate_aqi(pm25);
            prop_assert!(aqi <= 500);
        }

        #[test]
        fn prop_aqi_monotonic(a in 0.0f64..600.0, b in 0.0f64..600.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(calculate_aqi(lo) <= calculate_aqi(hi));
        }
    }
}
