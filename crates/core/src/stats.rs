use serde::Serialize;

/// Decimal places used by the live axis charts and the multi-axis export.
pub const DEFAULT_DECIMALS: u32 = 2;

/// Decimal places used by the single-axis export.
pub const EXPORT_DECIMALS: u32 = 4;

/// Summary statistics over the non-zero samples of a sequence.
///
/// A sample of exactly `0.0` means "slot not filled yet" and never
/// contributes to any field. With no non-zero samples every field is `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub avg:   f64,
    pub max:   f64,
    pub min:   f64,
    pub stdev: f64,
}

impl SummaryStats {
    /// Summarize `samples`, rounding every field to `decimals` places.
    ///
    /// `stdev` is the sample standard deviation (divisor `n - 1`) and stays
    /// `0.0` until at least two non-zero samples are present.
    #[must_use]
    pub fn compute(samples: &[f64], decimals: u32) -> Self {
        let measured: Vec<f64> = samples.iter().copied().filter(|v| *v != 0.0).collect();
        if measured.is_empty() {
            return Self::default();
        }

        let count = measured.len() as f64;
        let mean = measured.iter().sum::<f64>() / count;
        let max = measured.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = measured.iter().copied().fold(f64::INFINITY, f64::min);

        let stdev = if measured.len() < 2 {
            0.0
        } else {
            let squares = measured.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (squares / (count - 1.0)).sqrt()
        };

        Self {
            avg:   round_to(mean, decimals),
            max:   round_to(max, decimals),
            min:   round_to(min, decimals),
            stdev: round_to(stdev, decimals),
        }
    }
}

/// Round to `decimals` places, ties to even (`0.125` becomes `0.12`).
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round_ties_even() / scale;
    // Avoid printing "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
