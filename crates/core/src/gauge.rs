use serde::Serialize;

/// Nominal link speed used to express network throughput as a percentage
/// (1 Mbit/s in bytes per second).
pub const NOMINAL_LINK_BPS: f64 = 125_000.0;

/// Colour band of a gauge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl GaugeLevel {
    pub fn classify(value: f64) -> Self {
        if value <= 31.0 {
            Self::Low
        } else if value <= 51.0 {
            Self::Moderate
        } else if value <= 71.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// Latest reading of one solid gauge (CPU, MEM, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeReading {
    pub label: String,
    pub from:  f64,
    pub to:    f64,
    pub value: f64,
}

impl GaugeReading {
    pub fn new(label: impl Into<String>, from: f64, to: f64) -> Self {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        Self {
            label: label.into(),
            from,
            to,
            value: from,
        }
    }

    /// Store `value`, clamped into `[from, to]`. NaN is ignored.
    pub fn set(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.value = value.clamp(self.from, self.to);
    }

    pub fn level(&self) -> GaugeLevel {
        GaugeLevel::classify(self.value)
    }
}

/// `value` as a percentage of `full_scale`, capped at 100.
pub fn percent_of(value: f64, full_scale: f64) -> f64 {
    if full_scale <= 0.0 {
        return 0.0;
    }
    (value / full_scale * 100.0).clamp(0.0, 100.0)
}
