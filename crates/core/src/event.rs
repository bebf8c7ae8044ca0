/// Which holder a reset or export applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The daily counter store.
    Counters,
    /// Every axis of the series buffer.
    Series,
    /// One named axis of the series buffer.
    Axis(String),
    /// The pie totals.
    Pie,
    /// Everything, as one JSON document.
    Snapshot,
}

/// All messages that can flow through the dashboard event bus.
///
/// Sources:
/// - Producer connections / stdin → data and action variants
/// - Flush ticker                → `FlushTick`
/// - Rollover ticker             → `RolloverTick`
/// - Config watcher              → handled by the runtime directly
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ── Counters ──────────────────────────────────────────────────────────────
    /// Count `amount` events for `label` today and persist.
    Increment { label: String, amount: u64 },

    // ── Series ────────────────────────────────────────────────────────────────
    /// Replace one axis with a fresh batch of samples.
    SetAxis { axis: String, samples: Vec<f64> },
    /// Change the sample window of every axis.
    SetCapacity(usize),

    // ── Pie / gauges ──────────────────────────────────────────────────────────
    PieSet { label: String, value: f64 },
    PieIncrement { label: String, amount: f64 },
    Gauge { label: String, value: f64 },

    // ── User actions ──────────────────────────────────────────────────────────
    /// "Reset All Values" on a chart.
    Reset(Target),
    /// "Save as CSV" on a chart.
    Export(Target),

    // ── Internal ──────────────────────────────────────────────────────────────
    /// Periodic flush of today's counters.
    FlushTick,
    /// Periodic check for a new calendar day.
    RolloverTick,
    /// Graceful shutdown requested.
    Shutdown,
}
