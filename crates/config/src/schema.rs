use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tally_core::counter::{DEFAULT_EXTENSION, DEFAULT_LOG_DIR_NAME};
use tally_core::series::DEFAULT_CAPACITY;
use tally_core::stats::{DEFAULT_DECIMALS, EXPORT_DECIMALS};

/// Root configuration structure parsed from `tally.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Live alignment traces.
    pub series: SeriesConfig,
    /// Daily OK/NG style counters.
    pub counters: CounterConfig,
    /// Pie totals.
    pub pie: PieConfig,
    /// Solid gauges fed by an external producer.
    pub gauges: Vec<GaugeConfig>,
    /// CSV / JSON export.
    pub export: ExportConfig,
    /// Producer input channels.
    pub ingest: IngestConfig,
    /// Service timers.
    pub runtime: RuntimeConfig,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            series:   SeriesConfig::default(),
            counters: CounterConfig::default(),
            pie:      PieConfig::default(),
            gauges:   GaugeConfig::defaults(),
            export:   ExportConfig::default(),
            ingest:   IngestConfig::default(),
            runtime:  RuntimeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Axis names in display order.
    pub axes: Vec<String>,
    /// Samples kept per axis.
    pub capacity: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            axes:     vec!["X".into(), "Y".into(), "T".into()],
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub labels: Vec<String>,
    /// Parent of the log directory. `None` = the desktop directory.
    pub log_root: Option<PathBuf>,
    /// Directory (under `log_root`) holding one file per day.
    pub log_dir_name: String,
    /// Extension of per-day files, without the dot.
    pub extension: String,
    /// Seconds between periodic flushes of today's counters.
    pub flush_interval_secs: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            labels:              vec!["OK".into(), "NG".into()],
            log_root:            None,
            log_dir_name:        DEFAULT_LOG_DIR_NAME.to_string(),
            extension:           DEFAULT_EXTENSION.to_string(),
            flush_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieConfig {
    pub labels: Vec<String>,
    /// Zero every slice when the calendar day changes.
    pub reset_daily: bool,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            labels:      vec!["OK".into(), "NG".into()],
            reset_daily: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeConfig {
    pub label: String,
    #[serde(default)]
    pub from: f64,
    #[serde(default = "default_gauge_to")]
    pub to: f64,
}

fn default_gauge_to() -> f64 {
    100.0
}

impl GaugeConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            from:  0.0,
            to:    default_gauge_to(),
        }
    }

    /// The gauges shown when the config names none.
    pub fn defaults() -> Vec<Self> {
        ["CPU", "MEM", "DIS", "NET"].into_iter().map(Self::new).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to.
    pub dir: PathBuf,
    /// Rounding of the single-axis CSV summary.
    pub single_axis_decimals: u32,
    /// Rounding of the multi-axis CSV summary.
    pub multi_axis_decimals: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir:                  PathBuf::from("."),
            single_axis_decimals: EXPORT_DECIMALS,
            multi_axis_decimals:  DEFAULT_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Unix socket producers connect to. `None` disables the socket.
    pub socket: Option<PathBuf>,
    /// Also read producer commands from standard input.
    pub stdin: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            socket: None,
            stdin:  true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seconds between checks for a new calendar day.
    pub rollover_check_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rollover_check_secs: 60,
        }
    }
}
