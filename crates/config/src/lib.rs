pub mod schema;
pub mod watcher;

pub use schema::{
    CounterConfig, ExportConfig, GaugeConfig, IngestConfig, PieConfig, RuntimeConfig,
    SeriesConfig, TallyConfig,
};
pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};
use tally_core::{LabelSet, Result, TallyError};

/// Load configuration from a TOML file.  Returns `TallyConfig::default()` if
/// the file doesn't exist so the service always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<TallyConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(TallyConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| TallyError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<TallyConfig> {
    let config: TallyConfig =
        toml::from_str(raw).map_err(|e| TallyError::Config(format!("TOML parse error: {e}")))?;

    if config.series.capacity == 0 {
        return Err(TallyError::InvalidCapacity(0));
    }
    LabelSet::new(config.counters.labels.iter().cloned())?;
    LabelSet::new(config.pie.labels.iter().cloned())?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("tally").join("tally.toml")
}
