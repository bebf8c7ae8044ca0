use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tally_config::{GaugeConfig, TallyConfig};
use tally_core::{
    Clock, CounterSnapshot, CounterStore, GaugeLevel, GaugeReading, Message, PieSnapshot,
    PieTotals, Result, SeriesBuffer, SeriesSnapshot, TallyError, Target,
};
use tally_export::{csv, export_file_name, write_export, write_json};
use tracing::{debug, info, warn};

/// What the service loop should do after a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Continue,
    Exported(PathBuf),
    Stop,
}

/// All data holders of one dashboard, owned by the service loop.
#[derive(Debug)]
pub struct Dashboard {
    config:   TallyConfig,
    series:   SeriesBuffer,
    counters: CounterStore,
    pie:      PieTotals,
    gauges:   Vec<GaugeReading>,
    clock:    Arc<dyn Clock>,
}

impl Dashboard {
    /// Build every holder from `config` and load the counter history.
    pub fn from_config(config: TallyConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let series = SeriesBuffer::new(config.series.axes.iter().cloned(), config.series.capacity)?;
        let counters = open_counters(&config, clock.clone())?;
        let pie = PieTotals::new(config.pie.labels.iter().cloned(), clock.today())?;

        Ok(Self {
            gauges: build_gauges(&config.gauges),
            config,
            series,
            counters,
            pie,
            clock,
        })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    pub fn series(&self) -> &SeriesBuffer {
        &self.series
    }

    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    pub fn pie(&self) -> &PieTotals {
        &self.pie
    }

    pub fn gauges(&self) -> &[GaugeReading] {
        &self.gauges
    }

    /// Apply one bus message.
    pub fn handle(&mut self, message: Message) -> Result<Handled> {
        match message {
            Message::Increment { label, amount } => {
                self.counters.increment(&label, amount, true)?;
            }
            Message::SetAxis { axis, samples } => {
                let id = self
                    .series
                    .axis(&axis)
                    .ok_or_else(|| TallyError::UnknownAxis(axis.clone()))?;
                self.series.set_axis(id, Some(&samples));
            }
            Message::SetCapacity(capacity) => self.series.set_capacity(capacity)?,
            Message::PieSet { label, value } => self.pie.set_value(&label, value),
            Message::PieIncrement { label, amount } => self.pie.increment(&label, amount),
            Message::Gauge { label, value } => {
                match self.gauges.iter_mut().find(|g| g.label == label) {
                    Some(gauge) => gauge.set(value),
                    None => debug!("ignoring reading for unknown gauge '{label}'"),
                }
            }
            Message::Reset(target) => self.reset(&target)?,
            Message::Export(target) => {
                return self.export(&target, Local::now().naive_local()).map(Handled::Exported);
            }
            Message::FlushTick => self.counters.flush()?,
            Message::RolloverTick => self.roll_over()?,
            Message::Shutdown => {
                self.counters.flush()?;
                return Ok(Handled::Stop);
            }
        }
        Ok(Handled::Continue)
    }

    fn reset(&mut self, target: &Target) -> Result<()> {
        match target {
            Target::Counters => self.counters.reset_all(true)?,
            Target::Series | Target::Axis(_) => self.series.reset(),
            Target::Pie => self.pie.reset_all(),
            Target::Snapshot => warn!("nothing to reset for a snapshot"),
        }
        Ok(())
    }

    fn roll_over(&mut self) -> Result<()> {
        if self.config.pie.reset_daily && self.pie.roll_over(self.clock.today()) {
            info!("pie totals reset for a new day");
        }
        self.counters.roll_over()?;
        Ok(())
    }

    /// Write the export for `target` into the export directory.
    pub fn export(&self, target: &Target, at: NaiveDateTime) -> Result<PathBuf> {
        let export = &self.config.export;
        let dir = export.dir.as_path();

        match target {
            Target::Axis(name) => {
                let id = self
                    .series
                    .axis(name)
                    .ok_or_else(|| TallyError::UnknownAxis(name.clone()))?;
                let samples = self.series.samples(id);
                if samples.is_empty() {
                    return Err(TallyError::Export(format!("axis '{name}' has no data")));
                }
                let file = export_file_name(&format!("Align{name}"), at, "csv");
                write_export(dir, &file, |w| csv::write_series(w, samples, export.single_axis_decimals))
            }
            Target::Series => {
                let axes: Vec<(&str, &[f64])> = self
                    .series
                    .axis_ids()
                    .map(|id| (self.series.name(id).unwrap_or_default(), self.series.samples(id)))
                    .collect();
                let file = export_file_name("ChartData", at, "csv");
                write_export(dir, &file, |w| csv::write_axes(w, &axes, export.multi_axis_decimals))
            }
            Target::Counters => {
                let snapshot = self.counters.snapshot();
                let file = export_file_name("CartesianChart", at, "csv");
                write_export(dir, &file, |w| csv::write_counters(w, &snapshot))
            }
            Target::Pie => {
                let snapshot = self.pie.snapshot();
                let file = export_file_name("PieChart", at, "csv");
                write_export(dir, &file, |w| csv::write_pie(w, &snapshot))
            }
            Target::Snapshot => write_json(dir, "snapshot", at, &self.snapshot()),
        }
    }

    /// Detached copy of everything a renderer needs.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            series:   self.series.snapshot(self.config.export.multi_axis_decimals),
            counters: self.counters.snapshot(),
            today:    self.counters.snapshot_today(),
            pie:      self.pie.snapshot(),
            gauges: self
                .gauges
                .iter()
                .map(|g| GaugeView {
                    level:   g.level(),
                    reading: g.clone(),
                })
                .collect(),
        }
    }

    /// Switch to a reloaded configuration.
    ///
    /// Changing the counter labels or their storage reloads history from
    /// disk; changing the axis names starts empty axes. Timer intervals
    /// only take effect on restart. Replacements are built first, so a
    /// failed reload keeps the running state and configuration.
    pub fn apply_config(&mut self, config: TallyConfig) -> Result<()> {
        let old = &self.config;

        let series = if config.series.axes != old.series.axes {
            Some(SeriesBuffer::new(config.series.axes.iter().cloned(), config.series.capacity)?)
        } else if config.series.capacity != old.series.capacity {
            let mut series = self.series.clone();
            series.set_capacity(config.series.capacity)?;
            Some(series)
        } else {
            None
        };

        let counters_changed = config.counters.labels != old.counters.labels
            || config.counters.log_root != old.counters.log_root
            || config.counters.log_dir_name != old.counters.log_dir_name
            || config.counters.extension != old.counters.extension;
        let counters = if counters_changed {
            Some(open_counters(&config, self.clock.clone())?)
        } else {
            None
        };

        let pie = if config.pie.labels != old.pie.labels {
            let mut pie = self.pie.clone();
            pie.configure(config.pie.labels.iter().cloned())?;
            Some(pie)
        } else {
            None
        };

        if config.counters.flush_interval_secs != old.counters.flush_interval_secs
            || config.runtime != old.runtime
        {
            warn!("timer interval changes apply after a restart");
        }

        if let Some(series) = series {
            self.series = series;
        }
        if let Some(counters) = counters {
            self.counters = counters;
        }
        if let Some(pie) = pie {
            self.pie = pie;
        }
        if config.gauges != old.gauges {
            self.gauges = build_gauges(&config.gauges);
        }
        self.config = config;
        info!("configuration applied");
        Ok(())
    }
}

fn open_counters(config: &TallyConfig, clock: Arc<dyn Clock>) -> Result<CounterStore> {
    let counters = CounterStore::with_clock(config.counters.labels.iter().cloned(), clock)?
        .with_extension(config.counters.extension.clone());
    counters.init_log_dir(config.counters.log_root.as_deref(), &config.counters.log_dir_name)?;
    Ok(counters)
}

fn build_gauges(gauges: &[GaugeConfig]) -> Vec<GaugeReading> {
    gauges
        .iter()
        .map(|g| GaugeReading::new(g.label.clone(), g.from, g.to))
        .collect()
}

/// Everything the dashboard shows, as plain data.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub series:   SeriesSnapshot,
    pub counters: CounterSnapshot,
    pub today:    BTreeMap<String, u64>,
    pub pie:      PieSnapshot,
    pub gauges:   Vec<GaugeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeView {
    #[serde(flatten)]
    pub reading: GaugeReading,
    pub level:   GaugeLevel,
}
