use crate::error::{Result, TallyError};
use crate::stats::SummaryStats;
use serde::Serialize;
use std::collections::HashSet;

/// Number of samples kept per axis when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 20;

/// Stable index of an axis inside a [`SeriesBuffer`].
///
/// Resolved once from the axis name via [`SeriesBuffer::axis`]; the name is
/// only needed again for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisId(usize);

impl AxisId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// X-axis extent and tick labels shared by every axis chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisBounds {
    /// First visible sample position (1-based).
    pub min: usize,
    /// Last visible sample position.
    pub max: usize,
    /// Tick labels `"0"..="capacity"`.
    pub ticks: Vec<String>,
}

impl AxisBounds {
    fn for_capacity(capacity: usize) -> Self {
        Self {
            min:   1,
            max:   capacity,
            ticks: (0..=capacity).map(|i| i.to_string()).collect(),
        }
    }
}

/// Capacity-bounded sample window for a fixed set of named axes.
///
/// Producers hand over complete batches; each batch replaces the axis's
/// stored sequence and the oldest entries beyond `capacity` are dropped.
///
/// The buffer is not internally synchronized. Callers sharing one buffer
/// between several producers must wrap it in their own lock.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    names:    Vec<String>,
    axes:     Vec<Vec<f64>>,
    capacity: usize,
    bounds:   AxisBounds,
}

impl SeriesBuffer {
    pub fn new<I, S>(names: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if capacity == 0 {
            return Err(TallyError::InvalidCapacity(capacity));
        }

        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(TallyError::EmptyLabels);
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(TallyError::DuplicateLabel(name.clone()));
            }
        }

        Ok(Self {
            axes: vec![Vec::new(); names.len()],
            names,
            capacity,
            bounds: AxisBounds::for_capacity(capacity),
        })
    }

    /// Resolve an axis name to its id.
    pub fn axis(&self, name: &str) -> Option<AxisId> {
        self.names.iter().position(|n| n == name).map(AxisId)
    }

    pub fn axis_ids(&self) -> impl Iterator<Item = AxisId> {
        (0..self.names.len()).map(AxisId)
    }

    pub fn name(&self, axis: AxisId) -> Option<&str> {
        self.names.get(axis.0).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bounds(&self) -> &AxisBounds {
        &self.bounds
    }

    /// Current samples of `axis`, oldest first.
    pub fn samples(&self, axis: AxisId) -> &[f64] {
        self.axes.get(axis.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the samples of `axis` with `samples`, keeping only the newest
    /// `capacity` entries. `None` leaves the axis untouched.
    pub fn set_axis(&mut self, axis: AxisId, samples: Option<&[f64]>) {
        let Some(samples) = samples else {
            return;
        };
        let capacity = self.capacity;
        let Some(stored) = self.axes.get_mut(axis.0) else {
            tracing::debug!("ignoring samples for unknown axis index {}", axis.0);
            return;
        };

        let skip = samples.len().saturating_sub(capacity);
        stored.clear();
        stored.extend_from_slice(&samples[skip..]);
    }

    /// Positional batch update: `batches[i]` goes to the i-th axis. Extra
    /// batches beyond the axis count are ignored.
    pub fn set_values(&mut self, batches: &[Option<Vec<f64>>]) {
        for (index, batch) in batches.iter().enumerate().take(self.axes.len()) {
            self.set_axis(AxisId(index), batch.as_deref());
        }
    }

    /// Change the window size. Stored samples are trimmed on the next
    /// [`set_axis`](Self::set_axis); bounds are recomputed right away.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(TallyError::InvalidCapacity(capacity));
        }
        self.capacity = capacity;
        self.bounds = AxisBounds::for_capacity(capacity);
        Ok(())
    }

    /// Fill every axis with `capacity` zeros ("no measurement yet").
    pub fn reset(&mut self) {
        for axis in &mut self.axes {
            *axis = vec![0.0; self.capacity];
        }
        self.bounds = AxisBounds::for_capacity(self.capacity);
    }

    /// Statistics over the non-zero samples of `axis`.
    #[must_use]
    pub fn summary(&self, axis: AxisId, decimals: u32) -> SummaryStats {
        SummaryStats::compute(self.samples(axis), decimals)
    }

    /// Owned copy of every axis for renderers and exporters.
    pub fn snapshot(&self, decimals: u32) -> SeriesSnapshot {
        SeriesSnapshot {
            capacity: self.capacity,
            bounds:   self.bounds.clone(),
            axes: self
                .axis_ids()
                .map(|id| AxisSnapshot {
                    name:    self.names[id.0].clone(),
                    samples: self.axes[id.0].clone(),
                    summary: self.summary(id, decimals),
                })
                .collect(),
        }
    }
}

/// Immutable copy of a [`SeriesBuffer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub capacity: usize,
    pub bounds:   AxisBounds,
    pub axes:     Vec<AxisSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSnapshot {
    pub name:    String,
    pub samples: Vec<f64>,
    pub summary: SummaryStats,
}
