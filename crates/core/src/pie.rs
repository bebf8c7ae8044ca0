use crate::error::Result;
use crate::labels::LabelSet;
use chrono::NaiveDate;
use serde::Serialize;

/// Per-label totals with no date axis (the pie chart's data).
///
/// Values are in memory only and, when `roll_over` is driven daily, start
/// from zero every calendar day.
#[derive(Debug, Clone)]
pub struct PieTotals {
    labels:     LabelSet,
    values:     Vec<f64>,
    last_reset: NaiveDate,
}

impl PieTotals {
    pub fn new<I, S>(labels: I, today: NaiveDate) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = LabelSet::new(labels)?;
        Ok(Self {
            values: vec![0.0; labels.len()],
            labels,
            last_reset: today,
        })
    }

    /// Replace the label set; every value starts at zero.
    pub fn configure<I, S>(&mut self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = LabelSet::new(labels)?;
        self.values = vec![0.0; labels.len()];
        self.labels = labels;
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        self.labels.names()
    }

    pub fn value(&self, label: &str) -> Option<f64> {
        self.labels.index_of(label).map(|i| self.values[i])
    }

    /// Overwrite the value of `label`. Unknown labels are ignored.
    pub fn set_value(&mut self, label: &str, value: f64) {
        if let Some(i) = self.labels.index_of(label) {
            self.values[i] = value;
        }
    }

    /// Add `amount` to `label`. Unknown labels are ignored.
    pub fn increment(&mut self, label: &str, amount: f64) {
        if let Some(i) = self.labels.index_of(label) {
            self.values[i] += amount;
        }
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn reset_all(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Midnight reset: zero everything once `today` is past the last reset
    /// day. Returns `true` if a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if today <= self.last_reset {
            return false;
        }
        self.reset_all();
        self.last_reset = today;
        true
    }

    pub fn snapshot(&self) -> PieSnapshot {
        PieSnapshot {
            slices: self
                .labels
                .names()
                .iter()
                .cloned()
                .zip(self.values.iter().copied())
                .collect(),
            total: self.total(),
        }
    }
}

/// Immutable copy of [`PieTotals`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSnapshot {
    pub slices: Vec<(String, f64)>,
    pub total:  f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn total_tracks_values() {
        let mut pie = PieTotals::new(["OK", "NG"], day(1)).unwrap();
        pie.increment("OK", 3.0);
        pie.increment("NG", 1.0);
        pie.set_value("OK", 10.0);
        pie.increment("LOST", 99.0);
        assert_eq!(pie.total(), 11.0);
        assert_eq!(pie.value("OK"), Some(10.0));
        assert_eq!(pie.value("LOST"), None);
    }

    #[test]
    fn roll_over_resets_once_per_day() {
        let mut pie = PieTotals::new(["OK"], day(1)).unwrap();
        pie.increment("OK", 5.0);
        assert!(!pie.roll_over(day(1)));
        assert_eq!(pie.total(), 5.0);

        assert!(pie.roll_over(day(2)));
        assert_eq!(pie.total(), 0.0);
        pie.increment("OK", 1.0);
        assert!(!pie.roll_over(day(2)));
        assert_eq!(pie.total(), 1.0);
    }

    #[test]
    fn configure_replaces_slices() {
        let mut pie = PieTotals::new(["OK", "NG"], day(1)).unwrap();
        pie.increment("OK", 2.0);
        assert!(pie.configure(Vec::<String>::new()).is_err());
        assert_eq!(pie.total(), 2.0);

        pie.configure(["A", "B", "C"]).unwrap();
        let snap = pie.snapshot();
        assert_eq!(snap.total, 0.0);
        assert_eq!(
            snap.slices,
            vec![("A".to_string(), 0.0), ("B".to_string(), 0.0), ("C".to_string(), 0.0)]
        );
    }
}
