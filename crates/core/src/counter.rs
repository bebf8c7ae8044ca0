//! Per-label, per-day event counters with one-file-per-day persistence.
//!
//! On-disk layout: a flat directory holding `<YYYYMMDD>.<ext>` files, each
//! with one `label:count` line per configured label. A day's file is
//! rewritten in full on every flush.

use crate::clock::{Clock, DateKey, LocalClock};
use crate::error::Result;
use crate::labels::LabelSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

/// Extension of per-day counter files.
pub const DEFAULT_EXTENSION: &str = "log";

/// Directory created under the log root when none is configured.
pub const DEFAULT_LOG_DIR_NAME: &str = "LiveChartsLogs(30Days)";

/// Label-keyed daily counters shared between producer contexts.
///
/// Every mutation runs inside one critical section that also covers the
/// write of today's file, so concurrent increments are never lost and a
/// flush never observes a half-applied update.
#[derive(Debug)]
pub struct CounterStore {
    state: Mutex<CounterState>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct CounterState {
    labels:    LabelSet,
    /// Ascending date keys.
    dates:     Vec<DateKey>,
    /// `counts[label][date]`, every row as long as `dates`.
    counts:    Vec<Vec<u64>>,
    log_dir:   Option<PathBuf>,
    extension: String,
}

impl CounterStore {
    /// Store counting `labels` against the local calendar.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_clock(labels, Arc::new(LocalClock))
    }

    pub fn with_clock<I, S>(labels: I, clock: Arc<dyn Clock>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = LabelSet::new(labels)?;
        Ok(Self {
            state: Mutex::new(CounterState {
                counts:    vec![Vec::new(); labels.len()],
                labels,
                dates:     Vec::new(),
                log_dir:   None,
                extension: DEFAULT_EXTENSION.to_string(),
            }),
            clock,
        })
    }

    /// Use `extension` (without the dot) for per-day files.
    #[must_use]
    pub fn with_extension(self, extension: impl Into<String>) -> Self {
        self.lock().extension = extension.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, CounterState> {
        // Each critical section leaves the state aligned, so a panic in
        // another holder cannot leave it torn.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> DateKey {
        DateKey::from(self.clock.today())
    }

    /// Replace the label set and drop all in-memory history. Files on disk
    /// are left alone until the next load.
    pub fn configure<I, S>(&self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = LabelSet::new(labels)?;
        let mut state = self.lock();
        state.counts = vec![Vec::new(); labels.len()];
        state.labels = labels;
        state.dates.clear();
        info!("counter labels set to {:?}", state.labels.names());
        Ok(())
    }

    /// Directory that flushes write to, if any.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.lock().log_dir.clone()
    }

    pub fn set_log_dir(&self, dir: impl Into<PathBuf>) {
        self.lock().log_dir = Some(dir.into());
    }

    /// Resolve `<root>/<dir_name>` (root defaults to [`default_log_root`]),
    /// create it when missing, persist into it from now on and load the
    /// history it already holds.
    pub fn init_log_dir(&self, root: Option<&Path>, dir_name: &str) -> Result<PathBuf> {
        let root = root.map(Path::to_path_buf).unwrap_or_else(default_log_root);
        let dir = root.join(dir_name);
        fs::create_dir_all(&dir)?;
        self.set_log_dir(&dir);
        self.load_from_directory(&dir)?;
        Ok(dir)
    }

    /// Add `amount` to today's counter for `label`, then optionally write
    /// today's file. Unknown labels are ignored.
    ///
    /// A failed write is reported, but the in-memory count keeps the
    /// increment.
    pub fn increment(&self, label: &str, amount: u64, persist: bool) -> Result<()> {
        let today = self.today();
        let mut state = self.lock();

        let Some(row) = state.labels.index_of(label) else {
            trace!("ignoring increment for unknown label '{label}'");
            return Ok(());
        };

        let (day, _) = state.ensure_date(today);
        let counts = &mut state.counts[row];
        if counts.len() <= day {
            counts.resize(day + 1, 0);
        }
        counts[day] = counts[day].saturating_add(amount);

        if persist {
            state.persist_day(day)?;
        }
        Ok(())
    }

    /// Write today's counters if today already has an entry.
    pub fn flush(&self) -> Result<()> {
        let today = self.today();
        let state = self.lock();
        match state.position(&today) {
            Some(day) => state.persist_day(day),
            None => Ok(()),
        }
    }

    /// Daily rollover: make sure today has a (zeroed) entry, then flush it.
    /// Returns `true` when a new day was started.
    pub fn roll_over(&self) -> Result<bool> {
        let today = self.today();
        let mut state = self.lock();
        let (day, added) = state.ensure_date(today);
        if added {
            info!("started counters for {}", state.dates[day]);
        }
        state.persist_day(day)?;
        Ok(added)
    }

    /// Zero every counter on every day; optionally rewrite today's file.
    pub fn reset_all(&self, persist: bool) -> Result<()> {
        let today = self.today();
        let mut state = self.lock();
        for row in &mut state.counts {
            row.iter_mut().for_each(|c| *c = 0);
        }
        if persist {
            if let Some(day) = state.position(&today) {
                state.persist_day(day)?;
            }
        }
        Ok(())
    }

    /// Replace all in-memory history with the per-day files in `dir`.
    ///
    /// Files are taken in file-name order. Lines that are not
    /// `label:count`, counts that are not integers and unknown labels are
    /// skipped; labels missing from a file count as zero that day.
    pub fn load_from_directory(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let mut state = self.lock();

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || extension != Some(state.extension.as_str()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match DateKey::parse(stem) {
                Some(key) => files.push((key, path)),
                None => debug!("skipping '{}': not a YYYYMMDD file name", path.display()),
            }
        }
        files.sort();

        let mut dates = Vec::with_capacity(files.len());
        let mut counts = vec![Vec::with_capacity(files.len()); state.labels.len()];

        for (key, path) in files {
            let raw = fs::read(&path)?;
            let text = String::from_utf8_lossy(&raw);
            let day = parse_day(&text, &state.labels, &path);
            for (row, value) in counts.iter_mut().zip(day) {
                row.push(value);
            }
            dates.push(key);
        }

        info!("loaded {} day(s) of counters from {}", dates.len(), dir.display());
        state.dates = dates;
        state.counts = counts;
        Ok(())
    }

    /// Today's count per label; zero for labels without an entry yet.
    pub fn snapshot_today(&self) -> BTreeMap<String, u64> {
        let today = self.today();
        let state = self.lock();
        let day = state.position(&today);
        state
            .labels
            .names()
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let value = day.and_then(|d| state.counts[row].get(d).copied()).unwrap_or(0);
                (label.clone(), value)
            })
            .collect()
    }

    /// Owned copy of every label, date and count.
    pub fn snapshot(&self) -> CounterSnapshot {
        let state = self.lock();
        CounterSnapshot {
            labels: state.labels.names().to_vec(),
            dates:  state.dates.iter().map(|d| d.as_str().to_string()).collect(),
            counts: state.counts.clone(),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.lock().labels.names().to_vec()
    }

    pub fn dates(&self) -> Vec<String> {
        self.lock().dates.iter().map(|d| d.as_str().to_string()).collect()
    }
}

impl CounterState {
    fn position(&self, key: &DateKey) -> Option<usize> {
        self.dates.binary_search(key).ok()
    }

    /// Index of `key`, inserting it (with a zero for every label) when new.
    fn ensure_date(&mut self, key: DateKey) -> (usize, bool) {
        match self.dates.binary_search(&key) {
            Ok(day) => (day, false),
            Err(day) => {
                let len = self.dates.len();
                for row in &mut self.counts {
                    row.resize(len, 0);
                    row.insert(day, 0);
                }
                self.dates.insert(day, key);
                (day, true)
            }
        }
    }

    /// Rewrite the file for `dates[day]`. Written to a temp file first and
    /// renamed, so a crash leaves either the old or the new content.
    fn persist_day(&self, day: usize) -> Result<()> {
        let Some(dir) = &self.log_dir else {
            return Ok(());
        };

        let mut body = String::new();
        for (row, label) in self.labels.names().iter().enumerate() {
            let value = self.counts[row].get(day).copied().unwrap_or(0);
            body.push_str(&format!("{label}:{value}\n"));
        }

        let path = dir.join(format!("{}.{}", self.dates[day], self.extension));
        let tmp = path.with_extension(format!("{}.tmp", self.extension));
        let written = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            warn!("failed to write counters to '{}': {e}", path.display());
            return Err(e.into());
        }
        trace!("flushed counters to {}", path.display());
        Ok(())
    }
}

/// Parse one day file into a value per label (label order).
fn parse_day(text: &str, labels: &LabelSet, path: &Path) -> Vec<u64> {
    let mut values = vec![0; labels.len()];
    for line in text.lines() {
        let parts: Vec<&str> = line.split(':').collect();
        let [label, count] = parts.as_slice() else {
            if !line.trim().is_empty() {
                debug!("{}: skipping malformed line '{line}'", path.display());
            }
            continue;
        };
        let Some(row) = labels.index_of(label) else {
            trace!("{}: skipping unknown label '{label}'", path.display());
            continue;
        };
        match count.trim().parse::<u64>() {
            Ok(value) => values[row] = value,
            Err(_) => debug!("{}: skipping bad count in '{line}'", path.display()),
        }
    }
    values
}

/// `$HOME/Desktop`, or the working directory when `$HOME` is unset.
pub fn default_log_root() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join("Desktop"))
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Immutable copy of a [`CounterStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub labels: Vec<String>,
    pub dates:  Vec<String>,
    /// `counts[label][date]`.
    pub counts: Vec<Vec<u64>>,
}

impl CounterSnapshot {
    /// Count for `label` on the `date`-th day, zero when out of range.
    pub fn value(&self, label: usize, date: usize) -> u64 {
        self.counts
            .get(label)
            .and_then(|row| row.get(date))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::NaiveDate;
    use std::thread;

    fn clock(y: i32, m: u32, d: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    fn store_at(clock: &Arc<ManualClock>) -> CounterStore {
        CounterStore::with_clock(["OK", "NG"], clock.clone()).unwrap()
    }

    fn assert_aligned(store: &CounterStore) {
        let snap = store.snapshot();
        for row in &snap.counts {
            assert_eq!(row.len(), snap.dates.len());
        }
        let mut sorted = snap.dates.clone();
        sorted.sort();
        assert_eq!(sorted, snap.dates);
    }

    #[test]
    fn increment_starts_today_for_every_label() {
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.increment("OK", 2, false).unwrap();
        store.increment("OK", 1, false).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.dates, vec!["20240301"]);
        assert_eq!(snap.counts, vec![vec![3], vec![0]]);
        assert_eq!(store.snapshot_today()["NG"], 0);
    }

    #[test]
    fn dates_stay_aligned_across_days() {
        let clock = clock(2024, 1, 30);
        let store = store_at(&clock);
        for day in 0..5u64 {
            if day % 2 == 0 {
                store.increment("OK", day + 1, false).unwrap();
            } else {
                store.increment("NG", 1, false).unwrap();
            }
            assert_aligned(&store);
            clock.advance(1);
        }
        let snap = store.snapshot();
        assert_eq!(snap.dates.len(), 5);
        assert_eq!(snap.counts[0], vec![1, 0, 3, 0, 5]);
        assert_eq!(snap.counts[1], vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn clock_going_backwards_keeps_dates_sorted() {
        let clock = clock(2024, 5, 10);
        let store = store_at(&clock);
        store.increment("OK", 1, false).unwrap();
        clock.set(NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        store.increment("NG", 4, false).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.dates, vec!["20240508", "20240510"]);
        assert_eq!(snap.counts, vec![vec![0, 1], vec![4, 0]]);
    }

    #[test]
    fn unknown_label_changes_nothing() {
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.increment("OK", 1, false).unwrap();
        let before = store.snapshot();
        store.increment("UNKNOWN", 5, true).unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn reset_all_is_idempotent() {
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.increment("OK", 7, false).unwrap();
        clock.advance(1);
        store.increment("NG", 2, false).unwrap();

        store.reset_all(false).unwrap();
        let once = store.snapshot();
        store.reset_all(false).unwrap();
        assert_eq!(store.snapshot(), once);
        assert_eq!(once.dates.len(), 2);
        assert!(once.counts.iter().flatten().all(|c| *c == 0));
    }

    #[test]
    fn configure_clears_history_and_validates() {
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.increment("OK", 1, false).unwrap();

        assert!(store.configure(Vec::<String>::new()).is_err());
        assert_eq!(store.labels(), vec!["OK", "NG"]);
        assert_eq!(store.dates().len(), 1);

        store.configure(["OK", "NG", "RETRY"]).unwrap();
        assert!(store.dates().is_empty());
        store.increment("RETRY", 1, false).unwrap();
        assert_eq!(store.snapshot_today()["RETRY"], 1);
    }

    #[test]
    fn persisted_day_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);

        let store = store_at(&clock);
        store.set_log_dir(dir.path());
        store.increment("OK", 3, true).unwrap();

        let written = fs::read_to_string(dir.path().join("20240301.log")).unwrap();
        assert_eq!(written, "OK:3\nNG:0\n");

        let reloaded = store_at(&clock);
        reloaded.load_from_directory(dir.path()).unwrap();
        let today = reloaded.snapshot_today();
        assert_eq!(today.get("OK"), Some(&3));
        assert_eq!(today.get("NG"), Some(&0));
    }

    #[test]
    fn flush_overwrites_the_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.set_log_dir(dir.path());

        store.increment("NG", 1, true).unwrap();
        store.increment("NG", 1, false).unwrap();
        store.flush().unwrap();

        let written = fs::read_to_string(dir.path().join("20240301.log")).unwrap();
        assert_eq!(written, "OK:0\nNG:2\n");
        assert!(!dir.path().join("20240301.log.tmp").exists());
    }

    #[test]
    fn load_skips_bad_lines_files_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240102.log"), "OK:5\nNG\nNG:x\nRETRY:9\n").unwrap();
        fs::write(dir.path().join("20240101.log"), "NG:1\r\nOK:2:3\nOK:2\n").unwrap();
        fs::write(dir.path().join("20240103.txt"), "OK:100\n").unwrap();
        fs::write(dir.path().join("summary.log"), "OK:100\n").unwrap();

        let clock = clock(2024, 1, 3);
        let store = store_at(&clock);
        store.increment("OK", 42, false).unwrap();
        store.load_from_directory(dir.path()).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.dates, vec!["20240101", "20240102"]);
        assert_eq!(snap.counts, vec![vec![2, 5], vec![1, 0]]);
        assert_eq!(store.snapshot_today()["OK"], 0);
    }

    #[test]
    fn load_failure_preserves_state() {
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.increment("OK", 1, false).unwrap();
        assert!(store.load_from_directory("/definitely/not/a/dir").is_err());
        assert_eq!(store.snapshot_today()["OK"], 1);
    }

    #[test]
    fn failed_flush_keeps_in_memory_count() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.set_log_dir(dir.path().join("missing"));

        assert!(store.increment("OK", 1, true).is_err());
        assert_eq!(store.snapshot_today()["OK"], 1);
    }

    #[test]
    fn init_log_dir_creates_and_loads() {
        let root = tempfile::tempdir().unwrap();
        let existing = root.path().join("history");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("20240229.log"), "OK:4\nNG:1\n").unwrap();

        let clock = clock(2024, 2, 29);
        let store = store_at(&clock);
        let dir = store.init_log_dir(Some(root.path()), "history").unwrap();
        assert_eq!(dir, existing);
        assert_eq!(store.log_dir(), Some(existing));
        assert_eq!(store.snapshot_today()["OK"], 4);

        let fresh = store.init_log_dir(Some(root.path()), "new").unwrap();
        assert!(fresh.is_dir());
        assert!(store.dates().is_empty());
    }

    #[test]
    fn roll_over_starts_a_zeroed_day_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock);
        store.set_log_dir(dir.path());
        store.increment("OK", 1, false).unwrap();

        assert!(!store.roll_over().unwrap());
        clock.advance(1);
        assert!(store.roll_over().unwrap());
        assert!(!store.roll_over().unwrap());

        assert_eq!(store.dates(), vec!["20240301", "20240302"]);
        let written = fs::read_to_string(dir.path().join("20240302.log")).unwrap();
        assert_eq!(written, "OK:0\nNG:0\n");
    }

    #[test]
    fn custom_extension_is_used_for_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);
        let store = store_at(&clock).with_extension("cnt");
        store.set_log_dir(dir.path());
        store.increment("OK", 2, true).unwrap();
        assert!(dir.path().join("20240301.cnt").exists());

        let reloaded = store_at(&clock).with_extension("cnt");
        reloaded.load_from_directory(dir.path()).unwrap();
        assert_eq!(reloaded.snapshot_today()["OK"], 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock(2024, 3, 1);
        let store = Arc::new(store_at(&clock));
        store.set_log_dir(dir.path());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let label = if i % 2 == 0 { "OK" } else { "NG" };
                    for _ in 0..50 {
                        store.increment(label, 1, true).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.snapshot_today()["OK"], 200);
        assert_eq!(store.snapshot_today()["NG"], 200);
        let written = fs::read_to_string(dir.path().join("20240301.log")).unwrap();
        assert_eq!(written, "OK:200\nNG:200\n");
    }
}
