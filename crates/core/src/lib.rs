//! Data layer of the tally dashboard: sliding sample windows, daily event
//! counters, pie totals and gauge readings, plus the statistics computed
//! over them.

pub mod clock;
pub mod counter;
pub mod error;
pub mod event;
pub mod gauge;
pub mod labels;
pub mod pie;
pub mod series;
pub mod stats;

pub use clock::{Clock, DateKey, LocalClock, ManualClock};
pub use counter::{CounterSnapshot, CounterStore};
pub use error::{Result, TallyError};
pub use event::{Message, Target};
pub use gauge::{GaugeLevel, GaugeReading};
pub use labels::LabelSet;
pub use pie::{PieSnapshot, PieTotals};
pub use series::{AxisId, SeriesBuffer, SeriesSnapshot};
pub use stats::SummaryStats;
