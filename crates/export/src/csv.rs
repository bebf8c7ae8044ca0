//! CSV renderings of the dashboard's data holders.
//!
//! Sample values are always written with four decimals. Summary rows use
//! the precision passed by the caller: the single-axis export defaults to
//! four places, the multi-axis export to two. Labels come from user config
//! and are quoted by the `csv` writer wherever they need it.

use ::csv::{Terminator, Writer, WriterBuilder};
use std::io::{self, Write};
use tally_core::stats::SummaryStats;
use tally_core::{CounterSnapshot, PieSnapshot};

/// Records of differing widths, `\n` terminated.
fn writer<W: Write>(w: W) -> Writer<W> {
    WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(w)
}

/// An empty separator line, written past the record writer.
fn blank_line<W: Write>(out: &mut Writer<W>) -> io::Result<()> {
    out.flush()?;
    writeln!(out.get_mut())
}

fn summary_rows(stats: &SummaryStats) -> [(&'static str, f64); 4] {
    [("AVG", stats.avg), ("MAX", stats.max), ("MIN", stats.min), ("STDEV", stats.stdev)]
}

/// One axis as `Index,Value` rows followed by a `Summary` block.
pub fn write_series<W: Write>(w: &mut W, samples: &[f64], decimals: u32) -> io::Result<()> {
    let prec = decimals as usize;
    let mut out = writer(w);
    out.write_record(["Index", "Value"])?;
    for (i, value) in samples.iter().enumerate() {
        out.write_record([(i + 1).to_string(), format!("{value:.4}")])?;
    }

    let stats = SummaryStats::compute(samples, decimals);
    blank_line(&mut out)?;
    out.write_record(["Summary"])?;
    for (name, value) in summary_rows(&stats) {
        out.write_record([name.to_string(), format!("{value:.prec$}")])?;
    }
    out.flush()
}

/// Every axis side by side (`Index,X,Y,T`), shorter axes padded with empty
/// cells, then one `<axis>_AVG ... <axis>_STDEV` block per axis.
pub fn write_axes<W: Write>(w: &mut W, axes: &[(&str, &[f64])], decimals: u32) -> io::Result<()> {
    let mut out = writer(w);
    out.write_record(std::iter::once("Index").chain(axes.iter().map(|(name, _)| *name)))?;

    let rows = axes.iter().map(|(_, samples)| samples.len()).max().unwrap_or(0);
    for i in 0..rows {
        let cells = axes
            .iter()
            .map(|(_, samples)| samples.get(i).map(|v| format!("{v:.4}")).unwrap_or_default());
        out.write_record(std::iter::once((i + 1).to_string()).chain(cells))?;
    }

    blank_line(&mut out)?;
    out.write_record(["Summary"])?;
    for (name, samples) in axes {
        let stats = SummaryStats::compute(samples, decimals);
        for (field, value) in summary_rows(&stats) {
            out.write_record([format!("{name}_{field}"), value.to_string()])?;
        }
        blank_line(&mut out)?;
    }
    out.flush()
}

/// `Date,<label...>` with one row per stored day.
pub fn write_counters<W: Write>(w: &mut W, store: &CounterSnapshot) -> io::Result<()> {
    let mut out = writer(w);
    out.write_record(std::iter::once("Date").chain(store.labels.iter().map(String::as_str)))?;

    for (day, date) in store.dates.iter().enumerate() {
        let counts = (0..store.labels.len()).map(|row| store.value(row, day).to_string());
        out.write_record(std::iter::once(date.clone()).chain(counts))?;
    }
    out.flush()
}

/// `Label,Value` per slice and a closing `Total` row, two decimals.
pub fn write_pie<W: Write>(w: &mut W, pie: &PieSnapshot) -> io::Result<()> {
    let mut out = writer(w);
    out.write_record(["Label", "Value"])?;
    for (label, value) in &pie.slices {
        out.write_record([label.clone(), format!("{value:.2}")])?;
    }
    out.write_record(["Total".to_string(), format!("{:.2}", pie.total)])?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn counter_store_rows() {
        let store = CounterSnapshot {
            labels: vec!["OK".into(), "NG".into()],
            dates:  vec!["20240101".into(), "20240102".into()],
            counts: vec![vec![2, 5], vec![1, 0]],
        };
        let csv = render(|w| write_counters(w, &store));
        assert_eq!(csv, "Date,OK,NG\n20240101,2,1\n20240102,5,0\n");
    }

    #[test]
    fn short_counter_rows_read_as_zero() {
        let store = CounterSnapshot {
            labels: vec!["OK".into(), "NG".into()],
            dates:  vec!["20240101".into(), "20240102".into()],
            counts: vec![vec![2, 5], vec![1]],
        };
        let csv = render(|w| write_counters(w, &store));
        assert_eq!(csv, "Date,OK,NG\n20240101,2,1\n20240102,5,0\n");
    }

    #[test]
    fn single_series_with_summary() {
        let csv = render(|w| write_series(w, &[1.0, 0.0, 3.0, 5.0, 0.0], 4));
        assert_eq!(
            csv,
            "Index,Value\n\
             1,1.0000\n2,0.0000\n3,3.0000\n4,5.0000\n5,0.0000\n\
             \n\
             Summary\n\
             AVG,3.0000\nMAX,5.0000\nMIN,1.0000\nSTDEV,2.0000\n"
        );
    }

    #[test]
    fn empty_series_summarizes_to_zero() {
        let csv = render(|w| write_series(w, &[], 4));
        assert_eq!(csv, "Index,Value\n\nSummary\nAVG,0.0000\nMAX,0.0000\nMIN,0.0000\nSTDEV,0.0000\n");
    }

    #[test]
    fn multi_axis_pads_and_rounds_to_two() {
        let x: &[f64] = &[1.0, 2.0, 4.0];
        let y: &[f64] = &[0.5];
        let t: &[f64] = &[];
        let csv = render(|w| write_axes(w, &[("X", x), ("Y", y), ("T", t)], 2));
        assert_eq!(
            csv,
            "Index,X,Y,T\n\
             1,1.0000,0.5000,\n\
             2,2.0000,,\n\
             3,4.0000,,\n\
             \n\
             Summary\n\
             X_AVG,2.33\nX_MAX,4\nX_MIN,1\nX_STDEV,1.53\n\n\
             Y_AVG,0.5\nY_MAX,0.5\nY_MIN,0.5\nY_STDEV,0\n\n\
             T_AVG,0\nT_MAX,0\nT_MIN,0\nT_STDEV,0\n\n"
        );
    }

    #[test]
    fn labels_with_delimiters_are_quoted() {
        let store = CounterSnapshot {
            labels: vec!["Line A, OK".into(), "NG".into()],
            dates:  vec!["20240101".into()],
            counts: vec![vec![2], vec![1]],
        };
        let text = render(|w| write_counters(w, &store));
        assert_eq!(text, "Date,\"Line A, OK\",NG\n20240101,2,1\n");

        let mut reader = ::csv::ReaderBuilder::new().has_headers(false).from_reader(text.as_bytes());
        let widths: Vec<usize> = reader.records().map(|r| r.unwrap().len()).collect();
        assert_eq!(widths, vec![3, 3]);
    }

    #[test]
    fn quoted_pie_and_axis_labels() {
        let pie = PieSnapshot {
            slices: vec![("say \"hi\"".into(), 1.0)],
            total:  1.0,
        };
        let text = render(|w| write_pie(w, &pie));
        assert_eq!(text, "Label,Value\n\"say \"\"hi\"\"\",1.00\nTotal,1.00\n");

        let a: &[f64] = &[2.0];
        let text = render(|w| write_axes(w, &[("a,b", a)], 2));
        assert!(text.starts_with("Index,\"a,b\"\n1,2.0000\n\nSummary\n\"a,b_AVG\",2\n"));
    }

    #[test]
    fn pie_rows_and_total() {
        let pie = PieSnapshot {
            slices: vec![("OK".into(), 12.0), ("NG".into(), 3.5)],
            total:  15.5,
        };
        let csv = render(|w| write_pie(w, &pie));
        assert_eq!(csv, "Label,Value\nOK,12.00\nNG,3.50\nTotal,15.50\n");
    }
}
