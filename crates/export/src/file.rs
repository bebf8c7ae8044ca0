use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tally_core::{Result, TallyError};
use tracing::{info, warn};

/// `<prefix>_<YYYYMMDD_HHMMSS>.<extension>`
pub fn export_file_name(prefix: &str, at: NaiveDateTime, extension: &str) -> String {
    format!("{prefix}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}

/// Create `dir/file_name` through a temp file and let `render` fill it.
/// Returns the final path. On failure the temp file is removed and no
/// export appears.
pub fn write_export<F>(dir: &Path, file_name: &str, render: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let tmp = dir.join(format!(".{file_name}.tmp"));

    let written = File::create(&tmp).and_then(|file| {
        let mut out = BufWriter::new(file);
        render(&mut out)?;
        out.flush()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&tmp, &path)) {
        match fs::remove_file(&tmp) {
            Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                warn!("cannot remove {}: {cleanup}", tmp.display());
            }
            _ => {}
        }
        return Err(e.into());
    }

    info!("exported {}", path.display());
    Ok(path)
}

/// Write `value` as pretty JSON to `dir/<prefix>_<timestamp>.json`.
pub fn write_json<T: Serialize>(
    dir: &Path,
    prefix: &str,
    at: NaiveDateTime,
    value: &T,
) -> Result<PathBuf> {
    let name = export_file_name(prefix, at, "json");
    let body =
        serde_json::to_vec_pretty(value).map_err(|e| TallyError::Export(format!("{name}: {e}")))?;
    write_export(dir, &name, |w| w.write_all(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 9)
            .unwrap()
            .and_hms_opt(12, 5, 3)
            .unwrap()
    }

    #[test]
    fn names_carry_a_timestamp() {
        assert_eq!(
            export_file_name("CartesianChart", noon(), "csv"),
            "CartesianChart_20240709_120503.csv"
        );
    }

    #[test]
    fn export_creates_directory_and_leaves_no_temp_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("exports");
        let path = write_export(&dir, "a.csv", |w| w.write_all(b"Date,OK\n")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Date,OK\n");
        let names: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.csv")]);
    }

    #[test]
    fn failed_render_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("exports");
        let result = write_export(&dir, "b.csv", |w| {
            w.write_all(b"Date,OK\n")?;
            Err(std::io::Error::new(ErrorKind::Other, "disk full"))
        });

        assert!(matches!(result, Err(TallyError::Io { .. })));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn json_snapshot_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "snapshot", noon(), &vec![1, 2, 3]).unwrap();
        assert!(path.ends_with("snapshot_20240709_120503.json"));
        let parsed: Vec<i32> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }
}
