//! Export of dashboard data to CSV (and JSON snapshots) on demand.

pub mod csv;
pub mod file;

pub use file::{export_file_name, write_export, write_json};
