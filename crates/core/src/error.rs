use thiserror::Error;

/// Top-level error type used across the entire workspace.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid capacity {0}: must be greater than zero")]
    InvalidCapacity(usize),

    #[error("label set must not be empty")]
    EmptyLabels,

    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("invalid label {0:?}: must not contain ':' or line breaks")]
    InvalidLabel(String),

    #[error("unknown axis '{0}'")]
    UnknownAxis(String),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = TallyError> = std::result::Result<T, E>;
