use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the clock and refresh pipeline.
///
/// The humanizer itself never fails: it only ever receives a valid numeric
/// distance. Failures happen at the boundary (parsing a source timestamp,
/// or asking an unseeded clock for a distance) and are meant to be absorbed
/// there: an entry whose source never parsed simply does not update.
#[derive(Debug, Error)]
pub enum Error {
    /// The value handed in is not a valid point in time.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A distance was requested before the reference clock was seeded.
    #[error("reference clock has not been seeded")]
    ClockNotSeeded,
}

/// Errors surfaced while loading or validating configuration.
///
/// Template problems are caught here, at validation time, never during
/// formatting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A literal template may carry at most one `%d` placeholder.
    #[error("template `{field}` contains more than one %d placeholder")]
    Template { field: &'static str },
}
