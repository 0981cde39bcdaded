use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeatmapError {
    #[error("coordinate length mismatch: X has {x_len} values, Y has {y_len}")]
    CoordinateMismatch { x_len: usize, y_len: usize },

    #[error("no position samples to rasterize")]
    EmptySampleSet,

    #[error("degenerate scale: {what} must be positive and finite (got {value})")]
    DegenerateScale { what: &'static str, value: f64 },

    #[error("invalid coordinate token {token:?}")]
    InvalidToken { token: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("bundle is missing sheets: {}", .missing.join(", "))]
    MissingSheets { missing: Vec<String> },

    #[error("sheet {sheet} is missing required column {column:?}")]
    MissingColumn { sheet: String, column: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

#[derive(Debug, Error)]
pub enum HrError {
    #[error("heart-rate file is missing columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("window end {end:.2} min is before start {start:.2} min")]
    InvalidWindow { start: f64, end: f64 },

    #[error("no heart-rate samples")]
    EmptyTrace,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
