//! Error types for loading, aggregating and exporting order data.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{column}' in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("No data loaded")]
    NoData,
}
