//! Report exports
//!
//! Contract and period lists are first flattened into a [`Table`] of display
//! strings, then rendered either as spreadsheet-friendly CSV or as a printable
//! HTML page.

mod columns;
mod print;
mod spreadsheet;

pub use columns::{contract_table, period_table};
pub use print::to_html;
pub use spreadsheet::to_csv;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Flush(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Rendered report: one header row plus data rows of equal width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}
