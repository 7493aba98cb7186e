use std::path::PathBuf;

use acctsync_recon::ErrorKind;
use thiserror::Error;

/// Failure while reading the primary workbook.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("workbook not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("worksheet '{sheet}' not found in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("unsupported workbook format: {0} (expected .xlsx, .xls, .xlsb, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::SheetNotFound { .. } | Self::Io { .. } => ErrorKind::NotFound,
            Self::UnsupportedFormat(_) | Self::Parse { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// Failure while writing the JSON report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("cannot write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ExternalSystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_map_to_not_found() {
        let e = ImportError::SheetNotFound {
            path: PathBuf::from("book.xlsx"),
            sheet: "payment_terms".into(),
        };
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert_eq!(e.to_string(), "worksheet 'payment_terms' not found in book.xlsx");
        assert_eq!(ImportError::NotFound("x.xlsx".into()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn bad_format_is_invalid_argument() {
        let e = ImportError::UnsupportedFormat("notes.txt".into());
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}
