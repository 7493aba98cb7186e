// Workbook import and report output

pub mod csv;
pub mod error;
pub mod import;
pub mod layout;
pub mod report;
pub mod xlsx;

pub use error::{ImportError, ReportError};
pub use import::load;
pub use layout::{SheetLayout, Table};
pub use report::{iso_timestamp, write_report, ReportPayload, ReportStatus};
