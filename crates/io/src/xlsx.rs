// Excel/ODS worksheet reading (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use acctsync_recon::canonical_float;
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::ImportError;
use crate::layout::Table;

/// Read one worksheet into a header-indexed table.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<Table, ImportError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ImportError::Parse {
        path: path.to_path_buf(),
        message: format!("failed to open workbook: {e}"),
    })?;

    if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
        return Err(ImportError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ImportError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{sheet_name}': {e}"),
        })?;

    let (height, width) = range.get_size();
    debug!(sheet = sheet_name, height, width, "worksheet loaded");

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(Table::from_rows(rows))
}

/// Render a cell as text. Integral floats drop their fraction so numeric ids
/// join with their textual form.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => canonical_float(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => canonical_float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
