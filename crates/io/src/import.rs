use std::path::Path;

use acctsync_recon::{Dataset, Record};
use tracing::info;

use crate::error::ImportError;
use crate::layout::SheetLayout;

/// Load the dataset's worksheet from a workbook. Every record is tagged
/// `origin = primary`.
///
/// A `.csv`/`.tsv` export holds a single sheet, so the sheet-name check only
/// applies to spreadsheet formats.
pub fn load(path: &Path, dataset: Dataset) -> Result<Vec<Record>, ImportError> {
    if !path.is_file() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }

    let layout = SheetLayout::for_dataset(dataset);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => crate::xlsx::read_sheet(path, layout.sheet)?,
        "csv" | "tsv" => crate::csv::read_table(path)?,
        _ => return Err(ImportError::UnsupportedFormat(path.display().to_string())),
    };

    let records = layout.records(&table);
    info!(
        %dataset,
        path = %path.display(),
        rows = table.rows.len(),
        records = records.len(),
        "workbook imported"
    );
    Ok(records)
}
