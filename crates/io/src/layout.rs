// Worksheet layouts per dataset, and the header-indexed table both readers produce.

use std::collections::HashMap;

use acctsync_recon::model::{FIELD_NUMBER, FIELD_TYPE};
use acctsync_recon::{canonical_id, Dataset, Origin, Record};
use tracing::debug;

/// Where a dataset lives in the workbook and which columns feed a `Record`.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub sheet: &'static str,
    /// Id columns in priority order; the first non-empty one wins.
    pub id_columns: &'static [&'static str],
    pub name_column: &'static str,
    /// (header, record field, canonicalize as id)
    pub fields: &'static [(&'static str, &'static str, bool)],
}

const ACCOUNTS: SheetLayout = SheetLayout {
    sheet: "chartofaccount",
    id_columns: &["ID"],
    name_column: "Name",
    fields: &[("Number", FIELD_NUMBER, true), ("Type", FIELD_TYPE, false)],
};

const TERMS: SheetLayout = SheetLayout {
    sheet: "payment_terms",
    id_columns: &["Days", "ID"],
    name_column: "Name",
    fields: &[],
};

impl SheetLayout {
    pub fn for_dataset(dataset: Dataset) -> &'static SheetLayout {
        match dataset {
            Dataset::Accounts => &ACCOUNTS,
            Dataset::Terms => &TERMS,
        }
    }

    /// Map table rows to primary records.
    ///
    /// Rows without an id or a name are skipped.
    pub fn records(&self, table: &Table) -> Vec<Record> {
        let mut records = Vec::with_capacity(table.rows.len());

        for (row_idx, row) in table.rows.iter().enumerate() {
            let name = table.cell(row, self.name_column).trim();
            if name.is_empty() {
                debug!(row = row_idx + 2, "skipping row without name");
                continue;
            }

            let raw_id = self
                .id_columns
                .iter()
                .map(|col| table.cell(row, col).trim())
                .find(|v| !v.is_empty());
            let Some(raw_id) = raw_id else {
                debug!(row = row_idx + 2, name, "skipping row without id");
                continue;
            };

            let mut record = Record::new(canonical_id(raw_id), name, Origin::Primary);
            for &(header, field, is_numeric) in self.fields {
                let value = table.cell(row, header).trim();
                if value.is_empty() {
                    continue;
                }
                let value = if is_numeric {
                    canonical_id(value)
                } else {
                    value.to_string()
                };
                record.fields.insert(field.to_string(), value);
            }
            records.push(record);
        }

        records
    }
}

/// Header row plus data rows, every cell already rendered as text.
#[derive(Debug, Default, Clone)]
pub struct Table {
    columns: HashMap<String, usize>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build from raw rows; the first row is the header. Header text is trimmed.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        let mut columns = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if !name.is_empty() {
                columns.entry(name.to_string()).or_insert(idx);
            }
        }
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Cell text by header name; "" for an unknown column or a short row.
    pub fn cell<'r>(&self, row: &'r [String], column: &str) -> &'r str {
        self.columns
            .get(column)
            .and_then(|&idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}
