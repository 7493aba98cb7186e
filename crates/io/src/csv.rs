// CSV/TSV sheet exports

use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::error::ImportError;
use crate::layout::Table;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Read a delimited export into a header-indexed table.
///
/// `.tsv` files are tab-separated. Otherwise every candidate delimiter is
/// tried and the one whose rows best agree with the header width wins;
/// comma when none splits the header.
pub fn read_table(path: &Path) -> Result<Table, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = decode(&bytes);
    let parse_err = |e: csv::Error| ImportError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let is_tsv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        return split_rows(&content, b'\t').map(Table::from_rows).map_err(parse_err);
    }

    let mut best: Option<(usize, u8, Vec<Vec<String>>)> = None;
    for delimiter in DELIMITERS {
        let Ok(rows) = split_rows(&content, delimiter) else {
            continue;
        };
        let width = rows.first().map_or(0, Vec::len);
        if width < 2 {
            continue;
        }
        let agreeing = rows.iter().filter(|r| r.len() == width).count();
        let score = agreeing * width;
        if best.as_ref().map_or(true, |(top, _, _)| score > *top) {
            best = Some((score, delimiter, rows));
        }
    }

    let rows = match best {
        Some((_, delimiter, rows)) => {
            debug!(path = %path.display(), delimiter = ?char::from(delimiter), "delimiter chosen");
            rows
        }
        None => split_rows(&content, b',').map_err(parse_err)?,
    };
    Ok(Table::from_rows(rows))
}

fn split_rows(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, csv::Error> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect()
}

/// UTF-8 as is; anything else is read as Windows-1252, the usual encoding of
/// spreadsheet exports on Windows.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}
