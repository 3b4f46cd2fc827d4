//! Spreadsheet access: a dense grid over the first worksheet, plus the
//! extractors and the output writer built on top of it.

pub mod cell;
pub mod delivery;
pub mod invoice;
pub mod measurement;
pub mod reference;
pub mod writer;

use crate::error::{ConvertError, Result};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use std::path::Path;

pub use delivery::extract_delivery;
pub use invoice::{extract_invoices, ColumnMap, InvoiceField};
pub use measurement::extract_measurements;
pub use reference::load_reference_tables;
pub use writer::LedgerWriter;

static EMPTY: Data = Data::Empty;

/// First worksheet of a workbook, addressed by absolute 0-based row/column
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    rows: Vec<Vec<Data>>,
}

impl Sheet {
    pub fn from_rows(rows: Vec<Vec<Data>>) -> Self {
        Self { rows }
    }

    /// Parse an uploaded workbook (xlsx / xls / ods)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ConvertError::Workbook(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ConvertError::Workbook("workbook has no worksheet".to_string()))?
            .map_err(|e| ConvertError::Workbook(e.to_string()))?;
        Ok(Self::from_range(&range))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ConvertError::Workbook(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ConvertError::Workbook("workbook has no worksheet".to_string()))?
            .map_err(|e| ConvertError::Workbook(e.to_string()))?;
        Ok(Self::from_range(&range))
    }

    /// Headerless CSV, every field kept as text
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ConvertError::Workbook(e.to_string()))?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Data::Empty
                        } else {
                            Data::String(field.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Ok(Self { rows })
    }

    /// calamine ranges start at the first used cell; pad back to A1
    fn from_range(range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<Data>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Data::Empty; col_offset];
            cells.extend(row.iter().cloned());
            rows.push(cells);
        }
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, row: usize) -> &[Data] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Out-of-range cells read as empty
    pub fn cell(&self, row: usize, col: usize) -> &Data {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }
}
