use super::cell::cell_text;
use super::Sheet;
use crate::error::Result;
use crate::models::LedgerRow;
use bigdecimal::{BigDecimal, ToPrimitive};
use calamine::Data;
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::path::Path;

/// Rows of the template kept above the data (data starts on row 6)
pub const TEMPLATE_HEADER_ROWS: usize = 5;

pub const DATE_FORMAT: &str = "dd/mm/yyyy";
pub const TEXT_FORMAT: &str = "@";

// UpSSE column numbers (1-based, as in the import template)
pub mod column {
    pub const CUSTOMER_CODE: u16 = 1;
    pub const CUSTOMER_NAME: u16 = 2;
    pub const DATE: u16 = 3;
    pub const INVOICE_KEY: u16 = 4;
    pub const VOUCHER_CODE: u16 = 5;
    pub const DESCRIPTION: u16 = 6;
    pub const DEBIT_ACCOUNT: u16 = 7;
    pub const DENSITY: u16 = 11;
    pub const TEMPERATURE: u16 = 12;
    pub const TAX_CODE: u16 = 14;
    pub const TAX_AMOUNT: u16 = 15;
    pub const TAX_CREDIT_ACCOUNT: u16 = 16;
    pub const TAX_DEBIT_ACCOUNT: u16 = 17;
    pub const PRODUCT_CODE: u16 = 18;
    pub const UNIT: u16 = 19;
    pub const WAREHOUSE_CODE: u16 = 20;
    pub const QUANTITY: u16 = 21;
    pub const UNIT_PRICE: u16 = 22;
    pub const AMOUNT: u16 = 23;
    pub const REVENUE_ACCOUNT: u16 = 24;
    pub const INVENTORY_ACCOUNT: u16 = 25;
    pub const COGS_ACCOUNT: u16 = 26;
    pub const JOB_CODE: u16 = 28;
    pub const FLAG: u16 = 30;
}

fn to_f64(v: &BigDecimal) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

/// Writes ledger rows into a fresh workbook laid out like the UpSSE template
#[derive(Debug, Clone, Default)]
pub struct LedgerWriter {
    header_rows: Vec<Vec<Data>>,
}

impl LedgerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the header block of the template when it can be read
    pub fn with_template(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!("Template {} not found, writing without header rows", path.display());
            return Self::new();
        }
        match Sheet::from_path(path) {
            Ok(sheet) => Self {
                header_rows: (0..TEMPLATE_HEADER_ROWS.min(sheet.height()))
                    .map(|r| sheet.row(r).to_vec())
                    .collect(),
            },
            Err(e) => {
                tracing::warn!("Template {} unreadable: {}", path.display(), e);
                Self::new()
            }
        }
    }

    fn write_header(&self, ws: &mut Worksheet) -> Result<()> {
        for (r, row) in self.header_rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Data::Empty => {}
                    Data::Float(f) => {
                        ws.write_number(r, c, *f)?;
                    }
                    Data::Int(i) => {
                        ws.write_number(r, c, *i as f64)?;
                    }
                    Data::Bool(b) => {
                        ws.write_boolean(r, c, *b)?;
                    }
                    other => {
                        ws.write_string(r, c, cell_text(other))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Serialize `rows` (already in output order) to xlsx bytes
    pub fn write(&self, rows: &[LedgerRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format(DATE_FORMAT);
        let text_format = Format::new().set_num_format(TEXT_FORMAT);

        let ws = workbook.add_worksheet();
        self.write_header(ws)?;

        for (i, row) in rows.iter().enumerate() {
            let r = (TEMPLATE_HEADER_ROWS + i) as u32;
            let text = |ws: &mut Worksheet, col: u16, value: &str| -> Result<()> {
                if !value.is_empty() {
                    ws.write_string(r, col - 1, value)?;
                }
                Ok(())
            };
            let number = |ws: &mut Worksheet, col: u16, value: f64| -> Result<()> {
                ws.write_number(r, col - 1, value)?;
                Ok(())
            };

            text(ws, column::CUSTOMER_CODE, &row.customer_code)?;
            text(ws, column::CUSTOMER_NAME, &row.customer_name)?;
            write_date(ws, r, column::DATE - 1, &row.date, &date_format)?;
            text(ws, column::INVOICE_KEY, &row.invoice_key)?;
            text(ws, column::VOUCHER_CODE, &row.voucher_code)?;
            text(ws, column::DESCRIPTION, &row.description)?;
            text(ws, column::DEBIT_ACCOUNT, &row.debit_account)?;
            if let Some(density) = row.density {
                number(ws, column::DENSITY, density)?;
            }
            if let Some(temperature) = row.temperature {
                number(ws, column::TEMPERATURE, temperature)?;
            }
            ws.write_string_with_format(r, column::TAX_CODE - 1, &row.tax_code, &text_format)?;
            number(ws, column::TAX_AMOUNT, to_f64(&row.tax_amount))?;
            text(ws, column::TAX_CREDIT_ACCOUNT, &row.tax_credit_account)?;
            text(ws, column::TAX_DEBIT_ACCOUNT, &row.tax_debit_account)?;
            ws.write_string_with_format(r, column::PRODUCT_CODE - 1, &row.product_code, &text_format)?;
            text(ws, column::UNIT, &row.unit)?;
            text(ws, column::WAREHOUSE_CODE, &row.warehouse_code)?;
            number(ws, column::QUANTITY, to_f64(&row.quantity))?;
            number(ws, column::UNIT_PRICE, to_f64(&row.unit_price))?;
            number(ws, column::AMOUNT, to_f64(&row.amount))?;
            text(ws, column::REVENUE_ACCOUNT, &row.revenue_account)?;
            text(ws, column::INVENTORY_ACCOUNT, &row.inventory_account)?;
            text(ws, column::COGS_ACCOUNT, &row.cogs_account)?;
            text(ws, column::JOB_CODE, &row.job_code)?;
            number(ws, column::FLAG, f64::from(row.flag))?;
        }

        tracing::info!("Wrote {} ledger rows", rows.len());
        Ok(workbook.save_to_buffer()?)
    }
}

/// `DD/MM/YYYY` text becomes a real date; anything else stays text. Both get the date format.
fn write_date(ws: &mut Worksheet, row: u32, col: u16, value: &str, format: &Format) -> Result<()> {
    let value = value.trim();
    let parsed = NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .ok()
        .and_then(|d| ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8).ok());

    match parsed {
        Some(date) => {
            ws.write_datetime_with_format(row, col, &date, format)?;
        }
        None if value.is_empty() => {
            ws.write_blank(row, col, format)?;
        }
        None => {
            tracing::warn!("Date '{}' is not DD/MM/YYYY, written as text", value);
            ws.write_string_with_format(row, col, value, format)?;
        }
    }
    Ok(())
}
