use super::cell::{cell_clean, cell_f64, cell_label, cell_measure, cell_text};
use super::Sheet;
use crate::models::MeasurementRecord;
use crate::normalize::quantity_decimal;

// BM19 column positions (F, G, H, I, M)
const COL_PRODUCT: usize = 5;
const COL_CUSTOMER: usize = 6;
const COL_TEMPERATURE: usize = 7;
const COL_DENSITY: usize = 8;
const COL_QUANTITY: usize = 12;

fn find_header_row(sheet: &Sheet) -> Option<usize> {
    (0..sheet.height()).find(|&r| {
        let labels: Vec<String> = sheet.row(r).iter().map(cell_label).collect();
        labels.iter().any(|l| l == "MẶT HÀNG") && labels.iter().any(|l| l == "KHÁCH HÀNG")
    })
}

/// BM19 temperature / density records; an unrecognised sheet yields none
pub fn extract_measurements(sheet: &Sheet) -> Vec<MeasurementRecord> {
    let Some(header) = find_header_row(sheet) else {
        tracing::warn!("BM19: header row with 'MẶT HÀNG' and 'KHÁCH HÀNG' not found, ignoring sheet");
        return Vec::new();
    };

    let records: Vec<MeasurementRecord> = (header + 1..sheet.height())
        .filter_map(|row| {
            let product = cell_clean(sheet.cell(row, COL_PRODUCT));
            if product.is_empty() {
                return None;
            }
            Some(MeasurementRecord {
                product: product.to_uppercase(),
                customer_name: cell_text(sheet.cell(row, COL_CUSTOMER)).trim().to_string(),
                temperature: cell_measure(sheet.cell(row, COL_TEMPERATURE)),
                density: cell_measure(sheet.cell(row, COL_DENSITY)),
                quantity: quantity_decimal(cell_f64(sheet.cell(row, COL_QUANTITY))),
            })
        })
        .collect();

    tracing::info!("BM19: {} measurement records", records.len());
    records
}
