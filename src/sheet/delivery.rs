use super::cell::{cell_clean, cell_label, cell_text};
use super::Sheet;
use crate::normalize::is_blank;
use std::collections::HashMap;

/// Invoice key used to join delivery notes: digits before any `.`, last five, zero-padded
pub fn delivery_key(raw_invoice: &str) -> String {
    let head = raw_invoice.split('.').next().unwrap_or("");
    let chars: Vec<char> = head.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(5)..].iter().collect();
    format!("{:0>5}", tail)
}

fn is_vehicle_label(label: &str) -> bool {
    label.contains("PHƯƠNG TIỆN") || label.contains("BIỂN SỐ")
}

/// Invoice key -> vehicle plate from a BKPX sheet
pub fn extract_delivery_from_sheet(sheet: &Sheet) -> HashMap<String, String> {
    let mut map = HashMap::new();

    // 1. header row: a cell reading exactly "PHƯƠNG TIỆN" or "BIỂN SỐ"
    let header = (0..sheet.height()).find(|&r| {
        sheet
            .row(r)
            .iter()
            .map(cell_label)
            .any(|l| l == "PHƯƠNG TIỆN" || l == "BIỂN SỐ")
    });
    let Some(header) = header else {
        return map;
    };

    // 2. columns; later header cells override earlier ones
    let mut col_invoice = None;
    let mut col_vehicle = None;
    for (idx, cell) in sheet.row(header).iter().enumerate() {
        let label = cell_label(cell);
        if label.contains("HÓA ĐƠN") || label.contains("HĐ") {
            col_invoice = Some(idx);
        }
        if is_vehicle_label(&label) || label.contains("XE") {
            col_vehicle = Some(idx);
        }
    }
    let (Some(col_invoice), Some(col_vehicle)) = (col_invoice, col_vehicle) else {
        return map;
    };

    // 3. rows
    for row in header + 1..sheet.height() {
        let raw = cell_text(sheet.cell(row, col_invoice));
        let raw = raw.trim();
        if is_blank(raw) {
            continue;
        }
        map.insert(delivery_key(raw), cell_clean(sheet.cell(row, col_vehicle)));
    }
    map
}

/// BKPX upload: workbook first, CSV as fallback; unreadable input maps nothing
pub fn extract_delivery(bytes: &[u8]) -> HashMap<String, String> {
    let sheet = match Sheet::from_bytes(bytes) {
        Ok(sheet) => sheet,
        Err(e) => match Sheet::from_csv(bytes) {
            Ok(sheet) => sheet,
            Err(csv_err) => {
                tracing::warn!("BKPX unreadable as workbook ({}) or CSV ({})", e, csv_err);
                return HashMap::new();
            }
        },
    };
    let map = extract_delivery_from_sheet(&sheet);
    tracing::info!("BKPX: {} vehicle assignments", map.len());
    map
}
