use super::cell::{cell_clean, cell_f64, cell_label, cell_text};
use super::{Sheet, EMPTY};
use crate::error::{ConvertError, Result};
use crate::models::{InvoiceBatch, InvoiceLine};
use crate::normalize::{normalize_mst, quantity_decimal, to_decimal};
use crate::service::date_resolver::resolve_date_cell;
use calamine::Data;
use indexmap::IndexMap;

/// Only the first cells of a row are searched for the `STT` marker
const HEADER_SCAN_WIDTH: usize = 15;

/// BKHD columns, located by label text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceField {
    CustomerName,
    CustomerMst,
    Product,
    Warehouse,
    Quantity,
    UnitPrice,
    Unit,
    Amount,
    VatRate,
    TaxAmount,
    Template,
    Series,
    InvoiceNo,
    InvoiceDate,
}

impl InvoiceField {
    /// Matching order; a header cell can bind several fields
    pub const ALL: [InvoiceField; 14] = [
        InvoiceField::CustomerName,
        InvoiceField::CustomerMst,
        InvoiceField::Product,
        InvoiceField::Warehouse,
        InvoiceField::Quantity,
        InvoiceField::UnitPrice,
        InvoiceField::Unit,
        InvoiceField::Amount,
        InvoiceField::VatRate,
        InvoiceField::TaxAmount,
        InvoiceField::Template,
        InvoiceField::Series,
        InvoiceField::InvoiceNo,
        InvoiceField::InvoiceDate,
    ];

    /// Upper-case label searched for as a substring of the header cell
    pub fn label(self) -> &'static str {
        match self {
            InvoiceField::CustomerName => "TÊN KHÁCH HÀNG",
            InvoiceField::CustomerMst => "MST KHÁCH HÀNG",
            InvoiceField::Product => "MẶT HÀNG",
            InvoiceField::Warehouse => "KHO XUẤT HÀNG",
            InvoiceField::Quantity => "SỐ LƯỢNG",
            InvoiceField::UnitPrice => "ĐƠN GIÁ",
            InvoiceField::Unit => "ĐƠN VỊ TÍNH",
            InvoiceField::Amount => "THÀNH TIỀN",
            InvoiceField::VatRate => "VAT",
            InvoiceField::TaxAmount => "TIỀN THUẾ",
            InvoiceField::Template => "MẪU SỐ",
            InvoiceField::Series => "KÝ HIỆU",
            InvoiceField::InvoiceNo => "SỐ HÓA ĐƠN",
            InvoiceField::InvoiceDate => "NGÀY HÓA ĐƠN",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, InvoiceField::Warehouse)
    }
}

/// Semantic field -> column index, resolved from the header row
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    // binding order, as logged
    columns: IndexMap<InvoiceField, usize>,
}

impl ColumnMap {
    /// First matching header cell wins; fails listing every missing required label
    pub fn resolve(header: &[Data]) -> Result<Self> {
        let mut columns = IndexMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let text = cell_label(cell);
            for field in InvoiceField::ALL {
                if !columns.contains_key(&field) && text.contains(field.label()) {
                    columns.insert(field, idx);
                }
            }
        }

        let missing: Vec<String> = InvoiceField::ALL
            .iter()
            .filter(|f| f.is_required() && !columns.contains_key(*f))
            .map(|f| f.label().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConvertError::MissingColumns(missing));
        }

        tracing::debug!("BKHD columns: {:?}", columns);
        Ok(Self { columns })
    }

    pub fn get(&self, field: InvoiceField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Cell of `field` in `row`; unbound optional fields read as empty
    fn cell<'a>(&self, sheet: &'a Sheet, row: usize, field: InvoiceField) -> &'a Data {
        match self.get(field) {
            Some(col) => sheet.cell(row, col),
            None => &EMPTY,
        }
    }
}

fn find_header_row(sheet: &Sheet) -> Option<usize> {
    (0..sheet.height()).find(|&r| {
        sheet
            .row(r)
            .iter()
            .take(HEADER_SCAN_WIDTH)
            .any(|c| cell_label(c) == "STT")
    })
}

/// Subtotal / blank rows carry no ordinal in the first column
fn is_data_row(first_cell: &Data) -> bool {
    let stt = cell_text(first_cell).trim().to_lowercase();
    !(stt.is_empty() || stt == "nan" || stt.contains("cộng"))
}

fn read_line(sheet: &Sheet, cols: &ColumnMap, row: usize) -> InvoiceLine {
    let text = |f| cell_clean(cols.cell(sheet, row, f));
    let number = |f| cell_f64(cols.cell(sheet, row, f));

    InvoiceLine {
        customer_name: text(InvoiceField::CustomerName),
        mst_key: normalize_mst(&cell_text(cols.cell(sheet, row, InvoiceField::CustomerMst))),
        invoice_no: text(InvoiceField::InvoiceNo),
        series: text(InvoiceField::Series),
        template: text(InvoiceField::Template),
        unit: text(InvoiceField::Unit),
        quantity: quantity_decimal(number(InvoiceField::Quantity)),
        unit_price: to_decimal(number(InvoiceField::UnitPrice)),
        vat_raw: cell_text(cols.cell(sheet, row, InvoiceField::VatRate)).trim().to_string(),
        total_tax: to_decimal(number(InvoiceField::TaxAmount)),
        product: text(InvoiceField::Product),
        warehouse: text(InvoiceField::Warehouse),
        total_amount: to_decimal(number(InvoiceField::Amount)),
    }
}

/// Extract BKHD lines; data starts two rows under the `STT` header
pub fn extract_invoices(sheet: &Sheet) -> Result<InvoiceBatch> {
    let header = find_header_row(sheet).ok_or(ConvertError::MissingHeader)?;
    let cols = ColumnMap::resolve(sheet.row(header))?;

    let mut lines = Vec::new();
    let mut date = None;
    for row in header + 2..sheet.height() {
        if !is_data_row(sheet.cell(row, 0)) {
            continue;
        }
        if date.is_none() {
            date = Some(resolve_date_cell(cols.cell(sheet, row, InvoiceField::InvoiceDate)));
        }
        lines.push(read_line(sheet, &cols, row));
    }

    let date = date.unwrap_or_else(|| resolve_date_cell(&Data::Empty));
    tracing::info!(
        "BKHD: header at row {}, {} invoice lines, ambiguous date: {}",
        header + 1,
        lines.len(),
        date.is_ambiguous()
    );

    Ok(InvoiceBatch { lines, date })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateResolution;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn header() -> Vec<Data> {
        [
            "STT", "Ký hiệu", "Mẫu số", "Số hóa đơn", "Ngày hóa đơn", "Tên khách hàng",
            "MST khách hàng", "Mặt hàng", "Đơn vị tính", "Số lượng", "Đơn giá",
            "Thành tiền", "VAT", "Tiền thuế", "Kho xuất hàng",
        ]
        .iter()
        .map(|h| s(h))
        .collect()
    }

    fn data_row(stt: &str, date: f64) -> Vec<Data> {
        vec![
            s(stt), s("C24TAA"), s("1"), Data::Float(123.0), Data::Float(date),
            s("  Công ty   TNHH An "), s("0101-234567"), s("DO 0,05S-II"), s("Lít"),
            Data::Float(100.0004), Data::Float(20000.0), Data::Float(2_160_000.0), s("8%"),
            Data::Float(160_000.0), s("Kho Nam Định"),
        ]
    }

    fn sheet(rows: Vec<Vec<Data>>) -> Sheet {
        let mut all = vec![vec![s("BẢNG KÊ HÓA ĐƠN")], header(), vec![s("A"), s("B")]];
        all.extend(rows);
        Sheet::from_rows(all)
    }

    #[test]
    fn resolves_columns_and_lines() {
        // 45371 = 20/03/2024
        let batch = extract_invoices(&sheet(vec![
            data_row("1", 45371.0),
            vec![s("Cộng"), Data::Empty],
            vec![Data::Empty],
            data_row("2", 45000.0),
        ]))
        .unwrap();

        assert_eq!(batch.lines.len(), 2);
        assert_eq!(batch.date, DateResolution::Resolved("20/03/2024".into()));

        let line = &batch.lines[0];
        assert_eq!(line.customer_name, "Công ty TNHH An");
        assert_eq!(line.mst_key, "0101234567");
        assert_eq!(line.invoice_no, "123");
        assert_eq!(line.series, "C24TAA");
        assert_eq!(line.template, "1");
        assert_eq!(line.product, "DO 0,05S-II");
        assert_eq!(line.warehouse, "Kho Nam Định");
        assert_eq!(line.unit, "Lít");
        assert_eq!(line.quantity, BigDecimal::from(100));
        assert_eq!(line.unit_price, BigDecimal::from(20000));
        assert_eq!(line.vat_raw, "8%");
        assert_eq!(line.total_tax, BigDecimal::from(160_000));
        assert_eq!(line.total_amount, BigDecimal::from_str("2160000").unwrap());
    }

    #[test]
    fn header_cells_bind_first_match_only() {
        let cols = ColumnMap::resolve(&header()).unwrap();
        assert_eq!(cols.get(InvoiceField::InvoiceNo), Some(3));
        assert_eq!(cols.get(InvoiceField::InvoiceDate), Some(4));
        assert_eq!(cols.get(InvoiceField::CustomerName), Some(5));
        assert_eq!(cols.get(InvoiceField::CustomerMst), Some(6));
        assert_eq!(cols.get(InvoiceField::VatRate), Some(12));
        assert_eq!(cols.get(InvoiceField::Warehouse), Some(14));
    }

    #[test]
    fn missing_header_row_is_fatal() {
        let sheet = Sheet::from_rows(vec![vec![s("Số"), s("Tên")]]);
        assert!(matches!(extract_invoices(&sheet), Err(ConvertError::MissingHeader)));
    }

    #[test]
    fn header_marker_outside_scan_width_is_ignored() {
        let mut row = vec![Data::Empty; 15];
        row.push(s("STT"));
        let sheet = Sheet::from_rows(vec![row]);
        assert!(matches!(extract_invoices(&sheet), Err(ConvertError::MissingHeader)));
    }

    #[test]
    fn missing_required_columns_are_all_reported() {
        let header: Vec<Data> = header().into_iter().filter(|c| {
            let t = cell_label(c);
            t != "VAT" && t != "ĐƠN GIÁ"
        }).collect();
        let err = ColumnMap::resolve(&header).unwrap_err();
        let ConvertError::MissingColumns(missing) = err else {
            panic!("expected MissingColumns");
        };
        assert_eq!(missing, vec!["ĐƠN GIÁ".to_string(), "VAT".to_string()]);
    }

    #[test]
    fn warehouse_column_is_optional() {
        let header: Vec<Data> = header().into_iter().take(14).collect();
        let mut row = data_row("1", 45371.0);
        row.truncate(14);
        let sheet = Sheet::from_rows(vec![header, vec![], row]);
        let batch = extract_invoices(&sheet).unwrap();
        assert_eq!(batch.lines[0].warehouse, "");
    }

    #[test]
    fn date_comes_from_first_retained_row() {
        // 45476 = 03/07/2024, ambiguous
        let batch = extract_invoices(&sheet(vec![
            vec![s("nan"), Data::Empty, Data::Empty, Data::Empty, Data::Float(45371.0)],
            data_row("1", 45476.0),
        ]))
        .unwrap();
        assert!(batch.date.is_ambiguous());
        assert_eq!(batch.lines.len(), 1);
    }
}
