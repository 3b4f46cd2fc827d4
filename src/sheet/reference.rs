use super::cell::{cell_clean, cell_f64, cell_text};
use super::Sheet;
use crate::models::{AccountCodes, ProductInfo, ReferenceTables, VcfFactors};
use crate::normalize::{normalize_mst, to_decimal};
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::path::Path;

pub const BVMT_FILE: &str = "BVMT.xlsx";
pub const WAREHOUSE_FILE: &str = "MaKho_MaVV.xlsx";
pub const PRODUCT_FILE: &str = "MaHH.xlsx";
pub const ACCOUNTS_FILE: &str = "DanhSachTaiKhoan.xlsx";
pub const CUSTOMER_FILE: &str = "DSKH.xlsx";

const PRODUCT_HEADER: &str = "TÊN MẶT HÀNG";
const WAREHOUSE_HEADER: &str = "TÊN KHO XUẤT HÀNG";

fn key(sheet: &Sheet, row: usize, col: usize) -> String {
    cell_clean(sheet.cell(row, col)).to_uppercase()
}

/// Environmental-tax unit rate per product (name, rate)
pub fn bvmt_rates_from(sheet: &Sheet) -> HashMap<String, BigDecimal> {
    (0..sheet.height())
        .filter_map(|r| {
            let name = key(sheet, r, 0);
            if name.is_empty() || name == PRODUCT_HEADER {
                return None;
            }
            Some((name, to_decimal(cell_f64(sheet.cell(r, 1)))))
        })
        .collect()
}

/// Warehouse name -> warehouse code
pub fn warehouse_codes_from(sheet: &Sheet) -> HashMap<String, String> {
    (0..sheet.height())
        .filter_map(|r| {
            let name = key(sheet, r, 0);
            if name.is_empty() || name == WAREHOUSE_HEADER {
                return None;
            }
            Some((name, cell_clean(sheet.cell(r, 1))))
        })
        .collect()
}

/// Job-code matrix: product names on the second row from column C, warehouses from the third row
pub fn job_codes_from(sheet: &Sheet) -> HashMap<String, HashMap<String, String>> {
    let mut matrix = HashMap::new();
    if sheet.height() < 2 {
        return matrix;
    }

    let products: Vec<(usize, String)> = (2..sheet.width())
        .map(|c| (c, key(sheet, 1, c)))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    for r in 2..sheet.height() {
        let warehouse = key(sheet, r, 0);
        if warehouse.is_empty() {
            continue;
        }
        let row: HashMap<String, String> = products
            .iter()
            .filter_map(|(c, product)| {
                let code = cell_clean(sheet.cell(r, *c));
                (!code.is_empty()).then(|| (product.clone(), code))
            })
            .collect();
        matrix.insert(warehouse, row);
    }
    matrix
}

/// Product catalog: name, code, winter VCF, summer VCF
pub fn products_from(sheet: &Sheet) -> HashMap<String, ProductInfo> {
    (0..sheet.height())
        .filter_map(|r| {
            let name = key(sheet, r, 0);
            if name.is_empty() || name == PRODUCT_HEADER {
                return None;
            }
            let info = ProductInfo {
                code: cell_text(sheet.cell(r, 1)).trim().to_string(),
                vcf: VcfFactors {
                    winter: cell_f64(sheet.cell(r, 2)),
                    summer: cell_f64(sheet.cell(r, 3)),
                },
            };
            Some((name, info))
        })
        .collect()
}

/// Account codes sit in column B at fixed rows
pub fn accounts_from(sheet: &Sheet) -> AccountCodes {
    let slot = |row: usize| cell_clean(sheet.cell(row, 1));
    AccountCodes {
        debit: slot(1),
        tax_credit: slot(2),
        tax_debit: slot(3),
        revenue: slot(4),
        inventory: slot(5),
        cogs: slot(6),
        bvmt_revenue: slot(9),
    }
}

/// Customer directory (header row, then MST in column B and ledger code in column C)
pub fn customers_from(sheet: &Sheet) -> HashMap<String, String> {
    (1..sheet.height())
        .filter_map(|r| {
            let mst = normalize_mst(&cell_text(sheet.cell(r, 1)));
            if mst.is_empty() {
                return None;
            }
            Some((mst, cell_text(sheet.cell(r, 2)).trim().to_string()))
        })
        .collect()
}

fn open_table(dir: &Path, file: &str) -> Option<Sheet> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::warn!("Reference table {} not found, using empty table", path.display());
        return None;
    }
    match Sheet::from_path(&path) {
        Ok(sheet) => Some(sheet),
        Err(e) => {
            tracing::warn!("Reference table {} unreadable: {}", path.display(), e);
            None
        }
    }
}

/// Load all reference tables from `dir`; missing files leave their table empty
pub fn load_reference_tables(dir: &Path) -> ReferenceTables {
    let mut tables = ReferenceTables::default();

    if let Some(sheet) = open_table(dir, BVMT_FILE) {
        tables.bvmt_rates = bvmt_rates_from(&sheet);
    }
    if let Some(sheet) = open_table(dir, WAREHOUSE_FILE) {
        tables.warehouse_codes = warehouse_codes_from(&sheet);
        tables.job_codes = job_codes_from(&sheet);
    }
    if let Some(sheet) = open_table(dir, PRODUCT_FILE) {
        tables.products = products_from(&sheet);
    }
    if let Some(sheet) = open_table(dir, ACCOUNTS_FILE) {
        tables.accounts = accounts_from(&sheet);
    }
    if let Some(sheet) = open_table(dir, CUSTOMER_FILE) {
        tables.customers = customers_from(&sheet);
    }

    tracing::info!(
        "Reference tables: {} BVMT rates, {} warehouses, {} products, {} customers",
        tables.bvmt_rates.len(),
        tables.warehouse_codes.len(),
        tables.products.len(),
        tables.customers.len()
    );
    tables
}
