use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seasonal volume correction factors of a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VcfFactors {
    pub winter: f64,
    pub summer: f64,
}

/// Product catalog entry (MaHH)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub code: String,
    pub vcf: VcfFactors,
}

/// Chart-of-accounts slots used by the ledger rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCodes {
    pub debit: String,          // TK nợ
    pub tax_credit: String,     // TK thuế có
    pub tax_debit: String,      // TK thuế nợ
    pub revenue: String,        // TK doanh thu
    pub inventory: String,      // TK kho
    pub cogs: String,           // TK giá vốn
    pub bvmt_revenue: String,   // TK doanh thu BVMT
}

/// Static lookup tables, keyed by upper-cased names (customers by MST key)
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub bvmt_rates: HashMap<String, BigDecimal>,
    pub warehouse_codes: HashMap<String, String>,
    /// warehouse -> product -> job code (mã vụ việc)
    pub job_codes: HashMap<String, HashMap<String, String>>,
    pub products: HashMap<String, ProductInfo>,
    pub accounts: AccountCodes,
    pub customers: HashMap<String, String>,
}

impl ReferenceTables {
    /// Environmental-tax unit rate, zero when the product is unknown
    pub fn bvmt_rate(&self, product: &str) -> BigDecimal {
        self.bvmt_rates.get(product).cloned().unwrap_or_else(BigDecimal::zero)
    }

    pub fn warehouse_code(&self, warehouse: &str) -> &str {
        self.warehouse_codes.get(warehouse).map(String::as_str).unwrap_or("")
    }

    pub fn product_code(&self, product: &str) -> &str {
        self.products.get(product).map(|p| p.code.as_str()).unwrap_or("")
    }

    pub fn job_code(&self, warehouse: &str, product: &str) -> &str {
        self.job_codes
            .get(warehouse)
            .and_then(|row| row.get(product))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn customer_code(&self, mst_key: &str) -> &str {
        self.customers.get(mst_key).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_fall_back_to_empty() {
        let mut tables = ReferenceTables::default();
        tables.job_codes.insert("KHO A".into(), HashMap::from([("DO".into(), "VV01".into())]));

        assert_eq!(tables.job_code("KHO A", "DO"), "VV01");
        assert_eq!(tables.job_code("KHO A", "XANG"), "");
        assert_eq!(tables.job_code("KHO B", "DO"), "");
        assert_eq!(tables.warehouse_code("KHO A"), "");
        assert_eq!(tables.product_code("DO"), "");
        assert_eq!(tables.customer_code("0101"), "");
        assert!(tables.bvmt_rate("DO").is_zero());
    }
}
