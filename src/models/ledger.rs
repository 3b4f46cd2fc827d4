use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Which half of the split an output row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Commercial goods entry (price and amount net of BVMT)
    Goods,
    /// Environmental protection tax entry
    EnvironmentalTax,
}

/// One UpSSE ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub kind: EntryKind,
    pub customer_code: String,
    pub customer_name: String,
    pub date: String,
    pub invoice_key: String,
    pub voucher_code: String,
    pub description: String,
    pub debit_account: String,
    pub density: Option<f64>,
    pub temperature: Option<f64>,
    pub tax_code: String,
    pub tax_amount: BigDecimal,
    pub tax_credit_account: String,
    pub tax_debit_account: String,
    pub product_code: String,
    pub unit: String,
    pub warehouse_code: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub amount: BigDecimal,
    pub revenue_account: String,
    pub inventory_account: String,
    pub cogs_account: String,
    pub job_code: String,
    pub flag: u8,
}
