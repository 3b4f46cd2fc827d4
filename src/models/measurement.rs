use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// One BM19 row (temperature / density readings per delivery)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub product: String,        // upper-cased
    pub customer_name: String,
    pub temperature: Option<f64>,
    pub density: Option<f64>,
    pub quantity: BigDecimal,   // rounded to 3 decimals
}
