use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// One BKHD data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub customer_name: String,
    pub mst_key: String,            // normalized customer tax ID
    pub invoice_no: String,
    pub series: String,             // ký hiệu
    pub template: String,           // mẫu số
    pub unit: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub vat_raw: String,
    pub total_tax: BigDecimal,
    pub product: String,
    pub warehouse: String,
    pub total_amount: BigDecimal,
}

impl InvoiceLine {
    /// Invoice key used by the ledger: series prefix + last five digits of the number
    pub fn invoice_key(&self) -> String {
        let prefix: String = self.series.chars().take(5).collect();
        let digits: Vec<char> = self.invoice_no.chars().collect();
        let tail: String = digits[digits.len().saturating_sub(5)..].iter().collect();
        format!("{}{:0>5}", prefix, tail)
    }

    /// Template symbol followed by series symbol
    pub fn voucher_code(&self) -> String {
        format!("{}{}", self.template, self.series)
    }
}

/// One interpretation of an ambiguous day/month pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    pub d: u32,
    pub m: u32,
    pub full: String,
}

/// Outcome of disambiguating the batch date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateResolution {
    /// `DD/MM/YYYY`, or empty when the sheet carries no usable date
    Resolved(String),
    /// Both day/month orders are plausible; the caller has to pick one
    Ambiguous { first: DateOption, second: DateOption },
}

impl DateResolution {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, DateResolution::Ambiguous { .. })
    }

    /// The automatically chosen date, empty when ambiguous
    pub fn auto_date(&self) -> &str {
        match self {
            DateResolution::Resolved(date) => date,
            DateResolution::Ambiguous { .. } => "",
        }
    }
}

/// Extracted BKHD sheet: all lines share one date
#[derive(Debug, Clone)]
pub struct InvoiceBatch {
    pub lines: Vec<InvoiceLine>,
    pub date: DateResolution,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::Zero;

    fn line(series: &str, number: &str) -> InvoiceLine {
        InvoiceLine {
            customer_name: String::new(),
            mst_key: String::new(),
            invoice_no: number.to_string(),
            series: series.to_string(),
            template: "1".to_string(),
            unit: "Lít".to_string(),
            quantity: BigDecimal::zero(),
            unit_price: BigDecimal::zero(),
            vat_raw: String::new(),
            total_tax: BigDecimal::zero(),
            product: String::new(),
            warehouse: String::new(),
            total_amount: BigDecimal::zero(),
        }
    }

    #[test]
    fn invoice_key_pads_short_numbers() {
        assert_eq!(line("AB", "123").invoice_key(), "AB00123");
    }

    #[test]
    fn invoice_key_truncates_series_and_number() {
        assert_eq!(line("C24TAA", "0001234567").invoice_key(), "C24TA34567");
    }

    #[test]
    fn voucher_code_joins_template_and_series() {
        assert_eq!(line("C24TAA", "1").voucher_code(), "1C24TAA");
    }

    #[test]
    fn ambiguous_resolution_has_no_auto_date() {
        let res = DateResolution::Ambiguous {
            first: DateOption { d: 3, m: 7, full: "03/07/2024".into() },
            second: DateOption { d: 7, m: 3, full: "07/03/2024".into() },
        };
        assert!(res.is_ambiguous());
        assert_eq!(res.auto_date(), "");
    }
}
