use crate::models::{EntryKind, InvoiceLine, LedgerRow, MeasurementRecord, ReferenceTables};
use crate::normalize::{format_tax_code, name_similarity, parse_vat_rate};
use bigdecimal::{BigDecimal, Zero};
use rayon::prelude::*;

/// Minimum customer-name similarity for a BM19 record to count as the same delivery
pub const MATCH_THRESHOLD: f64 = 0.9;

/// Product code carried by every environmental-tax row
pub const BVMT_PRODUCT_CODE: &str = "TMT";

/// Amounts of one invoice line after separating the environmental tax
#[derive(Debug, Clone, PartialEq)]
pub struct LineSplit {
    pub bvmt_rate: BigDecimal,         // đơn giá BVMT
    pub bvmt_amount: BigDecimal,       // tiền thuế BVMT = quantity * rate
    pub bvmt_vat: BigDecimal,          // thuế trên BVMT = bvmt_amount * vat
    pub goods_tax: BigDecimal,
    pub goods_amount: BigDecimal,
    pub goods_unit_price: BigDecimal,
}

impl LineSplit {
    pub fn compute(line: &InvoiceLine, bvmt_rate: BigDecimal, vat: &BigDecimal) -> Self {
        let bvmt_amount = &line.quantity * &bvmt_rate;
        let bvmt_vat = &bvmt_amount * vat;
        Self {
            goods_tax: &line.total_tax - &bvmt_vat,
            goods_amount: &line.total_amount - &bvmt_amount,
            goods_unit_price: &line.unit_price - &bvmt_rate,
            bvmt_rate,
            bvmt_amount,
            bvmt_vat,
        }
    }
}

/// Best BM19 record for a line: same product and quantity, closest customer name
pub fn find_measurement<'m>(
    product_key: &str,
    line: &InvoiceLine,
    measurements: &'m [MeasurementRecord],
) -> Option<&'m MeasurementRecord> {
    let mut best: Option<(&MeasurementRecord, f64)> = None;
    for record in measurements
        .iter()
        .filter(|m| m.product == product_key && m.quantity == line.quantity)
    {
        let score = name_similarity(&line.customer_name, &record.customer_name);
        let is_better = match best {
            None => score > 0.0,
            Some((_, best_score)) => score > best_score,
        };
        if is_better {
            best = Some((record, score));
        }
    }

    best.filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .map(|(record, _)| record)
}

/// Everything resolved for one invoice line before the rows are emitted
#[derive(Debug)]
struct LinePlan<'a> {
    line: &'a InvoiceLine,
    measurement: Option<&'a MeasurementRecord>,
    split: LineSplit,
    customer_code: String,
    product_code: String,
    warehouse_code: String,
    job_code: String,
    tax_code: String,
}

/// Builds the UpSSE rows: one goods row and one BVMT row per invoice line
pub struct LedgerMatcher<'a> {
    tables: &'a ReferenceTables,
    measurements: &'a [MeasurementRecord],
}

impl<'a> LedgerMatcher<'a> {
    pub fn new(tables: &'a ReferenceTables, measurements: &'a [MeasurementRecord]) -> Self {
        Self { tables, measurements }
    }

    fn plan(&self, line: &'a InvoiceLine) -> LinePlan<'a> {
        let product_key = line.product.trim().to_uppercase();
        let warehouse_key = line.warehouse.trim().to_uppercase();

        // 1. measurement lookup
        let measurement = find_measurement(&product_key, line, self.measurements);

        // 2. tax split
        let vat = parse_vat_rate(&line.vat_raw);
        let split = LineSplit::compute(line, self.tables.bvmt_rate(&product_key), &vat);

        // 3. code resolution
        LinePlan {
            line,
            measurement,
            split,
            customer_code: self.tables.customer_code(&line.mst_key).to_string(),
            product_code: self.tables.product_code(&product_key).to_string(),
            warehouse_code: self.tables.warehouse_code(&warehouse_key).to_string(),
            job_code: self.tables.job_code(&warehouse_key, &product_key).to_string(),
            tax_code: format_tax_code(&line.vat_raw),
        }
    }

    /// Fields shared by the goods row and the BVMT row of a line
    fn base_row(&self, plan: &LinePlan, kind: EntryKind, date: &str) -> LedgerRow {
        let accounts = &self.tables.accounts;
        LedgerRow {
            kind,
            customer_code: plan.customer_code.clone(),
            customer_name: plan.line.customer_name.clone(),
            date: date.to_string(),
            invoice_key: plan.line.invoice_key(),
            voucher_code: plan.line.voucher_code(),
            description: String::new(),
            debit_account: accounts.debit.clone(),
            density: None,
            temperature: None,
            tax_code: plan.tax_code.clone(),
            tax_amount: BigDecimal::zero(),
            tax_credit_account: accounts.tax_credit.clone(),
            tax_debit_account: accounts.tax_debit.clone(),
            product_code: String::new(),
            unit: plan.line.unit.clone(),
            warehouse_code: plan.warehouse_code.clone(),
            quantity: plan.line.quantity.clone(),
            unit_price: BigDecimal::zero(),
            amount: BigDecimal::zero(),
            revenue_account: String::new(),
            inventory_account: accounts.inventory.clone(),
            cogs_account: accounts.cogs.clone(),
            job_code: plan.job_code.clone(),
            flag: 1,
        }
    }

    fn goods_row(&self, plan: &LinePlan, date: &str) -> LedgerRow {
        let line = plan.line;
        LedgerRow {
            description: format!(
                "Xuất bán {} theo HĐ {} số lượng {} lít",
                line.product, line.invoice_no, line.quantity
            ),
            density: plan.measurement.and_then(|m| m.density),
            temperature: plan.measurement.and_then(|m| m.temperature),
            tax_amount: plan.split.goods_tax.clone(),
            product_code: plan.product_code.clone(),
            unit_price: plan.split.goods_unit_price.clone(),
            amount: plan.split.goods_amount.clone(),
            revenue_account: self.tables.accounts.revenue.clone(),
            ..self.base_row(plan, EntryKind::Goods, date)
        }
    }

    fn tax_row(&self, plan: &LinePlan, date: &str) -> LedgerRow {
        LedgerRow {
            tax_amount: plan.split.bvmt_vat.clone(),
            product_code: BVMT_PRODUCT_CODE.to_string(),
            unit_price: plan.split.bvmt_rate.clone(),
            amount: plan.split.bvmt_amount.clone(),
            revenue_account: self.tables.accounts.bvmt_revenue.clone(),
            ..self.base_row(plan, EntryKind::EnvironmentalTax, date)
        }
    }

    /// All goods rows in invoice order, then all BVMT rows in the same order
    pub fn build_rows(&self, lines: &'a [InvoiceLine], date: &str) -> Vec<LedgerRow> {
        // Phase 1: per-line lookups (independent, order preserved)
        let plans: Vec<LinePlan> = lines.par_iter().map(|line| self.plan(line)).collect();

        let matched = plans.iter().filter(|p| p.measurement.is_some()).count();
        tracing::info!(
            "Matched BM19 records for {}/{} invoice lines",
            matched,
            plans.len()
        );

        // Phase 2: goods rows
        let mut rows: Vec<LedgerRow> = Vec::with_capacity(plans.len() * 2);
        rows.extend(plans.iter().map(|p| self.goods_row(p, date)));

        // Phase 3: BVMT rows
        rows.extend(plans.iter().map(|p| self.tax_row(p, date)));

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountCodes, ProductInfo};
    use crate::normalize::{quantity_decimal, to_decimal};
    use std::collections::HashMap;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn line(customer: &str, product: &str, qty: f64, number: &str) -> InvoiceLine {
        InvoiceLine {
            customer_name: customer.to_string(),
            mst_key: "0101234567".to_string(),
            invoice_no: number.to_string(),
            series: "C24TAA".to_string(),
            template: "1".to_string(),
            unit: "Lít".to_string(),
            quantity: quantity_decimal(qty),
            unit_price: dec("21500"),
            vat_raw: "8%".to_string(),
            total_tax: dec("172000"),
            product: product.to_string(),
            warehouse: "Kho Nam Định".to_string(),
            total_amount: dec("2322000"),
        }
    }

    fn record(customer: &str, product: &str, qty: f64, temp: f64) -> MeasurementRecord {
        MeasurementRecord {
            product: product.to_string(),
            customer_name: customer.to_string(),
            temperature: Some(temp),
            density: Some(0.84),
            quantity: quantity_decimal(qty),
        }
    }

    fn tables() -> ReferenceTables {
        ReferenceTables {
            bvmt_rates: HashMap::from([("DO".to_string(), dec("1000"))]),
            warehouse_codes: HashMap::from([("KHO NAM ĐỊNH".to_string(), "K01".to_string())]),
            job_codes: HashMap::from([(
                "KHO NAM ĐỊNH".to_string(),
                HashMap::from([("DO".to_string(), "VV-DO".to_string())]),
            )]),
            products: HashMap::from([(
                "DO".to_string(),
                ProductInfo { code: "DO005".to_string(), ..Default::default() },
            )]),
            accounts: AccountCodes {
                debit: "131".into(),
                tax_credit: "33311".into(),
                tax_debit: "131".into(),
                revenue: "5111".into(),
                inventory: "1561".into(),
                cogs: "632".into(),
                bvmt_revenue: "33381".into(),
            },
            customers: HashMap::from([("0101234567".to_string(), "KH001".to_string())]),
        }
    }

    #[test]
    fn split_conserves_tax_and_amount() {
        let l = line("Cty An", "DO", 100.0, "1");
        let split = LineSplit::compute(&l, dec("1000"), &dec("0.08"));
        assert_eq!(split.bvmt_amount, dec("100000"));
        assert_eq!(split.bvmt_vat, dec("8000"));
        assert_eq!(split.goods_tax, dec("164000"));
        assert_eq!(split.goods_amount, dec("2222000"));
        assert_eq!(split.goods_unit_price, dec("20500"));
        assert_eq!(&split.goods_tax + &split.bvmt_vat, l.total_tax);
        assert_eq!(&split.goods_amount + &split.bvmt_amount, l.total_amount);
    }

    #[test]
    fn split_conserves_totals_for_fractional_inputs() {
        for (qty, rate, vat) in [(1234.567, "1900", "10%"), (0.001, "2000", "0.08"), (77.7, "0", "KCT")] {
            let mut l = line("Cty An", "DO", qty, "1");
            l.total_tax = to_decimal(98765.4321);
            l.total_amount = to_decimal(1_234_567.89);
            let split = LineSplit::compute(&l, dec(rate), &parse_vat_rate(vat));
            assert_eq!(&split.goods_tax + &split.bvmt_vat, l.total_tax);
            assert_eq!(&split.goods_amount + &split.bvmt_amount, l.total_amount);
        }
    }

    #[test]
    fn measurement_requires_close_customer_name() {
        let l = line("A B C D E F G H I J K L M N O P Q R S T", "DO", 100.0, "1");
        // 19 of 20 tokens shared -> 0.95
        let close = record("A B C D E F G H I J K L M N O P Q R S", "DO", 100.0, 25.0);
        // 17 of 20 tokens shared -> 0.85
        let far = record("A B C D E F G H I J K L M N O P Q", "DO", 100.0, 30.0);

        let found = find_measurement("DO", &l, std::slice::from_ref(&close));
        assert_eq!(found.map(|m| m.temperature), Some(Some(25.0)));
        assert!(find_measurement("DO", &l, std::slice::from_ref(&far)).is_none());

        let records = [far.clone(), close.clone()];
        let found = find_measurement("DO", &l, &records);
        assert_eq!(found.and_then(|m| m.temperature), Some(25.0));
    }

    #[test]
    fn measurement_requires_same_product_and_quantity() {
        let l = line("Cty TNHH An", "DO", 100.0, "1");
        let records = [
            record("Công ty TNHH An", "XANG", 100.0, 20.0),
            record("Cty TNHH An", "DO", 100.001, 21.0),
        ];
        assert!(find_measurement("DO", &l, &records).is_none());

        let same = [record("Cty TNHH An", "DO", 100.0004, 22.0)];
        assert_eq!(find_measurement("DO", &l, &same).and_then(|m| m.temperature), Some(22.0));
    }

    #[test]
    fn rows_come_in_two_passes() {
        let tables = tables();
        let lines = vec![
            line("Cty An", "DO", 100.0, "123"),
            line("Cty Bình", "Xăng RON95", 50.0, "124"),
            line("Cty Cường", "do", 10.0, "125"),
        ];
        let rows = LedgerMatcher::new(&tables, &[]).build_rows(&lines, "20/03/2024");

        assert_eq!(rows.len(), 6);
        let kinds: Vec<EntryKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(&kinds[..3], &[EntryKind::Goods; 3]);
        assert_eq!(&kinds[3..], &[EntryKind::EnvironmentalTax; 3]);
        let keys: Vec<&str> = rows.iter().map(|r| r.invoice_key.as_str()).collect();
        assert_eq!(keys, ["C24TA00123", "C24TA00124", "C24TA00125", "C24TA00123", "C24TA00124", "C24TA00125"]);
        assert!(rows.iter().all(|r| r.flag == 1 && r.date == "20/03/2024"));
    }

    #[test]
    fn goods_and_tax_rows_carry_split_values_and_codes() {
        let tables = tables();
        let measurements = [record("Cty An", "DO", 100.0, 27.5)];
        let lines = vec![line("Cty An", "DO", 100.0, "123")];
        let rows = LedgerMatcher::new(&tables, &measurements).build_rows(&lines, "20/03/2024");
        let (goods, tax) = (&rows[0], &rows[1]);

        assert_eq!(goods.customer_code, "KH001");
        assert_eq!(goods.voucher_code, "1C24TAA");
        assert_eq!(goods.description, "Xuất bán DO theo HĐ 123 số lượng 100 lít");
        assert_eq!(goods.temperature, Some(27.5));
        assert_eq!(goods.density, Some(0.84));
        assert_eq!(goods.tax_code, "08");
        assert_eq!(goods.tax_amount, dec("164000"));
        assert_eq!(goods.product_code, "DO005");
        assert_eq!(goods.warehouse_code, "K01");
        assert_eq!(goods.job_code, "VV-DO");
        assert_eq!(goods.unit_price, dec("20500"));
        assert_eq!(goods.amount, dec("2222000"));
        assert_eq!(goods.revenue_account, "5111");

        assert_eq!(tax.description, "");
        assert_eq!(tax.product_code, BVMT_PRODUCT_CODE);
        assert_eq!(tax.temperature, None);
        assert_eq!(tax.tax_amount, dec("8000"));
        assert_eq!(tax.unit_price, dec("1000"));
        assert_eq!(tax.amount, dec("100000"));
        assert_eq!(tax.revenue_account, "33381");
        assert_eq!(tax.inventory_account, "1561");
        assert_eq!(tax.job_code, "VV-DO");
        assert_eq!(tax.quantity, dec("100"));

        assert_eq!(&goods.tax_amount + &tax.tax_amount, lines[0].total_tax);
        assert_eq!(&goods.amount + &tax.amount, lines[0].total_amount);
    }

    #[test]
    fn unknown_codes_resolve_empty_and_rate_zero() {
        let tables = tables();
        let mut l = line("Cty An", "Dầu hỏa", 10.0, "9");
        l.mst_key = "999".into();
        l.warehouse = "Kho lạ".into();
        let rows = LedgerMatcher::new(&tables, &[]).build_rows(std::slice::from_ref(&l), "");
        let (goods, tax) = (&rows[0], &rows[1]);

        assert_eq!(goods.customer_code, "");
        assert_eq!(goods.product_code, "");
        assert_eq!(goods.warehouse_code, "");
        assert_eq!(goods.job_code, "");
        assert_eq!(goods.temperature, None);
        assert_eq!(goods.amount, l.total_amount);
        assert!(tax.amount.is_zero());
        assert!(tax.tax_amount.is_zero());
    }
}
