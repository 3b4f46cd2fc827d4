use crate::config::DataConfig;
use crate::error::Result;
use crate::models::{DateOption, MeasurementRecord};
use crate::service::date_resolver::{decide_batch_date, DateDecision};
use crate::service::matcher::LedgerMatcher;
use crate::sheet::{extract_invoices, extract_measurements, load_reference_tables, LedgerWriter, Sheet};

/// One conversion request: BKHD is required, BM19 and the confirmed date are optional
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub bkhd: Vec<u8>,
    pub bm19: Option<Vec<u8>>,
    pub confirmed_date: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ConvertOutcome {
    /// The batch date needs a decision before anything is written
    Ambiguous { first: DateOption, second: DateOption },
    /// Filled UpSSE workbook
    Workbook(Vec<u8>),
}

/// BKHD (+ BM19) -> UpSSE conversion; reference tables are reloaded on every call
pub struct ConverterService {
    data: DataConfig,
}

impl ConverterService {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }

    pub fn convert(&self, req: &ConvertRequest) -> Result<ConvertOutcome> {
        // 1. invoices + date ambiguity
        let batch = extract_invoices(&Sheet::from_bytes(&req.bkhd)?)?;

        // 2. batch date
        let date = match decide_batch_date(&batch.date, req.confirmed_date.as_deref()) {
            DateDecision::Final(date) => date,
            DateDecision::NeedsConfirmation { first, second } => {
                tracing::info!(
                    "Ambiguous invoice date, asking for confirmation: {} / {}",
                    first.full,
                    second.full
                );
                return Ok(ConvertOutcome::Ambiguous { first, second });
            }
        };
        tracing::info!("Invoice date: '{}'", date);

        // 3. optional BM19
        let measurements = req
            .bm19
            .as_deref()
            .map(load_measurements)
            .unwrap_or_default();

        // 4. reference tables
        let tables = load_reference_tables(&self.data.dir);

        // 5. split lines into ledger rows
        let rows = LedgerMatcher::new(&tables, &measurements).build_rows(&batch.lines, &date);

        // 6. output workbook
        let bytes = LedgerWriter::with_template(&self.data.template_path()).write(&rows)?;
        Ok(ConvertOutcome::Workbook(bytes))
    }
}

fn load_measurements(bytes: &[u8]) -> Vec<MeasurementRecord> {
    match Sheet::from_bytes(bytes) {
        Ok(sheet) => extract_measurements(&sheet),
        Err(e) => {
            tracing::warn!("BM19 unreadable, continuing without measurements: {}", e);
            Vec::new()
        }
    }
}
