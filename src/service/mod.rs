pub mod converter;
pub mod date_resolver;
pub mod matcher;

pub use converter::{ConvertOutcome, ConvertRequest, ConverterService};
pub use date_resolver::{decide_batch_date, resolve_date, resolve_date_cell, DateDecision};
pub use matcher::{find_measurement, LedgerMatcher, LineSplit};
