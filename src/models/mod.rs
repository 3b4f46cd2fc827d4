pub mod invoice;
pub mod ledger;
pub mod measurement;
pub mod reference;

pub use invoice::{DateOption, DateResolution, InvoiceBatch, InvoiceLine};
pub use ledger::{EntryKind, LedgerRow};
pub use measurement::MeasurementRecord;
pub use reference::{AccountCodes, ProductInfo, ReferenceTables, VcfFactors};
