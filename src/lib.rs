pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod service;
pub mod sheet;

pub use config::AppConfig;
pub use error::{ConvertError, Result};
pub use service::{ConvertOutcome, ConvertRequest, ConverterService};
