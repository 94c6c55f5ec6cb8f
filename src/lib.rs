pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

#[cfg(test)]
mod test_support;

pub use config::Settings;
pub use error::{ProcessingError, Result};
pub use models::{FieldCatalog, ObservationTable, StationId, YearRange};
pub use processors::{DecodeOptions, IsdDecoder, MetData, MetDataFetcher};
