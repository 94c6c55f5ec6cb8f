pub mod record_reader;
pub mod source_provider;
pub mod station_reader;

pub use record_reader::{lines_from_bytes, RecordReader, RecordSource};
pub use source_provider::{DirectorySource, SourceProvider, StaticSources};
pub use station_reader::{StationLookup, StationTimeZones};
