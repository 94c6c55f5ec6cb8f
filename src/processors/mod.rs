pub mod coverage;
pub mod decoder;
pub mod hourly;
pub mod humidity;
pub mod mandatory_decoder;
pub mod parallel_processor;
pub mod report;
pub mod segment_decoder;
pub mod temporal;

pub use coverage::{CoverageReport, CoverageRow, CoverageSummarizer, Grouping, Period};
pub use decoder::{DecodeOptions, DecodeOutcome, IsdDecoder, MetData, MetDataFetcher};
pub use hourly::{bucketize, fill_missing_hours, round_to_hour};
pub use humidity::{add_relative_humidity, relative_humidity};
pub use mandatory_decoder::{FixedWidthLayout, MandatoryDecoder};
pub use parallel_processor::{ParallelProcessor, StationResult};
pub use report::{DecodeReport, MismatchCount};
pub use segment_decoder::{
    additional_remainder, count_categories, decode_category, select_categories,
    CategorySelection, CategoryValues, SegmentIndex,
};
pub use temporal::{utc_instant, TemporalNormalizer};
