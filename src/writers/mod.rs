pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::CsvTableWriter;
pub use parquet_writer::{table_schema, table_to_batch, ParquetFileInfo, ParquetWriter};
