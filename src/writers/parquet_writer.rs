use crate::error::{ProcessingError, Result};
use crate::models::{Cell, ColumnKind, ObservationTable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE, MANDATORY_COLUMNS,
};
use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Arrow schema of a table: `id` text, `time` timestamp, then one float or
/// text column per remaining column
pub fn table_schema(table: &ObservationTable) -> Arc<Schema> {
    let mut fields = vec![
        Field::new(MANDATORY_COLUMNS[0], DataType::Utf8, false),
        Field::new(
            MANDATORY_COLUMNS[1],
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
    ];
    let value_columns = table.column_names().len() - 2 - table.additional_columns().len();
    for name in table.column_names().iter().skip(2).take(value_columns) {
        fields.push(Field::new(name, DataType::Float64, true));
    }
    for spec in table.additional_columns() {
        let data_type = match spec.kind {
            ColumnKind::Numeric => DataType::Float64,
            ColumnKind::Text => DataType::Utf8,
        };
        fields.push(Field::new(&spec.name, data_type, true));
    }
    Arc::new(Schema::new(fields))
}

/// Lay a table out as one Arrow record batch
pub fn table_to_batch(table: &ObservationTable) -> Result<RecordBatch> {
    let schema = table_schema(table);
    let column_count = schema.fields().len();
    let rows: Vec<Vec<Cell<'_>>> = (0..table.len())
        .filter_map(|i| table.row_cells(i))
        .collect();

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(column_count);
    for (c, field) in schema.fields().iter().enumerate() {
        let array: ArrayRef = match field.data_type() {
            DataType::Timestamp(_, _) => Arc::new(TimestampSecondArray::from(
                rows.iter()
                    .map(|row| match row[c] {
                        Cell::Time(t) => Some(t.and_utc().timestamp()),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            DataType::Float64 => Arc::new(Float64Array::from(
                rows.iter()
                    .map(|row| match row[c] {
                        Cell::Number(n) => Some(n),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            _ => Arc::new(StringArray::from(
                rows.iter()
                    .map(|row| match row[c] {
                        Cell::Text(s) => Some(s),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
        };
        columns.push(array);
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write a table; an empty table still produces a file carrying the schema
    pub fn write_table(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        let batch = table_to_batch(table)?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        if batch.num_rows() > 0 {
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();
        let columns = metadata
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            columns,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub columns: Vec<String>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.columns.len(),
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg
        )
    }
}
