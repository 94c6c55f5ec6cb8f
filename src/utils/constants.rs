/// Slot widths of the mandatory section, in record order
pub const COLUMN_WIDTHS: [usize; 34] = [
    4, 6, 5, 4, 2, 2, 2, 2, 1, 6, 7, 5, 5, 5, 4, 3, 1, 1, 4, 1, 5, 1, 1, 1, 6, 1, 1, 1, 5, 1, 5,
    1, 5, 1,
];

/// Total width of the mandatory section
pub const MANDATORY_SECTION_WIDTH: usize = 105;

const fn sum_widths(widths: &[usize]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < widths.len() {
        total += widths[i];
        i += 1;
    }
    total
}

const _: () = assert!(sum_widths(&COLUMN_WIDTHS) == MANDATORY_SECTION_WIDTH);

/// Zero-based slot indices of the usable mandatory fields
pub mod slots {
    pub const USAF: usize = 1;
    pub const WBAN: usize = 2;
    pub const YEAR: usize = 3;
    pub const MONTH: usize = 4;
    pub const DAY: usize = 5;
    pub const HOUR: usize = 6;
    pub const MINUTE: usize = 7;
    pub const LATITUDE: usize = 9;
    pub const LONGITUDE: usize = 10;
    pub const ELEVATION: usize = 12;
    pub const WIND_DIRECTION: usize = 15;
    pub const WIND_SPEED: usize = 18;
    pub const CEILING_HEIGHT: usize = 20;
    pub const VISIBILITY: usize = 24;
    pub const TEMPERATURE: usize = 28;
    pub const DEW_POINT: usize = 30;
    pub const PRESSURE: usize = 32;
}

/// Raw sentinel values meaning "not observed"
pub mod sentinels {
    pub const LATITUDE: i64 = 99999;
    pub const LONGITUDE: i64 = 999999;
    pub const ELEVATION: i64 = 9999;
    pub const WIND_DIRECTION: i64 = 999;
    pub const WIND_SPEED: i64 = 9999;
    pub const CEILING_HEIGHT: i64 = 99999;
    pub const VISIBILITY: i64 = 999999;
    pub const TEMPERATURE: i64 = 9999;
    pub const DEW_POINT: i64 = 9999;
    pub const PRESSURE: i64 = 99999;
}

/// Section markers in the variable part of a record
pub const ADDITIONAL_DATA_MARKER: &str = "ADD";
pub const REMARKS_MARKER: &str = "REM";
pub const ELEMENT_QUALITY_MARKER: &str = "EQD";
pub const ORIGINAL_OBSERVATION_MARKER: &str = "QNN";

/// Length of a category code (two letters plus a variant digit)
pub const CATEGORY_CODE_LEN: usize = 3;

/// Output column names of the fixed schema, in order
pub const MANDATORY_COLUMNS: [&str; 9] = [
    "id",
    "time",
    "wd",
    "ws",
    "ceil_hgt",
    "visibility",
    "temp",
    "dew_point",
    "atmos_pres",
];
pub const RELATIVE_HUMIDITY_COLUMN: &str = "rh";

/// Valid year bounds for requests
pub const MIN_YEAR: i32 = 1901;
pub const MAX_YEAR: i32 = 2100;

/// Files at or below this size are treated as absent
pub const MIN_SOURCE_BYTES: u64 = 1;

/// Number of malformed-record examples kept in a report
pub const MAX_MALFORMED_EXAMPLES: usize = 10;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_table_sums_to_section_width() {
        assert_eq!(COLUMN_WIDTHS.iter().sum::<usize>(), MANDATORY_SECTION_WIDTH);
        assert!(COLUMN_WIDTHS.iter().all(|&w| w > 0));
    }
}
