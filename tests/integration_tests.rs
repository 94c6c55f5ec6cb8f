use chrono::{Datelike, NaiveDate, Timelike};
use flate2::write::GzEncoder;
use flate2::Compression;
use isd_decoder::models::{StationId, YearRange};
use isd_decoder::processors::{CategorySelection, DecodeOptions, Grouping, MetDataFetcher, Period};
use isd_decoder::readers::{DirectorySource, StationTimeZones};
use isd_decoder::writers::{CsvTableWriter, ParquetWriter};
use isd_decoder::ProcessingError;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const STATION: &str = "722315-53917";

/// Mandatory section with the given date, time, temperature and dew point
/// slots, followed by `variable`
fn isd_line(date: &str, time: &str, temp: &str, dew: &str, variable: &str) -> String {
    let slots = [
        "0123", "722315", "53917", &date[0..4], &date[4..6], &date[6..8], &time[0..2],
        &time[2..4], "4", "+30033", "-090267", "FM-15", "+0001", "99999", "V020", "360", "1",
        "N", "0041", "1", "00610", "1", "M", "N", "016093", "1", "9", "9", temp, "1", dew, "1",
        "10268", "1",
    ];
    let line = slots.concat();
    assert_eq!(line.len(), 105);
    format!("{}{}", line, variable)
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Archive with a gzip file for 2014 at the root and a plain 2015 file in a
/// year directory, plus a station registry
fn archive(dir: &Path) -> MetDataFetcher<'static, StationTimeZones, DirectorySource> {
    let y2014 = [
        // 2014-01-01 03:00 UTC is still 2013 in local standard time
        isd_line("20140101", "0300", "+0050", "-0020", "ADDAA101000095MW1021"),
        isd_line("20140101", "0653", "+0078", "-0011", "ADDAA101000095REMSYN004"),
        isd_line("20140101", "0720", "+0072", "-0011", ""),
        isd_line("20140701", "1800", "+0200", "+0100", "ADDMW1021GA1011+003050991"),
        isd_line("20140702", "1800", "+9999", "+9999", ""),
        "TRUNCATED 722315".to_string(),
    ]
    .join("\n");
    fs::write(dir.join("722315-53917-2014.gz"), gzip(&y2014)).unwrap();

    let y2015 = [
        isd_line("20150315", "1200", "+0150", "+0050", "ADDAA101000095"),
        isd_line("20150315", "1200", "+0150", "+0050", "ADDAA101000095"),
        isd_line("20151231", "2000", "+0100", "+0010", "ADDAA1XX000095"),
    ]
    .join("\n");
    fs::create_dir(dir.join("2015")).unwrap();
    fs::write(dir.join("2015").join("722315-53917-2015"), y2015).unwrap();

    let registry = dir.join("stations.csv");
    fs::write(
        &registry,
        "id,name,tz_name\n722315-53917,NEW ORLEANS LAKEFRONT,America/Chicago\n",
    )
    .unwrap();

    MetDataFetcher::new(
        StationTimeZones::from_path(&registry).unwrap(),
        DirectorySource::new(dir),
    )
}

fn station() -> StationId {
    STATION.parse().unwrap()
}

fn years() -> YearRange {
    "2014:2015".parse().unwrap()
}

#[test]
fn test_full_decode_of_two_years() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let options = DecodeOptions::default().with_categories(CategorySelection::All);

    let data = fetcher.get_met_data(&station(), years(), &options).unwrap();
    let table = &data.table;

    // Record at 03:00 UTC on 1 Jan 2014 falls in 2013 locally and is trimmed
    assert_eq!(table.len(), 6);
    assert!(table.rows().iter().all(|r| r.id == STATION));
    assert!(table.times().iter().all(|t| (2014..=2015).contains(&t.year())));
    assert_eq!(
        table.rows()[0].time,
        NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, 53, 0)
            .unwrap()
    );

    let names = table.column_names();
    assert_eq!(
        names[..10].to_vec(),
        vec![
            "id", "time", "wd", "ws", "ceil_hgt", "visibility", "temp", "dew_point",
            "atmos_pres", "rh"
        ]
    );
    assert!(names.contains(&"aa1_1".to_string()));
    assert!(names.contains(&"ga1_3".to_string()));
    assert!(names.contains(&"mw1_2".to_string()));

    assert_eq!(data.report.files_read, 2);
    assert_eq!(data.report.skipped_records, 1);
    assert_eq!(data.report.duplicate_lines, 1);
    assert_eq!(data.report.catalog_mismatches.len(), 1);
    assert_eq!(data.report.catalog_mismatches[0].file, "722315-53917-2015");
    assert!(data.report.missing_years.is_empty());
    assert!(data.report.advisory.is_none());
}

#[test]
fn test_sentinels_become_nulls() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let data = fetcher
        .get_met_data(&station(), years(), &DecodeOptions::default())
        .unwrap();

    // Without a category selection only the mandatory columns and rh remain
    assert_eq!(data.table.len(), 6);
    assert!(data.table.additional_columns().is_empty());
    assert_eq!(data.table.column_names().len(), 10);

    let missing = data
        .table
        .rows()
        .iter()
        .find(|r| r.time.month() == 7 && r.time.day() == 2)
        .unwrap();
    assert_eq!(missing.temp, None);
    assert_eq!(missing.dew_point, None);
    assert_eq!(missing.rh, None);
    assert_eq!(missing.wd, Some(360.0));
}

#[test]
fn test_relative_humidity_and_local_time() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let data = fetcher
        .get_met_data(&station(), years(), &DecodeOptions::default())
        .unwrap();

    let july = data
        .table
        .rows()
        .iter()
        .find(|r| r.time.month() == 7 && r.time.day() == 1)
        .unwrap();
    // 18:00 UTC is 12:00 central standard time, even in summer
    assert_eq!(july.time.hour(), 12);
    assert_eq!(july.temp, Some(20.0));
    assert_eq!(july.rh, Some(52.5));

    let utc = fetcher
        .get_met_data(
            &station(),
            years(),
            &DecodeOptions::default().with_local_time(false),
        )
        .unwrap();
    assert!(utc
        .table
        .rows()
        .iter()
        .any(|r| r.time.month() == 7 && r.time.day() == 1 && r.time.hour() == 18));
}

#[test]
fn test_allow_list_drops_absent_categories() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let options = DecodeOptions::default()
        .with_categories(CategorySelection::from_list("MW1,KA1"))
        .with_relative_humidity(false);

    let data = fetcher.get_met_data(&station(), years(), &options).unwrap();
    let additional: Vec<String> = data
        .table
        .additional_columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(additional, vec!["mw1_1", "mw1_2"]);
    assert!(!data.table.has_column("rh"));
    assert_eq!(data.report.categories, vec!["MW1"]);
}

#[test]
fn test_hourly_fill_covers_every_hour() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let options = DecodeOptions::default().hourly(true).fill(true);

    let data = fetcher.get_met_data(&station(), years(), &options).unwrap();
    assert_eq!(data.table.len(), 8760 * 2);

    // 06:53 and 07:20 UTC share the 01:00 local hour; minimum temperature wins
    let first_obs = data
        .table
        .rows()
        .iter()
        .find(|r| !r.is_null())
        .unwrap();
    assert_eq!(first_obs.time.hour(), 1);
    assert_eq!(first_obs.temp, Some(7.2));

    let leap = fetcher
        .get_met_data(&station(), YearRange::single(2016).unwrap(), &options)
        .unwrap();
    assert_eq!(leap.table.len(), 8784);
    assert_eq!(leap.report.missing_years, vec![2016]);
    assert!(leap.table.rows().iter().all(|r| r.is_null() && r.id == STATION));
}

#[test]
fn test_coverage_count_is_independent_of_selection() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());

    let only_aa1 = fetcher
        .coverage(&station(), years(), Grouping::All, Some(&["AA1".to_string()]))
        .unwrap();
    let all = fetcher
        .coverage(&station(), years(), Grouping::All, None)
        .unwrap();
    assert_eq!(only_aa1.total("AA1"), all.total("AA1"));
    assert_eq!(only_aa1.count(&Period::ALL, "AA1"), Some(3));

    let by_year = fetcher
        .coverage(&station(), years(), Grouping::Year, None)
        .unwrap();
    let rows = by_year.long_rows();
    assert!(rows.iter().any(|r| r.category == "KA1" && r.count == 0));
    let periods: Vec<String> = by_year.periods().map(|p| p.to_string()).collect();
    assert_eq!(periods, vec!["2014", "2015"]);
}

#[test]
fn test_record_without_optional_data_in_full_mode() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("722315-53917-2014"),
        isd_line("20140601", "1200", "+0250", "+0150", ""),
    )
    .unwrap();
    let fetcher = MetDataFetcher::new(
        StationTimeZones::from_pairs([(STATION, "")]),
        DirectorySource::new(dir.path()),
    );

    let data = fetcher
        .get_met_data(
            &station(),
            YearRange::single(2014).unwrap(),
            &DecodeOptions::default().with_categories(CategorySelection::All),
        )
        .unwrap();
    assert_eq!(data.table.len(), 1);
    assert!(data.table.additional_columns().is_empty());
    assert!(data.report.advisory.is_some());
    assert_eq!(data.table.rows()[0].time.hour(), 12);
}

#[test]
fn test_argument_errors() {
    assert!(matches!(
        "20x4".parse::<YearRange>(),
        Err(ProcessingError::InvalidArgument(_))
    ));

    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let result = fetcher.get_met_data(
        &station(),
        years(),
        &DecodeOptions::default().fill(true),
    );
    assert!(matches!(result, Err(ProcessingError::InvalidArgument(_))));
}

#[test]
fn test_tables_written_to_disk() {
    let dir = TempDir::new().unwrap();
    let fetcher = archive(dir.path());
    let data = fetcher
        .get_met_data(
            &station(),
            years(),
            &DecodeOptions::default().with_categories(CategorySelection::All),
        )
        .unwrap();

    let parquet_path = dir.path().join("out.parquet");
    let writer = ParquetWriter::new().with_compression("zstd").unwrap();
    writer.write_table(&data.table, &parquet_path).unwrap();
    let info = writer.get_file_info(&parquet_path).unwrap();
    assert_eq!(info.total_rows, data.table.len() as i64);
    assert_eq!(info.columns, data.table.column_names());

    let csv_path = dir.path().join("out.csv");
    CsvTableWriter::new()
        .write_table(&data.table, &csv_path)
        .unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), data.table.len() + 1);
    assert!(text.starts_with("id,time,wd,"));
}
