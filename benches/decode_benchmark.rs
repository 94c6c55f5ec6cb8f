use chrono::{NaiveDate, TimeDelta};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use isd_decoder::models::{FieldCatalog, YearRange};
use isd_decoder::processors::{
    bucketize, fill_missing_hours, CategorySelection, CoverageSummarizer, DecodeOptions, Grouping,
    IsdDecoder, MandatoryDecoder,
};
use isd_decoder::readers::RecordSource;

/// Half-hourly synthetic records for a single station starting 2014-01-01
fn create_test_lines(count: usize) -> Vec<String> {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    (0..count)
        .map(|i| {
            let t = start + TimeDelta::minutes(30 * i as i64);
            let temp = format!("{:+05}", (i % 400) as i32 - 100);
            let date = t.format("%Y%m%d").to_string();
            let time = t.format("%H%M").to_string();
            let variable = match i % 3 {
                0 => "ADDAA101000095MW1021REMSYN004",
                1 => "ADDGA1011+003050991KA1120M-00951",
                _ => "",
            };
            let slots = [
                "0123", "722315", "53917", &date, &time, "4", "+30033", "-090267", "FM-15",
                "+0001", "99999", "V020", "360", "1", "N", "0041", "1", "00610", "1", "M", "N",
                "016093", "1", "9", "9", &temp, "1", "-0011", "1", "10268", "1", variable,
            ];
            slots.concat()
        })
        .collect()
}

fn bench_mandatory_decode(c: &mut Criterion) {
    let lines = create_test_lines(1000);
    let decoder = MandatoryDecoder::new();

    c.bench_function("mandatory_decode_1000", |b| {
        b.iter(|| {
            for (i, line) in lines.iter().enumerate() {
                let _ = black_box(decoder.decode(line, i + 1));
            }
        })
    });
}

fn bench_full_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_decode");

    for size in [1000, 17520] {
        let source = RecordSource::from_bytes("722315-53917-2014", create_test_lines(size).join("\n"));
        let decoder = IsdDecoder::new(
            DecodeOptions::default()
                .with_categories(CategorySelection::All)
                .hourly(true),
        );

        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                decoder
                    .decode_sources(None, std::slice::from_ref(source), Some("America/Chicago"), None)
                    .map(|outcome| black_box(outcome.table.len()))
            })
        });
    }

    group.finish();
}

fn bench_hourly(c: &mut Criterion) {
    let source = RecordSource::from_bytes("722315-53917-2014", create_test_lines(17520).join("\n"));
    let table = IsdDecoder::new(DecodeOptions::default())
        .decode_sources(None, &[source], None, None)
        .map(|o| o.table)
        .unwrap_or_default();
    let years = YearRange::single(2014).unwrap();

    c.bench_function("bucketize_and_fill_one_year", |b| {
        b.iter(|| {
            let bucketed = bucketize(black_box(table.clone()));
            fill_missing_hours(bucketed, "722315-53917", years)
        })
    });
}

fn bench_coverage(c: &mut Criterion) {
    let lines = create_test_lines(17520);
    let decoder = MandatoryDecoder::new();
    let records: Vec<_> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| decoder.decode(l, i + 1).ok())
        .collect();
    let summarizer = CoverageSummarizer::new(FieldCatalog::builtin());

    c.bench_function("coverage_by_month", |b| {
        b.iter(|| black_box(summarizer.summarize_records(&records, Grouping::YearMonth)))
    });
}

criterion_group!(
    benches,
    bench_mandatory_decode,
    bench_full_decode,
    bench_hourly,
    bench_coverage
);
criterion_main!(benches);
