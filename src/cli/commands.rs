use crate::cli::args::{Cli, Commands, CoverageArgs, DecodeArgs, OutputFormat, SourceArgs};
use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{FieldCatalog, StationId, SubFieldKind, YearRange};
use crate::processors::{
    CategorySelection, DecodeReport, Grouping, MetDataFetcher, ParallelProcessor,
};
use crate::readers::{DirectorySource, RecordReader, StationTimeZones};
use crate::utils::filename::station_output_path;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvTableWriter, ParquetWriter};
use std::fs::File;
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose);
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Decode(args) => run_decode(&settings, &args),
        Commands::Coverage(args) => run_coverage(&settings, &args),
        Commands::Catalog { code } => run_catalog(code.as_deref()),
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen here
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("isd_decoder={}", level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn build_fetcher(
    settings: &Settings,
    source: &SourceArgs,
) -> Result<MetDataFetcher<'static, StationTimeZones, DirectorySource>> {
    let data_dir = source
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.data_dir.clone());
    let stations_file = source
        .stations_file
        .clone()
        .or_else(|| settings.stations_file.clone())
        .ok_or_else(|| {
            ProcessingError::Config(
                "No station registry: pass --stations-file or set stations_file".to_string(),
            )
        })?;

    let lookup = StationTimeZones::from_path(&stations_file)?;
    info!(
        "Loaded {} stations from {}, archive at {}",
        lookup.len(),
        stations_file.display(),
        data_dir.display()
    );

    Ok(MetDataFetcher::new(lookup, DirectorySource::new(data_dir))
        .with_reader(RecordReader::with_mmap(source.mmap || settings.use_mmap)))
}

fn run_decode(settings: &Settings, args: &DecodeArgs) -> Result<()> {
    let years: YearRange = args.source.years.parse()?;
    let stations = args
        .stations
        .iter()
        .map(|s| s.parse::<StationId>())
        .collect::<Result<Vec<_>>>()?;

    let mut options = settings.decode.clone();
    if args.full {
        options.categories = CategorySelection::All;
    } else if let Some(list) = &args.categories {
        options.categories = CategorySelection::from_list(list);
    }
    options.make_hourly |= args.hourly;
    options.fill_missing_hours |= args.fill;
    if args.no_rh {
        options.relative_humidity = false;
    }
    if args.utc {
        options.local_time = false;
    }
    options.validate()?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.output_dir.clone());
    std::fs::create_dir_all(&output_dir)?;

    let compression = args
        .compression
        .clone()
        .unwrap_or_else(|| settings.compression.clone());
    let parquet = ParquetWriter::new()
        .with_compression(&compression)?
        .with_row_group_size(settings.row_group_size);
    let csv = CsvTableWriter::new();

    let fetcher = build_fetcher(settings, &args.source)?;
    let workers = args.max_workers.unwrap_or(settings.max_workers);

    println!("Decoding {} station(s) for {}", stations.len(), years);
    println!("Output directory: {}", output_dir.display());
    println!("Workers: {}", workers);

    let progress = ProgressReporter::new(stations.len() as u64, "Decoding stations...", args.quiet);
    let results = ParallelProcessor::new(workers).process_stations(
        &fetcher,
        &stations,
        years,
        &options,
        |station, data| {
            let path = station_output_path(&output_dir, station, years, args.format.extension());
            match args.format {
                OutputFormat::Csv => csv.write_table(&data.table, &path)?,
                OutputFormat::Parquet => parquet.write_table(&data.table, &path)?,
            }
            progress.println(&format!(
                "{}: {} rows -> {}",
                station,
                data.table.len(),
                path.display()
            ));
            Ok(())
        },
        Some(&progress),
    )?;

    let mut total = DecodeReport::default();
    let mut rows = 0;
    for result in &results {
        if args.report {
            println!("\n{}", result.report.summary());
        }
        if let Some(error) = &result.error {
            println!("{} failed: {}", result.station, error);
        }
        rows += result.rows;
        total.merge(result.report.clone());
    }

    println!(
        "\nDecoded {} station(s): {} rows, {} records skipped, {} duplicates, {} catalog mismatches",
        results.len(),
        rows,
        total.skipped_records,
        total.duplicate_lines,
        total.total_mismatches()
    );

    if let Some(path) = &args.report_json {
        let reports: Vec<&DecodeReport> = results.iter().map(|r| &r.report).collect();
        serde_json::to_writer_pretty(File::create(path)?, &reports)?;
        info!("Decode reports written to {}", path.display());
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        return Err(ProcessingError::MissingData(format!(
            "{} of {} stations failed",
            failed,
            results.len()
        )));
    }
    Ok(())
}

fn run_coverage(settings: &Settings, args: &CoverageArgs) -> Result<()> {
    let station: StationId = args.station.parse()?;
    let years: YearRange = args.source.years.parse()?;
    let grouping: Grouping = args.by.parse()?;
    let selection = args.categories.as_deref().map(CategorySelection::from_list);
    let codes = selection.as_ref().and_then(CategorySelection::codes);

    let fetcher = build_fetcher(settings, &args.source)?;
    let report = fetcher.coverage(&station, years, grouping, codes)?;

    let writer = CsvTableWriter::new();
    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            if args.wide {
                writer.write_coverage_wide(&report, file)?;
            } else {
                writer.write_coverage_long(&report, file)?;
            }
            println!("{}", report.summary());
            println!("Coverage written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout().lock();
            if args.wide {
                writer.write_coverage_wide(&report, stdout)?;
            } else {
                writer.write_coverage_long(&report, stdout)?;
            }
        }
    }
    Ok(())
}

fn run_catalog(code: Option<&str>) -> Result<()> {
    let catalog = FieldCatalog::builtin();

    match code {
        Some(code) => {
            let code = code.to_uppercase();
            let descriptor = catalog.get(&code).ok_or_else(|| {
                ProcessingError::invalid_argument(format!("Unknown category code {}", code))
            })?;
            println!("{}: {}", descriptor.code, descriptor.description);
            println!("Payload width: {}", descriptor.payload_len());
            for (i, name) in descriptor.column_names().iter().enumerate() {
                let kind = match descriptor.sub_field_types[i] {
                    SubFieldKind::Numeric => "numeric",
                    SubFieldKind::Text => "text",
                };
                let scale = descriptor.sub_field_scales[i]
                    .map(|s| format!(" / {}", s))
                    .unwrap_or_default();
                println!(
                    "  {:<8} width {:>2}  {}{}",
                    name, descriptor.sub_field_lengths[i], kind, scale
                );
            }
        }
        None => {
            println!("{} categories:", catalog.len());
            for descriptor in catalog.iter() {
                println!(
                    "  {}  {:>2} fields  {:>3} chars  {}",
                    descriptor.code,
                    descriptor.field_count(),
                    descriptor.payload_len(),
                    descriptor.description
                );
            }
        }
    }
    Ok(())
}
