use crate::error::{ProcessingError, Result};
use crate::models::{
    DecodedRecord, FieldCatalog, Observation, ObservationTable, ObservationTableBuilder,
    StationId, YearRange,
};
use crate::processors::coverage::{CoverageReport, CoverageSummarizer, Grouping};
use crate::processors::hourly::{bucketize, fill_missing_hours};
use crate::processors::humidity::add_relative_humidity;
use crate::processors::mandatory_decoder::MandatoryDecoder;
use crate::processors::report::DecodeReport;
use crate::processors::segment_decoder::{
    count_categories, decode_category, select_categories, CategorySelection, SegmentIndex,
};
use crate::processors::temporal::TemporalNormalizer;
use crate::readers::{RecordReader, RecordSource, SourceProvider, StationLookup};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Post-processing switches for a decode batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub categories: CategorySelection,
    pub make_hourly: bool,
    pub fill_missing_hours: bool,
    pub relative_humidity: bool,
    pub local_time: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            categories: CategorySelection::None,
            make_hourly: false,
            fill_missing_hours: false,
            relative_humidity: true,
            local_time: true,
        }
    }
}

impl DecodeOptions {
    pub fn with_categories(mut self, categories: CategorySelection) -> Self {
        self.categories = categories;
        self
    }

    pub fn hourly(mut self, make_hourly: bool) -> Self {
        self.make_hourly = make_hourly;
        self
    }

    pub fn fill(mut self, fill_missing_hours: bool) -> Self {
        self.fill_missing_hours = fill_missing_hours;
        self
    }

    pub fn with_relative_humidity(mut self, relative_humidity: bool) -> Self {
        self.relative_humidity = relative_humidity;
        self
    }

    pub fn with_local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.fill_missing_hours && !self.make_hourly {
            return Err(ProcessingError::invalid_argument(
                "Filling missing hours requires hourly bucketing",
            ));
        }
        Ok(())
    }
}

/// Table, decoded records and anomaly report of one batch
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub table: ObservationTable,
    pub records: Vec<DecodedRecord>,
    pub report: DecodeReport,
}

pub type MetData = DecodeOutcome;

/// Decodes a batch of archive files into one observation table
pub struct IsdDecoder<'c> {
    catalog: &'c FieldCatalog,
    mandatory: MandatoryDecoder,
    reader: RecordReader,
    options: DecodeOptions,
}

impl IsdDecoder<'static> {
    pub fn new(options: DecodeOptions) -> Self {
        Self::with_catalog(FieldCatalog::builtin(), options)
    }
}

impl<'c> IsdDecoder<'c> {
    pub fn with_catalog(catalog: &'c FieldCatalog, options: DecodeOptions) -> Self {
        Self {
            catalog,
            mandatory: MandatoryDecoder::new(),
            reader: RecordReader::new(),
            options,
        }
    }

    pub fn with_reader(mut self, reader: RecordReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn catalog(&self) -> &'c FieldCatalog {
        self.catalog
    }

    /// Read every source and decode mandatory sections.
    ///
    /// Lines repeated verbatim across the batch are kept once. Unreadable
    /// files and malformed records are counted in the report and skipped.
    /// Returns the records with the index of the source each came from.
    pub fn read_records(
        &self,
        sources: &[RecordSource],
        report: &mut DecodeReport,
    ) -> (Vec<DecodedRecord>, Vec<usize>) {
        let mut records = Vec::new();
        let mut origins = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (source_index, source) in sources.iter().enumerate() {
            let name = source.name();
            let lines = match self.reader.read_lines(source) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", name, e);
                    report.unreadable_files.push(name);
                    continue;
                }
            };
            report.files_read += 1;
            debug!("Read {} lines from {}", lines.len(), name);

            for (i, line) in lines.into_iter().enumerate() {
                report.lines_read += 1;
                if seen.contains(&line) {
                    report.duplicate_lines += 1;
                    continue;
                }

                match self.mandatory.decode(&line, i + 1) {
                    Ok(record) => {
                        records.push(record);
                        origins.push(source_index);
                    }
                    Err(e) => {
                        debug!("Skipping record in {}: {}", name, e);
                        report.record_skipped(&name, &e);
                    }
                }
                seen.insert(line);
            }
        }

        report.records_decoded = records.len();
        (records, origins)
    }

    /// Decode a batch into a table.
    ///
    /// `time_zone` shifts timestamps to local standard time when local time
    /// is enabled; `years` trims rows to those calendar years and is required
    /// for filling missing hours.
    pub fn decode_sources(
        &self,
        station: Option<&StationId>,
        sources: &[RecordSource],
        time_zone: Option<&str>,
        years: Option<YearRange>,
    ) -> Result<DecodeOutcome> {
        self.options.validate()?;
        if self.options.fill_missing_hours && years.is_none() {
            return Err(ProcessingError::invalid_argument(
                "Filling missing hours requires a year range",
            ));
        }

        let mut report = match station {
            Some(id) => DecodeReport::for_station(&id.to_string()),
            None => DecodeReport::default(),
        };
        let (records, origins) = self.read_records(sources, &mut report);
        let source_names: Vec<String> = sources.iter().map(RecordSource::name).collect();

        let indexes: Vec<SegmentIndex> = records
            .iter()
            .map(|r| SegmentIndex::tokenize(&r.additional_data, self.catalog))
            .collect();
        let counts = count_categories(&indexes, self.catalog);
        let selected = select_categories(self.catalog, &counts, &self.options.categories);
        report.categories = selected.iter().map(|d| d.code.clone()).collect();

        let normalizer = if self.options.local_time {
            TemporalNormalizer::from_name(time_zone)
        } else {
            TemporalNormalizer::utc()
        };

        let column_names: Vec<Vec<String>> = selected.iter().map(|d| d.column_names()).collect();
        let mut builder = ObservationTableBuilder::with_capacity(records.len());

        for ((record, index), &origin) in records.iter().zip(&indexes).zip(&origins) {
            let time = normalizer.to_local_standard(record.time_utc);
            let base = Observation::from_mandatory(&record.mandatory, time);

            let mut pairs = Vec::new();
            for (descriptor, names) in selected.iter().zip(&column_names) {
                let decoded = decode_category(descriptor, index.payload(&descriptor.code));
                for mismatch in &decoded.mismatches {
                    debug!(
                        "{} line {}: {}",
                        source_names[origin], record.line_number, mismatch
                    );
                    report.record_mismatch(&source_names[origin], &descriptor.code);
                }
                pairs.extend(names.iter().cloned().zip(decoded.values));
            }
            builder.push(base, pairs);
        }

        let specs = selected.iter().flat_map(|d| d.column_specs()).collect();
        let mut table = builder.build(specs);
        table.sort_by_time();

        if self.options.make_hourly {
            table = bucketize(table);
        }
        if let Some(range) = years {
            table.retain_years(|year| range.contains(year));
        }
        if let (true, Some(range)) = (self.options.fill_missing_hours, years) {
            let id = station
                .map(StationId::to_string)
                .or_else(|| records.first().map(|r| r.mandatory.station_id()))
                .unwrap_or_default();
            table = fill_missing_hours(table, &id, range);
        }
        if self.options.relative_humidity {
            add_relative_humidity(&mut table);
        }

        info!(
            "Decoded {} records into {} rows ({} skipped, {} duplicates, {} catalog mismatches)",
            report.records_decoded,
            table.len(),
            report.skipped_records,
            report.duplicate_lines,
            report.total_mismatches()
        );

        Ok(DecodeOutcome {
            table,
            records,
            report,
        })
    }
}

/// Fetches and decodes station-years through a station registry and a
/// source provider
pub struct MetDataFetcher<'c, L, P> {
    lookup: L,
    provider: P,
    reader: RecordReader,
    catalog: &'c FieldCatalog,
}

impl<L: StationLookup, P: SourceProvider> MetDataFetcher<'static, L, P> {
    pub fn new(lookup: L, provider: P) -> Self {
        Self {
            lookup,
            provider,
            reader: RecordReader::new(),
            catalog: FieldCatalog::builtin(),
        }
    }
}

impl<'c, L: StationLookup, P: SourceProvider> MetDataFetcher<'c, L, P> {
    pub fn with_catalog<'n>(self, catalog: &'n FieldCatalog) -> MetDataFetcher<'n, L, P> {
        MetDataFetcher {
            lookup: self.lookup,
            provider: self.provider,
            reader: self.reader,
            catalog,
        }
    }

    pub fn with_reader(mut self, reader: RecordReader) -> Self {
        self.reader = reader;
        self
    }

    /// Sources for each requested year, plus the years with none
    fn sources(&self, station: &StationId, years: YearRange) -> (Vec<RecordSource>, Vec<i32>) {
        let mut sources = Vec::new();
        let mut missing = Vec::new();
        for year in years.years() {
            match self.provider.source(station, year) {
                Some(source) => sources.push(source),
                None => missing.push(year),
            }
        }
        (sources, missing)
    }

    /// Decode one station over a span of years.
    ///
    /// An unknown station yields an empty table with an advisory rather than
    /// an error.
    pub fn get_met_data(
        &self,
        station: &StationId,
        years: YearRange,
        options: &DecodeOptions,
    ) -> Result<MetData> {
        options.validate()?;

        if !self.lookup.contains(station) {
            warn!("Station {} is not in the station registry", station);
            let mut report = DecodeReport::for_station(&station.to_string());
            report.advisory = Some(format!("station {} is not in the registry", station));
            let mut table = ObservationTable::empty();
            table.set_includes_rh(options.relative_humidity);
            return Ok(MetData {
                table,
                records: Vec::new(),
                report,
            });
        }

        let time_zone = self.lookup.time_zone(station);
        let (sources, missing) = self.sources(station, years);
        info!(
            "Fetching {} for {}: {} of {} years available",
            station,
            years,
            sources.len(),
            years.len()
        );

        let decoder =
            IsdDecoder::with_catalog(self.catalog, options.clone()).with_reader(self.reader.clone());
        let mut outcome =
            decoder.decode_sources(Some(station), &sources, time_zone.as_deref(), Some(years))?;

        outcome.report.missing_years = missing;
        let zone_known = time_zone
            .as_deref()
            .and_then(|name| name.trim().parse::<chrono_tz::Tz>().ok())
            .is_some();
        if options.local_time && !zone_known {
            outcome.report.advisory = Some(format!(
                "no usable time zone for {}, timestamps are UTC",
                station
            ));
        }
        Ok(outcome)
    }

    /// Per-period category counts for one station over a span of years,
    /// periods taken in local standard time
    pub fn coverage(
        &self,
        station: &StationId,
        years: YearRange,
        grouping: Grouping,
        categories: Option<&[String]>,
    ) -> Result<CoverageReport> {
        let mut summarizer = CoverageSummarizer::new(self.catalog);
        if let Some(codes) = categories {
            summarizer = summarizer.with_categories(codes);
        }

        if !self.lookup.contains(station) {
            warn!("Station {} is not in the station registry", station);
            return Ok(summarizer.summarize(Vec::new(), grouping));
        }

        let normalizer = TemporalNormalizer::from_name(self.lookup.time_zone(station).as_deref());
        let (sources, _) = self.sources(station, years);
        let decoder = IsdDecoder::with_catalog(self.catalog, DecodeOptions::default())
            .with_reader(self.reader.clone());
        let mut report = DecodeReport::for_station(&station.to_string());
        let (records, _) = decoder.read_records(&sources, &mut report);

        let entries = records.iter().filter_map(|r| {
            let local = normalizer.to_local_standard(r.time_utc);
            years
                .contains(local.year())
                .then_some((local, r.additional_data.as_str()))
        });
        Ok(summarizer.summarize(entries, grouping))
    }
}
