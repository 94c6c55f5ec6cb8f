use crate::error::{ProcessingError, Result};
use crate::models::{StationId, YearRange};
use crate::processors::decoder::{DecodeOptions, MetData, MetDataFetcher};
use crate::processors::report::DecodeReport;
use crate::readers::{SourceProvider, StationLookup};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

/// Outcome of one station in a multi-station run
#[derive(Debug, Clone)]
pub struct StationResult {
    pub station: StationId,
    pub rows: usize,
    pub report: DecodeReport,
    pub error: Option<String>,
}

impl StationResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decodes many stations concurrently, one station per task
pub struct ParallelProcessor {
    max_workers: usize,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetch every station and hand each table to `sink` as soon as it is
    /// decoded. A failing station is recorded in its result and does not stop
    /// the others. Results come back in station order.
    pub fn process_stations<L, P, F>(
        &self,
        fetcher: &MetDataFetcher<'_, L, P>,
        stations: &[StationId],
        years: YearRange,
        options: &DecodeOptions,
        sink: F,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<StationResult>>
    where
        L: StationLookup,
        P: SourceProvider,
        F: Fn(&StationId, &MetData) -> Result<()> + Sync + Send,
    {
        options.validate()?;
        let processed = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_message(&format!("Decoding {} stations...", stations.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let mut results: Vec<StationResult> = pool.install(|| {
            stations
                .par_iter()
                .map(|station| {
                    let outcome = fetcher
                        .get_met_data(station, years, options)
                        .and_then(|data| sink(station, &data).map(|_| data));

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.station_finished(station, count as u64);
                    }

                    match outcome {
                        Ok(data) => StationResult {
                            station: station.clone(),
                            rows: data.table.len(),
                            report: data.report,
                            error: None,
                        },
                        Err(e) => {
                            error!("Station {} failed: {}", station, e);
                            StationResult {
                                station: station.clone(),
                                rows: 0,
                                report: DecodeReport::for_station(&station.to_string()),
                                error: Some(e.to_string()),
                            }
                        }
                    }
                })
                .collect()
        });

        results.sort_by(|a, b| a.station.cmp(&b.station));

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        info!(
            "Processed {} stations ({} failed)",
            results.len(),
            failed
        );
        if let Some(p) = progress {
            p.finish_with_message(&format!("Processed {} stations", results.len()));
        }

        Ok(results)
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
