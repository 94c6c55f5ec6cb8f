use crate::models::StationId;
use crate::readers::record_reader::RecordSource;
use crate::utils::constants::MIN_SOURCE_BYTES;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates the archive file for one station-year
pub trait SourceProvider: Send + Sync {
    fn source(&self, station: &StationId, year: i32) -> Option<RecordSource>;
}

/// Archive files laid out under a local directory, as
/// `<id>-<year>[.gz]` either directly or inside a `<year>/` subdirectory.
/// Files of `MIN_SOURCE_BYTES` bytes or fewer count as absent.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, station: &StationId, year: i32) -> [PathBuf; 4] {
        let base = format!("{}-{}", station, year);
        let by_year = self.root.join(year.to_string());
        [
            self.root.join(format!("{}.gz", base)),
            self.root.join(&base),
            by_year.join(format!("{}.gz", base)),
            by_year.join(&base),
        ]
    }
}

impl SourceProvider for DirectorySource {
    fn source(&self, station: &StationId, year: i32) -> Option<RecordSource> {
        let found = self.candidates(station, year).into_iter().find(|path| {
            path.metadata()
                .map(|m| m.is_file() && m.len() > MIN_SOURCE_BYTES)
                .unwrap_or(false)
        });
        if found.is_none() {
            debug!("No archive file for {} in {}", station, year);
        }
        found.map(RecordSource::Path)
    }
}

/// Sources registered up front, keyed by station and year
#[derive(Debug, Clone, Default)]
pub struct StaticSources {
    sources: BTreeMap<(StationId, i32), RecordSource>,
}

impl StaticSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, station: StationId, year: i32, source: RecordSource) {
        self.sources.insert((station, year), source);
    }

    pub fn with(mut self, station: StationId, year: i32, source: RecordSource) -> Self {
        self.insert(station, year, source);
        self
    }
}

impl SourceProvider for StaticSources {
    fn source(&self, station: &StationId, year: i32) -> Option<RecordSource> {
        self.sources.get(&(station.clone(), year)).cloned()
    }
}
