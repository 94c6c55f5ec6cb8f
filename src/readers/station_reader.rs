use crate::error::Result;
use crate::models::StationId;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Resolves the IANA time zone name of a station
pub trait StationLookup: Send + Sync {
    /// Whether the registry knows the station at all
    fn contains(&self, station: &StationId) -> bool;

    /// Zone name of a known station; `None` when the registry has none for it
    fn time_zone(&self, station: &StationId) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct StationRow {
    id: String,
    #[serde(default)]
    tz_name: String,
}

/// Station registry read from a CSV with `id` and `tz_name` columns
#[derive(Debug, Clone, Default)]
pub struct StationTimeZones {
    zones: HashMap<String, Option<String>>,
}

impl StationTimeZones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut registry = Self::new();
        for (id, tz) in pairs {
            registry.insert(id.into(), tz.into());
        }
        registry
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Extra columns are ignored; an empty `tz_name` marks a station
    /// without a known zone
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut registry = Self::new();
        for row in csv.deserialize() {
            let row: StationRow = row?;
            registry.insert(row.id, row.tz_name);
        }
        Ok(registry)
    }

    fn insert(&mut self, id: String, tz_name: String) {
        let tz = Some(tz_name).filter(|t| !t.trim().is_empty());
        self.zones.insert(id.trim().to_string(), tz);
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl StationLookup for StationTimeZones {
    fn contains(&self, station: &StationId) -> bool {
        self.zones.contains_key(&station.to_string())
    }

    fn time_zone(&self, station: &StationId) -> Option<String> {
        self.zones.get(&station.to_string()).cloned().flatten()
    }
}
