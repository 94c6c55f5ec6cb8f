use crate::error::{ProcessingError, Result};
use crate::models::{DecodedRecord, FieldCatalog};
use crate::processors::segment_decoder::SegmentIndex;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Time grouping of coverage counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    #[default]
    All,
    Year,
    YearMonth,
}

impl FromStr for Grouping {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Grouping::All),
            "year" => Ok(Grouping::Year),
            "month" | "year_month" | "year-month" => Ok(Grouping::YearMonth),
            other => Err(ProcessingError::invalid_argument(format!(
                "Unknown coverage grouping '{}', expected all, year or month",
                other
            ))),
        }
    }
}

/// Period key: everything, one year, or one month of one year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Period {
    pub const ALL: Period = Period {
        year: None,
        month: None,
    };

    pub fn of(time: NaiveDateTime, grouping: Grouping) -> Self {
        match grouping {
            Grouping::All => Self::ALL,
            Grouping::Year => Self {
                year: Some(time.year()),
                month: None,
            },
            Grouping::YearMonth => Self {
                year: Some(time.year()),
                month: Some(time.month()),
            },
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year, self.month) {
            (Some(y), Some(m)) => write!(f, "{:04}-{:02}", y, m),
            (Some(y), None) => write!(f, "{:04}", y),
            _ => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub period: Period,
    pub category: String,
    pub count: usize,
}

/// Per-period counts of records carrying each category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub grouping: Grouping,
    pub categories: Vec<String>,
    pub records: usize,
    counts: BTreeMap<Period, Vec<usize>>,
}

impl CoverageReport {
    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.counts.keys()
    }

    pub fn count(&self, period: &Period, category: &str) -> Option<usize> {
        let pos = self.categories.iter().position(|c| c == category)?;
        Some(self.counts.get(period).map_or(0, |row| row[pos]))
    }

    /// Count summed over all periods
    pub fn total(&self, category: &str) -> Option<usize> {
        let pos = self.categories.iter().position(|c| c == category)?;
        Some(self.counts.values().map(|row| row[pos]).sum())
    }

    /// Long format: one row per (period, category), zero counts included
    pub fn long_rows(&self) -> Vec<CoverageRow> {
        self.counts
            .iter()
            .flat_map(|(period, row)| {
                self.categories
                    .iter()
                    .zip(row)
                    .map(move |(category, &count)| CoverageRow {
                        period: *period,
                        category: category.clone(),
                        count,
                    })
            })
            .collect()
    }

    /// Wide format header: `period` followed by one column per category
    pub fn wide_header(&self) -> Vec<String> {
        std::iter::once("period".to_string())
            .chain(self.categories.iter().cloned())
            .collect()
    }

    /// Wide format rows: one per period
    pub fn wide_rows(&self) -> Vec<(Period, Vec<usize>)> {
        self.counts
            .iter()
            .map(|(period, row)| (*period, row.clone()))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("=== Coverage Report ===\n");
        summary.push_str(&format!("Records: {}\n", self.records));
        summary.push_str(&format!("Grouping: {:?}\n", self.grouping));

        let present: Vec<(&String, usize)> = self
            .categories
            .iter()
            .filter_map(|c| Some((c, self.total(c)?)))
            .filter(|(_, n)| *n > 0)
            .collect();
        summary.push_str(&format!(
            "Categories Present: {} of {}\n",
            present.len(),
            self.categories.len()
        ));
        for (code, count) in present {
            let percent = if self.records == 0 {
                0.0
            } else {
                100.0 * count as f64 / self.records as f64
            };
            summary.push_str(&format!("  {}: {} ({:.1}%)\n", code, count, percent));
        }
        summary
    }
}

/// Counts category occurrences without decoding sub-fields
pub struct CoverageSummarizer<'c> {
    catalog: &'c FieldCatalog,
    categories: Vec<String>,
}

impl<'c> CoverageSummarizer<'c> {
    /// Summarize every catalog category
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self {
            catalog,
            categories: catalog.codes().map(str::to_string).collect(),
        }
    }

    /// Restrict to the given codes; codes outside the catalog are ignored
    pub fn with_categories(mut self, codes: &[String]) -> Self {
        let mut selected = Vec::new();
        for code in codes.iter().map(|c| c.to_uppercase()) {
            if !self.catalog.contains(&code) {
                warn!("Category {} is not in the field catalog, ignoring", code);
            } else if !selected.contains(&code) {
                selected.push(code);
            }
        }
        self.categories = selected;
        self
    }

    /// Summarize (timestamp, additional-data remainder) pairs
    pub fn summarize<'a, I>(&self, entries: I, grouping: Grouping) -> CoverageReport
    where
        I: IntoIterator<Item = (NaiveDateTime, &'a str)>,
    {
        let mut counts: BTreeMap<Period, Vec<usize>> = BTreeMap::new();
        if grouping == Grouping::All {
            counts.insert(Period::ALL, vec![0; self.categories.len()]);
        }

        let mut records = 0;
        for (time, remainder) in entries {
            records += 1;
            let index = SegmentIndex::tokenize(remainder, self.catalog);
            let row = counts
                .entry(Period::of(time, grouping))
                .or_insert_with(|| vec![0; self.categories.len()]);
            for (slot, code) in row.iter_mut().zip(&self.categories) {
                if index.contains(code) {
                    *slot += 1;
                }
            }
        }

        CoverageReport {
            grouping,
            categories: self.categories.clone(),
            records,
            counts,
        }
    }

    /// Summarize decoded records by their UTC timestamps
    pub fn summarize_records(&self, records: &[DecodedRecord], grouping: Grouping) -> CoverageReport {
        self.summarize(
            records
                .iter()
                .map(|r| (r.time_utc, r.additional_data.as_str())),
            grouping,
        )
    }
}
