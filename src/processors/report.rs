use crate::error::ProcessingError;
use crate::utils::constants::MAX_MALFORMED_EXAMPLES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog mismatches seen for one category in one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchCount {
    pub file: String,
    pub category: String,
    pub count: usize,
}

/// Anomalies and counts gathered over one decode batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub station_id: Option<String>,
    pub files_read: usize,
    pub unreadable_files: Vec<String>,
    pub lines_read: usize,
    pub records_decoded: usize,
    pub skipped_records: usize,
    pub malformed_examples: Vec<String>,
    pub duplicate_lines: usize,
    pub catalog_mismatches: Vec<MismatchCount>,
    pub missing_years: Vec<i32>,
    pub categories: Vec<String>,
    pub advisory: Option<String>,
}

impl DecodeReport {
    pub fn for_station(station_id: &str) -> Self {
        Self {
            station_id: Some(station_id.to_string()),
            ..Self::default()
        }
    }

    /// Count a skipped record, keeping the first few reasons
    pub fn record_skipped(&mut self, source: &str, error: &ProcessingError) {
        self.skipped_records += 1;
        if self.malformed_examples.len() < MAX_MALFORMED_EXAMPLES {
            self.malformed_examples.push(format!("{}: {}", source, error));
        }
    }

    pub fn record_mismatch(&mut self, file: &str, category: &str) {
        match self
            .catalog_mismatches
            .iter_mut()
            .find(|m| m.file == file && m.category == category)
        {
            Some(entry) => entry.count += 1,
            None => self.catalog_mismatches.push(MismatchCount {
                file: file.to_string(),
                category: category.to_string(),
                count: 1,
            }),
        }
    }

    pub fn total_mismatches(&self) -> usize {
        self.catalog_mismatches.iter().map(|m| m.count).sum()
    }

    /// Mismatch totals per category across files
    pub fn mismatches_by_category(&self) -> BTreeMap<&str, usize> {
        let mut totals = BTreeMap::new();
        for m in &self.catalog_mismatches {
            *totals.entry(m.category.as_str()).or_insert(0) += m.count;
        }
        totals
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_records == 0
            && self.catalog_mismatches.is_empty()
            && self.unreadable_files.is_empty()
    }

    /// Fold another batch's report into this one
    pub fn merge(&mut self, other: DecodeReport) {
        self.files_read += other.files_read;
        self.unreadable_files.extend(other.unreadable_files);
        self.lines_read += other.lines_read;
        self.records_decoded += other.records_decoded;
        self.skipped_records += other.skipped_records;
        for example in other.malformed_examples {
            if self.malformed_examples.len() < MAX_MALFORMED_EXAMPLES {
                self.malformed_examples.push(example);
            }
        }
        self.duplicate_lines += other.duplicate_lines;
        for m in other.catalog_mismatches {
            for _ in 0..m.count {
                self.record_mismatch(&m.file, &m.category);
            }
        }
        self.missing_years.extend(other.missing_years);
        for code in other.categories {
            if !self.categories.contains(&code) {
                self.categories.push(code);
            }
        }
        if self.advisory.is_none() {
            self.advisory = other.advisory;
        }
    }

    /// Human-readable summary of the batch
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Decode Report ===\n");
        if let Some(station) = &self.station_id {
            summary.push_str(&format!("Station: {}\n", station));
        }
        if let Some(advisory) = &self.advisory {
            summary.push_str(&format!("Advisory: {}\n", advisory));
        }
        summary.push_str(&format!("Files Read: {}\n", self.files_read));
        if !self.unreadable_files.is_empty() {
            summary.push_str(&format!(
                "Unreadable Files: {}\n",
                self.unreadable_files.join(", ")
            ));
        }
        if !self.missing_years.is_empty() {
            let years: Vec<String> = self.missing_years.iter().map(|y| y.to_string()).collect();
            summary.push_str(&format!("Years Without Data: {}\n", years.join(", ")));
        }
        summary.push_str(&format!("Lines Read: {}\n", self.lines_read));
        summary.push_str(&format!("Duplicate Lines Removed: {}\n", self.duplicate_lines));

        let decodable = self.records_decoded + self.skipped_records;
        let percent = |n: usize| {
            if decodable == 0 {
                0.0
            } else {
                100.0 * n as f64 / decodable as f64
            }
        };
        summary.push_str(&format!(
            "Records Decoded: {} ({:.1}%)\n",
            self.records_decoded,
            percent(self.records_decoded)
        ));
        summary.push_str(&format!(
            "Records Skipped: {} ({:.1}%)\n",
            self.skipped_records,
            percent(self.skipped_records)
        ));

        if !self.categories.is_empty() {
            summary.push_str(&format!(
                "Additional Categories: {}\n",
                self.categories.join(" ")
            ));
        }

        summary.push_str(&format!(
            "\nCatalog Mismatches: {}\n",
            self.total_mismatches()
        ));
        for m in &self.catalog_mismatches {
            summary.push_str(&format!("  {} in {}: {}\n", m.category, m.file, m.count));
        }

        if !self.malformed_examples.is_empty() {
            summary.push_str(&format!(
                "\nFirst {} Skipped Records:\n",
                self.malformed_examples.len()
            ));
            for (i, example) in self.malformed_examples.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, example));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_counts_per_file_and_category() {
        let mut report = DecodeReport::default();
        report.record_mismatch("722315-53917-2014.gz", "AA1");
        report.record_mismatch("722315-53917-2014.gz", "AA1");
        report.record_mismatch("722315-53917-2015.gz", "AA1");
        report.record_mismatch("722315-53917-2015.gz", "KA1");

        assert_eq!(report.catalog_mismatches.len(), 3);
        assert_eq!(report.total_mismatches(), 4);
        assert_eq!(report.mismatches_by_category()["AA1"], 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_skipped_examples_are_capped() {
        let mut report = DecodeReport::default();
        for line in 0..(MAX_MALFORMED_EXAMPLES + 5) {
            report.record_skipped("file", &ProcessingError::malformed(line, "short"));
        }
        assert_eq!(report.skipped_records, MAX_MALFORMED_EXAMPLES + 5);
        assert_eq!(report.malformed_examples.len(), MAX_MALFORMED_EXAMPLES);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut report = DecodeReport::for_station("722315-53917");
        report.files_read = 2;
        report.records_decoded = 9;
        report.record_skipped("722315-53917-2014", &ProcessingError::malformed(4, "short"));
        report.advisory = Some("no time zone".to_string());

        let summary = report.summary();
        assert!(summary.contains("Station: 722315-53917"));
        assert!(summary.contains("Files Read: 2"));
        assert!(summary.contains("Records Decoded: 9 (90.0%)"));
        assert!(summary.contains("Records Skipped: 1 (10.0%)"));
        assert!(summary.contains("Advisory: no time zone"));
    }

    #[test]
    fn test_merge() {
        let mut a = DecodeReport::for_station("722315-53917");
        a.files_read = 1;
        a.categories = vec!["AA1".to_string()];
        a.record_mismatch("f1", "AA1");

        let mut b = DecodeReport::default();
        b.files_read = 2;
        b.categories = vec!["AA1".to_string(), "MW1".to_string()];
        b.record_mismatch("f1", "AA1");

        a.merge(b);
        assert_eq!(a.files_read, 3);
        assert_eq!(a.categories, vec!["AA1", "MW1"]);
        assert_eq!(a.catalog_mismatches[0].count, 2);
    }
}
