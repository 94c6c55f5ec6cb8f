use crate::error::Result;
use crate::models::{Cell, ObservationTable};
use crate::processors::coverage::CoverageReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn cell_text(cell: &Cell<'_>) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Text(s) => s.to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Time(t) => t.format(TIME_FORMAT).to_string(),
    }
}

/// Writes tables as CSV with a header row; nulls are empty fields
#[derive(Debug, Clone, Default)]
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_table(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        self.write_table_to(table, File::create(path)?)
    }

    pub fn write_table_to<W: Write>(&self, table: &ObservationTable, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(table.column_names())?;
        for i in 0..table.len() {
            if let Some(cells) = table.row_cells(i) {
                writer.write_record(cells.iter().map(cell_text))?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Coverage in long format: `period,category,count`
    pub fn write_coverage_long<W: Write>(&self, report: &CoverageReport, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["period", "category", "count"])?;
        for row in report.long_rows() {
            writer.write_record([
                row.period.to_string(),
                row.category,
                row.count.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Coverage in wide format: one column per category
    pub fn write_coverage_wide<W: Write>(&self, report: &CoverageReport, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(report.wide_header())?;
        for (period, counts) in report.wide_rows() {
            let mut record = vec![period.to_string()];
            record.extend(counts.iter().map(|c| c.to_string()));
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
