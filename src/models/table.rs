use crate::models::observation::{FieldValue, Observation};
use crate::utils::constants::{MANDATORY_COLUMNS, RELATIVE_HUMIDITY_COLUMN};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// Schema entry for an additional-data column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub category: Option<String>,
}

/// Borrowed view of one table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Null,
    Text(&'a str),
    Number(f64),
    Time(NaiveDateTime),
}

impl<'a> From<Option<&'a FieldValue>> for Cell<'a> {
    fn from(value: Option<&'a FieldValue>) -> Self {
        match value {
            None => Cell::Null,
            Some(FieldValue::Number(n)) => Cell::Number(*n),
            Some(FieldValue::Text(s)) => Cell::Text(s),
        }
    }
}

impl From<Option<f64>> for Cell<'_> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Number)
    }
}

/// Decoded observations with a fixed mandatory schema followed by the
/// additional columns discovered for the batch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    additional_columns: Vec<ColumnSpec>,
    include_rh: bool,
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(additional_columns: Vec<ColumnSpec>, rows: Vec<Observation>) -> Self {
        Self {
            additional_columns,
            include_rh: false,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Observation] {
        &mut self.rows
    }

    pub fn additional_columns(&self) -> &[ColumnSpec] {
        &self.additional_columns
    }

    pub fn includes_rh(&self) -> bool {
        self.include_rh
    }

    pub fn set_includes_rh(&mut self, include: bool) {
        self.include_rh = include;
    }

    /// Replace the rows, keeping the schema
    pub fn with_rows(&self, rows: Vec<Observation>) -> Self {
        Self {
            additional_columns: self.additional_columns.clone(),
            include_rh: self.include_rh,
            rows,
        }
    }

    /// All column names in output order
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = MANDATORY_COLUMNS.iter().map(|s| s.to_string()).collect();
        if self.include_rh {
            names.push(RELATIVE_HUMIDITY_COLUMN.to_string());
        }
        names.extend(self.additional_columns.iter().map(|c| c.name.clone()));
        names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| c == name)
    }

    /// Cells of one row in column order
    pub fn row_cells(&self, index: usize) -> Option<Vec<Cell<'_>>> {
        let row = self.rows.get(index)?;
        let mut cells = Vec::with_capacity(self.column_names().len());
        cells.push(Cell::Text(&row.id));
        cells.push(Cell::Time(row.time));
        cells.extend(row.measurements().into_iter().map(Cell::from));
        if self.include_rh {
            cells.push(Cell::from(row.rh));
        }
        cells.extend(
            (0..self.additional_columns.len())
                .map(|i| Cell::from(row.additional.get(i).and_then(Option::as_ref))),
        );
        Some(cells)
    }

    /// Values of a numeric column (mandatory, `rh` or additional)
    pub fn number_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if let Some(pos) = MANDATORY_COLUMNS.iter().position(|c| *c == name) {
            if pos < 2 {
                return None;
            }
            return Some(self.rows.iter().map(|r| r.measurements()[pos - 2]).collect());
        }
        if name == RELATIVE_HUMIDITY_COLUMN && self.include_rh {
            return Some(self.rows.iter().map(|r| r.rh).collect());
        }
        let pos = self.additional_position(name)?;
        if self.additional_columns[pos].kind != ColumnKind::Numeric {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.additional.get(pos).and_then(|v| v.as_ref()?.as_number()))
                .collect(),
        )
    }

    /// Values of a text column (`id` or additional)
    pub fn text_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        if name == "id" {
            return Some(self.rows.iter().map(|r| Some(r.id.clone())).collect());
        }
        let pos = self.additional_position(name)?;
        if self.additional_columns[pos].kind != ColumnKind::Text {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| {
                    r.additional
                        .get(pos)
                        .and_then(|v| v.as_ref()?.as_text().map(str::to_string))
                })
                .collect(),
        )
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.time).collect()
    }

    fn additional_position(&self, name: &str) -> Option<usize> {
        self.additional_columns.iter().position(|c| c.name == name)
    }

    /// Keep only rows whose timestamp year satisfies the predicate
    pub fn retain_years<F: Fn(i32) -> bool>(&mut self, keep: F) {
        self.rows.retain(|r| keep(r.time.year()));
    }

    pub fn sort_by_time(&mut self) {
        self.rows.sort_by_key(|r| r.time);
    }
}

/// Accumulates rows as (column name, value) pairs until the batch schema is
/// known, then lays them out against it
#[derive(Debug, Default)]
pub struct ObservationTableBuilder {
    rows: Vec<(Observation, Vec<(String, Option<FieldValue>)>)>,
}

impl ObservationTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, base: Observation, pairs: Vec<(String, Option<FieldValue>)>) {
        self.rows.push((base, pairs));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names absent from a row's pairs become nulls; names outside the schema
    /// are dropped
    pub fn build(self, additional_columns: Vec<ColumnSpec>) -> ObservationTable {
        let positions: HashMap<&str, usize> = additional_columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|(mut base, pairs)| {
                let mut values = vec![None; additional_columns.len()];
                for (name, value) in pairs {
                    if let Some(&pos) = positions.get(name.as_str()) {
                        values[pos] = value;
                    }
                }
                base.additional = values;
                base
            })
            .collect();

        ObservationTable::new(additional_columns, rows)
    }
}
