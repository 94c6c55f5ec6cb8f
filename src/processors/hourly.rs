use crate::models::{FieldValue, Observation, ObservationTable, YearRange};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

const SECONDS_PER_HOUR: i64 = 3600;

/// Round to the nearest whole hour; 30 minutes and later round up
pub fn round_to_hour(time: NaiveDateTime) -> NaiveDateTime {
    let seconds = time.and_utc().timestamp();
    let mut hours = seconds.div_euclid(SECONDS_PER_HOUR);
    if seconds.rem_euclid(SECONDS_PER_HOUR) >= SECONDS_PER_HOUR / 2 {
        hours += 1;
    }
    DateTime::from_timestamp(hours * SECONDS_PER_HOUR, 0)
        .map(|t| t.naive_utc())
        .unwrap_or(time)
}

fn min_number(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn min_value(a: Option<FieldValue>, b: &Option<FieldValue>) -> Option<FieldValue> {
    match (a, b) {
        (Some(x), Some(y)) if y.total_cmp(&x) == Ordering::Less => Some(y.clone()),
        (Some(x), _) => Some(x),
        (None, y) => y.clone(),
    }
}

/// Collapse rows onto whole hours.
///
/// Each output row takes the id of the first row in its bucket, the rounded
/// hour, and the null-skipping minimum of every value column (lexicographic
/// for text).
pub fn bucketize(table: ObservationTable) -> ObservationTable {
    let column_count = table.additional_columns().len();
    let input_rows = table.len();
    let mut buckets: BTreeMap<NaiveDateTime, Observation> = BTreeMap::new();

    for row in table.rows() {
        let hour = round_to_hour(row.time);
        match buckets.get_mut(&hour) {
            None => {
                let mut first = row.clone();
                first.time = hour;
                first.additional.resize(column_count, None);
                buckets.insert(hour, first);
            }
            Some(acc) => {
                let (current, incoming) = (acc.measurements(), row.measurements());
                acc.set_measurements(std::array::from_fn(|i| {
                    min_number(current[i], incoming[i])
                }));
                acc.rh = min_number(acc.rh, row.rh);

                for (i, value) in row.additional.iter().enumerate().take(column_count) {
                    let current = acc.additional[i].take();
                    acc.additional[i] = min_value(current, value);
                }
            }
        }
    }

    debug!(
        "Bucketed {} rows into {} hours",
        input_rows,
        buckets.len()
    );
    table.with_rows(buckets.into_values().collect())
}

/// Every whole hour from 1 January 00:00 of the first year through
/// 31 December 23:00 of the last
pub fn hourly_grid(years: YearRange) -> Vec<NaiveDateTime> {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(years.start, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        NaiveDate::from_ymd_opt(years.end, 12, 31).and_then(|d| d.and_hms_opt(23, 0, 0)),
    ) else {
        return Vec::new();
    };

    let mut grid = Vec::with_capacity((last - first).num_hours() as usize + 1);
    let mut t = first;
    while t <= last {
        grid.push(t);
        t += TimeDelta::hours(1);
    }
    grid
}

/// Add null rows for every grid hour the table lacks, merged in time order
pub fn fill_missing_hours(table: ObservationTable, station_id: &str, years: YearRange) -> ObservationTable {
    let column_count = table.additional_columns().len();
    let mut by_time: BTreeMap<NaiveDateTime, Observation> = BTreeMap::new();
    let mut off_grid = Vec::new();

    for row in table.rows().iter().cloned() {
        if by_time.contains_key(&row.time) {
            off_grid.push(row);
        } else {
            by_time.insert(row.time, row);
        }
    }

    let mut synthesized = 0usize;
    for hour in hourly_grid(years) {
        by_time.entry(hour).or_insert_with(|| {
            synthesized += 1;
            Observation::empty(station_id, hour, column_count)
        });
    }
    debug!("Filled {} missing hours for {}", synthesized, station_id);

    let mut rows: Vec<Observation> = by_time.into_values().collect();
    if !off_grid.is_empty() {
        rows.extend(off_grid);
        rows.sort_by_key(|r| r.time);
    }
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnKind, ColumnSpec};
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn row(time: NaiveDateTime, temp: Option<f64>, text: Option<&str>) -> Observation {
        let mut r = Observation::empty("722315-53917", time, 1);
        r.temp = temp;
        r.additional[0] = text.map(|s| FieldValue::Text(s.to_string()));
        r
    }

    fn text_column() -> Vec<ColumnSpec> {
        vec![ColumnSpec {
            name: "mw1_1".to_string(),
            kind: ColumnKind::Text,
            category: Some("MW1".to_string()),
        }]
    }

    #[test]
    fn test_round_to_hour() {
        assert_eq!(round_to_hour(at(2014, 1, 1, 0, 29)), at(2014, 1, 1, 0, 0));
        assert_eq!(round_to_hour(at(2014, 1, 1, 0, 30)), at(2014, 1, 1, 1, 0));
        assert_eq!(round_to_hour(at(2014, 12, 31, 23, 53)), at(2015, 1, 1, 0, 0));
    }

    #[test]
    fn test_bucketize_takes_minimums() {
        let table = ObservationTable::new(
            text_column(),
            vec![
                row(at(2014, 1, 1, 0, 53), Some(7.8), Some("21")),
                row(at(2014, 1, 1, 1, 10), None, Some("02")),
                row(at(2014, 1, 1, 1, 20), Some(6.1), None),
                row(at(2014, 1, 1, 2, 15), Some(5.0), None),
            ],
        );

        let bucketed = bucketize(table);
        assert_eq!(
            bucketed.times(),
            vec![at(2014, 1, 1, 1, 0), at(2014, 1, 1, 2, 0)]
        );
        assert_eq!(
            bucketed.number_column("temp").unwrap(),
            vec![Some(6.1), Some(5.0)]
        );
        assert_eq!(
            bucketed.text_column("mw1_1").unwrap(),
            vec![Some("02".to_string()), None]
        );
    }

    #[test]
    fn test_bucketize_is_idempotent() {
        let table = ObservationTable::new(
            text_column(),
            vec![
                row(at(2014, 3, 1, 5, 45), Some(1.0), None),
                row(at(2014, 3, 1, 6, 5), Some(2.0), Some("10")),
            ],
        );
        let once = bucketize(table);
        let twice = bucketize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_grid_sizes() {
        assert_eq!(hourly_grid(YearRange::single(2014).unwrap()).len(), 8760);
        assert_eq!(hourly_grid(YearRange::single(2016).unwrap()).len(), 8784);
        assert_eq!(hourly_grid(YearRange::new(2014, 2015).unwrap()).len(), 17520);
    }

    #[test]
    fn test_fill_missing_hours() {
        let table = ObservationTable::new(
            text_column(),
            vec![row(at(2014, 6, 1, 12, 0), Some(25.0), Some("01"))],
        );
        let filled = fill_missing_hours(table, "722315-53917", YearRange::single(2014).unwrap());

        assert_eq!(filled.len(), 8760);
        assert_eq!(filled.rows()[0].time, at(2014, 1, 1, 0, 0));
        assert_eq!(filled.rows()[8759].time, at(2014, 12, 31, 23, 0));
        assert!(filled.rows()[0].is_null());
        assert_eq!(filled.rows()[0].id, "722315-53917");
        assert_eq!(filled.rows()[0].additional.len(), 1);

        let kept: Vec<&Observation> = filled.rows().iter().filter(|r| !r.is_null()).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].temp, Some(25.0));
    }

    #[test]
    fn test_two_observed_hours_fill_the_rest_of_the_year() {
        let observed = |year: i32| {
            ObservationTable::new(
                text_column(),
                vec![
                    row(at(year, 2, 28, 6, 0), Some(12.5), None),
                    row(at(year, 11, 3, 18, 0), None, Some("02")),
                ],
            )
        };

        let filled = fill_missing_hours(observed(2014), "722315-53917", YearRange::single(2014).unwrap());
        assert_eq!(filled.len(), 8760);
        assert_eq!(filled.rows().iter().filter(|r| r.is_null()).count(), 8758);

        let leap = fill_missing_hours(observed(2016), "722315-53917", YearRange::single(2016).unwrap());
        assert_eq!(leap.len(), 8784);
        assert_eq!(leap.rows().iter().filter(|r| r.is_null()).count(), 8782);
        assert!(leap.rows().iter().all(|r| r.id == "722315-53917"));
        assert!(leap
            .rows()
            .windows(2)
            .all(|pair| pair[0].time < pair[1].time));
    }
}
