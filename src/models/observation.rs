use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use validator::Validate;

/// Typed content of the fixed-width mandatory section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MandatoryRecord {
    pub usaf: String,
    pub wban: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    // metres
    pub elevation: Option<f64>,

    // degrees, m/s, metres, metres, °C, °C, hPa
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub ceiling_height: Option<f64>,
    pub visibility: Option<f64>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub pressure: Option<f64>,
}

impl MandatoryRecord {
    pub fn station_id(&self) -> String {
        format!("{}-{}", self.usaf, self.wban)
    }
}

/// One decoded archive line with its additional-data remainder retained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    pub line_number: usize,
    pub mandatory: MandatoryRecord,
    pub time_utc: NaiveDateTime,
    pub additional_data: String,
}

/// Value of an additional-data sub-field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Numbers order numerically, text lexicographically; numbers sort first
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One output row: mandatory measurements plus additional columns aligned to
/// the owning table's optional schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    pub time: NaiveDateTime,
    pub wd: Option<f64>,
    pub ws: Option<f64>,
    pub ceil_hgt: Option<f64>,
    pub visibility: Option<f64>,
    pub temp: Option<f64>,
    pub dew_point: Option<f64>,
    pub atmos_pres: Option<f64>,
    pub rh: Option<f64>,
    pub additional: Vec<Option<FieldValue>>,
}

pub const MEASUREMENT_COUNT: usize = 7;

impl Observation {
    /// Null row carrying only station id and time
    pub fn empty(id: &str, time: NaiveDateTime, additional_columns: usize) -> Self {
        Self {
            id: id.to_string(),
            time,
            wd: None,
            ws: None,
            ceil_hgt: None,
            visibility: None,
            temp: None,
            dew_point: None,
            atmos_pres: None,
            rh: None,
            additional: vec![None; additional_columns],
        }
    }

    pub fn from_mandatory(record: &MandatoryRecord, time: NaiveDateTime) -> Self {
        Self {
            id: record.station_id(),
            time,
            wd: record.wind_direction,
            ws: record.wind_speed,
            ceil_hgt: record.ceiling_height,
            visibility: record.visibility,
            temp: record.temperature,
            dew_point: record.dew_point,
            atmos_pres: record.pressure,
            rh: None,
            additional: Vec::new(),
        }
    }

    /// Mandatory measurements in column order
    pub fn measurements(&self) -> [Option<f64>; MEASUREMENT_COUNT] {
        [
            self.wd,
            self.ws,
            self.ceil_hgt,
            self.visibility,
            self.temp,
            self.dew_point,
            self.atmos_pres,
        ]
    }

    pub fn set_measurements(&mut self, values: [Option<f64>; MEASUREMENT_COUNT]) {
        let [wd, ws, ceil_hgt, visibility, temp, dew_point, atmos_pres] = values;
        self.wd = wd;
        self.ws = ws;
        self.ceil_hgt = ceil_hgt;
        self.visibility = visibility;
        self.temp = temp;
        self.dew_point = dew_point;
        self.atmos_pres = atmos_pres;
    }

    /// True when nothing but id and time is present
    pub fn is_null(&self) -> bool {
        self.measurements().iter().all(Option::is_none)
            && self.rh.is_none()
            && self.additional.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_row_is_null() {
        let observation = Observation::empty("722315-53917", noon(), 3);
        assert!(observation.is_null());
        assert_eq!(observation.additional.len(), 3);
    }

    #[test]
    fn test_field_value_ordering() {
        let a = FieldValue::Number(1.5);
        let b = FieldValue::Number(-2.0);
        assert_eq!(a.total_cmp(&b), Ordering::Greater);

        let x = FieldValue::Text("BKN".to_string());
        let y = FieldValue::Text("OVC".to_string());
        assert_eq!(x.total_cmp(&y), Ordering::Less);
    }

    #[test]
    fn test_coordinate_validation() {
        let record = MandatoryRecord {
            usaf: "722315".to_string(),
            wban: "53917".to_string(),
            year: 2014,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            latitude: Some(95.0),
            longitude: Some(-90.0),
            elevation: None,
            wind_direction: None,
            wind_speed: None,
            ceiling_height: None,
            visibility: None,
            temperature: None,
            dew_point: None,
            pressure: None,
        };
        assert!(record.validate().is_err());
        assert_eq!(record.station_id(), "722315-53917");
    }
}
