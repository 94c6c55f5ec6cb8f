use chrono::{NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::{OffsetComponents, Tz};
use tracing::warn;

/// UTC instant from calendar components, `None` when they do not form a
/// valid date and time
pub fn utc_instant(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

/// Shifts UTC instants to local standard time (daylight saving never applied)
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalNormalizer {
    zone: Option<Tz>,
}

impl TemporalNormalizer {
    /// Leaves timestamps in UTC
    pub fn utc() -> Self {
        Self { zone: None }
    }

    pub fn new(zone: Tz) -> Self {
        Self { zone: Some(zone) }
    }

    /// Resolve an IANA zone name; unknown names fall back to UTC
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Self::utc(),
            Some(name) => match name.parse::<Tz>() {
                Ok(zone) => Self::new(zone),
                Err(_) => {
                    warn!("Unknown time zone '{}', keeping UTC timestamps", name);
                    Self::utc()
                }
            },
        }
    }

    pub fn zone(&self) -> Option<Tz> {
        self.zone
    }

    /// Standard offset in effect at `utc`
    pub fn standard_offset(&self, utc: NaiveDateTime) -> TimeDelta {
        match self.zone {
            None => TimeDelta::zero(),
            Some(zone) => zone.offset_from_utc_datetime(&utc).base_utc_offset(),
        }
    }

    pub fn to_local_standard(&self, utc: NaiveDateTime) -> NaiveDateTime {
        utc + self.standard_offset(utc)
    }
}
