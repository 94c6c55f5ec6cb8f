use crate::error::{ProcessingError, Result};
use crate::models::{DecodedRecord, MandatoryRecord};
use crate::processors::segment_decoder::additional_remainder;
use crate::processors::temporal::utc_instant;
use crate::utils::constants::{sentinels, slots, COLUMN_WIDTHS, MANDATORY_SECTION_WIDTH};
use std::ops::Range;
use validator::Validate;

/// Byte ranges of the mandatory slots, derived once from the width table
#[derive(Debug, Clone)]
pub struct FixedWidthLayout {
    ranges: Vec<Range<usize>>,
}

impl FixedWidthLayout {
    pub fn standard() -> Self {
        let mut start = 0;
        let ranges = COLUMN_WIDTHS
            .iter()
            .map(|&width| {
                let range = start..start + width;
                start += width;
                range
            })
            .collect();
        Self { ranges }
    }

    pub fn width(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    /// Split the mandatory section of a line into its slots
    pub fn slice<'a>(&self, line: &'a str, line_number: usize) -> Result<Vec<&'a str>> {
        if line.len() < self.width() {
            return Err(ProcessingError::malformed(
                line_number,
                format!(
                    "record is {} bytes, the mandatory section needs {}",
                    line.len(),
                    self.width()
                ),
            ));
        }

        self.ranges
            .iter()
            .map(|range| {
                line.get(range.clone()).ok_or_else(|| {
                    ProcessingError::malformed(line_number, "non-ASCII mandatory section")
                })
            })
            .collect()
    }

    /// Inverse of `slice`: concatenate slots back into a mandatory section
    pub fn join(&self, slots: &[&str]) -> Result<String> {
        if slots.len() != self.ranges.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "expected {} slots, got {}",
                self.ranges.len(),
                slots.len()
            )));
        }
        for (i, (slot, range)) in slots.iter().zip(&self.ranges).enumerate() {
            if slot.len() != range.len() {
                return Err(ProcessingError::InvalidFormat(format!(
                    "slot {} is {} bytes wide, expected {}",
                    i,
                    slot.len(),
                    range.len()
                )));
            }
        }
        Ok(slots.concat())
    }
}

impl Default for FixedWidthLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Decodes the mandatory section of archive lines
#[derive(Debug, Clone, Default)]
pub struct MandatoryDecoder {
    layout: FixedWidthLayout,
}

impl MandatoryDecoder {
    pub fn new() -> Self {
        Self {
            layout: FixedWidthLayout::standard(),
        }
    }

    pub fn layout(&self) -> &FixedWidthLayout {
        &self.layout
    }

    pub fn decode(&self, line: &str, line_number: usize) -> Result<DecodedRecord> {
        let s = self.layout.slice(line, line_number)?;

        let integer = |slot: usize, name: &str| -> Result<i64> {
            s[slot].trim().parse::<i64>().map_err(|_| {
                ProcessingError::malformed(
                    line_number,
                    format!("{} '{}' is not an integer", name, s[slot]),
                )
            })
        };

        let measurement = |slot: usize, name: &str, sentinel: i64, scale: f64| -> Result<Option<f64>> {
            let raw = integer(slot, name)?;
            // Sentinels are defined on the raw value, before scaling
            if raw.abs() == sentinel {
                Ok(None)
            } else {
                Ok(Some(raw as f64 / scale))
            }
        };

        let mandatory = MandatoryRecord {
            usaf: s[slots::USAF].to_string(),
            wban: s[slots::WBAN].to_string(),
            year: integer(slots::YEAR, "year")? as i32,
            month: integer(slots::MONTH, "month")? as u32,
            day: integer(slots::DAY, "day")? as u32,
            hour: integer(slots::HOUR, "hour")? as u32,
            minute: integer(slots::MINUTE, "minute")? as u32,
            latitude: measurement(slots::LATITUDE, "latitude", sentinels::LATITUDE, 1000.0)?,
            longitude: measurement(slots::LONGITUDE, "longitude", sentinels::LONGITUDE, 1000.0)?,
            elevation: measurement(slots::ELEVATION, "elevation", sentinels::ELEVATION, 1.0)?,
            wind_direction: measurement(
                slots::WIND_DIRECTION,
                "wind direction",
                sentinels::WIND_DIRECTION,
                1.0,
            )?,
            wind_speed: measurement(slots::WIND_SPEED, "wind speed", sentinels::WIND_SPEED, 10.0)?,
            ceiling_height: measurement(
                slots::CEILING_HEIGHT,
                "ceiling height",
                sentinels::CEILING_HEIGHT,
                1.0,
            )?,
            visibility: measurement(slots::VISIBILITY, "visibility", sentinels::VISIBILITY, 1.0)?,
            temperature: measurement(
                slots::TEMPERATURE,
                "temperature",
                sentinels::TEMPERATURE,
                10.0,
            )?,
            dew_point: measurement(slots::DEW_POINT, "dew point", sentinels::DEW_POINT, 10.0)?,
            pressure: measurement(slots::PRESSURE, "pressure", sentinels::PRESSURE, 10.0)?,
        };

        let time_utc = utc_instant(
            mandatory.year,
            mandatory.month,
            mandatory.day,
            mandatory.hour,
            mandatory.minute,
        )
        .ok_or_else(|| {
            ProcessingError::malformed(
                line_number,
                format!(
                    "invalid date/time {:04}-{:02}-{:02} {:02}:{:02}",
                    mandatory.year, mandatory.month, mandatory.day, mandatory.hour, mandatory.minute
                ),
            )
        })?;

        mandatory.validate().map_err(|e| {
            ProcessingError::malformed(line_number, format!("coordinates out of range: {}", e))
        })?;

        let additional_data = line
            .get(MANDATORY_SECTION_WIDTH..)
            .map(additional_remainder)
            .ok_or_else(|| {
                ProcessingError::malformed(
                    line_number,
                    "additional section does not start on a character boundary",
                )
            })?
            .to_string();

        Ok(DecodedRecord {
            line_number,
            mandatory,
            time_utc,
            additional_data,
        })
    }
}
