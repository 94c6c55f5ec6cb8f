use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Composite `USAF-WBAN` station key, zero padding preserved
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId {
    usaf: String,
    wban: String,
}

impl StationId {
    pub fn new(usaf: &str, wban: &str) -> Result<Self> {
        let valid = usaf.len() == 6
            && wban.len() == 5
            && usaf.chars().all(|c| c.is_ascii_alphanumeric())
            && wban.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(ProcessingError::invalid_argument(format!(
                "Station id must be <6-char USAF>-<5-digit WBAN>, got '{}-{}'",
                usaf, wban
            )));
        }
        Ok(Self {
            usaf: usaf.to_string(),
            wban: wban.to_string(),
        })
    }

    pub fn usaf(&self) -> &str {
        &self.usaf
    }

    pub fn wban(&self) -> &str {
        &self.wban
    }
}

impl FromStr for StationId {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let (usaf, wban) = s.trim().split_once('-').ok_or_else(|| {
            ProcessingError::invalid_argument(format!("Station id '{}' has no '-' separator", s))
        })?;
        Self::new(usaf, wban)
    }
}

impl TryFrom<String> for StationId {
    type Error = ProcessingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.usaf, self.wban)
    }
}

/// Inclusive span of requested calendar years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct YearRange {
    #[validate(range(min = 1901, max = 2100))]
    pub start: i32,

    #[validate(range(min = 1901, max = 2100))]
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(ProcessingError::invalid_argument(format!(
                "Year range is inverted: {} > {}",
                start, end
            )));
        }
        let range = Self { start, end };
        range
            .validate()
            .map_err(|e| ProcessingError::invalid_argument(format!("Year out of range: {}", e)))?;
        Ok(range)
    }

    pub fn single(year: i32) -> Result<Self> {
        Self::new(year, year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl FromStr for YearRange {
    type Err = ProcessingError;

    /// Accepts `2014` or `2014:2015`
    fn from_str(s: &str) -> Result<Self> {
        let parse_year = |part: &str| {
            part.trim().parse::<i32>().map_err(|_| {
                ProcessingError::invalid_argument(format!("Year '{}' is not numeric", part.trim()))
            })
        };

        match s.split_once(':') {
            Some((start, end)) => Self::new(parse_year(start)?, parse_year(end)?),
            None => Self::single(parse_year(s)?),
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}
