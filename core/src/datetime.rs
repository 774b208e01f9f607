//! Delivery time parsing and the compact date/time forms the service expects.
//!
//! Path segments use `MM-DD+HH:MM`, order bodies split the same instant into
//! `delivery_date` (`MM-DD`) and `delivery_time` (`HH:MM`). `ASAP` passes
//! through untouched in every form.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{OrdrinError, Result};

const ASAP: &str = "ASAP";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// When an order should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTime {
    Asap,
    At(NaiveDateTime),
}

impl DeliveryTime {
    /// `ASAP` or `MM-DD+HH:MM`, used as a path segment.
    pub fn datetime_segment(&self) -> String {
        match self {
            DeliveryTime::Asap => ASAP.to_string(),
            DeliveryTime::At(at) => at.format("%m-%d+%H:%M").to_string(),
        }
    }

    /// `ASAP` or `MM-DD`.
    pub fn date_field(&self) -> String {
        match self {
            DeliveryTime::Asap => ASAP.to_string(),
            DeliveryTime::At(at) => at.format("%m-%d").to_string(),
        }
    }

    /// `HH:MM`, absent for `ASAP`.
    pub fn time_field(&self) -> Option<String> {
        match self {
            DeliveryTime::Asap => None,
            DeliveryTime::At(at) => Some(at.format("%H:%M").to_string()),
        }
    }
}

impl FromStr for DeliveryTime {
    type Err = OrdrinError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ASAP) {
            return Ok(DeliveryTime::Asap);
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(DeliveryTime::At)
            .ok_or_else(|| {
                OrdrinError::bad_value(format!(
                    "Delivery Time - Validation - Date/Time \
                     (invalid, must be ASAP or YYYY-MM-DD HH:MM) ({s})"
                ))
            })
    }
}

impl fmt::Display for DeliveryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.datetime_segment())
    }
}

impl From<NaiveDateTime> for DeliveryTime {
    fn from(at: NaiveDateTime) -> Self {
        DeliveryTime::At(at)
    }
}

/// `"ASAP"` stays `"ASAP"`; `"2024-01-05 18:30"` becomes `"01-05+18:30"`.
pub fn format_datetime(input: &str) -> Result<String> {
    Ok(input.parse::<DeliveryTime>()?.datetime_segment())
}

/// `"ASAP"` stays `"ASAP"`; a bare `YYYY-MM-DD` or a date-time becomes `MM-DD`.
pub fn format_date(input: &str) -> Result<String> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date.format("%m-%d").to_string());
    }
    Ok(input.parse::<DeliveryTime>()?.date_field())
}

/// Accepts a bare `HH:MM[:SS]` or a full date-time and renders `HH:MM`.
pub fn format_time(input: &str) -> Result<String> {
    let s = input.trim();
    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
    {
        return Ok(time.format("%H:%M").to_string());
    }
    match s.parse::<DeliveryTime>() {
        Ok(DeliveryTime::At(at)) => Ok(at.format("%H:%M").to_string()),
        _ => Err(OrdrinError::bad_value(format!(
            "Delivery Time - Validation - Time (invalid, must be HH:MM) ({s})"
        ))),
    }
}
