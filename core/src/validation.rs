//! Rule checks that accumulate human-readable violations.
//!
//! # Design
//! A `Validation` is created per operation with a context label such as
//! `"Restaurant DeliveryFee"`. Each check appends a message on failure and
//! never returns early, so one pass reports everything that is wrong.
//! `finish` turns a non-empty accumulator into `OrdrinError::BadValue`.
//!
//! Messages keep the service's established shape:
//! `"<context> - Validation - <field> (invalid, <reason>) (<value>)"`.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{OrdrinError, Result};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));
static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static MONEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{2})?$").expect("valid regex"));
static CVC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid regex"));
static TRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+/\d+(,\d+)*(\+\d+/\d+(,\d+)*)*$").expect("valid regex")
});

/// Accumulator of validation failures for one operation.
#[derive(Debug, Clone)]
pub struct Validation {
    context: String,
    errors: Vec<String>,
}

impl Validation {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            errors: Vec::new(),
        }
    }

    fn reject(&mut self, field: &str, reason: &str, value: &str) {
        self.errors.push(format!(
            "{} - Validation - {field} (invalid, {reason}) ({value})",
            self.context
        ));
    }

    /// Record a violation found by a check that lives outside this module.
    pub fn invalid(&mut self, field: &str, reason: &str, value: &str) -> &mut Self {
        self.reject(field, reason, value);
        self
    }

    /// Fails when `value` is empty or only whitespace.
    pub fn required(&mut self, value: &str, field: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "required", value);
        }
        self
    }

    pub fn email(&mut self, value: &str) -> &mut Self {
        if !EMAIL.is_match(value) {
            self.reject("Email", "must be a valid email address", value);
        }
        self
    }

    /// Fails unless `value` is a string of digits.
    pub fn numeric_id(&mut self, value: &str, field: &str) -> &mut Self {
        if !NUMERIC_ID.is_match(value) {
            self.reject(field, "must be integer", value);
        }
        self
    }

    /// Accepts whole amounts (`12`) and two-decimal amounts (`12.50`).
    pub fn money(&mut self, value: &str, field: &str) -> &mut Self {
        if !MONEY.is_match(value) {
            self.reject(field, "must be numeric", value);
        }
        self
    }

    /// Fails unless `value` matches `pattern`.
    pub fn matches(
        &mut self,
        value: &str,
        pattern: &Regex,
        field: &str,
        reason: &str,
    ) -> &mut Self {
        if !pattern.is_match(value) {
            self.reject(field, reason, value);
        }
        self
    }

    /// Length and Luhn check. Only the last four digits are echoed back.
    pub fn card_number(&mut self, value: &str) -> &mut Self {
        let digits = strip_card_separators(value);
        let well_formed = (13..=19).contains(&digits.len())
            && digits.bytes().all(|b| b.is_ascii_digit())
            && luhn_valid(&digits);
        if !well_formed {
            self.reject(
                "Card Number",
                "must be 13-19 digits and pass the checksum",
                &mask_card_number(&digits),
            );
        }
        self
    }

    pub fn cvc(&mut self, value: &str) -> &mut Self {
        if !CVC.is_match(value) {
            self.reject("CVC", "must be 3 or 4 digits", "***");
        }
        self
    }

    /// Fails for a malformed month/year or a card that expired before the
    /// month containing `today`.
    pub fn expiration_date(&mut self, month: u32, year: u32, today: NaiveDate) -> &mut Self {
        let shown = format!("{month:02}/{year}");
        let Some(year) = normalize_year(year) else {
            self.reject("Expiration Date", "year must be 2 or 4 digits", &shown);
            return self;
        };
        if !(1..=12).contains(&month) {
            self.reject("Expiration Date", "month must be between 1 and 12", &shown);
            return self;
        }
        if (year, month) < (today.year(), today.month()) {
            self.reject("Expiration Date", "card has expired", &shown);
        }
        self
    }

    /// Checks the `id/qty[,opt]*(+id/qty[,opt]*)*` string form of a tray.
    pub fn tray_items(&mut self, raw: &str) -> &mut Self {
        if !TRAY.is_match(raw) {
            self.reject(
                "Items",
                "items must be a non-empty array of TrayItems or string tray representation",
                raw,
            );
        }
        self
    }

    /// Merge the violations of a nested validation into this one.
    pub fn absorb(&mut self, result: Result<()>) -> &mut Self {
        match result {
            Ok(()) => {}
            Err(OrdrinError::BadValue(messages)) => self.errors.extend(messages),
            Err(other) => self.errors.push(format!("{} - {other}", self.context)),
        }
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing was recorded, otherwise every message as `BadValue`.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(OrdrinError::BadValue(self.errors))
        }
    }
}

/// Same shape check as [`Validation::email`], without recording anything.
pub(crate) fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Luhn checksum over a string of ASCII digits.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut d = u32::from(b - b'0');
        if i % 2 != 0 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// Two-digit years are read as 20YY. Anything else but four digits is rejected.
pub fn normalize_year(year: u32) -> Option<i32> {
    match year {
        0..=99 => i32::try_from(2000 + year).ok(),
        1000..=9999 => i32::try_from(year).ok(),
        _ => None,
    }
}

pub(crate) fn strip_card_separators(value: &str) -> String {
    value.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

fn mask_card_number(digits: &str) -> String {
    let tail: String = digits
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}
