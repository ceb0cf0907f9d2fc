//! Indian financial year and GST arithmetic.

use crate::amount::round2;
use crate::error::LedgerError;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// April 1 to March 31, identified by the calendar year it starts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FinancialYear(i32);

impl FinancialYear {
    pub fn starting(year: i32) -> Self {
        Self(year)
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            Self(date.year())
        } else {
            Self(date.year() - 1)
        }
    }

    pub fn start_year(&self) -> i32 {
        self.0
    }

    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 4, 1).unwrap_or_else(|| self.out_of_calendar())
    }

    pub fn end(&self) -> NaiveDate {
        self.0
            .checked_add(1)
            .and_then(|year| NaiveDate::from_ymd_opt(year, 3, 31))
            .unwrap_or_else(|| self.out_of_calendar())
    }

    /// Years chrono cannot represent clamp to the nearest end of its calendar.
    fn out_of_calendar(&self) -> NaiveDate {
        if self.0 < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn previous(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// `FY 2024-25`
    pub fn label(&self) -> String {
        format!("FY {}", self)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.0, (i64::from(self.0) + 1).rem_euclid(100))
    }
}

impl FromStr for FinancialYear {
    type Err = LedgerError;

    /// Accepts `2024`, `2024-25`, `2024-2025` and any of those prefixed by `FY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::Parse(format!("invalid financial year `{}'", s));
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("FY")
            .or_else(|| trimmed.strip_prefix("fy"))
            .unwrap_or(trimmed)
            .trim();

        let (start, end) = match body.split_once('-') {
            Some((start, end)) => (start, Some(end)),
            None => (body, None),
        };
        let start: i32 = start.trim().parse().map_err(|_| invalid())?;
        // both the opening April and the closing March must be real dates
        let closing = start.checked_add(1).ok_or_else(invalid)?;
        if NaiveDate::from_ymd_opt(start, 4, 1).is_none()
            || NaiveDate::from_ymd_opt(closing, 3, 31).is_none()
        {
            return Err(invalid());
        }
        if let Some(end) = end {
            let end = end.trim();
            let expected = match end.len() {
                2 => closing.rem_euclid(100),
                4 => closing,
                _ => return Err(invalid()),
            };
            if end.parse::<i32>().map_err(|_| invalid())? != expected {
                return Err(invalid());
            }
        }
        Ok(Self(start))
    }
}

/// A GST slab in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GstRate(f64);

impl GstRate {
    pub const NIL: GstRate = GstRate(0f64);
    pub const FIVE: GstRate = GstRate(5f64);
    pub const TWELVE: GstRate = GstRate(12f64);
    pub const EIGHTEEN: GstRate = GstRate(18f64);
    pub const TWENTY_EIGHT: GstRate = GstRate(28f64);

    pub fn custom(percent: f64) -> Result<Self, LedgerError> {
        if !percent.is_finite() || !(0f64..=100f64).contains(&percent) {
            return Err(LedgerError::Parse(format!("invalid GST rate {}", percent)));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GstBreakdown {
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub total: f64,
}

impl GstBreakdown {
    pub fn tax(&self) -> f64 {
        self.cgst + self.sgst + self.igst
    }

    fn split(taxable: f64, tax: f64, intra_state: bool) -> Self {
        let taxable = round2(taxable);
        let (cgst, sgst, igst) = if intra_state {
            let half = round2(tax / 2f64);
            (half, round2(tax - half), 0f64)
        } else {
            (0f64, 0f64, round2(tax))
        };
        Self {
            taxable,
            cgst,
            sgst,
            igst,
            total: round2(taxable + cgst + sgst + igst),
        }
    }
}

/// Tax on top of a taxable value. Intra-state supplies split the tax into
/// CGST and SGST, inter-state supplies pay it all as IGST.
pub fn gst_exclusive(taxable: f64, rate: GstRate, intra_state: bool) -> GstBreakdown {
    GstBreakdown::split(taxable, taxable * rate.percent() / 100f64, intra_state)
}

/// Backs the tax out of a gross amount that already includes it.
pub fn gst_inclusive(gross: f64, rate: GstRate, intra_state: bool) -> GstBreakdown {
    let taxable = round2(gross * 100f64 / (100f64 + rate.percent()));
    GstBreakdown::split(taxable, gross - taxable, intra_state)
}
