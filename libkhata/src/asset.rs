use crate::{
    account::AccountStore,
    amount::Side,
    error::{LedgerError, Result},
    journal::{new_id, EntrySource, JournalEntry, JournalLine},
};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    #[default]
    StraightLine,
}

pub const MAX_USEFUL_LIFE_YEARS: u32 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub account_id: String,
    pub accumulated_dep_account_id: String,
    pub depreciation_expense_account_id: String,
    pub acquisition_date: NaiveDate,
    pub cost: f64,
    #[serde(default)]
    pub salvage_value: f64,
    pub useful_life_years: u32,
    #[serde(default)]
    pub depreciation_method: DepreciationMethod,
}

impl NewAsset {
    pub fn validate(&self, accounts: &AccountStore) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidAsset("name is required".to_string()));
        }
        if !self.cost.is_finite() || self.cost <= 0f64 {
            return Err(LedgerError::InvalidAsset(format!(
                "cost must be positive, got {}",
                self.cost
            )));
        }
        if !self.salvage_value.is_finite()
            || self.salvage_value < 0f64
            || self.salvage_value > self.cost
        {
            return Err(LedgerError::InvalidAsset(format!(
                "salvage value {} must be between 0 and cost {}",
                self.salvage_value, self.cost
            )));
        }
        if self.useful_life_years == 0 || self.useful_life_years > MAX_USEFUL_LIFE_YEARS {
            return Err(LedgerError::InvalidAsset(format!(
                "useful life must be between 1 and {} years, got {}",
                MAX_USEFUL_LIFE_YEARS, self.useful_life_years
            )));
        }
        accounts.require(&self.account_id)?;
        accounts.require(&self.accumulated_dep_account_id)?;
        accounts.require(&self.depreciation_expense_account_id)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub account_id: String,
    pub accumulated_dep_account_id: String,
    pub depreciation_expense_account_id: String,
    pub acquisition_date: NaiveDate,
    pub cost: f64,
    pub salvage_value: f64,
    pub useful_life_years: u32,
    pub depreciation_method: DepreciationMethod,
}

impl From<NewAsset> for Asset {
    fn from(new: NewAsset) -> Self {
        Self {
            id: new_id(),
            name: new.name,
            account_id: new.account_id,
            accumulated_dep_account_id: new.accumulated_dep_account_id,
            depreciation_expense_account_id: new.depreciation_expense_account_id,
            acquisition_date: new.acquisition_date,
            cost: new.cost,
            salvage_value: new.salvage_value,
            useful_life_years: new.useful_life_years,
            depreciation_method: new.depreciation_method,
        }
    }
}

/// Whole months from `from` to `to`; a month counts once its day-of-month
/// has been reached.
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Truncate to paise, so rounding never pushes a run past the depreciable base.
fn floor2(amount: f64) -> f64 {
    (amount * 100f64 + 1e-6).floor() / 100f64
}

impl Asset {
    pub fn depreciable_base(&self) -> f64 {
        self.cost - self.salvage_value
    }

    pub fn annual_depreciation(&self) -> f64 {
        match self.depreciation_method {
            DepreciationMethod::StraightLine => {
                self.depreciable_base() / f64::from(self.useful_life_years)
            }
        }
    }

    pub fn life_months(&self) -> u32 {
        self.useful_life_years.saturating_mul(12)
    }

    /// What the accumulated depreciation should be by `as_of`, prorated
    /// by whole months.
    pub fn accumulated_at(&self, as_of: NaiveDate) -> f64 {
        let months = whole_months_between(self.acquisition_date, as_of);
        if months >= self.life_months() {
            return self.depreciable_base();
        }
        (self.annual_depreciation() / 12f64 * f64::from(months)).min(self.depreciable_base())
    }

    /// The entry that brings accumulated depreciation up to date, given what
    /// earlier runs already posted. `None` when nothing is due.
    pub fn depreciation_entry(
        &self,
        as_of: NaiveDate,
        already_posted: f64,
    ) -> Option<JournalEntry> {
        let due = floor2(self.accumulated_at(as_of) - already_posted);
        if due < 0.01 {
            return None;
        }

        Some(JournalEntry {
            id: new_id(),
            date: as_of,
            memo: format!("Depreciation: {}", self.name),
            lines: vec![
                JournalLine::new(
                    &self.depreciation_expense_account_id,
                    &self.name,
                    Side::Debit(due),
                ),
                JournalLine::new(&self.accumulated_dep_account_id, &self.name, Side::Credit(due)),
            ],
            source: EntrySource::Depreciation {
                asset_id: self.id.clone(),
            },
        })
    }

    pub fn acquisition_entry(&self, funding_account_id: &str) -> JournalEntry {
        JournalEntry {
            id: new_id(),
            date: self.acquisition_date,
            memo: format!("Acquisition: {}", self.name),
            lines: vec![
                JournalLine::new(&self.account_id, &self.name, Side::Debit(self.cost)),
                JournalLine::new(funding_account_id, &self.name, Side::Credit(self.cost)),
            ],
            source: EntrySource::Acquisition {
                asset_id: self.id.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AssetRegister {
    assets: Vec<Asset>,
}

impl AssetRegister {
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn insert(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    pub fn list(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
