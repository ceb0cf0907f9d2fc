use crate::{
    account::{AccountStore, AccountType},
    amount::{Side, Totals},
    error::{LedgerError, Result},
};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeMap;

pub const AUTO_BALANCE_DESCRIPTION: &str = "Auto balance";

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A line as the user typed it: either side may be filled, or both, or none.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftLine {
    pub account_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
}

impl DraftLine {
    pub fn debit(account_id: &str, amount: f64) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
            debit: amount,
            ..Default::default()
        }
    }

    pub fn credit(account_id: &str, amount: f64) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
            credit: amount,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.debit <= 0f64 && self.credit <= 0f64
    }

    fn is_single_sided(&self) -> bool {
        (self.debit > 0f64) != (self.credit > 0f64)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub memo: String,
    pub lines: Vec<DraftLine>,
}

impl NewEntry {
    pub fn new(date: NaiveDate, memo: &str, lines: Vec<DraftLine>) -> Self {
        Self {
            date,
            memo: memo.to_string(),
            lines,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub description: String,
    pub side: Side,
}

impl JournalLine {
    pub fn new(account_id: &str, description: &str, side: Side) -> Self {
        Self {
            id: new_id(),
            account_id: account_id.to_string(),
            description: description.to_string(),
            side,
        }
    }
}

/// Where an entry came from. Depreciation runs look at this to find what
/// they already posted for an asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EntrySource {
    #[default]
    Manual,
    Acquisition {
        asset_id: String,
    },
    Depreciation {
        asset_id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: NaiveDate,
    pub memo: String,
    pub lines: Vec<JournalLine>,
    #[serde(default)]
    pub source: EntrySource,
}

impl JournalEntry {
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for line in &self.lines {
            totals += line.side;
        }
        totals
    }
}

/// Turns user lines into posted lines, or explains what is wrong with them.
/// Lines with nothing on either side are dropped.
fn check_amounts(lines: &[DraftLine]) -> Result<()> {
    for (idx, line) in lines.iter().enumerate() {
        for amount in [line.debit, line.credit] {
            if !amount.is_finite() || amount < 0f64 {
                return Err(LedgerError::InvalidAmount { line: idx, amount });
            }
        }
    }
    Ok(())
}

pub fn validate_lines(lines: &[DraftLine], accounts: &AccountStore) -> Result<Vec<JournalLine>> {
    check_amounts(lines)?;

    let mut posted = Vec::new();
    let mut totals = Totals::default();
    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let account_id = match line.account_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(LedgerError::MissingAccount { line: idx }),
        };
        accounts.require(account_id)?;
        if !line.is_single_sided() {
            return Err(LedgerError::BothSides { line: idx });
        }
        let side = if line.debit > 0f64 {
            Side::Debit(line.debit)
        } else {
            Side::Credit(line.credit)
        };
        totals += side;
        posted.push(JournalLine::new(account_id, &line.description, side));
    }

    if posted.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }
    ensure_balanced(&totals)?;

    Ok(posted)
}

/// Same checks for an entry that already has typed lines, e.g. one loaded
/// from storage or generated by a depreciation run.
pub fn validate_entry(entry: &JournalEntry, accounts: &AccountStore) -> Result<()> {
    if entry.lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }
    for (idx, line) in entry.lines.iter().enumerate() {
        let amount = line.side.amount();
        if !amount.is_finite() || amount <= 0f64 {
            return Err(LedgerError::InvalidAmount { line: idx, amount });
        }
        accounts.require(&line.account_id)?;
    }
    ensure_balanced(&entry.totals())
}

fn ensure_balanced(totals: &Totals) -> Result<()> {
    if totals.is_balanced() {
        Ok(())
    } else {
        Err(LedgerError::UnbalancedEntry {
            debit_total: totals.debit,
            credit_total: totals.credit,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BalancingProposal {
    /// The user line, possibly moved to the debit side.
    pub line: DraftLine,
    pub balancing: DraftLine,
    pub flipped: bool,
}

/// Builds the offsetting line for a single one-sided line.
///
/// A credit typed against an expense or asset account is assumed to be a
/// slip and is turned into a debit of the same size first.
pub fn propose_balancing_line(
    line: &DraftLine,
    accounts: &AccountStore,
    offset_account_id: &str,
) -> Result<BalancingProposal> {
    if line.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }
    let account_id = match line.account_id.as_deref() {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Err(LedgerError::MissingAccount { line: 0 }),
    };
    if !line.is_single_sided() {
        return Err(LedgerError::BothSides { line: 0 });
    }
    let account_type = accounts.require(account_id)?.account_type;
    accounts.require(offset_account_id)?;

    let mut line = line.clone();
    let mut flipped = false;
    if line.credit > 0f64
        && matches!(account_type, AccountType::Expenses | AccountType::Assets)
    {
        tracing::warn!(
            account = account_id,
            amount = line.credit,
            "credit on {} account treated as debit",
            account_type
        );
        line.debit = line.credit;
        line.credit = 0f64;
        flipped = true;
    }

    let balancing = DraftLine {
        account_id: Some(offset_account_id.to_string()),
        description: AUTO_BALANCE_DESCRIPTION.to_string(),
        debit: line.credit,
        credit: line.debit,
    };

    Ok(BalancingProposal {
        line,
        balancing,
        flipped,
    })
}

/// Fills in the offset line when the user entered exactly one one-sided line.
/// Anything else comes back as typed (minus empty lines) and is left to the
/// balance check when posting.
pub fn auto_balance(
    lines: &[DraftLine],
    accounts: &AccountStore,
    offset_account_id: &str,
) -> Result<Vec<DraftLine>> {
    check_amounts(lines)?;
    let filled: Vec<&DraftLine> = lines.iter().filter(|line| !line.is_empty()).collect();

    match filled.as_slice() {
        [] => Err(LedgerError::EmptyEntry),
        [only] if only.is_single_sided() => {
            let proposal = propose_balancing_line(only, accounts, offset_account_id)?;
            Ok(vec![proposal.line, proposal.balancing])
        }
        _ => Ok(filled.iter().map(|line| (*line).clone()).collect()),
    }
}

/// Append-only list of posted entries.
///
/// Keeps a date index for range folds and a running per-account total so the
/// current balance of an account does not need a full pass.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    bookings: BTreeMap<NaiveDate, Vec<usize>>,
    balances: IndexMap<String, Totals>,
}

impl Journal {
    pub fn new() -> Self {
        Default::default()
    }

    /// Callers validate first.
    pub(crate) fn append(&mut self, entry: JournalEntry) {
        for line in &entry.lines {
            *self.balances.entry(line.account_id.clone()).or_default() += line.side;
        }
        self.bookings
            .entry(entry.date)
            .or_default()
            .push(self.entries.len());
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn balance(&self, account_id: &str) -> Totals {
        self.balances.get(account_id).copied().unwrap_or_default()
    }

    /// Entries dated within `[start, end]`, by date then insertion order.
    pub fn between(
        &self,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> impl Iterator<Item = &JournalEntry> + '_ {
        let range = match start {
            Some(start) if start > end => None,
            Some(start) => Some(self.bookings.range(start..=end)),
            None => Some(self.bookings.range(..=end)),
        };
        range
            .into_iter()
            .flatten()
            .flat_map(|(_, idxs)| idxs.iter())
            .filter_map(|&idx| self.entries.get(idx))
    }

    pub fn until(&self, as_of: NaiveDate) -> impl Iterator<Item = &JournalEntry> + '_ {
        self.between(None, as_of)
    }
}

#[cfg(test)]
mod tests {
    use crate::account::AccountStore;
    use crate::amount::Side;
    use crate::error::LedgerError;
    use crate::journal::{
        auto_balance, propose_balancing_line, validate_lines, DraftLine, EntrySource, Journal,
        JournalEntry, JournalLine,
    };
    use chrono::NaiveDate;

    use anyhow::{anyhow, Result};

    #[test]
    fn test_validate_drops_empty_lines() -> Result<()> {
        let accounts = AccountStore::with_default_chart();
        let lines = vec![
            DraftLine::debit("5000", 250f64).with_description("Stationery"),
            DraftLine::default(),
            DraftLine::credit("1000", 250f64),
        ];
        let posted = validate_lines(&lines, &accounts)?;
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].side, Side::Debit(250f64));
        assert_eq!(posted[0].description, "Stationery");
        assert_eq!(posted[1].side, Side::Credit(250f64));
        Ok(())
    }

    #[test]
    fn test_validate_errors() {
        let accounts = AccountStore::with_default_chart();

        let empty = validate_lines(&[DraftLine::default()], &accounts).unwrap_err();
        assert!(matches!(empty, LedgerError::EmptyEntry));

        let missing = validate_lines(
            &[DraftLine {
                debit: 10f64,
                ..Default::default()
            }],
            &accounts,
        )
        .unwrap_err();
        assert!(matches!(missing, LedgerError::MissingAccount { line: 0 }));

        let unknown = validate_lines(&[DraftLine::debit("7777", 10f64)], &accounts).unwrap_err();
        assert!(matches!(unknown, LedgerError::UnknownAccount(id) if id == "7777"));

        let both = validate_lines(
            &[DraftLine {
                account_id: Some("5000".to_string()),
                debit: 10f64,
                credit: 10f64,
                ..Default::default()
            }],
            &accounts,
        )
        .unwrap_err();
        assert!(matches!(both, LedgerError::BothSides { line: 0 }));

        let negative = validate_lines(&[DraftLine::debit("5000", -1f64)], &accounts).unwrap_err();
        assert!(matches!(negative, LedgerError::InvalidAmount { line: 0, .. }));

        let unbalanced = validate_lines(
            &[
                DraftLine::debit("5000", 100f64),
                DraftLine::credit("1000", 90f64),
            ],
            &accounts,
        )
        .unwrap_err();
        match unbalanced {
            LedgerError::UnbalancedEntry {
                debit_total,
                credit_total,
            } => {
                assert_eq!(debit_total, 100f64);
                assert_eq!(credit_total, 90f64);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_tolerance() -> Result<()> {
        let accounts = AccountStore::with_default_chart();
        let posted = validate_lines(
            &[
                DraftLine::debit("5000", 100.0004),
                DraftLine::credit("1000", 100f64),
            ],
            &accounts,
        )?;
        assert_eq!(posted.len(), 2);
        Ok(())
    }

    #[test]
    fn test_propose_balancing_line() -> Result<()> {
        let accounts = AccountStore::with_default_chart();

        let proposal =
            propose_balancing_line(&DraftLine::debit("5000", 1000f64), &accounts, "1000")?;
        assert!(!proposal.flipped);
        assert_eq!(proposal.balancing.account_id.as_deref(), Some("1000"));
        assert_eq!(proposal.balancing.credit, 1000f64);
        assert_eq!(proposal.balancing.description, "Auto balance");

        let flipped =
            propose_balancing_line(&DraftLine::credit("5000", 500f64), &accounts, "1000")?;
        assert!(flipped.flipped);
        assert_eq!(flipped.line.debit, 500f64);
        assert_eq!(flipped.line.credit, 0f64);
        assert_eq!(flipped.balancing.credit, 500f64);

        // credits on income accounts are what the user meant
        let sale = propose_balancing_line(&DraftLine::credit("4000", 800f64), &accounts, "1100")?;
        assert!(!sale.flipped);
        assert_eq!(sale.balancing.debit, 800f64);

        let no_offset =
            propose_balancing_line(&DraftLine::debit("5000", 1f64), &accounts, "4242").unwrap_err();
        assert!(matches!(no_offset, LedgerError::UnknownAccount(_)));
        Ok(())
    }

    #[test]
    fn test_auto_balance_leaves_complete_entries() -> Result<()> {
        let accounts = AccountStore::with_default_chart();
        let lines = vec![
            DraftLine::debit("5100", 15000f64),
            DraftLine::credit("1100", 15000f64),
        ];
        assert_eq!(auto_balance(&lines, &accounts, "1000")?, lines);

        let single = auto_balance(
            &[DraftLine::default(), DraftLine::debit("5100", 10f64)],
            &accounts,
            "1000",
        )?;
        assert_eq!(single.len(), 2);

        let missing = auto_balance(
            &[DraftLine {
                credit: 5f64,
                ..Default::default()
            }],
            &accounts,
            "1000",
        )
        .unwrap_err();
        assert_eq!(format!("{}", missing), "Select an account");
        assert_eq!(
            format!("{}", auto_balance(&[], &accounts, "1000").unwrap_err()),
            "Enter an amount"
        );
        Ok(())
    }

    #[test]
    fn test_auto_balance_rejects_negative_amount() {
        let accounts = AccountStore::with_default_chart();
        let err = auto_balance(&[DraftLine::debit("5000", -5f64)], &accounts, "1000").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { line: 0, .. }));

        let err = auto_balance(
            &[DraftLine::debit("5000", 5f64), DraftLine::credit("1000", f64::NAN)],
            &accounts,
            "1000",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { line: 1, .. }));
    }

    #[test]
    fn test_journal_index() -> Result<()> {
        let mut journal = Journal::new();
        let d1 = NaiveDate::from_ymd_opt(2024, 4, 1).ok_or(anyhow!("invalid date"))?;
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 1).ok_or(anyhow!("invalid date"))?;
        for (date, amount) in [(d2, 30f64), (d1, 20f64)] {
            journal.append(JournalEntry {
                id: format!("je-{}", amount),
                date,
                memo: String::new(),
                lines: vec![
                    JournalLine::new("5000", "", Side::Debit(amount)),
                    JournalLine::new("1000", "", Side::Credit(amount)),
                ],
                source: EntrySource::Manual,
            });
        }

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entries()[0].id, "je-30");
        assert_eq!(journal.balance("5000").debit, 50f64);
        assert_eq!(journal.balance("1000").net(), -50f64);
        assert_eq!(journal.balance("9999").net(), 0f64);

        let until: Vec<&str> = journal.until(d1).map(|e| e.id.as_str()).collect();
        assert_eq!(until, vec!["je-20"]);
        let all: Vec<&str> = journal.between(Some(d1), d2).map(|e| e.id.as_str()).collect();
        assert_eq!(all, vec!["je-20", "je-30"]);
        assert_eq!(journal.between(Some(d2), d1).count(), 0);
        Ok(())
    }
}
