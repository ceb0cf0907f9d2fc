use crate::{
    account::{Account, AccountStore},
    amount::Totals,
    asset::{Asset, AssetRegister, NewAsset},
    error::{LedgerError, Result},
    india::FinancialYear,
    journal::{
        auto_balance, new_id, validate_entry, validate_lines, EntrySource, Journal, JournalEntry,
        NewEntry,
    },
    parser::{inner_str, Rule},
    report::{self, BalanceSheet, IncomeStatement, TrialBalance},
    statement::{ParsedAsset, ParsedEntry, Statement},
    storage::LedgerSnapshot,
};

use anyhow::anyhow;
use chrono::NaiveDate;
use pest::iterators::Pair;

use std::collections::HashMap;

/// The books: chart of accounts, journal and fixed-asset register.
///
/// Every write goes through validation here; reports are folded from the
/// journal on demand.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: AccountStore,
    journal: Journal,
    assets: AssetRegister,
    options: HashMap<String, String>,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger {
            accounts: AccountStore::new(),
            journal: Journal::new(),
            assets: AssetRegister::new(),
            options: HashMap::new(),
        }
    }

    pub fn with_accounts(accounts: AccountStore) -> Ledger {
        Ledger {
            accounts,
            ..Ledger::new()
        }
    }

    pub fn with_default_chart() -> Ledger {
        Self::with_accounts(AccountStore::with_default_chart())
    }

    pub fn parse_option(&mut self, token: Pair<Rule>) -> anyhow::Result<()> {
        let mut option = token.into_inner();
        let key = inner_str(
            option
                .next()
                .ok_or(anyhow!(format!("invalid next token: {}", option.as_str())))?,
        );
        let val = inner_str(
            option
                .next()
                .ok_or(anyhow!(format!("invalid next token: {}", option.as_str())))?,
        );
        self.set_option(key, val);
        Ok(())
    }

    pub fn set_option(&mut self, key: &str, val: &str) {
        self.options.insert(key.to_string(), val.to_string());
    }

    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    pub fn process_statement(&mut self, statement: Statement) -> Result<()> {
        match statement {
            Statement::OpenAccount(account) => self.open_account(account),
            Statement::Entry(date, parsed) => self.parsed_entry(date, parsed),
            Statement::Asset(date, parsed) => self.parsed_asset(date, parsed),
            Statement::Depreciate(date) => self.post_depreciation(date).map(|_| ()),
        }
    }

    fn parsed_entry(&mut self, date: NaiveDate, parsed: ParsedEntry<'_>) -> Result<()> {
        let entry = NewEntry::new(date, parsed.memo, parsed.lines());
        let posted = match parsed.offset {
            Some(offset) => self.add_auto_balanced_entry(entry, offset),
            None => self.add_journal_entry(entry),
        };
        posted.map(|_| ())
    }

    fn parsed_asset(&mut self, date: NaiveDate, parsed: ParsedAsset<'_>) -> Result<()> {
        let funding = parsed.funding_account.to_string();
        self.add_asset(parsed.into_new_asset(date), &funding)
            .map(|_| ())
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn list_accounts(&self) -> Vec<Account> {
        self.accounts.list()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn open_account(&mut self, account: Account) -> Result<()> {
        tracing::debug!(id = %account.id, account_type = %account.account_type, "open account");
        self.accounts.open(account)
    }

    pub fn list_journal_entries(&self) -> &[JournalEntry] {
        self.journal.entries()
    }

    /// Current balance of an account over the whole journal.
    pub fn account_balance(&self, account_id: &str) -> Totals {
        self.journal.balance(account_id)
    }

    /// Validates and appends. Nothing is posted when validation fails.
    pub fn add_journal_entry(&mut self, entry: NewEntry) -> Result<JournalEntry> {
        let lines = validate_lines(&entry.lines, &self.accounts)?;
        let posted = JournalEntry {
            id: new_id(),
            date: entry.date,
            memo: entry.memo,
            lines,
            source: EntrySource::Manual,
        };
        self.append(posted.clone());
        Ok(posted)
    }

    /// Lets a single one-sided line through by adding the offsetting line on
    /// `offset_account_id` first.
    pub fn add_auto_balanced_entry(
        &mut self,
        mut entry: NewEntry,
        offset_account_id: &str,
    ) -> Result<JournalEntry> {
        entry.lines = auto_balance(&entry.lines, &self.accounts, offset_account_id)?;
        self.add_journal_entry(entry)
    }

    /// Posts an entry built elsewhere, e.g. by a depreciation run.
    pub fn post(&mut self, entry: JournalEntry) -> Result<()> {
        validate_entry(&entry, &self.accounts)?;
        self.append(entry);
        Ok(())
    }

    fn append(&mut self, entry: JournalEntry) {
        let totals = entry.totals();
        tracing::debug!(
            id = %entry.id,
            date = %entry.date,
            lines = entry.lines.len(),
            debit = totals.debit,
            credit = totals.credit,
            "post journal entry"
        );
        self.journal.append(entry);
    }

    pub fn list_assets(&self) -> &[Asset] {
        self.assets.list()
    }

    /// Registers the asset and posts its purchase against `funding_account_id`.
    pub fn add_asset(&mut self, new: NewAsset, funding_account_id: &str) -> Result<Asset> {
        new.validate(&self.accounts)?;
        self.accounts.require(funding_account_id)?;

        let asset = Asset::from(new);
        let acquisition = asset.acquisition_entry(funding_account_id);
        validate_entry(&acquisition, &self.accounts)?;

        tracing::info!(
            id = %asset.id,
            name = %asset.name,
            cost = asset.cost,
            acquired = %asset.acquisition_date,
            "asset acquired"
        );
        self.append(acquisition);
        self.assets.insert(asset.clone());
        Ok(asset)
    }

    /// Depreciation already credited for an asset by earlier runs, whatever
    /// their date. A run dated before the latest one therefore finds nothing due.
    pub fn posted_depreciation(&self, asset: &Asset) -> f64 {
        self.journal
            .entries()
            .iter()
            .filter(|entry| match &entry.source {
                EntrySource::Depreciation { asset_id } => *asset_id == asset.id,
                _ => false,
            })
            .flat_map(|entry| entry.lines.iter())
            .filter(|line| line.account_id == asset.accumulated_dep_account_id)
            .map(|line| line.side.credit())
            .sum()
    }

    /// Entries that would bring every asset's depreciation up to `as_of`.
    /// They are not posted.
    pub fn generate_depreciation_entries(&self, as_of: NaiveDate) -> Vec<JournalEntry> {
        self.assets
            .list()
            .iter()
            .filter_map(|asset| asset.depreciation_entry(as_of, self.posted_depreciation(asset)))
            .collect()
    }

    pub fn post_depreciation(&mut self, as_of: NaiveDate) -> Result<Vec<JournalEntry>> {
        let entries = self.generate_depreciation_entries(as_of);
        for entry in &entries {
            self.post(entry.clone())?;
        }
        tracing::info!(%as_of, entries = entries.len(), "depreciation run");
        Ok(entries)
    }

    pub fn trial_balance(&self, as_of: NaiveDate) -> TrialBalance {
        report::trial_balance(&self.accounts, &self.journal, as_of)
    }

    pub fn balance_sheet(&self, as_of: NaiveDate) -> BalanceSheet {
        report::balance_sheet(&self.accounts, &self.journal, as_of)
    }

    pub fn income_statement(&self, start: NaiveDate, end: NaiveDate) -> IncomeStatement {
        report::income_statement(&self.accounts, &self.journal, start, end)
    }

    pub fn income_statement_for(&self, year: FinancialYear) -> IncomeStatement {
        self.income_statement(year.start(), year.end())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            options: self
                .options
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            accounts: self.accounts.list(),
            journal: self.journal.entries().to_vec(),
            assets: self.assets.list().to_vec(),
        }
    }

    /// Rebuilds a ledger from a snapshot, re-checking every entry.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Ledger> {
        let mut ledger = Ledger::new();
        for (key, val) in &snapshot.options {
            ledger.set_option(key, val);
        }
        for account in snapshot.accounts {
            ledger.accounts.open(account)?;
        }
        for asset in snapshot.assets {
            if ledger.assets.get(&asset.id).is_some() {
                return Err(LedgerError::InvalidAsset(format!(
                    "duplicate asset id `{}'",
                    asset.id
                )));
            }
            ledger.assets.insert(asset);
        }
        for entry in snapshot.journal {
            ledger.post(entry)?;
        }
        Ok(ledger)
    }
}
