use crate::{
    account::{Account, AccountStore, AccountType},
    amount::{approx_eq, is_negligible, Totals},
    journal::{Journal, JournalEntry},
};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

pub const CURRENT_EARNINGS: &str = "Current earnings";

/// Per-account debit and credit sums over `entries`.
pub fn fold<'a>(entries: impl Iterator<Item = &'a JournalEntry>) -> IndexMap<String, Totals> {
    let mut balances: IndexMap<String, Totals> = IndexMap::new();
    for entry in entries {
        for line in &entry.lines {
            *balances.entry(line.account_id.clone()).or_default() += line.side;
        }
    }
    balances
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: String,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: f64,
    pub credit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: f64,
    pub total_credit: f64,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        approx_eq(self.total_debit, self.total_credit)
    }

    pub fn row(&self, account_id: &str) -> Option<&TrialBalanceRow> {
        self.rows.iter().find(|row| row.account_id == account_id)
    }
}

pub fn trial_balance(accounts: &AccountStore, journal: &Journal, as_of: NaiveDate) -> TrialBalance {
    let balances = fold(journal.until(as_of));
    let mut rows = Vec::new();
    let (mut total_debit, mut total_credit) = (0f64, 0f64);

    for account in accounts.list() {
        let net = balances
            .get(&account.id)
            .map(Totals::net)
            .unwrap_or_default();
        let debit = net.max(0f64);
        let credit = (-net).max(0f64);
        if debit + credit < 0.001 {
            continue;
        }
        total_debit += debit;
        total_credit += credit;
        rows.push(TrialBalanceRow {
            account_id: account.id,
            code: account.code,
            name: account.name,
            account_type: account.account_type,
            debit,
            credit,
        });
    }

    TrialBalance {
        as_of,
        rows,
        total_debit,
        total_credit,
    }
}

/// One account on a statement, with its balance on the account's normal side.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub account_id: String,
    pub code: String,
    pub name: String,
    pub amount: f64,
}

impl ReportRow {
    fn from_account(account: Account, amount: f64) -> Self {
        Self {
            account_id: account.id,
            code: account.code,
            name: account.name,
            amount,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Section {
    pub rows: Vec<ReportRow>,
    pub total: f64,
}

impl Section {
    fn push(&mut self, row: ReportRow) {
        self.total += row.amount;
        self.rows.push(row);
    }

    pub fn row(&self, account_id: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.account_id == account_id)
    }
}

fn natural_amount(account_type: AccountType, totals: &Totals) -> f64 {
    if account_type.is_debit_normal() {
        totals.net()
    } else {
        -totals.net()
    }
}

fn sections_for(
    accounts: &AccountStore,
    balances: &IndexMap<String, Totals>,
    kinds: &[AccountType],
) -> Vec<Section> {
    let mut sections = vec![Section::default(); kinds.len()];
    for account in accounts.list() {
        let Some(pos) = kinds.iter().position(|kind| *kind == account.account_type) else {
            continue;
        };
        let Some(totals) = balances.get(&account.id) else {
            continue;
        };
        let amount = natural_amount(account.account_type, totals);
        if is_negligible(amount) {
            continue;
        }
        if let Some(section) = sections.get_mut(pos) {
            section.push(ReportRow::from_account(account, amount));
        }
    }
    sections
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: Section,
    pub liabilities: Section,
    pub equity: Section,
}

impl BalanceSheet {
    pub fn liabilities_and_equity(&self) -> f64 {
        self.liabilities.total + self.equity.total
    }

    pub fn is_balanced(&self) -> bool {
        approx_eq(self.assets.total, self.liabilities_and_equity())
    }
}

/// Income and expenses not yet closed into equity show up as a
/// "Current earnings" line, which keeps assets = liabilities + equity.
pub fn balance_sheet(accounts: &AccountStore, journal: &Journal, as_of: NaiveDate) -> BalanceSheet {
    let balances = fold(journal.until(as_of));
    let mut sections = sections_for(
        accounts,
        &balances,
        &[
            AccountType::Assets,
            AccountType::Liabilities,
            AccountType::Equity,
            AccountType::Income,
            AccountType::Expenses,
        ],
    )
    .into_iter();
    let mut next = || sections.next().unwrap_or_default();
    let (assets, liabilities, mut equity, income, expenses) =
        (next(), next(), next(), next(), next());

    let earnings = income.total - expenses.total;
    if !is_negligible(earnings) {
        equity.push(ReportRow {
            account_id: String::new(),
            code: String::new(),
            name: CURRENT_EARNINGS.to_string(),
            amount: earnings,
        });
    }

    let sheet = BalanceSheet {
        as_of,
        assets,
        liabilities,
        equity,
    };
    if !sheet.is_balanced() {
        tracing::warn!(
            %as_of,
            assets = sheet.assets.total,
            liabilities_and_equity = sheet.liabilities_and_equity(),
            "balance sheet does not balance"
        );
    }
    sheet
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IncomeStatement {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: Section,
    pub expenses: Section,
    pub net_income: f64,
}

pub fn income_statement(
    accounts: &AccountStore,
    journal: &Journal,
    start: NaiveDate,
    end: NaiveDate,
) -> IncomeStatement {
    let balances = fold(journal.between(Some(start), end));
    let mut sections = sections_for(
        accounts,
        &balances,
        &[AccountType::Income, AccountType::Expenses],
    )
    .into_iter();
    let income = sections.next().unwrap_or_default();
    let expenses = sections.next().unwrap_or_default();
    let net_income = income.total - expenses.total;

    IncomeStatement {
        start,
        end,
        income,
        expenses,
        net_income,
    }
}
