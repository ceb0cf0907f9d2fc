use crate::error::{LedgerError, Result};
use crate::parser::Rule;

use indexmap::IndexMap;
use pest::iterators::Pair;
use serde::{Deserialize, Serialize};

use std::cmp::PartialEq;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl AccountType {
    /// Assets and expenses grow on the debit side, everything else on the credit side.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Assets | AccountType::Expenses)
    }

    pub fn is_balance_sheet(&self) -> bool {
        matches!(
            self,
            AccountType::Assets | AccountType::Liabilities | AccountType::Equity
        )
    }

    pub fn parse(token: Pair<'_, Rule>) -> anyhow::Result<AccountType> {
        Ok(token.as_str().try_into()?)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Assets => write!(f, "Assets"),
            AccountType::Liabilities => write!(f, "Liabilities"),
            AccountType::Equity => write!(f, "Equity"),
            AccountType::Income => write!(f, "Income"),
            AccountType::Expenses => write!(f, "Expenses"),
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = LedgerError;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "asset" | "assets" => Ok(AccountType::Assets),
            "liability" | "liabilities" => Ok(AccountType::Liabilities),
            "equity" => Ok(AccountType::Equity),
            "income" | "revenue" => Ok(AccountType::Income),
            "expense" | "expenses" => Ok(AccountType::Expenses),
            _ => Err(LedgerError::UnknownAccountType(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

impl Account {
    pub fn new(code: &str, name: &str, account_type: AccountType) -> Self {
        Self {
            id: code.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            account_type,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

/// Chart of accounts, keyed by account id.
///
/// Accounts are never edited or removed once opened, journal lines keep
/// referring to them by id forever.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountStore {
    accounts: IndexMap<String, Account>,
}

const DEFAULT_CHART: &[(&str, &str, AccountType)] = &[
    ("1000", "Cash", AccountType::Assets),
    ("1100", "Bank", AccountType::Assets),
    ("1200", "Accounts Receivable", AccountType::Assets),
    ("1300", "GST Input Credit", AccountType::Assets),
    ("1500", "Fixed Assets", AccountType::Assets),
    ("1510", "Accumulated Depreciation", AccountType::Assets),
    ("2000", "Accounts Payable", AccountType::Liabilities),
    ("2100", "GST Payable", AccountType::Liabilities),
    ("3000", "Owner's Capital", AccountType::Equity),
    ("3100", "Retained Earnings", AccountType::Equity),
    ("4000", "Sales", AccountType::Income),
    ("4100", "Other Income", AccountType::Income),
    ("5000", "Office Expense", AccountType::Expenses),
    ("5100", "Rent", AccountType::Expenses),
    ("5200", "Salaries", AccountType::Expenses),
    ("6400", "Depreciation Expense", AccountType::Expenses),
];

impl AccountStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// A small-business chart, ids equal to codes.
    ///
    /// Accumulated depreciation is kept as an asset account carrying a credit
    /// balance (a contra asset), so it nets against fixed assets on the balance
    /// sheet.
    pub fn with_default_chart() -> Self {
        let mut store = Self::new();
        for (code, name, account_type) in DEFAULT_CHART {
            store
                .accounts
                .insert(code.to_string(), Account::new(code, name, *account_type));
        }
        store
    }

    pub fn open(&mut self, account: Account) -> Result<()> {
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::DuplicateAccount(account.id));
        }
        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Account> {
        self.get(id)
            .ok_or_else(|| LedgerError::UnknownAccount(id.to_string()))
    }

    pub fn account_type(&self, id: &str) -> Option<AccountType> {
        self.get(id).map(|acc| acc.account_type)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts ordered by code.
    pub fn list(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }
}
