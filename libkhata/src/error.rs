use thiserror::Error;

/// Everything the ledger refuses to do, and why.
///
/// The `Display` text of the entry validation variants is what the user sees,
/// so keep them short.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Enter an amount")]
    EmptyEntry,

    #[error("Select an account")]
    MissingAccount { line: usize },

    #[error("unknown account `{0}'")]
    UnknownAccount(String),

    #[error("account `{0}' already exists")]
    DuplicateAccount(String),

    #[error("unknown account type `{0}'")]
    UnknownAccountType(String),

    #[error("invalid amount on line {line}: {amount}")]
    InvalidAmount { line: usize, amount: f64 },

    #[error("line {line} has both a debit and a credit")]
    BothSides { line: usize },

    #[error("Entry not balanced. Add balancing line.")]
    UnbalancedEntry { debit_total: f64, credit_total: f64 },

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
