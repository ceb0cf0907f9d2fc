//! Khata - a double-entry ledger for small Indian businesses
//! ---
//!
//! Books are kept as a chart of accounts, an append-only journal of balanced
//! entries, and a fixed-asset register that feeds straight-line depreciation
//! back into the journal. Trial balance, balance sheet and income statement
//! are folded from the journal on demand.
//!
//! Ledgers can be built through the API or read from a plain text journal,
//! see [`parse`] and [`parse_file`].
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Chart of accounts, see [`AccountStore`][account::AccountStore].
///
/// Account ids are opaque strings; the default chart uses the account code as
/// the id. Accounts are never closed or edited.
pub mod account;

pub mod amount;
pub mod asset;

/// Rule-based category suggestions for bank transactions.
pub mod categorizer;

pub mod error;

/// Financial year and GST helpers.
pub mod india;

pub mod journal;

/// Ledger representation.
pub mod ledger;

/// Our main parser entrypoints.
pub mod parser;

pub mod report;
pub mod statement;
pub mod storage;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use parser::{parse, parse_file};
