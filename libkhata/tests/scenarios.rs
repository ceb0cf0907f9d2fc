use libkhata::account::AccountType;
use libkhata::asset::{DepreciationMethod, NewAsset};
use libkhata::journal::{propose_balancing_line, DraftLine, NewEntry, AUTO_BALANCE_DESCRIPTION};
use libkhata::{Ledger, LedgerError};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

fn date(s: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
}

fn laptop(acquired: NaiveDate) -> NewAsset {
    NewAsset {
        name: "Laptop".to_string(),
        account_id: "1500".to_string(),
        accumulated_dep_account_id: "1510".to_string(),
        depreciation_expense_account_id: "6400".to_string(),
        acquisition_date: acquired,
        cost: 120_000f64,
        salvage_value: 0f64,
        useful_life_years: 5,
        depreciation_method: DepreciationMethod::StraightLine,
    }
}

#[test]
fn single_sided_entry_auto_balances() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    assert_eq!(ledger.account("5000").map(|a| a.account_type), Some(AccountType::Expenses));
    let before = ledger.list_journal_entries().len();

    let posted = ledger.add_auto_balanced_entry(
        NewEntry::new(
            date("2024-04-01")?,
            "Stationery",
            vec![DraftLine::debit("5000", 1000f64)],
        ),
        "1000",
    )?;

    assert_eq!(posted.lines.len(), 2);
    assert_eq!(posted.lines[0].account_id, "5000");
    assert_eq!(posted.lines[0].side.debit(), 1000f64);
    assert_eq!(posted.lines[1].account_id, "1000");
    assert_eq!(posted.lines[1].side.credit(), 1000f64);
    assert_eq!(posted.lines[1].description, AUTO_BALANCE_DESCRIPTION);
    assert_eq!(ledger.list_journal_entries().len(), before + 1);

    let tb = ledger.trial_balance(date("2024-04-01")?);
    let expense = tb.row("5000").ok_or(anyhow!("no expense row"))?;
    let cash = tb.row("1000").ok_or(anyhow!("no cash row"))?;
    assert_eq!((expense.debit, expense.credit), (1000f64, 0f64));
    assert_eq!((cash.debit, cash.credit), (0f64, 1000f64));
    Ok(())
}

#[test]
fn credit_on_expense_is_flipped() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    let posted = ledger.add_auto_balanced_entry(
        NewEntry::new(
            date("2024-04-01")?,
            "Courier",
            vec![DraftLine::credit("5000", 500f64)],
        ),
        "1000",
    )?;

    assert_eq!(posted.lines[0].side.debit(), 500f64);
    assert_eq!(posted.lines[1].side.credit(), 500f64);

    let tb = ledger.trial_balance(date("2024-04-01")?);
    assert_eq!(tb.row("5000").ok_or(anyhow!("no expense row"))?.debit, 500f64);
    assert_eq!(tb.row("1000").ok_or(anyhow!("no cash row"))?.credit, 500f64);

    let proposal =
        propose_balancing_line(&DraftLine::credit("5000", 500f64), ledger.accounts(), "1000")?;
    assert!(proposal.flipped);
    Ok(())
}

#[test]
fn credit_on_income_is_kept() -> Result<()> {
    let ledger = Ledger::with_default_chart();
    let proposal =
        propose_balancing_line(&DraftLine::credit("4000", 800f64), ledger.accounts(), "1100")?;
    assert!(!proposal.flipped);
    assert_eq!(proposal.line.credit, 800f64);
    assert_eq!(proposal.balancing.debit, 800f64);
    Ok(())
}

#[test]
fn depreciation_for_one_full_year() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    ledger.add_asset(laptop(date("2024-04-01")?), "1100")?;

    let entries = ledger.generate_depreciation_entries(date("2025-04-01")?);
    let expensed: f64 = entries
        .iter()
        .flat_map(|entry| entry.lines.iter())
        .filter(|line| line.account_id == "6400")
        .map(|line| line.side.debit())
        .sum();
    let accumulated: f64 = entries
        .iter()
        .flat_map(|entry| entry.lines.iter())
        .filter(|line| line.account_id == "1510")
        .map(|line| line.side.credit())
        .sum();
    assert_eq!(expensed, 24_000f64);
    assert_eq!(accumulated, 24_000f64);
    Ok(())
}

#[test]
fn repeated_depreciation_runs_do_not_double_count() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    ledger.add_asset(laptop(date("2024-04-01")?), "1100")?;

    ledger.post_depreciation(date("2024-10-01")?)?;
    ledger.post_depreciation(date("2025-04-01")?)?;
    ledger.post_depreciation(date("2025-04-01")?)?;
    assert_eq!(ledger.account_balance("1510").credit, 24_000f64);
    assert_eq!(ledger.account_balance("6400").debit, 24_000f64);
    Ok(())
}

#[test]
fn backdated_depreciation_run_books_nothing_twice() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    ledger.add_asset(laptop(date("2024-04-01")?), "1100")?;

    let fully = ledger.post_depreciation(date("2029-04-01")?)?;
    assert_eq!(fully.len(), 1);
    assert_eq!(ledger.account_balance("1510").credit, 120_000f64);

    let earlier = ledger.post_depreciation(date("2028-04-01")?)?;
    assert!(earlier.is_empty());
    assert_eq!(ledger.account_balance("1510").credit, 120_000f64);
    assert_eq!(ledger.account_balance("6400").debit, 120_000f64);
    Ok(())
}

#[test]
fn unbalanced_entry_is_rejected() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    let err = ledger
        .add_journal_entry(NewEntry::new(
            date("2024-04-01")?,
            "Short",
            vec![DraftLine::debit("5100", 10_000f64), DraftLine::credit("1100", 9_000f64)],
        ))
        .unwrap_err();

    match err {
        LedgerError::UnbalancedEntry {
            debit_total,
            credit_total,
        } => {
            assert_eq!(debit_total, 10_000f64);
            assert_eq!(credit_total, 9_000f64);
        }
        other => return Err(anyhow!("unexpected error: {}", other)),
    }
    assert_eq!(format!("{}", LedgerError::EmptyEntry), "Enter an amount");
    assert!(ledger.list_journal_entries().is_empty());
    Ok(())
}

#[test]
fn every_auto_balanced_entry_balances() -> Result<()> {
    let mut ledger = Ledger::with_default_chart();
    let lines = [
        DraftLine::debit("5000", 0.1f64),
        DraftLine::credit("5100", 333.33f64),
        DraftLine::credit("4000", 1_234_567.89f64),
        DraftLine::debit("1200", 0.01f64),
    ];
    for line in lines {
        let posted = ledger.add_auto_balanced_entry(
            NewEntry::new(date("2024-06-30")?, "", vec![line]),
            "1100",
        )?;
        let totals = posted.totals();
        assert!((totals.debit - totals.credit).abs() < 1e-3);
    }
    assert!(ledger.trial_balance(date("2024-06-30")?).is_balanced());
    Ok(())
}
