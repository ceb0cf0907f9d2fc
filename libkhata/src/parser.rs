use crate::ledger::Ledger;
use anyhow::{anyhow, Context, Result};
use pest::iterators::Pair;
use pest::Parser;

use std::fs;
use std::path::Path;

#[derive(Parser)]
#[grammar = "khata.pest"]
pub struct LedgerParser;

/// Reads a journal file into `carried_ledger`, or into an empty ledger.
/// `include` paths are resolved against the including file's directory.
pub fn parse_file(path: &Path, carried_ledger: Option<Ledger>) -> Result<Ledger> {
    let fcontent = fs::read_to_string(path)
        .with_context(|| format!("cannot read journal `{}'", path.display()))?;
    parse_with_base(&fcontent, carried_ledger.unwrap_or_default(), path.parent())
}

pub fn parse(input: &str, carried_ledger: Option<Ledger>) -> Result<Ledger> {
    parse_with_base(input, carried_ledger.unwrap_or_default(), None)
}

fn parse_with_base(input: &str, mut ledger: Ledger, base: Option<&Path>) -> Result<Ledger> {
    let statements = LedgerParser::parse(Rule::ledger, input)?;

    for statement in statements {
        let (line, _) = statement.as_span().start_pos().line_col();
        let statement_str = statement.as_str().trim().to_string();
        match statement.as_rule() {
            Rule::include => {
                let target = inner_str(
                    statement
                        .into_inner()
                        .next()
                        .ok_or(anyhow!(format!("unexpected token: {}", statement_str)))?,
                );
                let path = match base {
                    Some(base) => base.join(target),
                    None => Path::new(target).to_path_buf(),
                };
                tracing::debug!(path = %path.display(), "include");
                ledger = parse_file(&path, Some(ledger))?
            }
            Rule::option => ledger.parse_option(statement)?,
            Rule::statement => ledger
                .process_statement(statement.try_into()?)
                .with_context(|| format!("line {}: {}", line, statement_str))?,
            Rule::EOI => (),
            _ => return Err(anyhow!(format!("unexpected token: {}", statement_str))),
        };
    }

    Ok(ledger)
}

/// Contents of a quoted string token, without the quotes.
pub fn inner_str<'s>(token: Pair<'s, Rule>) -> &'s str {
    token
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::error::LedgerError;
    use crate::ledger::Ledger;
    use crate::parser::{parse, parse_file};
    use chrono::NaiveDate;

    use anyhow::{anyhow, Result};

    const BOOKS: &str = r#"; Sharma Traders, FY 2024-25
option "title" "Sharma Traders"

open 1000 Assets "Cash"
open 1100 Assets "Bank"
open 1500 Assets "Fixed Assets"
open 1510 Assets "Accumulated Depreciation"
open 3000 Equity "Owner's Capital"
open 5000 Expenses "Office Expense"
open 6400 Expenses "Depreciation Expense"

2024-04-01 * "Capital introduced"
    1100 Dr 500000
    3000 Cr 500000 ; owner's savings

2024-04-01 * "Office supplies"
    5000 Dr 1000.00 "Paper"
    1000 Cr 1000.00

2024-04-02 * "Tea"
    5000 Dr 150
    offset 1000

2024-04-01 asset "Laptop" 120000 salvage 0 life 5 accounts 1500 1510 6400 from 1100
2025-04-01 depreciate
"#;

    #[test]
    fn test_parse_books() -> Result<()> {
        let ledger = parse(BOOKS, None)?;

        assert_eq!(ledger.get_option("title").unwrap(), "Sharma Traders");
        assert_eq!(ledger.list_accounts().len(), 7);
        // capital, supplies, tea, acquisition, depreciation
        assert_eq!(ledger.list_journal_entries().len(), 5);
        assert_eq!(ledger.account_balance("5000").debit, 1_150f64);
        assert_eq!(ledger.account_balance("1000").credit, 1_150f64);
        assert_eq!(ledger.account_balance("1510").credit, 24_000f64);

        let tb = ledger.trial_balance(
            NaiveDate::from_ymd_opt(2025, 4, 1).ok_or(anyhow!("invalid date"))?,
        );
        assert!(tb.is_balanced());
        Ok(())
    }

    #[test]
    fn test_parse_carried_ledger() -> Result<()> {
        let ledger = parse(r#"option "currency" "INR""#, None)?;
        let ledger = parse(
            r#"open 4000 Income "Sales"
open 1000 Assets "Cash"
2024-05-01 * "Walk-in sale"
    4000 Cr 2500
    offset 1000"#,
            Some(ledger),
        )?;
        assert_eq!(ledger.get_option("currency").unwrap(), "INR");
        assert_eq!(ledger.account_balance("1000").debit, 2_500f64);
        Ok(())
    }

    #[test]
    fn test_unbalanced_entry_is_reported_with_line() -> Result<()> {
        let err = parse(
            r#"open 1000 Assets "Cash"
open 5000 Expenses "Office Expense"
2024-04-01 * "Typo"
    5000 Dr 100
    1000 Cr 90"#,
            None,
        )
        .unwrap_err();
        assert!(format!("{}", err).starts_with("line 3:"));
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::UnbalancedEntry { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_asset_life_out_of_range() -> Result<()> {
        let err = parse(
            "2024-04-01 asset \"Shed\" 1000 salvage 0 life 400000000 \
             accounts 1500 1510 6400 from 1100\n\
             2025-04-01 depreciate\n",
            Some(Ledger::with_default_chart()),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::InvalidAsset(_))
        ));
        Ok(())
    }

    #[test]
    fn test_syntax_error() {
        assert!(parse("2024-04-01 * \"No postings\"", None).is_err());
        assert!(parse("open 1000 \"Cash\"", None).is_err());
    }

    #[test]
    fn test_parse_file_with_include() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("khata-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(
            dir.join("accounts.khata"),
            "open 1000 Assets \"Cash\"\nopen 5100 Expenses \"Rent\"\n",
        )?;
        std::fs::write(
            dir.join("main.khata"),
            "include \"accounts.khata\"\n\
             2024-04-05 * \"April rent\"\n  5100 Dr 15000\n  offset 1000\n",
        )?;

        let ledger = parse_file(&dir.join("main.khata"), None)?;
        assert_eq!(ledger.account_balance("5100").debit, 15_000f64);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
