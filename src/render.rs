use libkhata::account::Account;
use libkhata::amount::{format_inr, Side};
use libkhata::asset::Asset;
use libkhata::categorizer::CategorySuggestion;
use libkhata::india::GstBreakdown;
use libkhata::journal::JournalEntry;
use libkhata::report::{BalanceSheet, IncomeStatement, Section, TrialBalance};

const RULE: &str = "----------------------------------------------------------------";

fn money(amount: f64) -> String {
    format!("{:>20}", format_inr(amount))
}

fn blank_or_money(amount: f64) -> String {
    if amount == 0f64 {
        format!("{:>20}", "")
    } else {
        money(amount)
    }
}

pub fn accounts(accounts: &[Account]) {
    for account in accounts {
        println!(
            "{:<8} {:<12} {}",
            account.code,
            account.account_type.to_string(),
            account.name
        );
    }
}

pub fn entries(entries: &[JournalEntry]) {
    for entry in entries {
        println!("{} {}", entry.date, entry.memo);
        for line in &entry.lines {
            println!(
                "    {:<8}{}{}  {}",
                line.account_id,
                blank_or_money(line.side.debit()),
                blank_or_money(line.side.credit()),
                line.description
            );
        }
    }
}

pub fn trial_balance(tb: &TrialBalance) {
    println!("Trial balance as of {}", tb.as_of);
    println!("{}", RULE);
    for row in &tb.rows {
        println!(
            "{:<8}{:<24}{}{}",
            row.code,
            row.name,
            blank_or_money(row.debit),
            blank_or_money(row.credit)
        );
    }
    println!("{}", RULE);
    println!("{:<32}{}{}", "Total", money(tb.total_debit), money(tb.total_credit));
    if !tb.is_balanced() {
        println!("NOT BALANCED");
    }
}

fn section(title: &str, section: &Section) {
    println!("{}", title);
    for row in &section.rows {
        println!("  {:<8}{:<30}{}", row.code, row.name, money(row.amount));
    }
    println!("  {:<38}{}", format!("Total {}", title.to_lowercase()), money(section.total));
}

pub fn balance_sheet(sheet: &BalanceSheet) {
    println!("Balance sheet as of {}", sheet.as_of);
    println!("{}", RULE);
    section("Assets", &sheet.assets);
    section("Liabilities", &sheet.liabilities);
    section("Equity", &sheet.equity);
    println!("{}", RULE);
    println!(
        "{:<40}{}",
        "Liabilities and equity",
        money(sheet.liabilities_and_equity())
    );
}

pub fn income_statement(statement: &IncomeStatement) {
    println!("Income statement {} to {}", statement.start, statement.end);
    println!("{}", RULE);
    section("Income", &statement.income);
    section("Expenses", &statement.expenses);
    println!("{}", RULE);
    println!("{:<40}{}", "Net income", money(statement.net_income));
}

pub fn suggestions(suggestions: &[CategorySuggestion]) {
    if suggestions.is_empty() {
        println!("no category matched");
    }
    for suggestion in suggestions {
        println!(
            "{:<16} {:>3}  {:>4.0}%  {}",
            suggestion.category,
            suggestion.score,
            suggestion.confidence * 100f64,
            suggestion.reasoning
        );
    }
}

pub fn gst(breakdown: &GstBreakdown) {
    println!("{:<10}{}", "Taxable", money(breakdown.taxable));
    if breakdown.igst > 0f64 {
        println!("{:<10}{}", "IGST", money(breakdown.igst));
    } else {
        println!("{:<10}{}", "CGST", money(breakdown.cgst));
        println!("{:<10}{}", "SGST", money(breakdown.sgst));
    }
    println!("{:<10}{}", "Total", money(breakdown.total));
}

/// A quoted journal string. The grammar keeps escapes verbatim, so
/// characters that would need one are replaced instead.
fn quoted(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            '"' => '\'',
            '\\' => '/',
            '\n' | '\r' | '\t' => ' ',
            c => c,
        })
        .collect();
    format!("\"{}\"", cleaned)
}

/// A posted entry as journal text, every line explicit.
pub fn entry_text(entry: &JournalEntry) -> String {
    let mut text = format!("{} * {}\n", entry.date, quoted(&entry.memo));
    for line in &entry.lines {
        let (side, amount) = match line.side {
            Side::Debit(amount) => ("Dr", amount),
            Side::Credit(amount) => ("Cr", amount),
        };
        text.push_str(&format!("  {} {} {}", line.account_id, side, amount));
        if !line.description.is_empty() {
            text.push_str(&format!(" {}", quoted(&line.description)));
        }
        text.push('\n');
    }
    text
}

/// An `asset` statement. Reading it back posts the acquisition again.
pub fn asset_text(asset: &Asset, funding_account_id: &str) -> String {
    format!(
        "{} asset {} {} salvage {} life {} accounts {} {} {} from {}\n",
        asset.acquisition_date,
        quoted(&asset.name),
        asset.cost,
        asset.salvage_value,
        asset.useful_life_years,
        asset.account_id,
        asset.accumulated_dep_account_id,
        asset.depreciation_expense_account_id,
        funding_account_id
    )
}
