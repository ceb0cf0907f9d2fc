use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use libkhata::asset::{DepreciationMethod, NewAsset};
use libkhata::categorizer::categorize;
use libkhata::india::{gst_exclusive, gst_inclusive, FinancialYear, GstRate};
use libkhata::journal::{DraftLine, NewEntry};
use libkhata::storage::{JsonFileStorage, LedgerStorage};
use libkhata::Ledger;
use tracing_subscriber::EnvFilter;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

mod render;
mod settings;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "khata", version, about = "Double-entry books from a plain text journal")]
struct Cli {
    /// Settings file, defaults to ./khata.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Journal file to read, overrides the configured one
    #[arg(short, long, env = "KHATA_JOURNAL")]
    journal: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chart of accounts
    Accounts,
    /// Every posted entry
    Journal,
    TrialBalance {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    BalanceSheet {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    IncomeStatement {
        #[arg(long, requires = "to", conflicts_with = "fy")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Financial year, e.g. 2024-25
        #[arg(long)]
        fy: Option<FinancialYear>,
    },
    /// Post a single-line entry, balanced against an offset account
    Post {
        memo: String,
        account: String,
        #[arg(long, conflicts_with = "credit", required_unless_present = "credit")]
        debit: Option<f64>,
        #[arg(long)]
        credit: Option<f64>,
        /// Balancing account, defaults to the configured offset account
        #[arg(long)]
        offset: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Register a fixed asset and post its acquisition
    AddAsset {
        name: String,
        cost: f64,
        #[arg(long, default_value_t = 0f64)]
        salvage: f64,
        /// Useful life in years
        #[arg(long)]
        life: u32,
        /// Defaults to today
        #[arg(long)]
        acquired: Option<NaiveDate>,
        #[arg(long, default_value = "1500")]
        account: String,
        #[arg(long, default_value = "1510")]
        accumulated: String,
        #[arg(long, default_value = "6400")]
        expense: String,
        /// Paying account, defaults to the configured funding account
        #[arg(long)]
        from: Option<String>,
    },
    /// Depreciation due up to a date
    Depreciate {
        #[arg(long)]
        as_of: NaiveDate,
        /// Post the entries and show the resulting trial balance
        #[arg(long)]
        post: bool,
    },
    /// Suggest categories for a bank transaction
    Categorize {
        description: String,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
    },
    /// GST on an amount
    Gst {
        amount: f64,
        /// Rate in percent
        #[arg(long, default_value_t = 18f64)]
        rate: f64,
        /// The amount already includes GST
        #[arg(long)]
        inclusive: bool,
        /// Charge IGST instead of CGST and SGST
        #[arg(long)]
        inter_state: bool,
    },
    /// Write the ledger as JSON
    Export { path: PathBuf },
}

fn init_tracing(settings: &Settings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_ledger(settings: &Settings) -> Result<Ledger> {
    let ledger = if settings.seed_default_chart {
        Ledger::with_default_chart()
    } else {
        Ledger::new()
    };
    match &settings.journal {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading journal");
            libkhata::parse_file(path, Some(ledger))
        }
        None => Ok(ledger),
    }
}

/// Appends statements to the configured journal so the next run reads them.
fn record(settings: &Settings, text: &str) -> Result<()> {
    let path = match &settings.journal {
        Some(path) => path,
        None => {
            tracing::warn!("no journal configured, nothing was saved");
            return Ok(());
        }
    };
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "\n{}", text)?;
    tracing::info!(path = %path.display(), "journal updated");
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.journal.is_some() {
        settings.journal = cli.journal;
    }
    init_tracing(&settings);

    // commands that do not need the books
    match &cli.command {
        Command::Categorize {
            description,
            vendor,
            amount,
        } => {
            render::suggestions(&categorize(description, vendor.as_deref(), *amount));
            return Ok(());
        }
        Command::Gst {
            amount,
            rate,
            inclusive,
            inter_state,
        } => {
            let rate = GstRate::custom(*rate)?;
            let breakdown = if *inclusive {
                gst_inclusive(*amount, rate, !*inter_state)
            } else {
                gst_exclusive(*amount, rate, !*inter_state)
            };
            render::gst(&breakdown);
            return Ok(());
        }
        _ => (),
    }

    let mut ledger = load_ledger(&settings)?;

    match cli.command {
        Command::Accounts => render::accounts(&ledger.list_accounts()),
        Command::Journal => render::entries(ledger.list_journal_entries()),
        Command::TrialBalance { as_of } => {
            render::trial_balance(&ledger.trial_balance(as_of.unwrap_or_else(today)))
        }
        Command::BalanceSheet { as_of } => {
            render::balance_sheet(&ledger.balance_sheet(as_of.unwrap_or_else(today)))
        }
        Command::IncomeStatement { from, to, fy } => {
            let statement = match (from, to, fy) {
                (Some(from), Some(to), _) => ledger.income_statement(from, to),
                (_, _, Some(fy)) => ledger.income_statement_for(fy),
                (None, None, None) => {
                    ledger.income_statement_for(FinancialYear::containing(today()))
                }
                _ => return Err(anyhow!("give both --from and --to, or --fy")),
            };
            render::income_statement(&statement);
        }
        Command::Post {
            memo,
            account,
            debit,
            credit,
            offset,
            date,
        } => {
            let line = match (debit, credit) {
                (Some(amount), None) => DraftLine::debit(&account, amount),
                (None, Some(amount)) => DraftLine::credit(&account, amount),
                _ => return Err(anyhow!("give one of --debit or --credit")),
            };
            let offset = offset.unwrap_or_else(|| settings.offset_account.clone());
            let entry = NewEntry::new(date.unwrap_or_else(today), &memo, vec![line]);
            let posted = ledger.add_auto_balanced_entry(entry, &offset)?;
            render::entries(std::slice::from_ref(&posted));
            record(&settings, &render::entry_text(&posted))?;
        }
        Command::AddAsset {
            name,
            cost,
            salvage,
            life,
            acquired,
            account,
            accumulated,
            expense,
            from,
        } => {
            let funding = from.unwrap_or_else(|| settings.funding_account.clone());
            let asset = ledger.add_asset(
                NewAsset {
                    name,
                    account_id: account,
                    accumulated_dep_account_id: accumulated,
                    depreciation_expense_account_id: expense,
                    acquisition_date: acquired.unwrap_or_else(today),
                    cost,
                    salvage_value: salvage,
                    useful_life_years: life,
                    depreciation_method: DepreciationMethod::StraightLine,
                },
                &funding,
            )?;
            if let Some(acquisition) = ledger.list_journal_entries().last() {
                render::entries(std::slice::from_ref(acquisition));
            }
            record(&settings, &render::asset_text(&asset, &funding))?;
        }
        Command::Depreciate { as_of, post } => {
            if post {
                let posted = ledger.post_depreciation(as_of)?;
                render::entries(&posted);
                render::trial_balance(&ledger.trial_balance(as_of));
            } else {
                render::entries(&ledger.generate_depreciation_entries(as_of));
            }
        }
        Command::Export { path } => {
            let mut storage = JsonFileStorage::new(&path);
            storage.save(&ledger.snapshot())?;
            tracing::info!(path = %path.display(), "ledger exported");
        }
        Command::Categorize { .. } | Command::Gst { .. } => (),
    }

    Ok(())
}
