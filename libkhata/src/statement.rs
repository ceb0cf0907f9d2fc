use crate::account::{Account, AccountType};
use crate::amount::Side;
use crate::asset::{DepreciationMethod, NewAsset};
use crate::journal::DraftLine;
use crate::parser::{inner_str, Rule};
use chrono::NaiveDate;
use pest::iterators::{Pair, Pairs};

use std::convert::TryFrom;

#[derive(Debug, PartialEq)]
pub enum Statement<'s> {
    OpenAccount(Account),
    Entry(NaiveDate, ParsedEntry<'s>),
    Asset(NaiveDate, ParsedAsset<'s>),
    Depreciate(NaiveDate),
}

impl<'s> TryFrom<Pair<'s, Rule>> for Statement<'s> {
    type Error = anyhow::Error;

    fn try_from(pair: Pair<'s, Rule>) -> Result<Self, Self::Error> {
        let inner = pair.into_inner().next().ok_or(anyhow::Error::msg(
            "invalid next token, expected statements",
        ))?;
        Self::into_statement(inner)
    }
}

fn next_token<'s>(pairs: &mut Pairs<'s, Rule>, expected: &str) -> anyhow::Result<Pair<'s, Rule>> {
    pairs.next().ok_or(anyhow::Error::msg(format!(
        "invalid next token, expected {}",
        expected
    )))
}

macro_rules! parse_next {
    ($parser:ident, $pairs:ident) => {
        $parser::parse(next_token(&mut $pairs, stringify!($parser))?)?
    };
}

fn parse_number(token: Pair<'_, Rule>) -> anyhow::Result<f64> {
    Ok(token.as_str().parse::<f64>()?)
}

#[derive(Debug, PartialEq)]
pub struct ParsedPosting<'s> {
    pub account: &'s str,
    pub side: Side,
    pub description: Option<&'s str>,
}

impl<'s> ParsedPosting<'s> {
    pub fn parse(token: Pair<'s, Rule>) -> anyhow::Result<Self> {
        let mut pairs = token.into_inner();
        let account = next_token(&mut pairs, "account")?.as_str();
        let side = next_token(&mut pairs, "Dr or Cr")?.as_str().to_ascii_lowercase();
        let amount = parse_number(next_token(&mut pairs, "amount")?)?;
        let side = match side.as_str() {
            "dr" => Side::Debit(amount),
            _ => Side::Credit(amount),
        };

        Ok(ParsedPosting {
            account,
            side,
            description: pairs.next().map(inner_str),
        })
    }

    fn draft(&self) -> DraftLine {
        let line = match self.side {
            Side::Debit(amount) => DraftLine::debit(self.account, amount),
            Side::Credit(amount) => DraftLine::credit(self.account, amount),
        };
        match self.description {
            Some(description) => line.with_description(description),
            None => line,
        }
    }
}

/// A dated entry with its postings and the optional `offset` account used to
/// auto-balance a single posting.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedEntry<'s> {
    pub memo: &'s str,
    pub postings: Vec<ParsedPosting<'s>>,
    pub offset: Option<&'s str>,
}

impl<'s> ParsedEntry<'s> {
    fn parse_postings(&mut self, token: Pair<'s, Rule>) -> anyhow::Result<()> {
        for pair in token.into_inner() {
            match pair.as_rule() {
                Rule::posting => self.postings.push(ParsedPosting::parse(pair)?),
                Rule::offset => {
                    if self.offset.is_some() {
                        return Err(anyhow::Error::msg(format!(
                            "offset given twice in `{}'",
                            self.memo
                        )));
                    }
                    self.offset = Some(next_token(&mut pair.into_inner(), "account")?.as_str());
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    pub fn lines(&self) -> Vec<DraftLine> {
        self.postings.iter().map(ParsedPosting::draft).collect()
    }
}

#[derive(Debug, PartialEq)]
pub struct ParsedAsset<'s> {
    pub name: &'s str,
    pub cost: f64,
    pub salvage_value: f64,
    pub useful_life_years: u32,
    pub account: &'s str,
    pub accumulated_dep_account: &'s str,
    pub depreciation_expense_account: &'s str,
    pub funding_account: &'s str,
}

impl<'s> ParsedAsset<'s> {
    fn parse(pairs: &mut Pairs<'s, Rule>) -> anyhow::Result<Self> {
        Ok(ParsedAsset {
            name: inner_str(next_token(pairs, "asset name")?),
            cost: parse_number(next_token(pairs, "cost")?)?,
            salvage_value: parse_number(next_token(pairs, "salvage value")?)?,
            useful_life_years: next_token(pairs, "useful life")?.as_str().parse()?,
            account: next_token(pairs, "asset account")?.as_str(),
            accumulated_dep_account: next_token(pairs, "accumulated depreciation account")?
                .as_str(),
            depreciation_expense_account: next_token(pairs, "depreciation expense account")?
                .as_str(),
            funding_account: next_token(pairs, "funding account")?.as_str(),
        })
    }

    pub fn into_new_asset(self, acquisition_date: NaiveDate) -> NewAsset {
        NewAsset {
            name: self.name.to_string(),
            account_id: self.account.to_string(),
            accumulated_dep_account_id: self.accumulated_dep_account.to_string(),
            depreciation_expense_account_id: self.depreciation_expense_account.to_string(),
            acquisition_date,
            cost: self.cost,
            salvage_value: self.salvage_value,
            useful_life_years: self.useful_life_years,
            depreciation_method: DepreciationMethod::StraightLine,
        }
    }
}

impl<'s> Statement<'s> {
    fn into_statement(statement: Pair<'s, Rule>) -> anyhow::Result<Self> {
        let tag = statement.as_rule();
        let mut pairs = statement.into_inner();

        if tag == Rule::open_statement {
            let code = next_token(&mut pairs, "account code")?.as_str();
            let account_type = parse_next!(AccountType, pairs);
            let name = inner_str(next_token(&mut pairs, "account name")?);
            return Ok(Self::OpenAccount(Account::new(code, name, account_type)));
        }

        let datestr = next_token(&mut pairs, "date str")?.as_str();
        let date = NaiveDate::parse_from_str(datestr, "%Y-%m-%d")?;

        let stmt = match tag {
            Rule::entry_statement => {
                let mut entry = ParsedEntry {
                    memo: inner_str(next_token(&mut pairs, "memo")?),
                    ..Default::default()
                };
                entry.parse_postings(next_token(&mut pairs, "postings")?)?;
                Self::Entry(date, entry)
            }
            Rule::asset_statement => Self::Asset(date, ParsedAsset::parse(&mut pairs)?),
            Rule::depreciate_statement => Self::Depreciate(date),
            _ => unreachable!(),
        };

        Ok(stmt)
    }
}
