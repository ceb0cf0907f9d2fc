//! Keyword scoring for bank transactions.
//!
//! Each rule gives points for keywords found in the description or vendor,
//! for wildcard patterns matching the combined text, and for an amount that
//! falls in the rule's usual range. Nothing is learned; the table is fixed.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use std::cmp::Ordering;

const KEYWORD_POINTS: u32 = 10;
const PATTERN_POINTS: u32 = 15;
const AMOUNT_POINTS: u32 = 5;
const FULL_CONFIDENCE_SCORE: f64 = 50f64;
const MAX_SUGGESTIONS: usize = 3;

struct RuleDef {
    category: &'static str,
    keywords: &'static [&'static str],
    patterns: &'static [&'static str],
    amount_range: Option<(f64, f64)>,
}

const RULES: &[RuleDef] = &[
    RuleDef {
        category: "Food & Dining",
        keywords: &["swiggy", "zomato", "restaurant", "cafe", "dominos", "pizza", "hotel"],
        patterns: &["*food*", "*biryani*"],
        amount_range: Some((50f64, 5_000f64)),
    },
    RuleDef {
        category: "Groceries",
        keywords: &["bigbasket", "blinkit", "zepto", "dmart", "grocery", "kirana", "supermarket"],
        patterns: &["*mart*"],
        amount_range: Some((100f64, 15_000f64)),
    },
    RuleDef {
        category: "Transportation",
        keywords: &["uber", "ola", "rapido", "petrol", "diesel", "fuel", "metro", "fastag"],
        patterns: &["*cab*", "*parking*"],
        amount_range: Some((30f64, 5_000f64)),
    },
    RuleDef {
        category: "Shopping",
        keywords: &["amazon", "flipkart", "myntra", "ajio", "nykaa", "meesho"],
        patterns: &["*store*", "*shop*"],
        amount_range: None,
    },
    RuleDef {
        category: "Utilities",
        keywords: &[
            "electricity",
            "bescom",
            "water",
            "gas",
            "broadband",
            "jio",
            "airtel",
            "recharge",
        ],
        patterns: &["*bill*", "*postpaid*"],
        amount_range: Some((100f64, 10_000f64)),
    },
    RuleDef {
        category: "Rent",
        keywords: &["rent", "landlord", "lease", "pg"],
        patterns: &["*house rent*"],
        amount_range: Some((5_000f64, 200_000f64)),
    },
    RuleDef {
        category: "Salary",
        keywords: &["salary", "payroll", "stipend", "wages"],
        patterns: &["*sal cr*", "*neft*salary*"],
        amount_range: Some((10_000f64, 10_000_000f64)),
    },
    RuleDef {
        category: "Healthcare",
        keywords: &["pharmacy", "apollo", "hospital", "clinic", "medical", "doctor", "1mg"],
        patterns: &["*medic*"],
        amount_range: None,
    },
    RuleDef {
        category: "Entertainment",
        keywords: &["netflix", "hotstar", "prime", "spotify", "bookmyshow", "pvr", "inox"],
        patterns: &["*movie*", "*subscription*"],
        amount_range: Some((50f64, 3_000f64)),
    },
    RuleDef {
        category: "Travel",
        keywords: &["irctc", "makemytrip", "goibibo", "indigo", "vistara", "flight", "railway"],
        patterns: &["*air*ticket*", "*holiday*"],
        amount_range: None,
    },
    RuleDef {
        category: "Education",
        keywords: &["school", "college", "tuition", "course", "udemy", "byjus", "fees"],
        patterns: &["*academy*"],
        amount_range: None,
    },
    RuleDef {
        category: "Insurance",
        keywords: &["lic", "insurance", "premium", "policy"],
        patterns: &["*policy*premium*"],
        amount_range: None,
    },
    RuleDef {
        category: "Investments",
        keywords: &["zerodha", "groww", "sip", "mutual", "ppf", "nps", "fd"],
        patterns: &["*mutual fund*", "*demat*"],
        amount_range: None,
    },
    RuleDef {
        category: "Taxes",
        keywords: &["gst", "tds", "income tax", "advance tax", "challan"],
        patterns: &["*itns*", "*tax*payment*"],
        amount_range: None,
    },
];

struct Rule {
    category: &'static str,
    keywords: Vec<(&'static str, Regex)>,
    patterns: Vec<Regex>,
    amount_range: Option<(f64, f64)>,
}

/// `*` matches anything, everything else is literal. Anchored at both ends.
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("(?i)^{}$", body))
}

/// Keywords match whole words, so "ola" does not fire on "cola".
fn keyword_regex(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
}

fn compile(def: &RuleDef) -> Result<Rule, regex::Error> {
    Ok(Rule {
        category: def.category,
        keywords: def
            .keywords
            .iter()
            .map(|kw| keyword_regex(kw).map(|re| (*kw, re)))
            .collect::<Result<_, _>>()?,
        patterns: def
            .patterns
            .iter()
            .map(|p| wildcard_regex(p))
            .collect::<Result<_, _>>()?,
        amount_range: def.amount_range,
    })
}

lazy_static! {
    // the table is static, a rule that does not compile is dropped with a log line
    static ref COMPILED: Vec<Rule> = RULES
        .iter()
        .filter_map(|def| match compile(def) {
            Ok(rule) => Some(rule),
            Err(err) => {
                tracing::error!(category = def.category, %err, "invalid categorizer rule");
                None
            }
        })
        .collect();
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategorySuggestion {
    pub category: String,
    pub score: u32,
    pub confidence: f64,
    pub reasoning: String,
}

fn score(rule: &Rule, text: &str, amount: Option<f64>) -> Option<CategorySuggestion> {
    let matched: Vec<&str> = rule
        .keywords
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(kw, _)| *kw)
        .collect();
    let pattern_hits = rule.patterns.iter().filter(|re| re.is_match(text)).count() as u32;

    let mut points = matched.len() as u32 * KEYWORD_POINTS + pattern_hits * PATTERN_POINTS;
    if points == 0 {
        return None;
    }
    if let (Some((low, high)), Some(amount)) = (rule.amount_range, amount) {
        if (low..=high).contains(&amount.abs()) {
            points += AMOUNT_POINTS;
        }
    }

    let reasoning = if matched.is_empty() {
        "Matched patterns".to_string()
    } else {
        format!("Matched keywords: {}", matched.join(", "))
    };

    Some(CategorySuggestion {
        category: rule.category.to_string(),
        score: points,
        confidence: (f64::from(points) / FULL_CONFIDENCE_SCORE).min(1f64),
        reasoning,
    })
}

/// Best three categories for a transaction, strongest first.
pub fn categorize(
    description: &str,
    vendor: Option<&str>,
    amount: Option<f64>,
) -> Vec<CategorySuggestion> {
    let text = match vendor {
        Some(vendor) if !vendor.trim().is_empty() => format!("{} {}", description, vendor),
        _ => description.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }

    let mut suggestions: Vec<CategorySuggestion> = COMPILED
        .iter()
        .filter_map(|rule| score(rule, text, amount))
        .collect();
    suggestions.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.category.cmp(&b.category),
        other => other,
    });
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
