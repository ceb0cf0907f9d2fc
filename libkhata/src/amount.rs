use serde::{Deserialize, Serialize};

/// Two totals closer than this are considered equal.
pub const EPSILON: f64 = 1e-3;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

pub fn is_negligible(amount: f64) -> bool {
    amount.abs() < EPSILON
}

/// Which side of the ledger a posted line sits on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit(f64),
    Credit(f64),
}

impl Side {
    pub fn amount(&self) -> f64 {
        match self {
            Side::Debit(v) | Side::Credit(v) => *v,
        }
    }

    pub fn debit(&self) -> f64 {
        match self {
            Side::Debit(v) => *v,
            Side::Credit(_) => 0f64,
        }
    }

    pub fn credit(&self) -> f64 {
        match self {
            Side::Debit(_) => 0f64,
            Side::Credit(v) => *v,
        }
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, Side::Debit(_))
    }

    /// Debits positive, credits negative.
    pub fn signed(&self) -> f64 {
        self.debit() - self.credit()
    }

    /// The side that carries a positive debit-minus-credit `net`,
    /// `None` when the net is negligible.
    pub fn from_net(net: f64) -> Option<Side> {
        if is_negligible(net) {
            None
        } else if net > 0f64 {
            Some(Side::Debit(net))
        } else {
            Some(Side::Credit(-net))
        }
    }
}

impl std::ops::Neg for Side {
    type Output = Side;

    fn neg(self) -> Self::Output {
        match self {
            Side::Debit(v) => Side::Credit(v),
            Side::Credit(v) => Side::Debit(v),
        }
    }
}

/// Running debit and credit sums.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub debit: f64,
    pub credit: f64,
}

impl Totals {
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }

    pub fn is_balanced(&self) -> bool {
        approx_eq(self.debit, self.credit)
    }
}

impl std::ops::AddAssign<Side> for Totals {
    fn add_assign(&mut self, side: Side) {
        self.debit += side.debit();
        self.credit += side.credit();
    }
}

/// Round to paise.
pub fn round2(amount: f64) -> f64 {
    (amount * 100f64).round() / 100f64
}

/// Formats rupees with Indian digit grouping, e.g. `₹ 12,34,567.89`.
pub fn format_inr(amount: f64) -> String {
    let paise = (amount.abs() * 100f64).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let mut grouped = String::new();
    let (head, tail) = if rupees.len() > 3 {
        rupees.split_at(rupees.len() - 3)
    } else {
        ("", rupees.as_str())
    };
    let head_chars: Vec<char> = head.chars().collect();
    for (idx, c) in head_chars.iter().enumerate() {
        if idx > 0 && (head_chars.len() - idx) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    if !head.is_empty() {
        grouped.push(',');
    }
    grouped.push_str(tail);

    let sign = if amount < 0f64 && paise > 0 { "-" } else { "" };
    format!("{}₹ {}.{:02}", sign, grouped, fraction)
}
