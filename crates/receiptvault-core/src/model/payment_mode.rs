use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a receipt was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Cheque,
    BankTransfer,
    Upi,
    Card,
    Other,
}

/// Free-form labels accepted for each mode, after label normalization
static MODE_ALIASES: &[(&str, PaymentMode)] = &[
    ("check", PaymentMode::Cheque),
    ("bank", PaymentMode::BankTransfer),
    ("neft", PaymentMode::BankTransfer),
    ("rtgs", PaymentMode::BankTransfer),
    ("imps", PaymentMode::BankTransfer),
    ("gpay", PaymentMode::Upi),
    ("googlepay", PaymentMode::Upi),
    ("phonepe", PaymentMode::Upi),
    ("credit_card", PaymentMode::Card),
    ("debit_card", PaymentMode::Card),
    ("credit", PaymentMode::Card),
    ("debit", PaymentMode::Card),
    ("others", PaymentMode::Other),
];

impl PaymentMode {
    pub const ALL: [PaymentMode; 6] = [
        PaymentMode::Cash,
        PaymentMode::Cheque,
        PaymentMode::BankTransfer,
        PaymentMode::Upi,
        PaymentMode::Card,
        PaymentMode::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Cheque => "cheque",
            PaymentMode::BankTransfer => "bank_transfer",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
            PaymentMode::Other => "other",
        }
    }

    /// Human label used on rendered receipts
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Cheque => "Cheque",
            PaymentMode::BankTransfer => "Bank Transfer",
            PaymentMode::Upi => "UPI",
            PaymentMode::Card => "Card",
            PaymentMode::Other => "Other",
        }
    }

    /// Resolve a spreadsheet or user label ("GPay", "Check", "Bank Transfer")
    ///
    /// The label is trimmed, lower-cased and has spaces and hyphens folded to
    /// underscores before being matched against canonical names and aliases.
    pub fn from_label(raw: &str) -> Option<Self> {
        let label = normalize_label(raw);
        if label.is_empty() {
            return None;
        }
        if let Some(mode) = Self::ALL.iter().find(|m| m.as_str() == label) {
            return Some(*mode);
        }
        MODE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == label)
            .map(|(_, mode)| *mode)
    }
}

/// Trim, lower-case, fold spaces and hyphens to underscores
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    /// Strict parse of the canonical name (storage and API input)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown payment mode '{}'", s))
    }
}
