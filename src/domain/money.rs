use serde::{Deserialize, Deserializer};
use std::fmt;

/// Money is represented as whole won. KRW has no minor unit, so the amounts
/// read off a banking app map one-to-one onto integers.
pub type Won = i64;

/// Format won with thousands separators.
/// Example: 1234567 -> "1,234,567", -15000 -> "-15,000"
pub fn format_won(amount: Won) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}", sign, grouped)
}

/// Parse a won amount as typed by a person or copied from a screenshot.
/// Accepts separators and the currency markers: "1,234,567", "₩15000", "15000원".
pub fn parse_won(input: &str) -> Result<Won, ParseWonError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-').trim();

    let input = input.trim_start_matches('₩').trim_end_matches('원').trim();
    let digits: String = input.chars().filter(|c| *c != ',').collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseWonError::InvalidFormat);
    }

    let amount: Won = digits.parse().map_err(|_| ParseWonError::OutOfRange)?;
    Ok(if negative { -amount } else { amount })
}

/// Deserialize a won amount given either as a JSON number or as text such as
/// "12,000원". Fractional numbers are rounded to the nearest won.
pub fn deserialize_won<'de, D>(deserializer: D) -> Result<Won, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Whole(i64),
        Fraction(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Whole(amount) => Ok(amount),
        Amount::Fraction(amount) => Ok(amount.round() as Won),
        Amount::Text(text) => parse_won(&text).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWonError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseWonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWonError::InvalidFormat => write!(f, "invalid won amount"),
            ParseWonError::OutOfRange => write!(f, "won amount out of range"),
        }
    }
}

impl std::error::Error for ParseWonError {}
