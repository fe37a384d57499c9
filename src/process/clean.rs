use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_TOKEN_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9.]+").expect("valid numeric token regex"));

/// Incomes at or above this are survey codes for "not reported".
pub const INCOME_SENTINEL: f64 = 999_999.0;

/// A cleaned survey cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Value(f64),
    /// Blank, unparsable, or a sentinel code.
    Missing,
    /// The column this value would come from is absent in the file.
    NotApplicable,
}

impl FieldValue {
    pub fn value(self) -> Option<f64> {
        match self {
            FieldValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, FieldValue::Value(_))
    }

    /// True when the value equals the integer survey code `code`.
    pub fn is_code(self, code: i64) -> bool {
        self.value() == Some(code as f64)
    }

    /// True when the value lies in `lo..=hi`.
    pub fn between(self, lo: f64, hi: f64) -> bool {
        self.value().is_some_and(|v| v >= lo && v <= hi)
    }

    pub fn at_least(self, lo: f64) -> bool {
        self.value().is_some_and(|v| v >= lo)
    }
}

/// Numeric coercion: surrounding whitespace ignored, anything else non-numeric is missing.
pub fn parse_numeric(raw: &str) -> FieldValue {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Value(v),
        _ => FieldValue::Missing,
    }
}

/// Expansion weights arrive as text with decimal commas and stray characters:
/// take the first run of digits and dots after swapping `,` for `.`.
pub fn clean_weight(raw: &str) -> FieldValue {
    let swapped = raw.replace(',', ".");
    NUMERIC_TOKEN_RX
        .find(&swapped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map_or(FieldValue::Missing, FieldValue::Value)
}

/// Labor income; non-positive values and sentinel codes are missing, never zero.
pub fn clean_income(raw: &str) -> FieldValue {
    match parse_numeric(raw) {
        FieldValue::Value(v) if v > 0.0 && v < INCOME_SENTINEL => FieldValue::Value(v),
        _ => FieldValue::Missing,
    }
}

/// Trimmed, lowercased free text.
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_lowercase()
}
