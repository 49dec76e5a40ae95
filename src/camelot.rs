//! Camelot Wheel (component C1, spec §4.1).
//!
//! The standard harmonic-mixing wheel: 12 numbered positions x 2 modes
//! (`A` = minor, `B` = major), arranged so that harmonically adjacent keys
//! differ by one position or by mode at the same number.

use std::fmt;

/// Minor (`A`) or major (`B`) mode on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    A,
    B,
}

/// A parsed Camelot position, e.g. `8B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamelotKey {
    pub number: u8,
    pub mode: Mode,
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::A => 'A',
            Mode::B => 'B',
        };
        write!(f, "{}{}", self.number, mode)
    }
}

/// A resolved key value: either a parsed position, or "no constraint".
///
/// `Unknown` covers both the explicit `"unknown"` sentinel and an absent
/// field — the spec treats both identically for compatibility purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValue {
    Known(CamelotKey),
    Unknown,
}

/// Failure to parse a raw key token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCamelotError {
    #[error("key token '{0}' is empty")]
    Empty(String),
    #[error("key token '{0}' has an invalid mode letter")]
    InvalidMode(String),
    #[error("key token '{0}' has a non-numeric or out-of-range position")]
    InvalidNumber(String),
}

/// Parse a raw Camelot token of the form `N` + mode letter, `N in 1..=12`.
/// Case-insensitive on the mode letter; leading zeros are rejected (spec
/// §4.1: "leading zeros not accepted").
pub fn parse(s: &str) -> Result<CamelotKey, ParseCamelotError> {
    if s.is_empty() {
        return Err(ParseCamelotError::Empty(s.to_string()));
    }

    let mut chars = s.chars();
    let mode_char = chars.next_back().ok_or_else(|| ParseCamelotError::Empty(s.to_string()))?;
    let digits = chars.as_str();

    let mode = match mode_char {
        'A' | 'a' => Mode::A,
        'B' | 'b' => Mode::B,
        _ => return Err(ParseCamelotError::InvalidMode(s.to_string())),
    };

    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) || digits.starts_with('-') {
        return Err(ParseCamelotError::InvalidNumber(s.to_string()));
    }

    let number: u8 = digits
        .parse()
        .map_err(|_| ParseCamelotError::InvalidNumber(s.to_string()))?;

    if !(1..=12).contains(&number) {
        return Err(ParseCamelotError::InvalidNumber(s.to_string()));
    }

    Ok(CamelotKey { number, mode })
}

/// Resolve a raw, optional key field (as stored on a `Track`) into a
/// `KeyValue`. A parse failure is logged once and treated as `Unknown`
/// (error-tolerant, spec §4.1).
#[must_use]
pub fn resolve(raw: Option<&str>) -> KeyValue {
    match raw {
        None => KeyValue::Unknown,
        Some(s) if s.eq_ignore_ascii_case("unknown") => KeyValue::Unknown,
        Some(s) => match parse(s) {
            Ok(key) => KeyValue::Known(key),
            Err(e) => {
                log::warn!("unparseable Camelot key '{s}': {e}; treating as unknown");
                KeyValue::Unknown
            }
        },
    }
}

/// Total compatibility check: never errors, degrades to unconstrained
/// whenever either side is unknown (spec §4.1).
#[must_use]
pub fn compatible(x: KeyValue, y: KeyValue) -> bool {
    match (x, y) {
        (KeyValue::Known(a), KeyValue::Known(b)) => compatible_known(a, b),
        _ => true,
    }
}

fn compatible_known(a: CamelotKey, b: CamelotKey) -> bool {
    if a.mode == b.mode {
        a.number == b.number || adjacent(a.number, b.number)
    } else {
        a.number == b.number
    }
}

fn adjacent(a: u8, b: u8) -> bool {
    let diff = (i16::from(a) - i16::from(b)).rem_euclid(12);
    diff == 1 || diff == 11
}
