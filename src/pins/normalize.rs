//! Single normalization boundary for upstream pin representations.
//!
//! Generators describe pins as `"GPIO2"`, `"D13"`, `"A0"`, `"2"` or plain
//! integers. Everything past this module sees only [`PinId`] and
//! [`PinRole`].

use crate::board::{PinId, PinRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no pin number found in '{raw}'")]
    UnparsablePin { raw: String },
}

/// A pin as written by an upstream generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawPin {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawPin::Number(n) => write!(f, "{}", n),
            RawPin::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawPin {
    fn from(s: &str) -> Self {
        RawPin::Text(s.to_string())
    }
}

impl From<String> for RawPin {
    fn from(s: String) -> Self {
        RawPin::Text(s)
    }
}

impl From<i64> for RawPin {
    fn from(n: i64) -> Self {
        RawPin::Number(n)
    }
}

impl From<u32> for RawPin {
    fn from(n: u32) -> Self {
        RawPin::Number(n as i64)
    }
}

/// Canonicalize one pin reference.
///
/// The pin number is the first contiguous run of ASCII digits in the raw
/// text (a bare integer is treated as its decimal text, sign dropped). The
/// role defaults to GPIO when undeclared; an unrecognized role tag also
/// degrades to GPIO.
pub fn normalize(raw_pin: &RawPin, declared_role: Option<&str>) -> Result<(PinId, PinRole), NormalizeError> {
    let pin = match raw_pin {
        RawPin::Number(n) => extract_pin_number(&n.unsigned_abs().to_string()),
        RawPin::Text(text) => extract_pin_number(text),
    }
    .ok_or_else(|| NormalizeError::UnparsablePin {
        raw: raw_pin.to_string(),
    })?;

    Ok((pin, normalize_role(declared_role)))
}

/// Role for a declared tag; `None`, blank and unknown tags become GPIO.
pub fn normalize_role(declared_role: Option<&str>) -> PinRole {
    match declared_role.map(str::trim) {
        None | Some("") => PinRole::Gpio,
        Some(tag) => PinRole::parse(tag).unwrap_or_else(|| {
            tracing::warn!("Unknown pin role '{}', treating as GPIO", tag);
            PinRole::Gpio
        }),
    }
}

/// First run of digits in `text`, if it fits a pin id.
pub fn extract_pin_number(text: &str) -> Option<PinId> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}
