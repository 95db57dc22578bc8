//! Parsing of registry-style duration strings (`10s`, `1m30s`, `1.5h`).
//!
//! The service registry expresses check TTLs in this grammar, so the same
//! parser is used for every duration in the configuration file. Each
//! component is a decimal number (optionally fractional) followed by a
//! mandatory unit: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.
//!
//! Only strictly positive durations are accepted.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fractional digits beyond this are truncated (keeps the math in `u128`).
const MAX_FRACTION_DIGITS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid duration '{0}'")]
    Invalid(String),

    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    #[error("duration '{0}' must be positive")]
    NotPositive(String),

    #[error("duration '{0}' is too large")]
    Overflow(String),
}

/// Parse a duration string such as `"10s"` or `"2h45m"`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut rest = match trimmed.strip_prefix('+') {
        Some(r) => r,
        None if trimmed.starts_with('-') => {
            return Err(DurationError::NotPositive(input.to_string()));
        }
        None => trimmed,
    };
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total_nanos: u128 = 0;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let unit_nanos = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());

        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = int_value.checked_mul(unit_nanos).ok_or_else(overflow)?;

        let frac_digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
        if !frac_digits.is_empty() {
            let frac_value: u128 = frac_digits.parse().map_err(|_| overflow())?;
            let scale = 10u128.pow(frac_digits.len() as u32);
            nanos = nanos
                .checked_add(frac_value * unit_nanos / scale)
                .ok_or_else(overflow)?;
        }

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(overflow)?;
    }

    if total_nanos == 0 {
        return Err(DurationError::NotPositive(input.to_string()));
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SEC)
        .map_err(|_| DurationError::Overflow(input.to_string()))?;
    let subsec = (total_nanos % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, subsec))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
