//! Reduction policies: how much of a numeric resource a death costs.
//!
//! A policy is written in the penalty document as a short string:
//!
//! | Written | Parsed | Effect on `v` |
//! |---------|--------|---------------|
//! | `"25"`  | `Absolute(25)` | `v - 25` |
//! | `"40%"` | `Relative(40)` | `v * 0.6` |
//! | `"0"`, `"0%"` | no-op | unchanged, no mutation issued |
//!
//! Parsing happens once, when the catalog is loaded. A malformed string is a
//! [`ConfigError`] at load time and never surfaces during a respawn.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ConfigError;

/// The percent marker that turns a fixed amount into a relative one.
const PERCENT_MARKER: char = '%';

/// A parsed reduction specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ReductionSpec {
    /// Remove a percentage (0 to 100) of the original value.
    Relative(Decimal),
    /// Remove a fixed amount from the original value.
    Absolute(Decimal),
}

impl ReductionSpec {
    /// Parse a reduction string for the document key `field`.
    ///
    /// Accepts ASCII digits optionally followed by exactly one trailing `%`.
    /// Percentages above 100 are rejected.
    pub fn parse(raw: &str, field: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &'static str| ConfigError::InvalidReduction {
            field: field.to_owned(),
            raw: raw.to_owned(),
            reason,
        };

        let (digits, relative) = match raw.strip_suffix(PERCENT_MARKER) {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        if digits.is_empty() {
            return Err(invalid("no digits"));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not numeric"));
        }

        let amount = Decimal::from_str_exact(digits)
            .ok()
            .ok_or_else(|| invalid("out of range"))?;

        if relative {
            if amount > Decimal::ONE_HUNDRED {
                return Err(invalid("percentage above 100"));
            }
            Ok(Self::Relative(amount))
        } else {
            Ok(Self::Absolute(amount))
        }
    }

    /// Compute the value left after applying this reduction to `original`.
    ///
    /// The result is not clamped: an absolute reduction larger than the
    /// original goes negative. Callers clamp where their domain requires it.
    ///
    /// If the arithmetic overflows `Decimal`'s range the original value is
    /// returned unchanged.
    pub fn apply(&self, original: Decimal) -> Decimal {
        let reduced = match self {
            Self::Relative(percent) => percent
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|fraction| Decimal::ONE.checked_sub(fraction))
                .and_then(|factor| original.checked_mul(factor)),
            Self::Absolute(amount) => original.checked_sub(*amount),
        };

        reduced.unwrap_or_else(|| {
            tracing::warn!(
                policy = %self,
                original = %original,
                "reduction overflowed, value left unchanged"
            );
            original
        })
    }

    /// Whether this reduction removes nothing.
    ///
    /// The engine skips the whole mutation for a no-op policy so that
    /// external resources see no write at all.
    pub fn is_no_op(&self) -> bool {
        match self {
            Self::Relative(value) | Self::Absolute(value) => value.is_zero(),
        }
    }
}

impl core::fmt::Display for ReductionSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Relative(percent) => write!(f, "{percent}{PERCENT_MARKER}"),
            Self::Absolute(amount) => write!(f, "{amount}"),
        }
    }
}
