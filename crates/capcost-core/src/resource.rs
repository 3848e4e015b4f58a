//! Resource names and quantities.
//!
//! A [`Quantity`] is stored as a signed count of milli-units so that sums
//! over many pods and containers stay exact. Conversion to `f64` happens
//! only at the edges (prices, ratios).

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

/// CPU, measured in cores.
pub const RESOURCE_CPU: &str = "cpu";
/// Memory, measured in bytes.
pub const RESOURCE_MEMORY: &str = "memory";
/// NVIDIA GPUs, measured in devices.
pub const RESOURCE_NVIDIA_GPU: &str = "nvidia.com/gpu";

/// Bytes in one GiB.
pub const GIB: i64 = 1024 * 1024 * 1024;

/// Resource name → amount, as found in node capacity/allocatable and
/// container requests.
pub type ResourceList = HashMap<String, Quantity>;

/// A resource amount with milli-unit precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity { milli: 0 };

    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    /// Whole units: cores, bytes, devices.
    pub const fn from_value(value: i64) -> Self {
        Self {
            milli: value.saturating_mul(1000),
        }
    }

    pub const fn milli_value(&self) -> i64 {
        self.milli
    }

    /// Whole units, rounded up.
    pub fn value(&self) -> i64 {
        self.milli.div_euclid(1000) + i64::from(self.milli.rem_euclid(1000) != 0)
    }

    pub const fn is_zero(&self) -> bool {
        self.milli == 0
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity::from_milli(self.milli.saturating_add(rhs.milli))
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        *self = *self + rhs;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity::from_milli(self.milli.saturating_sub(rhs.milli))
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

/// Multiplier from a quantity suffix to milli-units.
fn suffix_scale(suffix: &str) -> Option<i128> {
    let scale = match suffix {
        "m" => 1,
        "" => 1_000,
        "k" => 1_000 * 1_000,
        "M" => 1_000 * 1_000_000,
        "G" => 1_000 * 1_000_000_000,
        "T" => 1_000 * 1_000_000_000_000,
        "P" => 1_000 * 1_000_000_000_000_000,
        "Ki" => 1_000 * (1 << 10),
        "Mi" => 1_000 * (1 << 20),
        "Gi" => 1_000 * (1 << 30),
        "Ti" => 1_000 * (1 << 40),
        "Pi" => 1_000 * (1 << 50),
        _ => return None,
    };
    Some(scale)
}

/// Splits a decimal exponent (`e3`, `E-2`) off a quantity suffix.
fn decimal_exponent(suffix: &str) -> Option<i32> {
    let digits = suffix.strip_prefix(['e', 'E'])?;
    let unsigned = digits.strip_prefix(['+', '-']).unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `numerator / denominator` rounded away from zero to a whole number.
fn round_away_from_zero(numerator: i128, denominator: i128, negative: bool) -> i128 {
    let magnitude = (numerator + denominator - 1) / denominator;
    if negative { -magnitude } else { magnitude }
}

impl FromStr for Quantity {
    type Err = CoreError;

    /// Parse a Kubernetes-style quantity: `500m`, `2`, `1.5`, `4Gi`, `10k`,
    /// `1e3`.
    ///
    /// Fractions below milli precision round away from zero.
    fn from_str(s: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidQuantity {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);
        if number.is_empty() {
            return Err(invalid("missing number"));
        }

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("missing number"));
        }
        if fraction.contains('.') {
            return Err(invalid("more than one decimal point"));
        }
        if fraction.len() > 9 {
            return Err(invalid("too many fractional digits"));
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("number out of range"))?
        };
        let frac: i128 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid("number out of range"))?
        };

        let frac_scale = 10_i128.pow(fraction.len() as u32);
        let mut denominator = frac_scale;
        let scale = match suffix_scale(suffix) {
            Some(scale) => scale,
            None => {
                let exponent = decimal_exponent(suffix).ok_or_else(|| invalid("unknown suffix"))?;
                let power = 10_i128
                    .checked_pow(exponent.unsigned_abs())
                    .ok_or_else(|| invalid("number out of range"))?;
                if exponent < 0 {
                    denominator = denominator
                        .checked_mul(power)
                        .ok_or_else(|| invalid("number out of range"))?;
                    1_000
                } else {
                    power
                        .checked_mul(1_000)
                        .ok_or_else(|| invalid("number out of range"))?
                }
            }
        };

        let numerator = whole
            .checked_mul(frac_scale)
            .and_then(|w| w.checked_add(frac))
            .and_then(|n| n.checked_mul(scale))
            .ok_or_else(|| invalid("number out of range"))?;
        // Round away from zero to milli precision, as the API server does.
        let milli = round_away_from_zero(numerator, denominator, negative);

        let milli = i64::try_from(milli).map_err(|_| invalid("number out of range"))?;
        Ok(Quantity::from_milli(milli))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milli % 1000 == 0 {
            write!(f, "{}", self.milli / 1000)
        } else {
            write!(f, "{}m", self.milli)
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(Quantity::from_value(v)),
            Raw::Float(v) => {
                let milli = v * 1000.0;
                // Same rounding as the string form: away from zero.
                let milli = if milli < 0.0 { milli.floor() } else { milli.ceil() };
                if !milli.is_finite() || milli < i64::MIN as f64 || milli >= i64::MAX as f64 {
                    return Err(serde::de::Error::custom(format!("invalid quantity: {v}")));
                }
                Ok(Quantity::from_milli(milli as i64))
            }
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
