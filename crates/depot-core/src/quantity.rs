use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuantityParseError;

/// Units on the 1024-based storage ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StorageUnit {
    #[default]
    B,
    KB,
    MB,
    GB,
    TB,
}

impl StorageUnit {
    pub const ALL: [StorageUnit; 5] = [Self::B, Self::KB, Self::MB, Self::GB, Self::TB];

    pub const fn bytes_per_unit(self) -> i64 {
        match self {
            Self::B => 1,
            Self::KB => 1 << 10,
            Self::MB => 1 << 20,
            Self::GB => 1 << 30,
            Self::TB => 1 << 40,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::B => "Bytes",
            Self::KB => "Kilobytes",
            Self::MB => "Megabytes",
            Self::GB => "Gigabytes",
            Self::TB => "Terabytes",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "" | "b" => Some(Self::B),
            "k" | "kb" | "ki" | "kib" => Some(Self::KB),
            "m" | "mb" | "mi" | "mib" => Some(Self::MB),
            "g" | "gb" | "gi" | "gib" => Some(Self::GB),
            "t" | "tb" | "ti" | "tib" => Some(Self::TB),
            _ => None,
        }
    }
}

impl fmt::Display for StorageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// A non-negative byte count with a display unit.
///
/// Equality and ordering always compare the normalized byte value, so
/// `StorageQuantity::kb(1) == StorageQuantity::bytes(1024)`. Byte counts are
/// signed 64-bit; anything at or above 2^63 bytes saturates.
///
/// ```
/// use depot_core::{StorageQuantity, StorageUnit};
///
/// let min_free = StorageQuantity::mb(245);
/// assert_eq!(min_free.as_bytes(), 245 * 1024 * 1024);
/// assert_eq!(min_free.to(StorageUnit::GB), 0);
/// assert!(StorageQuantity::gb(1).is_greater_than(&min_free));
/// assert_eq!(min_free.to_string(), "245 Megabytes");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageQuantity {
    bytes: i64,
    unit:  StorageUnit,
}

impl StorageQuantity {
    pub const ZERO: StorageQuantity = StorageQuantity {
        bytes: 0,
        unit:  StorageUnit::B,
    };

    /// `amount` expressed in `unit`. Negative amounts clamp to zero.
    pub const fn of(amount: i64, unit: StorageUnit) -> Self {
        let amount = if amount < 0 { 0 } else { amount };
        Self {
            bytes: amount.saturating_mul(unit.bytes_per_unit()),
            unit,
        }
    }

    pub const fn bytes(amount: i64) -> Self { Self::of(amount, StorageUnit::B) }

    pub const fn kb(amount: i64) -> Self { Self::of(amount, StorageUnit::KB) }

    pub const fn mb(amount: i64) -> Self { Self::of(amount, StorageUnit::MB) }

    pub const fn gb(amount: i64) -> Self { Self::of(amount, StorageUnit::GB) }

    /// Raw byte count.
    pub const fn as_bytes(&self) -> i64 { self.bytes }

    pub const fn unit(&self) -> StorageUnit { self.unit }

    /// Whole units contained in this quantity, truncating any remainder.
    pub const fn to(&self, unit: StorageUnit) -> i64 { self.bytes / unit.bytes_per_unit() }

    /// Same byte count, displayed in `unit`.
    #[must_use]
    pub const fn in_unit(self, unit: StorageUnit) -> Self {
        Self {
            bytes: self.bytes,
            unit,
        }
    }

    pub fn is_greater_than(&self, other: &StorageQuantity) -> bool { self.bytes > other.bytes }

    pub fn is_greater_than_or_equal_to(&self, other: &StorageQuantity) -> bool {
        self.bytes >= other.bytes
    }

    pub fn is_equivalent_to(&self, other: &StorageQuantity) -> bool { self.bytes == other.bytes }

    pub fn is_zero(&self) -> bool { self.bytes == 0 }
}

impl Default for StorageQuantity {
    fn default() -> Self { Self::ZERO }
}

impl PartialEq for StorageQuantity {
    fn eq(&self, other: &Self) -> bool { self.bytes == other.bytes }
}

impl Eq for StorageQuantity {}

impl PartialOrd for StorageQuantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for StorageQuantity {
    fn cmp(&self, other: &Self) -> Ordering { self.bytes.cmp(&other.bytes) }
}

impl Add for StorageQuantity {
    type Output = StorageQuantity;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            bytes: self.bytes.saturating_add(rhs.bytes),
            unit:  self.unit.min(rhs.unit),
        }
    }
}

impl Sub for StorageQuantity {
    type Output = StorageQuantity;

    /// Floors at zero.
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            bytes: self.bytes.saturating_sub(rhs.bytes).max(0),
            unit:  self.unit,
        }
    }
}

impl From<u64> for StorageQuantity {
    fn from(bytes: u64) -> Self { Self::bytes(i64::try_from(bytes).unwrap_or(i64::MAX)) }
}

impl fmt::Display for StorageQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to(self.unit), self.unit.label())
    }
}

impl FromStr for StorageQuantity {
    type Err = QuantityParseError;

    /// Accepts `"245MB"`, `"245 M"`, `"750Mi"`, `"8kb"` or a bare byte count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QuantityParseError::Empty);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);
        let amount: i64 = number
            .parse()
            .map_err(|_| QuantityParseError::InvalidNumber(s.to_string()))?;
        let unit = StorageUnit::from_suffix(suffix.trim())
            .ok_or_else(|| QuantityParseError::UnknownUnit(suffix.trim().to_string()))?;

        Ok(Self::of(amount, unit))
    }
}

impl TryFrom<String> for StorageQuantity {
    type Error = QuantityParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<StorageQuantity> for String {
    /// Compact, re-parseable form; falls back to bytes when the display unit
    /// would lose precision.
    fn from(q: StorageQuantity) -> Self {
        if q.bytes % q.unit.bytes_per_unit() == 0 {
            format!("{}{}", q.to(q.unit), q.unit.symbol())
        } else {
            format!("{}B", q.bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_ladder_is_1024_based() {
        for pair in StorageUnit::ALL.windows(2) {
            assert_eq!(pair[1].bytes_per_unit(), pair[0].bytes_per_unit() * 1024);
        }
        assert_eq!(StorageUnit::TB.bytes_per_unit(), 1_099_511_627_776);
    }

    #[test]
    fn test_conversion_truncates() {
        let q = StorageQuantity::bytes(1536);
        assert_eq!(q.to(StorageUnit::KB), 1);
        assert_eq!(q.to(StorageUnit::MB), 0);
        assert_eq!(StorageQuantity::gb(3).to(StorageUnit::MB), 3072);
    }

    #[test]
    fn test_comparisons_normalize_to_bytes() {
        let a = StorageQuantity::kb(1);
        let b = StorageQuantity::bytes(1024);
        assert!(a.is_equivalent_to(&b));
        assert_eq!(a, b);
        assert!(!a.is_greater_than(&b));
        assert!(a.is_greater_than_or_equal_to(&b));
        assert!(StorageQuantity::mb(245).is_greater_than(&StorageQuantity::kb(250_000)));
        assert!(StorageQuantity::mb(1) > StorageQuantity::kb(1023));
    }

    #[test]
    fn test_zero_is_additive_identity() {
        let q = StorageQuantity::mb(7);
        assert_eq!(q + StorageQuantity::ZERO, q);
        assert_eq!(StorageQuantity::ZERO + q, q);
        assert_eq!(StorageQuantity::kb(1) - StorageQuantity::mb(1), StorageQuantity::ZERO);
    }

    #[test]
    fn test_negative_and_overflow() {
        assert_eq!(StorageQuantity::of(-5, StorageUnit::GB), StorageQuantity::ZERO);
        assert_eq!(StorageQuantity::of(i64::MAX, StorageUnit::TB).as_bytes(), i64::MAX);
        assert_eq!(StorageQuantity::from(u64::MAX).as_bytes(), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(StorageQuantity::bytes(12_206_080).to_string(), "12206080 Bytes");
        assert_eq!(StorageQuantity::kb(8).to_string(), "8 Kilobytes");
        assert_eq!(StorageQuantity::mb(2).in_unit(StorageUnit::KB).to_string(), "2048 Kilobytes");
    }

    #[test]
    fn test_parse() {
        assert_eq!("245MB".parse::<StorageQuantity>().unwrap(), StorageQuantity::mb(245));
        assert_eq!("750Mi".parse::<StorageQuantity>().unwrap(), StorageQuantity::mb(750));
        assert_eq!(" 8 kb ".parse::<StorageQuantity>().unwrap(), StorageQuantity::kb(8));
        assert_eq!("4096".parse::<StorageQuantity>().unwrap(), StorageQuantity::kb(4));
        assert_eq!("2G".parse::<StorageQuantity>().unwrap().unit(), StorageUnit::GB);

        assert_eq!("".parse::<StorageQuantity>(), Err(QuantityParseError::Empty));
        assert!(matches!(
            "MB".parse::<StorageQuantity>(),
            Err(QuantityParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "12 parsecs".parse::<StorageQuantity>(),
            Err(QuantityParseError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_serde_string_form() {
        #[derive(Deserialize, Serialize)]
        struct Limits {
            min_free: StorageQuantity,
        }

        let limits: Limits = toml::from_str(r#"min_free = "245MB""#).unwrap();
        assert_eq!(limits.min_free, StorageQuantity::mb(245));
        assert_eq!(toml::to_string(&limits).unwrap().trim(), r#"min_free = "245MB""#);

        let odd = StorageQuantity::bytes(1500).in_unit(StorageUnit::KB);
        assert_eq!(String::from(odd), "1500B");
    }
}
