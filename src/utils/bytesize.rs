//! Binary byte sizes with human readable unit suffixes.
//!
//! Strings like `"3.5 TIB"`, `"512M"` or `"10 gibibytes"` are accepted by
//! [`ByteSize::parse`]. Formatting always renders six decimals followed by the
//! short unit symbol, e.g. `"3216.991232GiB"`.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ByteSizeError {
    #[error("unrecognized size suffix {0}")]
    UnrecognizedSuffix(String),
    #[error("unrecognized unit: {0}")]
    UnrecognizedUnit(String),
    #[error("invalid size value {0:?}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ByteSize(pub u64);

pub const B: u64 = 1;
pub const KIB: u64 = 1 << 10;
pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;
pub const TIB: u64 = 1 << 40;

fn unit_size(unit: &str) -> Option<u64> {
    let size = match unit.to_uppercase().as_str() {
        "B" | "BYTE" | "BYTES" => B,
        "K" | "KB" | "KIB" | "KIBIBYTE" | "KIBIBYTES" => KIB,
        "M" | "MB" | "MIB" | "MEBIBYTE" | "MEBIBYTES" => MIB,
        "G" | "GB" | "GIB" | "GIBIBYTE" | "GIBIBYTES" => GIB,
        "T" | "TB" | "TIB" | "TEBIBYTE" | "TEBIBYTES" => TIB,
        _ => return None,
    };
    Some(size)
}

fn short_symbol(size: u64) -> &'static str {
    match size {
        TIB => "TiB",
        GIB => "GiB",
        MIB => "MiB",
        KIB => "KiB",
        _ => "B",
    }
}

/// Splits `"12.5 GIB"` into `("12.5", "GIB")` at the first character that is
/// neither a digit nor a dot. A missing suffix is an error.
fn split_value_and_suffix(s: &str) -> Result<(&str, &str), ByteSizeError> {
    let s = s.trim();
    let idx = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .ok_or_else(|| ByteSizeError::UnrecognizedSuffix(String::new()))?;
    Ok((s[..idx].trim(), s[idx..].trim()))
}

fn parse_number(value: &str) -> Result<f64, ByteSizeError> {
    value.parse::<f64>().map_err(|_| ByteSizeError::InvalidValue(value.to_string()))
}

impl ByteSize {
    pub fn parse(s: &str) -> Result<Self, ByteSizeError> {
        let (value, suffix) = split_value_and_suffix(s)?;
        let unit = unit_size(suffix).ok_or_else(|| ByteSizeError::UnrecognizedSuffix(suffix.to_string()))?;
        let value = parse_number(value)?;
        // Fractions of a byte are dropped.
        Ok(ByteSize((value * unit as f64) as u64))
    }

    /// Renders the size in `unit`, or in the largest unit not exceeding the
    /// size when `unit` is `None`.
    pub fn format(&self, unit: Option<&str>) -> Result<String, ByteSizeError> {
        let size = match unit {
            Some(u) => unit_size(u).ok_or_else(|| ByteSizeError::UnrecognizedUnit(u.to_string()))?,
            None => [TIB, GIB, MIB, KIB].into_iter().find(|&u| self.0 >= u).unwrap_or(B),
        };
        Ok(format!("{:.6}{}", self.0 as f64 / size as f64, short_symbol(size)))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = [TIB, GIB, MIB, KIB].into_iter().find(|&u| self.0 >= u).unwrap_or(B);
        write!(f, "{:.2}{}", self.0 as f64 / size as f64, short_symbol(size))
    }
}

/// Returns the numeric part of a size string such as `"3216.991232GiB"`.
pub fn float64(s: &str) -> Result<f64, ByteSizeError> {
    let (value, _) = split_value_and_suffix(s)?;
    parse_number(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_short_and_long_suffixes() {
        assert_eq!(ByteSize::parse("1 KB").unwrap(), ByteSize(1024));
        assert_eq!(ByteSize::parse("2 mebibytes").unwrap(), ByteSize(2 * MIB));
        assert_eq!(ByteSize::parse("  1.5G ").unwrap(), ByteSize(GIB + GIB / 2));
        assert_eq!(ByteSize::parse("0B").unwrap(), ByteSize(0));
    }

    #[test]
    fn parse_rejects_missing_or_unknown_suffix() {
        assert!(matches!(ByteSize::parse("1024"), Err(ByteSizeError::UnrecognizedSuffix(_))));
        assert!(matches!(ByteSize::parse("12 PB"), Err(ByteSizeError::UnrecognizedSuffix(_))));
        assert!(matches!(ByteSize::parse("1.2.3 GB"), Err(ByteSizeError::InvalidValue(_))));
    }

    #[test]
    fn format_in_explicit_and_automatic_unit() {
        let size = ByteSize(3 * GIB);
        assert_eq!(size.format(Some("MIB")).unwrap(), "3072.000000MiB");
        assert_eq!(size.format(None).unwrap(), "3.000000GiB");
        assert_eq!(ByteSize(512).format(None).unwrap(), "512.000000B");
        assert!(size.format(Some("PIB")).is_err());
        assert_eq!(size.to_string(), "3.00GiB");
    }

    #[test]
    fn float64_extracts_value() {
        assert_eq!(float64("3216.991232GiB").unwrap(), 3216.991232);
        assert!(float64("42").is_err());
    }
}
