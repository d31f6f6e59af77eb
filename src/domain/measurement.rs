use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::bytesize::{self, ByteSize, ByteSizeError};

pub const UNKNOWN_VALUE: &str = "UNKNOWN";

#[derive(Debug, Error, PartialEq)]
pub enum MeasurementError {
    #[error("measurement value is UNKNOWN")]
    Unknown,
    #[error("invalid measurement {0:?}")]
    Invalid(String),
    #[error(transparent)]
    ByteSize(#[from] ByteSizeError),
}

/// A quantity with a byte unit symbol, as reported by Exadata agents.
///
/// Agents may report `UNKNOWN` instead of a size; such a measurement renders as
/// `UNKNOWN` and refuses every conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleExadataMeasurement {
    unparsed_value: String,
    pub symbol: String,
    pub quantity: f64,
}

impl OracleExadataMeasurement {
    /// Zero mebibytes, the starting point for sums.
    pub fn new() -> Self {
        Self { unparsed_value: String::new(), symbol: "MIB".to_string(), quantity: 0.0 }
    }

    pub fn unknown() -> Self {
        Self { unparsed_value: UNKNOWN_VALUE.to_string(), symbol: String::new(), quantity: 0.0 }
    }

    pub fn is_unknown(&self) -> bool {
        self.unparsed_value == UNKNOWN_VALUE
    }

    pub fn unparsed_value(&self) -> &str {
        &self.unparsed_value
    }

    /// Builds `"{d} {symbol}"`, zero becomes `0B`.
    pub fn from_int(d: i64, symbol: &str) -> Result<Self, MeasurementError> {
        if d == 0 {
            "0B".parse()
        } else {
            format!("{} {}", d, symbol).parse()
        }
    }

    /// Converts to `symbol` going through whole bytes, so sub-byte precision is lost.
    pub fn convert(&self, symbol: &str) -> Result<Self, MeasurementError> {
        if self.is_unknown() {
            return Err(MeasurementError::Unknown);
        }
        let bytes = ByteSize::parse(&self.to_string())?;
        let quantity = bytesize::float64(&bytes.format(Some(symbol))?)?;
        let mut res = Self { unparsed_value: String::new(), symbol: symbol.to_string(), quantity };
        res.unparsed_value = res.to_string();
        Ok(res)
    }

    /// The value in `symbol` with two decimals, e.g. `"3216.99 GIB"`.
    pub fn human(&self, symbol: &str) -> Result<String, MeasurementError> {
        if self.is_unknown() {
            return Ok(UNKNOWN_VALUE.to_string());
        }
        let c = self.convert(symbol)?;
        Ok(format!("{:.2} {}", c.quantity, c.symbol))
    }

    pub fn rounded_gib(&self) -> Result<i64, MeasurementError> {
        if self.is_unknown() {
            return Err(MeasurementError::Unknown);
        }
        Ok(self.convert("GIB")?.quantity.round() as i64)
    }

    pub fn to_tb(&self) -> Result<Self, MeasurementError> {
        self.convert("TIB")
    }

    /// Adds `qty` expressed in `symbol`, keeping the original symbol.
    /// Values that cannot be converted are left untouched.
    pub fn add(&mut self, qty: f64, symbol: &str) {
        let Ok(mut converted) = self.convert(symbol) else {
            return;
        };
        converted.quantity += qty;
        if let Ok(back) = converted.convert(&self.symbol) {
            *self = back;
        }
    }

    /// Adds another measurement, whatever its symbol.
    pub fn add_measurement(&mut self, other: &Self) {
        if other.is_unknown() {
            return;
        }
        self.add(other.quantity, &other.symbol);
    }

    pub fn sub(&mut self, other: &Self) {
        let Ok(converted) = other.convert(&self.symbol) else {
            return;
        };
        self.quantity -= converted.quantity;
        self.unparsed_value = self.to_string();
    }
}

impl fmt::Display for OracleExadataMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str(UNKNOWN_VALUE);
        }
        write!(f, "{:.6} {}", self.quantity, self.symbol)
    }
}

impl FromStr for OracleExadataMeasurement {
    type Err = MeasurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.trim() {
            "" | "0" => "0B",
            other => other,
        };
        if s == UNKNOWN_VALUE {
            return Ok(Self::unknown());
        }

        let quantity = bytesize::float64(s)?;

        let mut runs = s.split(|c: char| !c.is_ascii_alphabetic()).filter(|r| !r.is_empty());
        let symbol = runs.next().ok_or_else(|| MeasurementError::Invalid(s.to_string()))?;
        if runs.next().is_some() {
            return Err(MeasurementError::Invalid(s.to_string()));
        }

        Ok(Self { unparsed_value: s.to_string(), symbol: symbol.to_string(), quantity })
    }
}

/// Share of `measure` over `total`, both compared in GiB, e.g. `"31.42%"`.
/// Returns `"0%"` for an empty total and an empty string when either side
/// cannot be converted.
pub fn percentage(measure: &OracleExadataMeasurement, total: &OracleExadataMeasurement) -> String {
    let (Ok(m), Ok(t)) = (measure.convert("GIB"), total.convert("GIB")) else {
        return String::new();
    };
    if t.quantity != 0.0 {
        format!("{:.2}%", m.quantity * 100.0 / t.quantity)
    } else {
        "0%".to_string()
    }
}
