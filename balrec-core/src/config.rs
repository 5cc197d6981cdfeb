//! Reconciliation settings shared by extraction and comparison.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DATE_COL: &str = "Date";
pub const DEFAULT_CLOSING_COL: &str = "Closing";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Column names, tolerance and date convention for one reconciliation run.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// date_col = "Value Date"
/// tolerance = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Header of the date column in both statements
    pub date_col: String,
    /// Header of the closing balance column in both statements
    pub closing_col: String,
    /// Largest absolute ERP - bank difference still counted as a match
    #[serde(with = "rust_decimal::serde::float")]
    pub tolerance: Decimal,
    /// Read ambiguous dates like 03/04/2024 as DD/MM
    pub dayfirst: bool,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            date_col: DEFAULT_DATE_COL.to_string(),
            closing_col: DEFAULT_CLOSING_COL.to_string(),
            tolerance: Decimal::ONE,
            dayfirst: true,
        }
    }
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ReconConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_col.trim().is_empty() {
            return Err(ConfigError::Invalid("date_col must not be empty".into()));
        }
        if self.closing_col.trim().is_empty() {
            return Err(ConfigError::Invalid("closing_col must not be empty".into()));
        }
        if self.date_col.trim() == self.closing_col.trim() {
            return Err(ConfigError::Invalid(format!(
                "date_col and closing_col are both '{}'",
                self.date_col
            )));
        }
        if self.tolerance.is_sign_negative() && !self.tolerance.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// The two columns every source table must carry, date first
    pub fn required_columns(&self) -> [&str; 2] {
        [self.date_col.as_str(), self.closing_col.as_str()]
    }
}
