use serde::{Deserialize, Serialize};

use crate::mseed_error::MSeedError;

/// Record size used when a record carries no blockette 1000.
pub const DEFAULT_RECORD_SIZE: usize = 4096;

/// Records whose start year falls outside this range are assumed to be in the
/// other byte order.
pub const MIN_PLAUSIBLE_YEAR: i16 = 1960;
pub const MAX_PLAUSIBLE_YEAR: i16 = 2055;

/// Two records are contiguous if the gap between them is less than this many
/// sample periods of the earlier record.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.5;

/// Tunables for parsing and merging records.
///
/// Missing fields take their default, so an empty JSON object is a valid
/// config.
///
/// ```
/// let config = mseed2::ParseConfig::from_json_str(r#"{"gap_tolerance": 2.0}"#).unwrap();
/// assert_eq!(config.gap_tolerance, 2.0);
/// assert_eq!(config.default_record_size, 4096);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParseConfig {
    pub default_record_size: usize,
    pub min_year: i16,
    pub max_year: i16,
    pub gap_tolerance: f64,
}

impl ParseConfig {
    pub fn from_json_str(json: &str) -> Result<ParseConfig, MSeedError> {
        let config: ParseConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// True if the year is in the range a correctly ordered header would have.
    pub fn is_plausible_year(&self, year: i16) -> bool {
        year >= self.min_year && year <= self.max_year
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            default_record_size: DEFAULT_RECORD_SIZE,
            min_year: MIN_PLAUSIBLE_YEAR,
            max_year: MAX_PLAUSIBLE_YEAR,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() -> Result<(), MSeedError> {
        let config = ParseConfig::from_json_str("{}")?;
        assert_eq!(config, ParseConfig::default());
        Ok(())
    }

    #[test]
    fn year_range() {
        let config = ParseConfig::default();
        assert!(config.is_plausible_year(1960));
        assert!(config.is_plausible_year(2055));
        assert!(!config.is_plausible_year(1959));
        assert!(!config.is_plausible_year(2056));
    }

    #[test]
    fn bad_json() {
        assert!(matches!(
            ParseConfig::from_json_str("[1, 2]"),
            Err(MSeedError::JsonError(_))
        ));
    }
}
