//! Turns the scraped progress value into a data usage report.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use crate::format::{format_percentage, format_quantity, round_dp, DISPLAY_DP};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Could not parse progress value '{value}'")]
    InvalidProgress { value: String },

    #[error("Progress value '{value}' of {total} GB is too large to compute")]
    Overflow { value: String, total: u64 },
}

/// Parse a progress value written with a decimal comma (`"42,50"`).
///
/// Exponent notation (`"1e2"`) and `_` digit separators are accepted.
/// `inf` and `nan` are not.
pub fn parse_progress(raw: &str) -> Result<Decimal, ReportError> {
    let normalized = raw.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| ReportError::InvalidProgress {
            value: raw.to_string(),
        })
}

/// Absolute usage against the monthly allowance, in GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUsage {
    pub used: Decimal,
    pub total: u64,
}

/// Percentage of the allowance used, plus the absolute figures when the
/// allowance is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageReport {
    pub percentage: Decimal,
    pub usage: Option<DataUsage>,
}

impl UsageReport {
    /// Build a report from the raw attribute value.
    ///
    /// Values outside 0–100 are reported as-is.
    pub fn from_progress(raw: &str, total_gb: Option<u64>) -> Result<Self, ReportError> {
        let percentage = parse_progress(raw)?;
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            warn!(%percentage, "Progress value outside 0-100");
        }

        let usage = match total_gb {
            Some(total) => {
                let used = percentage
                    .checked_mul(Decimal::from(total))
                    .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                    .ok_or_else(|| ReportError::Overflow {
                        value: raw.to_string(),
                        total,
                    })?;
                Some(DataUsage {
                    used: round_dp(used, DISPLAY_DP),
                    total,
                })
            }
            None => None,
        };

        Ok(Self { percentage, usage })
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percentage = format_percentage(self.percentage);
        match &self.usage {
            Some(usage) => write!(
                f,
                "{} GB / {} GB ({percentage}%)",
                format_quantity(usage.used),
                usage.total
            ),
            None => write!(f, "{percentage}%"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_progress("42,50"), Ok(Decimal::new(4250, 2)));
        assert_eq!(parse_progress(" 7 "), Ok(Decimal::from(7)));
        assert_eq!(parse_progress("3.5"), Ok(Decimal::new(35, 1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            parse_progress("n/d"),
            Err(ReportError::InvalidProgress {
                value: "n/d".to_string()
            })
        );
        assert!(parse_progress("").is_err());
        assert!(parse_progress("1,2,3").is_err());
        assert!(parse_progress("inf").is_err());
        assert!(parse_progress("nan").is_err());
    }

    #[test]
    fn test_parse_exponent_notation() {
        assert_eq!(parse_progress("1e2"), Ok(Decimal::from(100)));
        assert_eq!(parse_progress("4,25e1"), Ok(Decimal::new(425, 1)));
        assert_eq!(parse_progress("1_0"), Ok(Decimal::from(10)));
    }

    #[test]
    fn test_report_with_capacity() -> Result<(), ReportError> {
        let report = UsageReport::from_progress("42,50", Some(100))?;

        assert_eq!(report.percentage, Decimal::new(4250, 2));
        assert_eq!(
            report.usage,
            Some(DataUsage {
                used: Decimal::new(425, 1),
                total: 100
            })
        );
        assert_eq!(report.to_string(), "42.5 GB / 100 GB (42.50%)");
        Ok(())
    }

    #[test]
    fn test_report_without_capacity() -> Result<(), ReportError> {
        let report = UsageReport::from_progress("42,50", None)?;

        assert_eq!(report.usage, None);
        assert_eq!(report.to_string(), "42.50%");
        Ok(())
    }

    #[test]
    fn test_used_is_rounded_to_two_places() -> Result<(), ReportError> {
        let report = UsageReport::from_progress("33,33", Some(150))?;

        // 33.33% of 150 = 49.995
        assert_eq!(report.to_string(), "50.0 GB / 150 GB (33.33%)");
        Ok(())
    }

    #[test]
    fn test_out_of_range_passes_through() -> Result<(), ReportError> {
        let report = UsageReport::from_progress("120,00", Some(10))?;
        assert_eq!(report.to_string(), "12.0 GB / 10 GB (120.00%)");

        let report = UsageReport::from_progress("-5", None)?;
        assert_eq!(report.to_string(), "-5.00%");
        Ok(())
    }

    #[test]
    fn test_huge_value_overflows_without_panicking() {
        let max = "79228162514264337593543950335";

        assert_eq!(
            UsageReport::from_progress(max, Some(100)),
            Err(ReportError::Overflow {
                value: max.to_string(),
                total: 100
            })
        );
        assert!(matches!(
            UsageReport::from_progress("5000000000", Some(u64::MAX)),
            Err(ReportError::Overflow { .. })
        ));
    }

    #[test]
    fn test_huge_value_without_capacity_is_reported() -> Result<(), ReportError> {
        let report = UsageReport::from_progress("79228162514264337593543950335", None)?;
        assert_eq!(report.to_string(), "79228162514264337593543950335.00%");
        Ok(())
    }
}
