use serde::Deserialize;

use crate::error::ApiError;

/// Query-string parameters shared by the report endpoints. Which fields are
/// actually required varies per endpoint, so everything is optional here and
/// validated by the accessors.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub platform: Option<String>,
    #[serde(default)]
    pub range: String,
    pub sort_by: Option<String>,
}

impl ReportParams {
    /// The required, lowercased platform. Absent or empty is a client error.
    pub fn platform(&self) -> Result<String, ApiError> {
        match self.platform.as_deref() {
            Some(p) if !p.is_empty() => Ok(p.to_lowercase()),
            _ => Err(ApiError::PlatformRequired),
        }
    }
}

/// Percentage of successful jobs rounded to two decimals, or `None` when the
/// group has no jobs at all.
pub fn success_rate(successful: i64, total: i64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let rate = successful as f64 * 100.0 / total as f64;
    Some((rate * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(platform: Option<&str>) -> ReportParams {
        ReportParams {
            platform: platform.map(|p| p.to_string()),
            range: String::new(),
            sort_by: None,
        }
    }

    #[test]
    fn platform_is_lowercased() {
        assert_eq!(params(Some("GitHub")).platform().unwrap(), "github");
    }

    #[test]
    fn missing_or_empty_platform_is_rejected() {
        assert!(matches!(
            params(None).platform(),
            Err(ApiError::PlatformRequired)
        ));
        assert!(matches!(
            params(Some("")).platform(),
            Err(ApiError::PlatformRequired)
        ));
    }

    #[test]
    fn success_rate_rounds_to_two_decimals() {
        assert_eq!(success_rate(1, 3), Some(33.33));
        assert_eq!(success_rate(2, 3), Some(66.67));
        assert_eq!(success_rate(5, 5), Some(100.0));
        assert_eq!(success_rate(0, 4), Some(0.0));
    }

    #[test]
    fn success_rate_is_undefined_for_empty_groups() {
        assert_eq!(success_rate(0, 0), None);
    }
}
