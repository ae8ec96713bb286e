use crate::error::ApiError;

/// Sort keys accepted by the list endpoints. Each variant selects a
/// compile-time query variant; client input never reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TotalCost,
    TotalJobs,
}

impl SortKey {
    /// Parses the `sort_by` parameter, defaulting to `total_cost` when the
    /// parameter is absent. Returns `None` for anything else.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.unwrap_or("total_cost") {
            "total_cost" => Some(SortKey::TotalCost),
            "total_jobs" => Some(SortKey::TotalJobs),
            _ => None,
        }
    }
}

/// Entity types counted as teams in the per-platform team listing.
pub fn listing_team_types(platform: &str) -> Result<&'static [&'static str], ApiError> {
    match platform {
        "github" => Ok(&["team"]),
        "gitlab" => Ok(&["group", "subgroup"]),
        "bitbucket" => Ok(&["workspace", "project"]),
        other => Err(ApiError::UnsupportedPlatform(other.to_string())),
    }
}

/// Entity types counted as teams in the per-platform summary. Not the same
/// table as `listing_team_types`: the two endpoints diverge on bitbucket
/// projects, and unknown platforms fall through to the general bucket here
/// instead of being rejected.
pub fn summary_team_types(platform: &str) -> &'static [&'static str] {
    if platform == "bitbucket" {
        &["workspace"]
    } else {
        &["team", "group", "subgroup"]
    }
}

/// Every entity type the global team listing seeds its traversal from.
pub const GLOBAL_TEAM_TYPES: &[&str] = &["team", "group", "subgroup", "workspace", "project"];

/// Owned copy suitable for binding as a `text[]` query parameter.
pub fn as_bind_list(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_defaults_to_total_cost() {
        assert_eq!(SortKey::parse(None), Some(SortKey::TotalCost));
        assert_eq!(SortKey::parse(Some("total_cost")), Some(SortKey::TotalCost));
        assert_eq!(SortKey::parse(Some("total_jobs")), Some(SortKey::TotalJobs));
    }

    #[test]
    fn sort_key_rejects_anything_else() {
        for bad in ["cost", "TOTAL_COST", "total_failed", ""] {
            assert_eq!(SortKey::parse(Some(bad)), None, "{bad}");
        }
    }

    #[test]
    fn listing_and_summary_tables_diverge_on_bitbucket() {
        assert_eq!(
            listing_team_types("bitbucket").unwrap(),
            &["workspace", "project"]
        );
        assert_eq!(summary_team_types("bitbucket"), &["workspace"]);
    }

    #[test]
    fn listing_table_covers_the_supported_platforms() {
        assert_eq!(listing_team_types("github").unwrap(), &["team"]);
        assert_eq!(
            listing_team_types("gitlab").unwrap(),
            &["group", "subgroup"]
        );
        assert!(matches!(
            listing_team_types("svn"),
            Err(ApiError::UnsupportedPlatform(p)) if p == "svn"
        ));
    }

    #[test]
    fn summary_table_has_no_unsupported_bucket() {
        assert_eq!(summary_team_types("github"), &["team", "group", "subgroup"]);
        assert_eq!(summary_team_types("svn"), &["team", "group", "subgroup"]);
    }
}
