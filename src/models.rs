//! Row types the aggregation queries decode into. Aggregates over zero rows
//! come back as SQL NULL, so sums stay `Option` here and the views substitute
//! the neutral value when shaping the response.

use sqlx::FromRow;

/// `SUM`/`COUNT` totals for the enterprise-wide dashboard roll-up.
#[derive(Debug, FromRow)]
pub struct EnterpriseTotalsRow {
    pub total_cost: Option<f64>,
    pub failed_cost: Option<f64>,
    pub total_runs: i64,
    pub successful_runs: Option<i64>,
    pub failed_runs: Option<i64>,
}

/// One `GROUP BY platform` row of the platform cost breakdown.
#[derive(Debug, FromRow)]
pub struct PlatformCostsRow {
    pub platform: String,
    pub total_cost: Option<f64>,
    pub failed_cost: Option<f64>,
    pub total_jobs: i64,
    pub successful_jobs: Option<i64>,
    pub failed_jobs: Option<i64>,
}

/// Totals for a single platform.
#[derive(Debug, FromRow)]
pub struct PlatformTotalsRow {
    pub total_cost: Option<f64>,
    pub total_jobs: i64,
    pub failed_jobs: Option<i64>,
}

/// Top-ranked group by a cost metric (`LIMIT 1` queries).
#[derive(Debug, FromRow)]
pub struct NamedCostRow {
    pub name: String,
    pub total: Option<f64>,
}

/// Top-ranked group by a count metric (`LIMIT 1` queries).
#[derive(Debug, FromRow)]
pub struct NamedCountRow {
    pub name: String,
    pub total: i64,
}

#[derive(Debug, FromRow)]
pub struct CountRow {
    pub total: i64,
}

#[derive(Debug, FromRow)]
pub struct SumRow {
    pub total: Option<f64>,
}

/// One team of the per-platform listing, after depth dedup.
#[derive(Debug, FromRow)]
pub struct TeamRow {
    pub team_name: String,
    pub parent_team_name: Option<String>,
    pub total_jobs: i64,
    pub total_cost: f64,
    pub depth: i32,
    pub repositories: Option<Vec<String>>,
}

/// One team of the global listing, which also carries platform and type.
#[derive(Debug, FromRow)]
pub struct GlobalTeamRow {
    pub team_name: String,
    pub platform: String,
    pub entity_type: String,
    pub parent_team_name: Option<String>,
    pub total_jobs: i64,
    pub total_cost: f64,
    pub depth: i32,
    pub repositories: Option<Vec<String>>,
}

/// One active repository of the per-platform listing. Doubles as the
/// response entry, the query already coalesces the aggregates.
#[derive(Debug, serde::Serialize, FromRow)]
pub struct RepoRow {
    pub repo_name: String,
    pub team_name: String,
    pub total_jobs: i64,
    pub total_cost: f64,
}

/// One active repository of the global listing.
#[derive(Debug, serde::Serialize, FromRow)]
pub struct GlobalRepoRow {
    pub repo_name: String,
    pub team_name: String,
    pub platform: String,
    pub total_jobs: i64,
    pub total_cost: f64,
}
