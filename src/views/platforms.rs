use poem::handler;
use poem::web::{Json, Query};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{NamedCostRow, PlatformCostsRow, PlatformTotalsRow};
use crate::views::utils::{success_rate, ReportParams};
use crate::{db, range};

const PLATFORM_COSTS: &str = "
SELECT
    LOWER(run.platform) AS platform,
    SUM(run.cost) AS total_cost,
    SUM(CASE WHEN run.status = 'failed' THEN run.cost ELSE 0 END) AS failed_cost,
    COUNT(run.id) AS total_jobs,
    SUM(CASE WHEN run.status = 'success' THEN 1 ELSE 0 END) AS successful_jobs,
    SUM(CASE WHEN run.status = 'failed' THEN 1 ELSE 0 END) AS failed_jobs
FROM ci_cd_runs run
WHERE run.start_time >= $1 AND run.start_time < $2
GROUP BY LOWER(run.platform)
ORDER BY total_cost DESC NULLS LAST";

const PLATFORM_TOTALS: &str = "
SELECT
    SUM(run.cost) AS total_cost,
    COUNT(run.id) AS total_jobs,
    SUM(CASE WHEN run.status = 'failed' THEN 1 ELSE 0 END) AS failed_jobs
FROM ci_cd_runs run
WHERE LOWER(run.platform) = $1
  AND run.start_time >= $2 AND run.start_time < $3";

// Shared with the repository summary endpoint. Tie order between equally
// costly repos is whatever the store returns.
pub(crate) const TOP_REPO_BY_COST: &str = "
SELECT r.name AS name, SUM(run.cost) AS total
FROM ci_cd_runs run
JOIN repositories r ON run.repository_id = r.id
WHERE LOWER(run.platform) = $1
  AND run.start_time >= $2 AND run.start_time < $3
GROUP BY r.id, r.name
ORDER BY total DESC NULLS LAST
LIMIT 1";

pub(crate) const PLATFORM_TOTAL_COST: &str = "
SELECT SUM(run.cost) AS total
FROM ci_cd_runs run
WHERE LOWER(run.platform) = $1
  AND run.start_time >= $2 AND run.start_time < $3";

#[derive(Debug, Serialize)]
struct PlatformCosts {
    platform: String,
    total_cost_by_platform: f64,
    failed_cost_by_platform: f64,
    total_jobs: i64,
    successful_jobs: i64,
    failed_jobs: i64,
    success_rate_percent: Option<f64>,
}

#[handler]
pub async fn platform_costs(
    params: Query<ReportParams>,
) -> Result<Json<Vec<PlatformCosts>>, ApiError> {
    let (start, end) = range::resolve(&params.range);
    let mut conn = db::acquire().await?;

    let rows = sqlx::query_as::<_, PlatformCostsRow>(PLATFORM_COSTS)
        .bind(start)
        .bind(end)
        .fetch_all(&mut conn)
        .await?;

    let breakdown = rows
        .into_iter()
        .map(|row| PlatformCosts {
            platform: row.platform,
            total_cost_by_platform: row.total_cost.unwrap_or(0.0),
            failed_cost_by_platform: row.failed_cost.unwrap_or(0.0),
            total_jobs: row.total_jobs,
            successful_jobs: row.successful_jobs.unwrap_or(0),
            failed_jobs: row.failed_jobs.unwrap_or(0),
            success_rate_percent: success_rate(row.successful_jobs.unwrap_or(0), row.total_jobs),
        })
        .collect();

    Ok(Json(breakdown))
}

#[derive(Debug, Serialize)]
struct PlatformSummary {
    platform: String,
    total_cost: f64,
    total_jobs: i64,
    failed_jobs: i64,
    most_costly_repo: Option<String>,
    most_costly_repo_cost: f64,
}

#[handler]
pub async fn platform_summary(
    params: Query<ReportParams>,
) -> Result<Json<PlatformSummary>, ApiError> {
    let platform = params.platform()?;
    let (start, end) = range::resolve(&params.range);
    let mut conn = db::acquire().await?;

    let totals = sqlx::query_as::<_, PlatformTotalsRow>(PLATFORM_TOTALS)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_one(&mut conn)
        .await?;

    let top_repo = sqlx::query_as::<_, NamedCostRow>(TOP_REPO_BY_COST)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut conn)
        .await?;

    Ok(Json(PlatformSummary {
        platform,
        total_cost: totals.total_cost.unwrap_or(0.0),
        total_jobs: totals.total_jobs,
        failed_jobs: totals.failed_jobs.unwrap_or(0),
        most_costly_repo: top_repo.as_ref().map(|r| r.name.clone()),
        most_costly_repo_cost: top_repo.and_then(|r| r.total).unwrap_or(0.0),
    }))
}
