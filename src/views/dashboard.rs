use poem::handler;
use poem::web::{Json, Query};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::EnterpriseTotalsRow;
use crate::views::utils::ReportParams;
use crate::{db, range, ENTERPRISE_NAME};

// Closure of the enterprise root, then run totals restricted to it.
const ENTERPRISE_TOTALS: &str = "
WITH RECURSIVE enterprise_tree AS (
    SELECT id FROM entities WHERE name = $1 AND type = 'enterprise'
    UNION ALL
    SELECT e.id FROM entities e
    JOIN enterprise_tree t ON e.parent_id = t.id
)
SELECT
    SUM(run.cost) AS total_cost,
    SUM(CASE WHEN run.status = 'failed' THEN run.cost ELSE 0 END) AS failed_cost,
    COUNT(run.id) AS total_runs,
    SUM(CASE WHEN run.status = 'success' THEN 1 ELSE 0 END) AS successful_runs,
    SUM(CASE WHEN run.status = 'failed' THEN 1 ELSE 0 END) AS failed_runs
FROM ci_cd_runs run
JOIN repositories r ON run.repository_id = r.id
JOIN entities e ON r.entity_id = e.id
WHERE e.id IN (SELECT id FROM enterprise_tree)
  AND run.start_time >= $2 AND run.start_time < $3";

#[derive(Debug, Serialize)]
struct DashboardSummary {
    total_enterprise_ci_cd_cost: f64,
    total_failed_build_cost_enterprise: f64,
    total_runs_enterprise: i64,
    successful_runs_enterprise: i64,
    failed_runs_enterprise: i64,
}

#[handler]
pub async fn dashboard_summary(
    params: Query<ReportParams>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let (start, end) = range::resolve(&params.range);
    let mut conn = db::acquire().await?;

    let row = sqlx::query_as::<_, EnterpriseTotalsRow>(ENTERPRISE_TOTALS)
        .bind(ENTERPRISE_NAME.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(&mut conn)
        .await?;

    Ok(Json(DashboardSummary {
        total_enterprise_ci_cd_cost: row.total_cost.unwrap_or(0.0),
        total_failed_build_cost_enterprise: row.failed_cost.unwrap_or(0.0),
        total_runs_enterprise: row.total_runs,
        successful_runs_enterprise: row.successful_runs.unwrap_or(0),
        failed_runs_enterprise: row.failed_runs.unwrap_or(0),
    }))
}
