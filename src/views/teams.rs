use poem::handler;
use poem::web::{Json, Query};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{CountRow, GlobalTeamRow, NamedCostRow, NamedCountRow, SumRow, TeamRow};
use crate::platform::{self, SortKey};
use crate::views::platforms::PLATFORM_TOTAL_COST;
use crate::views::utils::ReportParams;
use crate::{db, range};

// Team ranking queries join active repositories and left-join runs with the
// platform and window conditions in the ON clause, so a team keeps its row
// (with NULL/zero aggregates) even when nothing ran.
const MOST_COSTLY_TEAM: &str = "
SELECT e.name AS name, SUM(run.cost) AS total
FROM entities e
JOIN repositories r ON r.entity_id = e.id AND r.is_active
LEFT JOIN ci_cd_runs run ON run.repository_id = r.id
    AND LOWER(run.platform) = $1
    AND run.start_time >= $2 AND run.start_time < $3
WHERE e.platform = $1 AND e.type = ANY($4)
GROUP BY e.id, e.name
ORDER BY total DESC NULLS LAST
LIMIT 1";

const TEAM_WITH_MOST_JOBS: &str = "
SELECT e.name AS name, COUNT(run.id) AS total
FROM entities e
JOIN repositories r ON r.entity_id = e.id AND r.is_active
LEFT JOIN ci_cd_runs run ON run.repository_id = r.id
    AND LOWER(run.platform) = $1
    AND run.start_time >= $2 AND run.start_time < $3
WHERE e.platform = $1 AND e.type = ANY($4)
GROUP BY e.id, e.name
ORDER BY total DESC
LIMIT 1";

const TEAM_WITH_MOST_FAILED_JOBS: &str = "
SELECT e.name AS name, COUNT(run.id) AS total
FROM entities e
JOIN repositories r ON r.entity_id = e.id AND r.is_active
LEFT JOIN ci_cd_runs run ON run.repository_id = r.id
    AND LOWER(run.platform) = $1
    AND run.start_time >= $2 AND run.start_time < $3
    AND run.status = 'failed'
WHERE e.platform = $1 AND e.type = ANY($4)
GROUP BY e.id, e.name
ORDER BY total DESC
LIMIT 1";

const TOTAL_ACTIVE_TEAMS: &str = "
SELECT COUNT(DISTINCT e.id) AS total
FROM entities e
JOIN repositories r ON r.entity_id = e.id AND r.is_active
WHERE e.platform = $1 AND e.type = ANY($2)";

const TEAM_SCOPED_JOBS: &str = "
SELECT COUNT(run.id) AS total
FROM ci_cd_runs run
JOIN repositories r ON run.repository_id = r.id AND r.is_active
JOIN entities e ON r.entity_id = e.id
WHERE LOWER(run.platform) = $1
  AND run.start_time >= $2 AND run.start_time < $3
  AND e.platform = $1 AND e.type = ANY($4)";

// Per-platform team listing: expand the team tree parent-to-child, dedupe a
// node reached over several paths to its deepest discovery, then attach the
// window-filtered run aggregates and the (unwindowed) distinct repository
// names. One query variant per legal sort key.
macro_rules! platform_teams_sql {
    ($order:literal) => {
        concat!(
            "
WITH RECURSIVE team_tree AS (
    SELECT id, name, parent_id, 0 AS depth
    FROM entities
    WHERE platform = $1 AND type = ANY($2)
    UNION ALL
    SELECT e.id, e.name, e.parent_id, tt.depth + 1
    FROM entities e
    JOIN team_tree tt ON e.parent_id = tt.id
    WHERE e.platform = $1 AND e.type = ANY($2)
),
team_tree_deduped AS (
    SELECT id, name, parent_id, MAX(depth) AS depth
    FROM team_tree
    GROUP BY id, name, parent_id
),
team_jobs AS (
    SELECT tt.id AS team_id,
           COUNT(run.id) AS total_jobs,
           SUM(COALESCE(run.cost, 0.0)) AS total_cost
    FROM team_tree_deduped tt
    LEFT JOIN repositories r ON r.entity_id = tt.id
    LEFT JOIN ci_cd_runs run ON run.repository_id = r.id
    WHERE LOWER(run.platform) = $1
      AND run.start_time >= $3 AND run.start_time < $4
    GROUP BY tt.id
),
team_repos AS (
    SELECT e.id AS team_id, array_agg(DISTINCT r.name) AS repos
    FROM repositories r
    JOIN entities e ON r.entity_id = e.id
    GROUP BY e.id
)
SELECT
    tt.name AS team_name,
    (SELECT name FROM entities WHERE id = tt.parent_id) AS parent_team_name,
    COALESCE(tj.total_jobs, 0) AS total_jobs,
    COALESCE(tj.total_cost, 0.0) AS total_cost,
    COALESCE(tt.depth, 0) AS depth,
    tr.repos AS repositories
FROM team_tree_deduped tt
LEFT JOIN team_jobs tj ON tj.team_id = tt.id
LEFT JOIN team_repos tr ON tr.team_id = tt.id
ORDER BY ",
            $order,
            " DESC"
        )
    };
}

const PLATFORM_TEAMS_BY_COST: &str = platform_teams_sql!("total_cost");
const PLATFORM_TEAMS_BY_JOBS: &str = platform_teams_sql!("total_jobs");

// Global listing: seeded from every team-like type, the recursive step is
// deliberately unrestricted, and the window condition lives in the run join
// so teams without runs still list with zeros.
macro_rules! all_teams_sql {
    ($order:literal) => {
        concat!(
            "
WITH RECURSIVE team_tree AS (
    SELECT id, name, parent_id, platform, type, 0 AS depth
    FROM entities
    WHERE type = ANY($1)
    UNION ALL
    SELECT e.id, e.name, e.parent_id, e.platform, e.type, tt.depth + 1
    FROM entities e
    JOIN team_tree tt ON e.parent_id = tt.id
),
team_tree_deduped AS (
    SELECT id, name, parent_id, platform, type, MAX(depth) AS depth
    FROM team_tree
    GROUP BY id, name, parent_id, platform, type
),
team_jobs AS (
    SELECT tt.id AS team_id,
           COUNT(run.id) AS total_jobs,
           SUM(COALESCE(run.cost, 0.0)) AS total_cost
    FROM team_tree_deduped tt
    LEFT JOIN repositories r ON r.entity_id = tt.id
    LEFT JOIN ci_cd_runs run ON run.repository_id = r.id
        AND run.start_time >= $2 AND run.start_time < $3
    GROUP BY tt.id
),
team_repos AS (
    SELECT r.entity_id AS team_id, array_agg(DISTINCT r.name) AS repos
    FROM repositories r
    GROUP BY r.entity_id
)
SELECT
    tt.name AS team_name,
    tt.platform AS platform,
    tt.type AS entity_type,
    (SELECT name FROM entities WHERE id = tt.parent_id) AS parent_team_name,
    COALESCE(tj.total_jobs, 0) AS total_jobs,
    COALESCE(tj.total_cost, 0.0) AS total_cost,
    COALESCE(tt.depth, 0) AS depth,
    tr.repos AS repositories
FROM team_tree_deduped tt
LEFT JOIN team_jobs tj ON tj.team_id = tt.id
LEFT JOIN team_repos tr ON tr.team_id = tt.id
ORDER BY ",
            $order,
            " DESC"
        )
    };
}

const ALL_TEAMS_BY_COST: &str = all_teams_sql!("total_cost");
const ALL_TEAMS_BY_JOBS: &str = all_teams_sql!("total_jobs");

#[derive(Debug, Serialize)]
struct PlatformTeamsSummary {
    platform: String,
    most_costly_team: Option<String>,
    most_costly_team_cost: f64,
    team_with_most_jobs: Option<String>,
    team_with_most_jobs_count: i64,
    team_with_most_failed_jobs: Option<String>,
    team_with_most_failed_jobs_count: i64,
    total_active_teams: i64,
    total_cost: f64,
    total_jobs_count: i64,
}

#[handler]
pub async fn platform_teams_summary(
    params: Query<ReportParams>,
) -> Result<Json<PlatformTeamsSummary>, ApiError> {
    let platform = params.platform()?;
    let (start, end) = range::resolve(&params.range);
    let team_types = platform::as_bind_list(platform::summary_team_types(&platform));
    let mut conn = db::acquire().await?;

    let most_costly = sqlx::query_as::<_, NamedCostRow>(MOST_COSTLY_TEAM)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .bind(&team_types)
        .fetch_optional(&mut conn)
        .await?;

    let most_jobs = sqlx::query_as::<_, NamedCountRow>(TEAM_WITH_MOST_JOBS)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .bind(&team_types)
        .fetch_optional(&mut conn)
        .await?;

    let most_failed = sqlx::query_as::<_, NamedCountRow>(TEAM_WITH_MOST_FAILED_JOBS)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .bind(&team_types)
        .fetch_optional(&mut conn)
        .await?;

    let active_teams = sqlx::query_as::<_, CountRow>(TOTAL_ACTIVE_TEAMS)
        .bind(&platform)
        .bind(&team_types)
        .fetch_one(&mut conn)
        .await?;

    let total_cost = sqlx::query_as::<_, SumRow>(PLATFORM_TOTAL_COST)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_one(&mut conn)
        .await?;

    let total_jobs = sqlx::query_as::<_, CountRow>(TEAM_SCOPED_JOBS)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .bind(&team_types)
        .fetch_one(&mut conn)
        .await?;

    Ok(Json(PlatformTeamsSummary {
        platform,
        most_costly_team: most_costly.as_ref().map(|t| t.name.clone()),
        most_costly_team_cost: most_costly.and_then(|t| t.total).unwrap_or(0.0),
        team_with_most_jobs: most_jobs.as_ref().map(|t| t.name.clone()),
        team_with_most_jobs_count: most_jobs.map(|t| t.total).unwrap_or(0),
        team_with_most_failed_jobs: most_failed.as_ref().map(|t| t.name.clone()),
        team_with_most_failed_jobs_count: most_failed.map(|t| t.total).unwrap_or(0),
        total_active_teams: active_teams.total,
        total_cost: total_cost.total.unwrap_or(0.0),
        total_jobs_count: total_jobs.total,
    }))
}

#[derive(Debug, Serialize)]
struct TeamEntry {
    team_name: String,
    parent_team_name: Option<String>,
    total_jobs: i64,
    total_cost: f64,
    depth: i32,
    repositories: Vec<String>,
}

#[handler]
pub async fn platform_teams(params: Query<ReportParams>) -> Result<Json<Vec<TeamEntry>>, ApiError> {
    let platform = params.platform()?;
    let sort = SortKey::parse(params.sort_by.as_deref()).ok_or(ApiError::InvalidSortField)?;
    let team_types = platform::as_bind_list(platform::listing_team_types(&platform)?);
    let (start, end) = range::resolve(&params.range);

    let sql = match sort {
        SortKey::TotalCost => PLATFORM_TEAMS_BY_COST,
        SortKey::TotalJobs => PLATFORM_TEAMS_BY_JOBS,
    };

    let mut conn = db::acquire().await?;
    let rows = sqlx::query_as::<_, TeamRow>(sql)
        .bind(&platform)
        .bind(&team_types)
        .bind(start)
        .bind(end)
        .fetch_all(&mut conn)
        .await?;

    let teams = rows
        .into_iter()
        .map(|row| TeamEntry {
            team_name: row.team_name,
            parent_team_name: row.parent_team_name,
            total_jobs: row.total_jobs,
            total_cost: row.total_cost,
            depth: row.depth,
            repositories: row.repositories.unwrap_or_default(),
        })
        .collect();

    Ok(Json(teams))
}

#[derive(Debug, Serialize)]
struct GlobalTeamEntry {
    team_name: String,
    platform: String,
    entity_type: String,
    parent_team_name: Option<String>,
    total_jobs: i64,
    total_cost: f64,
    depth: i32,
    repositories: Vec<String>,
}

#[handler]
pub async fn all_teams(params: Query<ReportParams>) -> Result<Json<Vec<GlobalTeamEntry>>, ApiError> {
    let sort = SortKey::parse(params.sort_by.as_deref()).ok_or(ApiError::InvalidSortChoice)?;
    let (start, end) = range::resolve(&params.range);
    let team_types = platform::as_bind_list(platform::GLOBAL_TEAM_TYPES);

    let sql = match sort {
        SortKey::TotalCost => ALL_TEAMS_BY_COST,
        SortKey::TotalJobs => ALL_TEAMS_BY_JOBS,
    };

    let mut conn = db::acquire().await?;
    let rows = sqlx::query_as::<_, GlobalTeamRow>(sql)
        .bind(&team_types)
        .bind(start)
        .bind(end)
        .fetch_all(&mut conn)
        .await?;

    let teams = rows
        .into_iter()
        .map(|row| GlobalTeamEntry {
            team_name: row.team_name,
            platform: row.platform,
            entity_type: row.entity_type,
            parent_team_name: row.parent_team_name,
            total_jobs: row.total_jobs,
            total_cost: row.total_cost,
            depth: row.depth,
            repositories: row.repositories.unwrap_or_default(),
        })
        .collect();

    Ok(Json(teams))
}
