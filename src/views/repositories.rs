use poem::handler;
use poem::web::{Json, Query};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{CountRow, GlobalRepoRow, NamedCostRow, NamedCountRow, RepoRow, SumRow};
use crate::platform::SortKey;
use crate::views::platforms::{PLATFORM_TOTAL_COST, TOP_REPO_BY_COST};
use crate::views::utils::ReportParams;
use crate::{db, range};

const TOP_REPO_BY_JOBS: &str = "
SELECT r.name AS name, COUNT(run.id) AS total
FROM ci_cd_runs run
JOIN repositories r ON r.id = run.repository_id
WHERE LOWER(run.platform) = $1
  AND run.start_time >= $2 AND run.start_time < $3
GROUP BY r.id, r.name
ORDER BY total DESC
LIMIT 1";

// Active-repo inventory is not windowed by the report range.
const TOTAL_ACTIVE_REPOS: &str = "
SELECT COUNT(*) AS total
FROM repositories
WHERE LOWER(platform) = $1 AND is_active";

macro_rules! platform_repos_sql {
    ($order:literal) => {
        concat!(
            "
SELECT
    r.name AS repo_name,
    e.name AS team_name,
    COUNT(run.id) AS total_jobs,
    COALESCE(SUM(run.cost), 0.0) AS total_cost
FROM repositories r
JOIN entities e ON r.entity_id = e.id
LEFT JOIN ci_cd_runs run ON r.id = run.repository_id
    AND LOWER(run.platform) = $1
    AND run.start_time >= $2 AND run.start_time < $3
WHERE LOWER(r.platform) = $1 AND r.is_active
GROUP BY r.id, r.name, e.name
ORDER BY ",
            $order,
            " DESC"
        )
    };
}

const PLATFORM_REPOS_BY_COST: &str = platform_repos_sql!("total_cost");
const PLATFORM_REPOS_BY_JOBS: &str = platform_repos_sql!("total_jobs");

macro_rules! all_repos_sql {
    ($order:literal) => {
        concat!(
            "
SELECT
    r.name AS repo_name,
    e.name AS team_name,
    LOWER(r.platform) AS platform,
    COUNT(run.id) AS total_jobs,
    COALESCE(SUM(run.cost), 0.0) AS total_cost
FROM repositories r
JOIN entities e ON r.entity_id = e.id
LEFT JOIN ci_cd_runs run ON r.id = run.repository_id
    AND run.start_time >= $1 AND run.start_time < $2
WHERE r.is_active
GROUP BY r.id, r.name, r.platform, e.name
ORDER BY ",
            $order,
            " DESC"
        )
    };
}

const ALL_REPOS_BY_COST: &str = all_repos_sql!("total_cost");
const ALL_REPOS_BY_JOBS: &str = all_repos_sql!("total_jobs");

#[derive(Debug, Serialize)]
struct PlatformRepositoriesSummary {
    platform: String,
    most_costly_repo: Option<String>,
    most_costly_repo_cost: f64,
    repo_with_most_jobs: Option<String>,
    repo_with_most_jobs_count: i64,
    total_active_repositories: i64,
    total_cost: f64,
}

#[handler]
pub async fn platform_repositories_summary(
    params: Query<ReportParams>,
) -> Result<Json<PlatformRepositoriesSummary>, ApiError> {
    let platform = params.platform()?;
    let (start, end) = range::resolve(&params.range);
    let mut conn = db::acquire().await?;

    let most_costly = sqlx::query_as::<_, NamedCostRow>(TOP_REPO_BY_COST)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut conn)
        .await?;

    let most_jobs = sqlx::query_as::<_, NamedCountRow>(TOP_REPO_BY_JOBS)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut conn)
        .await?;

    let active_repos = sqlx::query_as::<_, CountRow>(TOTAL_ACTIVE_REPOS)
        .bind(&platform)
        .fetch_one(&mut conn)
        .await?;

    let total_cost = sqlx::query_as::<_, SumRow>(PLATFORM_TOTAL_COST)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_one(&mut conn)
        .await?;

    Ok(Json(PlatformRepositoriesSummary {
        platform,
        most_costly_repo: most_costly.as_ref().map(|r| r.name.clone()),
        most_costly_repo_cost: most_costly.and_then(|r| r.total).unwrap_or(0.0),
        repo_with_most_jobs: most_jobs.as_ref().map(|r| r.name.clone()),
        repo_with_most_jobs_count: most_jobs.map(|r| r.total).unwrap_or(0),
        total_active_repositories: active_repos.total,
        total_cost: total_cost.total.unwrap_or(0.0),
    }))
}

#[handler]
pub async fn platform_repositories(
    params: Query<ReportParams>,
) -> Result<Json<Vec<RepoRow>>, ApiError> {
    let platform = params.platform()?;
    let sort = SortKey::parse(params.sort_by.as_deref()).ok_or(ApiError::InvalidSortField)?;
    let (start, end) = range::resolve(&params.range);

    let sql = match sort {
        SortKey::TotalCost => PLATFORM_REPOS_BY_COST,
        SortKey::TotalJobs => PLATFORM_REPOS_BY_JOBS,
    };

    let mut conn = db::acquire().await?;
    let repos = sqlx::query_as::<_, RepoRow>(sql)
        .bind(&platform)
        .bind(start)
        .bind(end)
        .fetch_all(&mut conn)
        .await?;

    Ok(Json(repos))
}

#[derive(Debug, Serialize)]
struct RepoRollup {
    most_expensive_repo: Option<String>,
    most_jobs_repo: Option<String>,
    cheapest_repo: Option<String>,
}

#[derive(Debug, Serialize)]
struct AllRepositories {
    repositories: Vec<GlobalRepoRow>,
    summary: RepoRollup,
}

/// Top/bottom picks over the already-aggregated listing. Tie order between
/// equal totals is not defined.
fn rollup(repos: &[GlobalRepoRow]) -> RepoRollup {
    RepoRollup {
        most_expensive_repo: repos
            .iter()
            .max_by(|a, b| a.total_cost.total_cmp(&b.total_cost))
            .map(|r| r.repo_name.clone()),
        most_jobs_repo: repos
            .iter()
            .max_by_key(|r| r.total_jobs)
            .map(|r| r.repo_name.clone()),
        cheapest_repo: repos
            .iter()
            .min_by(|a, b| a.total_cost.total_cmp(&b.total_cost))
            .map(|r| r.repo_name.clone()),
    }
}

#[handler]
pub async fn all_repositories(
    params: Query<ReportParams>,
) -> Result<Json<AllRepositories>, ApiError> {
    let sort = SortKey::parse(params.sort_by.as_deref()).ok_or(ApiError::InvalidSortChoice)?;
    let (start, end) = range::resolve(&params.range);

    let sql = match sort {
        SortKey::TotalCost => ALL_REPOS_BY_COST,
        SortKey::TotalJobs => ALL_REPOS_BY_JOBS,
    };

    let mut conn = db::acquire().await?;
    let repositories = sqlx::query_as::<_, GlobalRepoRow>(sql)
        .bind(start)
        .bind(end)
        .fetch_all(&mut conn)
        .await?;

    let summary = rollup(&repositories);

    Ok(Json(AllRepositories {
        repositories,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, jobs: i64, cost: f64) -> GlobalRepoRow {
        GlobalRepoRow {
            repo_name: name.to_string(),
            team_name: "core".to_string(),
            platform: "github".to_string(),
            total_jobs: jobs,
            total_cost: cost,
        }
    }

    #[test]
    fn rollup_picks_extremes_by_cost_and_jobs() {
        let repos = vec![
            repo("alpha", 4, 10.0),
            repo("bravo", 1, 25.0),
            repo("charlie", 9, 0.0),
        ];

        let summary = rollup(&repos);
        assert_eq!(summary.most_expensive_repo.as_deref(), Some("bravo"));
        assert_eq!(summary.most_jobs_repo.as_deref(), Some("charlie"));
        assert_eq!(summary.cheapest_repo.as_deref(), Some("charlie"));
    }

    #[test]
    fn rollup_over_nothing_is_all_null() {
        let summary = rollup(&[]);
        assert_eq!(summary.most_expensive_repo, None);
        assert_eq!(summary.most_jobs_repo, None);
        assert_eq!(summary.cheapest_repo, None);
    }
}
