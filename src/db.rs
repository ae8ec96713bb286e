use anyhow::Result;
use once_cell::sync::OnceCell;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use crate::error::ApiError;

pub static POOL: OnceCell<PgPool> = OnceCell::new();

pub async fn init_pool(url: &str) -> Result<()> {
    let pool = PgPool::connect(url).await?;
    POOL.set(pool).unwrap();

    Ok(())
}

/// Checks out one connection for the duration of a request. It returns to
/// the pool when the guard drops, on every exit path.
pub async fn acquire() -> Result<PoolConnection<Postgres>, ApiError> {
    POOL.get()
        .unwrap()
        .acquire()
        .await
        .map_err(ApiError::Connection)
}
