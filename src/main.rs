mod db;
mod error;
mod models;
mod platform;
mod range;
mod views;

use anyhow::Result;

use poem::{get, listener::TcpListener, middleware::Cors, EndpointExt, Route, Server};

lazy_static::lazy_static! {
    /// Name of the root entity the enterprise-wide dashboard rolls up under.
    pub static ref ENTERPRISE_NAME: String = std::env::var("ENTERPRISE_NAME")
        .unwrap_or_else(|_| "My Global Enterprise".into());
}

fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
}

async fn setup_db() -> Result<()> {
    db::init_pool(&std::env::var("DATABASE_URL").unwrap()).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    setup_db().await?;

    let app = Route::new()
        .at(
            "/api/dashboard-summary",
            get(views::dashboard::dashboard_summary),
        )
        .at("/api/platform-costs", get(views::platforms::platform_costs))
        .at(
            "/api/platform-summary",
            get(views::platforms::platform_summary),
        )
        .at(
            "/api/platform-teams-summary",
            get(views::teams::platform_teams_summary),
        )
        .at("/api/platform-teams", get(views::teams::platform_teams))
        .at(
            "/api/platform-repositories-summary",
            get(views::repositories::platform_repositories_summary),
        )
        .at(
            "/api/platform-repositories",
            get(views::repositories::platform_repositories),
        )
        .at("/api/teams", get(views::teams::all_teams))
        .at(
            "/api/repositories",
            get(views::repositories::all_repositories),
        )
        .with(Cors::new())
        .inspect_all_err(|err| {
            tracing::error!("{:?}", err);
        });

    Server::new(TcpListener::bind("0.0.0.0:3000"))
        .run(app)
        .await?;

    Ok(())
}
