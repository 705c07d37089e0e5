use std::process;
use std::sync::Arc;

use scorta::application::error::AppError;
use scorta::application::posts::PostService;
use scorta::application::repos::{PostsRepo, UsersRepo};
use scorta::application::users::UserService;
use scorta::cache::{CacheClient, CacheMetrics, CachedPostRepository};
use scorta::config;
use scorta::infra::db::PostgresRepositories;
use scorta::infra::error::InfraError;
use scorta::infra::http::{build_router, HttpState};
use scorta::infra::{redis, telemetry};
use tracing::{error, info, Dispatch, Level};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if tracing::dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!("database connection pool established");

    let repositories = Arc::new(PostgresRepositories::new(pool));

    let cache_client = redis::connect(&settings.redis)
        .await
        .map_err(AppError::from)?;
    let cache_client: Arc<dyn CacheClient> = Arc::new(cache_client);

    let metrics = Arc::new(
        CacheMetrics::new()
            .map_err(|err| AppError::from(InfraError::cache(err)))?,
    );

    let store_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = Arc::new(
        CachedPostRepository::new(store_repo, cache_client, metrics.clone()).await,
    );
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();

    let state = HttpState {
        posts: Arc::new(PostService::new(posts_repo)),
        users: Arc::new(UserService::new(users_repo)),
        metrics,
        db: repositories,
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;
    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("server exiting");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installs");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("sigterm handler installs")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
