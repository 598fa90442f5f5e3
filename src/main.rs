use geostory_backend_rs::{
    app::App,
    jobs,
    modules::auth::service,
    types::{Config, ToContext},
};
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing_subscriber::prelude::*;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    let purge_interval = Duration::from_secs(config.auth.purge_interval_seconds);
    let admin = config.auth.admin.clone();

    let ctx = match config.to_context().await {
        Ok(ctx) => Arc::new(ctx),
        Err(err) => {
            tracing::error!("Failed to set up the application context: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(admin) = admin {
        if service::ensure_admin(&ctx, &admin).await.is_err() {
            tracing::error!("Failed to set up administrator {}", admin.username);
            return ExitCode::FAILURE;
        }
    }

    tokio::spawn(jobs::purge_expired_credentials(ctx.clone(), purge_interval));

    match App::new(ctx).serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Server stopped: {err}");
            ExitCode::FAILURE
        }
    }
}
