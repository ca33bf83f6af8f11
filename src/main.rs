#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::{RuntimeConfiguration, Settings},
    diagnostics::check_connection,
    routes::student_form_router,
    state::StudentFormState,
};
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod diagnostics;
mod error;
mod maud_conveniences;
mod routes;
mod state;
mod store;
mod submission;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_result = dotenvy::dotenv();
    let settings = Settings::from_env();

    let default_level = if settings.get_flag("DEBUG") { "debug" } else { "info" };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    match dotenv_result {
        Ok(path) => info!(?path, "Loaded env vars"),
        Err(e) if e.not_found() => debug!("No .env file found, using the process environment"),
        Err(e) => warn!(?e, "Unable to load .env file"),
    }

    let config = match RuntimeConfiguration::new(&settings) {
        Ok(config) => config,
        Err(e) => {
            error!(%e, "Unable to create config");
            return ExitCode::FAILURE;
        }
    };

    match std::env::args().nth(1).as_deref() {
        Some("check-connection") => run_connection_check(&config).await,
        None | Some("serve") => {
            serve(config).await;
            ExitCode::SUCCESS
        }
        Some(other) => {
            error!(?other, "Unknown command, expected `serve` or `check-connection`");
            ExitCode::FAILURE
        }
    }
}

async fn run_connection_check(config: &RuntimeConfiguration) -> ExitCode {
    let db_config = config.db_config();
    println!("Testing database connection...");
    println!("{}", "-".repeat(50));
    println!("{db_config}");
    println!("{}", "-".repeat(50));

    let report = check_connection(&db_config).await;
    print!("{report}");

    if report.is_connected() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn serve(config: RuntimeConfiguration) {
    let db_config = config.db_config();
    info!(server = %db_config.server, database = %db_config.database, driver = %db_config.driver, auth = db_config.auth.label(), "Using database");

    //only informational, the form still comes up if the database is down
    if !check_connection(&db_config).await.is_connected() {
        warn!("Database is not reachable yet, submissions will fail until it is");
    }

    let state = StudentFormState::new(config.clone());
    let app = student_form_router(state).layer(TraceLayer::new_for_http());

    let server_ip = config.server_config().bind_address();
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("unable to serve app");
}
