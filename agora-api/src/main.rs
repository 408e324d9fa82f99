use agora_common::validation::{InvalidFilterPatternError, ProfanityFilter};
use agora_db::{
    client::{DbClient, DbError},
    composer::ViewComposer,
    submit::Submitter,
};
use serde::Deserialize;
use server::{ServerState, notices::NoticeBoard};
use sqlx::postgres::PgPoolOptions;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to database: {0}")]
    DatabaseConnect(#[from] sqlx::Error),
    #[error("Error preparing database: {0}")]
    Database(#[from] DbError),
    #[error("Invalid PROFANITY_PATTERN: {0}")]
    ProfanityPattern(#[from] InvalidFilterPatternError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "default_max_connections")]
    database_max_connections: u32,
    /// Base URL under which stored images are publicly served.
    storage_public_url: String,
    profanity_pattern: Option<String>,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "agora_api=debug,\
                agora_db=debug,\
                agora_common=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn server_state(env: &Env) -> Result<ServerState, InitError> {
    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .connect(&env.database_url)
        .await?;

    let db_client = Arc::new(DbClient::new(pool, &env.storage_public_url));
    db_client.migrate().await?;

    let filter = ProfanityFilter::from_pattern(env.profanity_pattern.as_deref())?;
    let composer = Arc::new(ViewComposer::new(Arc::clone(&db_client)));
    let submitter = Arc::new(Submitter::new(Arc::clone(&composer), filter));

    Ok(ServerState {
        db_client,
        composer,
        submitter,
        notices: Arc::new(NoticeBoard::new()),
    })
}

fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => error!(%err, "Could not listen for Ctrl+C, shutting down"),
        }
        shutdown.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let state = server_state(&env).await?;

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().layer(tracing_layer).with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
