use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod cli;
mod config;
mod context;
mod errors;
mod jobs;
mod mcp;
mod models;
mod platform;
mod query;

use auth::{TokenCache, TokenIssuer};
use context::DatabaseContext;
use errors::AppError;
use mcp::types::JsonRpcRequest;
use mcp::McpServer;
use models::token::Permission;
use platform::PlatformClient;
use query::QueryClient;

/// Shared application state passed to handlers.
pub struct AppState {
    pub mcp: McpServer,
    pub platform: PlatformClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dblink=debug,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Db { command }) => handle_db_command(cfg, command).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    let platform = PlatformClient::new(&cfg.platform_url, &cfg.organization, &cfg.org_token);
    let issuer = TokenIssuer::new(
        &cfg.platform_url,
        &cfg.organization,
        &cfg.org_token,
        &cfg.token_expiration,
    );
    let tokens = TokenCache::new(issuer);
    let context = DatabaseContext::new(cfg.default_database.clone());
    let query = QueryClient::new(&cfg.database_url_template, &cfg.organization);

    let mcp = McpServer::new(platform.clone(), tokens.clone(), context, query);

    let eviction = jobs::eviction::EvictionJob::start(
        tokens,
        Duration::from_secs(cfg.eviction_interval_secs),
    );
    tracing::info!(
        interval_secs = cfg.eviction_interval_secs,
        "token eviction job started"
    );

    let state = Arc::new(AppState { mcp, platform });

    let app = axum::Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .route("/mcp", post(mcp_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("DBLink gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The eviction ticker is owned by the server lifecycle; stop it
    // before exiting so shutdown is clean.
    eviction.stop().await;
    Ok(())
}

/// Readiness: the gateway is ready when the platform API accepts the
/// organization credential.
async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    state.platform.list_databases().await?;
    Ok("ok")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received");
}

/// POST /mcp — one JSON-RPC message per request (Streamable HTTP).
/// Notifications are acknowledged with an empty 202.
async fn mcp_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JsonRpcRequest>,
) -> axum::response::Response {
    match state.mcp.handle(req).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Middleware: injects a unique X-Request-Id into every response so
/// clients can correlate errors with gateway logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn handle_db_command(cfg: config::Config, cmd: cli::DbCommands) -> anyhow::Result<()> {
    let platform = PlatformClient::new(&cfg.platform_url, &cfg.organization, &cfg.org_token);

    match cmd {
        cli::DbCommands::List => {
            let databases = platform.list_databases().await?;
            if databases.is_empty() {
                println!("No databases found.");
            } else {
                println!("{:<32} {:<40}", "NAME", "HOSTNAME");
                for db in databases {
                    println!(
                        "{:<32} {:<40}",
                        db.name,
                        db.hostname.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        cli::DbCommands::Create { name } => {
            let db = platform.create_database(&name).await?;
            println!("Database created:\n  Name: {}", db.name);
            if let Some(hostname) = db.hostname {
                println!("  Host: {}", hostname);
            }
        }
        cli::DbCommands::Token {
            database,
            permission,
        } => {
            let permission =
                Permission::from_str(&permission).map_err(|e| anyhow::anyhow!(e))?;
            let issuer = TokenIssuer::new(
                &cfg.platform_url,
                &cfg.organization,
                &cfg.org_token,
                &cfg.token_expiration,
            );
            let token = issuer.issue(&database, permission).await?;
            println!(
                "Token minted:\n  Database:   {}\n  Permission: {}\n  Expires:    {}\n  Token:      {}",
                token.database, token.permission, token.expires_at, token.token
            );
        }
    }
    Ok(())
}
