//! supplychat-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables (and `.env`).
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Either provision a user (`add-user`) or serve:
//!    build the agent gateway, the router, and start the HTTP server with
//!    graceful shutdown.

mod auth;
mod config;
mod entities;
mod error;
mod middleware;
mod routes;
mod schemas;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use supplychat_agent::{
    AgentBackend, AgentGateway, ConversationMemory, GatewayOptions, GenaiBackend, GenaiSettings,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::entities::{NewUser, SqliteStore, UserStore};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "supplychat-server")]
#[command(about = "Chat backend for the supply-chain assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Provision a user account
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: SUPPLYCHAT_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "supplychat-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = SqliteStore::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to open database {}", cfg.database_url))?;
    info!(database_url = %cfg.database_url, "database ready");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg, store).await,
        Command::AddUser {
            username,
            password,
            role,
            location,
            description,
        } => {
            let hashed_password = hash_password(&password)
                .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
            let user = store
                .insert_user(NewUser {
                    username,
                    hashed_password,
                    role,
                    location,
                    description,
                })
                .await
                .context("failed to insert user (does it already exist?)")?;
            info!(username = %user.username, id = user.id, "user created");
            Ok(())
        }
    }
}

async fn serve(cfg: Config, store: SqliteStore) -> anyhow::Result<()> {
    // ── 4. Agent gateway ───────────────────────────────────────────────────────
    let settings = GenaiSettings {
        model: cfg.agent_model.clone(),
        api_key: cfg.agent_api_key.clone(),
        temperature: cfg.agent_temperature,
    };
    let memory = ConversationMemory::open(&cfg.agent_memory_db, cfg.agent_history_turns)
        .await
        .with_context(|| format!("failed to open agent memory {}", cfg.agent_memory_db))?;
    let agent = AgentGateway::new(
        GatewayOptions {
            prompt_path: cfg.system_prompt_path.clone().into(),
            timeout: Duration::from_secs(cfg.agent_timeout_secs),
            memory,
        },
        move || Ok(Arc::new(GenaiBackend::new(&settings)) as Arc<dyn AgentBackend>),
    );
    if cfg.agent_eager_init {
        // A failure here is retried on the first message.
        if let Err(e) = agent.initialize().await {
            warn!(error = %e, "agent initialisation failed; will retry lazily");
        }
    }
    info!(model = %cfg.agent_model, "agent gateway ready");

    // ── 5. Token issuer ────────────────────────────────────────────────────────
    let secret = match &cfg.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("SUPPLYCHAT_JWT_SECRET is not set; tokens will not survive a restart");
            format!("{}{}", Uuid::new_v4(), Uuid::new_v4())
        }
    };
    let tokens = TokenIssuer::new(secret.as_bytes(), cfg.token_ttl_secs);

    // ── 6. Shared application state ────────────────────────────────────────────
    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store: Arc::new(store),
        agent: Arc::new(agent),
        tokens: Arc::new(tokens),
    });

    // ── 7. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("supplychat-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
