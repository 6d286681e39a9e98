//! AI Writing Assistant
//!
//! A small chat backend: prompts are forwarded to a text generation API and every
//! exchange is kept as a JSON file per conversation. The same binary also ships a
//! terminal client for the backend.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod conversation;
mod core;
mod providers;
mod routes;

use client::{ChatApi, ChatSession};
use config::Config;
use crate::core::{ChatEngine, ChatStore};
use providers::Provider;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chat_engine: Arc<ChatEngine>,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP backend (default)
    Serve,
    /// Chat with a running backend from the terminal
    Chat {
        /// Backend base URL
        #[arg(long, env = "ASSISTANT_SERVER_URL", default_value = "http://localhost:4000")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_assistant=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(Config::from_env()?).await,
        Command::Chat { server } => {
            tracing::info!("Connecting to {}", server);
            client::repl::run(ChatSession::new(ChatApi::new(server))).await
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let provider = Provider::from_name(&config.provider, &config)?;
    tracing::info!("Generating with {}", provider.name());

    let store = ChatStore::new(&config.storage_dir);
    tracing::info!("Storing chats in {}", store.dir().display());

    let chat_engine = Arc::new(ChatEngine::new(Arc::new(provider), store));

    let state = AppState {
        config,
        chat_engine,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Backend server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
