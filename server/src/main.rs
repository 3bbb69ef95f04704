use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use env_logger::Builder;
use log::{info, warn};
use tower_http::services::ServeDir;

mod auth;
mod config;
mod game;
mod handlers;
mod room;
mod rooms;
mod state;
mod words;

use crate::auth::TokenRegistry;
use crate::handlers::{chat_ws_handler, draw_ws_handler, scoreboard_handler};
use crate::rooms::Rooms;
use crate::state::AppState;
use crate::words::WordList;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Shared application name; channels live at `/{app_name}/draw` and `/{app_name}/chat`.
    #[arg(long, default_value = "doodleguess")]
    app_name: String,
    #[arg(long)]
    words: Option<PathBuf>,
    /// `token username` per line.
    #[arg(long)]
    tokens: Option<PathBuf>,
    #[arg(long)]
    public_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 10)]
    handshake_timeout_secs: u64,
}

fn crate_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_default_env();

    #[cfg(debug_assertions)]
    builder.filter_level(log::LevelFilter::Debug);
    #[cfg(not(debug_assertions))]
    builder.filter_level(log::LevelFilter::Info);

    builder.init();

    let args = Args::parse();

    let words_path = args.words.unwrap_or_else(|| crate_path("assets/words.txt"));
    let words = WordList::new(config::read_lines(&words_path).await?)?;
    info!("Loaded {} words from {}", words.len(), words_path.display());

    let tokens_path = args.tokens.unwrap_or_else(|| crate_path("assets/tokens.txt"));
    let tokens = TokenRegistry::parse(&config::read_lines(&tokens_path).await?)?;
    info!("Loaded {} tokens from {}", tokens.len(), tokens_path.display());
    if tokens.is_empty() {
        warn!("No tokens loaded; every handshake will be rejected");
    }

    let state = AppState {
        rooms: Rooms::new(Arc::new(words)),
        tokens: Arc::new(tokens),
        handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
    };

    let public_dir = args.public_dir.unwrap_or_else(|| crate_path("../public"));
    let app_name = args.app_name.trim_matches('/');

    let app = Router::new()
        .route(&format!("/{app_name}/draw"), get(draw_ws_handler))
        .route(&format!("/{app_name}/chat"), get(chat_ws_handler))
        .route(&format!("/{app_name}/scoreboard"), get(scoreboard_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Doodleguess running at http://localhost:{}/", args.port);

    axum::serve(listener, app).await?;
    Ok(())
}
