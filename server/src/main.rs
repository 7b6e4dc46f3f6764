use clap::Parser;
use log::info;
use server::network::{self, AppState, RoomRegistry, ServerConfig};
use server::session::SessionStore;
use shared::{DEFAULT_ANIMATION_DELAY_MS, DEFAULT_SESSION_ID};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main-method of the application.
/// Parses command-line arguments, builds the shared state and serves the
/// HTTP/WebSocket endpoints until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "3000")]
        port: u16,
        /// Reveal-animation pacing delay in milliseconds, forwarded to
        /// clients with every draw
        #[clap(long, env = "SLOT_ANIMATION_DELAY", default_value_t = DEFAULT_ANIMATION_DELAY_MS)]
        animation_delay: u64,
        /// Directory of static assets to serve
        #[clap(long, default_value = "public")]
        static_dir: String,
    }

    let args = Args::parse();
    env_logger::init();

    // Shared session table, seeded with the default session.
    let store = Arc::new(RwLock::new(SessionStore::new()));
    {
        let mut store = store.write().await;
        store.get_or_create(DEFAULT_SESSION_ID);
    }

    let state = AppState {
        store,
        rooms: Arc::new(RwLock::new(RoomRegistry::new())),
        config: ServerConfig {
            animation_delay_ms: args.animation_delay,
            static_dir: args.static_dir.into(),
        },
    };

    let address = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server listening on http://{}", address);

    let app = network::router(state);

    // Handle shutdown gracefully
    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
