use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dogloot_server::config::load_game;
use dogloot_server::game::SpawnPolicy;
use dogloot_server::{http, serialization};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// The dog-collects-loot game server.
#[derive(Debug, Parser)]
#[command(name = "dogloot-server")]
struct Cli {
    /// Path to the JSON game configuration.
    #[arg(long)]
    config_file: PathBuf,

    /// Directory of static frontend assets to serve alongside the API.
    #[arg(long)]
    www_root: Option<PathBuf>,

    /// Milliseconds between automatic ticks. When set, the manual
    /// `/api/v1/game/tick` route is disabled.
    #[arg(long)]
    tick_period: Option<u64>,

    /// Spawn new players at a random point on the road network instead of
    /// the start of road 0.
    #[arg(long, default_value_t = false)]
    randomize_spawn_points: bool,

    /// Path to a snapshot file: restored at startup if present, written
    /// periodically and on shutdown.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Milliseconds between automatic snapshot saves. Requires `--state-file`.
    #[arg(long)]
    save_state_period: Option<u64>,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let cli = Cli::parse();

    let mut game = match load_game(&cli.config_file) {
        Ok(game) => game,
        Err(err) => {
            log::error!("failed to load config {}: {err}", cli.config_file.display());
            std::process::exit(1);
        }
    };

    game.spawn_policy = if cli.randomize_spawn_points { SpawnPolicy::Random } else { SpawnPolicy::Start };
    game.auto_tick_enabled = cli.tick_period.is_some();

    if let Some(state_path) = &cli.state_file {
        serialization::restore(&mut game, state_path);
        log::info!("restored state from {}", state_path.display());
    }

    let game = Arc::new(Mutex::new(game));

    if let Some(period_ms) = cli.tick_period {
        let game = Arc::clone(&game);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(period_ms));
            loop {
                interval.tick().await;
                game.lock().await.tick(period_ms as f64);
            }
        });
    }

    if let (Some(state_path), Some(period_ms)) = (cli.state_file.clone(), cli.save_state_period) {
        let game = Arc::clone(&game);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(period_ms));
            loop {
                interval.tick().await;
                let guard = game.lock().await;
                serialization::save(&guard, &state_path);
                log::info!("autosaved state to {}", state_path.display());
            }
        });
    }

    let mut app = http::router(Arc::clone(&game));
    if let Some(www_root) = &cli.www_root {
        app = app.fallback_service(ServeDir::new(www_root));
    }
    app = app.layer(TraceLayer::new_for_http());

    log::info!("listening on {}", cli.listen);
    let listener = tokio::net::TcpListener::bind(cli.listen).await.expect("failed to bind listen address");

    let serve = axum::serve(listener, app.into_make_service());
    tokio::select! {
        result = serve => {
            if let Err(err) = result {
                log::error!("server error: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutting down");
        }
    }

    if let Some(state_path) = &cli.state_file {
        let guard = game.lock().await;
        serialization::save(&guard, state_path);
        log::info!("saved state to {}", state_path.display());
    }
}
