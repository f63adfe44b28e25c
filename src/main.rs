use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use player_stats::api::{build_router, cors_layer, state::AppState};
use player_stats::cache::MemoryCache;
use player_stats::config::AppConfig;
use player_stats::models::PlayerId;
use player_stats::stats::StatsUpdateCoordinator;
use player_stats::storage::{MemoryDataSource, StorageConfig};

#[derive(Parser)]
#[command(name = "player-stats")]
#[command(about = "Derived player statistics with cached list and page projections")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Recompute and store player stats
    Recompute {
        /// Only this player
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        player: Option<String>,

        /// Every player
        #[arg(long)]
        all: bool,
    },

    /// Print the player list as JSON
    Players {
        /// Include inactive players
        #[arg(long)]
        all: bool,
    },

    /// Print a player page as JSON
    Page {
        /// Player id, alias or platform id
        handle: String,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = PathBuf::from(&cli.config);
    let mut config = if path.exists() {
        AppConfig::from_file(&path).with_context(|| format!("loading {}", cli.config))?
    } else {
        AppConfig::default()
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    Ok(config)
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting player-stats v{}", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(
        MemoryDataSource::open(StorageConfig::new(config.data_dir.clone()))
            .with_context(|| format!("opening data directory {:?}", config.data_dir))?,
    );
    let cache = Arc::new(MemoryCache::new());
    let coordinator = Arc::new(StatsUpdateCoordinator::new(
        source,
        cache,
        config.stats_settings()?,
    ));

    match cli.command {
        Commands::Serve { host, port } => {
            let lists = coordinator.refresh_player_lists().await?;
            tracing::info!(
                "Warmed player lists: {} players, {} active",
                lists.all.len(),
                lists.active.len()
            );

            let app = build_router(AppState::new(coordinator))
                .layer(cors_layer(&config.server.cors_origin));
            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Recompute { player, all } => {
            if let Some(id) = player {
                let stats = coordinator.update_player_stats(&PlayerId::from(id)).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if all {
                let updated = coordinator.update_all_player_stats().await?;
                println!("Updated stats for {} players", updated);
            }
        }
        Commands::Players { all } => {
            let players = coordinator.get_player_list(all).await?;
            println!("{}", serde_json::to_string_pretty(&players)?);
        }
        Commands::Page { handle } => {
            let page = coordinator.get_player_page(&handle).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_requires_a_target() {
        assert!(Cli::try_parse_from(["player-stats", "recompute"]).is_err());
        let both = ["player-stats", "recompute", "--player", "p1", "--all"];
        assert!(Cli::try_parse_from(both).is_err());

        let cli = Cli::try_parse_from(["player-stats", "recompute", "--all"]).unwrap();
        assert!(matches!(cli.command, Commands::Recompute { player: None, all: true }));

        let cli = Cli::try_parse_from(["player-stats", "recompute", "--player", "p1"]).unwrap();
        assert!(matches!(cli.command, Commands::Recompute { player: Some(_), all: false }));
    }
}
