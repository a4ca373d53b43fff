//! WordMon Engine - Main entry point.
//!
//! Runs the concurrent arena with the simulated challengers for
//! `WORDMON_DEMO_SECONDS` (default 30) or until Ctrl+C / SIGTERM, then
//! prints the leaderboard.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordmon_engine::infrastructure::config::GameConfig;
use wordmon_engine::use_cases::arena::{BattleOutcome, ChallengerProfile};
use wordmon_engine::App;

const DEFAULT_DEMO_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (`cargo run` may start in `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordmon_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WordMon Engine");

    // Load configuration
    let config = GameConfig::from_env()?;
    let catalog = config.load_catalog()?;
    let demo_seconds = std::env::var("WORDMON_DEMO_SECONDS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_DEMO_SECONDS);

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let app = App::new(config, catalog, ChallengerProfile::defaults()).await?;
    let game = app.game.clone();
    let mut outcomes = app.outcomes().subscribe();

    tracing::info!(seconds = demo_seconds, "Arena running");
    let deadline = tokio::time::sleep(Duration::from_secs(demo_seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => {
                tracing::info!("Demo time elapsed");
                break;
            }
            _ = cancel_token.cancelled() => break,
            outcome = outcomes.recv() => match outcome {
                Ok(BattleOutcome::Captured { challenger, word, receipt, .. }) => {
                    tracing::info!(
                        challenger = %challenger,
                        word = %word.text,
                        xp = receipt.new_xp,
                        level = receipt.new_level,
                        "Capture"
                    );
                }
                Ok(BattleOutcome::Fled { word, reason, .. }) => {
                    tracing::info!(word = %word.text, ?reason, "Flee");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Outcome reporter lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    app.shutdown().await;

    let status = game.status().await?;
    tracing::info!(
        game = %status.name,
        version = %status.version,
        uptime_seconds = status.uptime_seconds,
        players = status.players,
        "Final status"
    );
    for (rank, player) in game.leaderboard(None).await?.iter().enumerate() {
        tracing::info!(
            rank = rank + 1,
            player = %player.name(),
            xp = player.xp(),
            level = player.level(),
            captures = player.total_captures(),
            distinct = player.inventory_size(),
            "Leaderboard"
        );
    }

    tracing::info!("WordMon Engine shutdown complete");
    Ok(())
}

/// Cancels `cancel_token` on Ctrl+C or SIGTERM.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    // Then the working directory.
    let _ = dotenvy::dotenv();
}
