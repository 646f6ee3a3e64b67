//! Esoccer Signal Bot
//!
//! Live e-soccer tips with automatic settlement.

use clap::{Parser, Subcommand};
use esoccer_signals::{config::Config, engine::SignalEngine};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "esoccer-signals")]
#[command(about = "Live e-soccer signal bot with settlement tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both cadences until Ctrl-C
    Run {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single poll cycle
    Poll {
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single settlement cycle
    Settle {
        #[arg(long)]
        dry_run: bool,
    },
    /// Print today's performance and send the summary if it changed
    Summary,
    /// Test Telegram notification
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { dry_run } => run_bot(config, dry_run).await,
        Commands::Poll { dry_run } => poll_once(config, dry_run).await,
        Commands::Settle { dry_run } => settle_once(config, dry_run).await,
        Commands::Summary => send_summary(config).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

async fn run_bot(config: Config, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("Starting esoccer signal bot");
    if dry_run {
        tracing::warn!("Running in DRY RUN mode - messages are logged, not sent");
    } else if config.telegram.is_none() {
        tracing::warn!("Telegram not configured, falling back to dry run");
    }

    let engine = Arc::new(SignalEngine::from_config(&config, dry_run).await?);
    engine.run().await?;
    Ok(())
}

async fn poll_once(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let engine = SignalEngine::from_config(&config, dry_run).await?;
    // Gates need league stats, so build them first
    let leagues = engine.warm_league_table().await;
    tracing::info!("{} leagues with rolling stats", leagues);
    let report = engine.poll_cycle().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn settle_once(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let engine = SignalEngine::from_config(&config, dry_run).await?;
    let report = engine.settlement_cycle().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn send_summary(config: Config) -> anyhow::Result<()> {
    let engine = SignalEngine::from_config(&config, false).await?;
    let (summary, sent) = engine.publish_summary().await?;

    println!("\n📊 Today's performance");
    println!("  Green:   {}", summary.green);
    println!("  Red:     {}", summary.red);
    println!("  Refund:  {}", summary.refund);
    println!("  Pending: {}", summary.pending);
    match summary.green_rate {
        Some(rate) => println!("  Rate:    {}%", rate),
        None => println!("  Rate:    n/a"),
    }
    if sent {
        println!("✅ Summary sent");
    }
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    if config.telegram.is_none() {
        anyhow::bail!("Telegram not configured in config.toml");
    }
    let engine = SignalEngine::from_config(&config, false).await?;
    engine
        .notifier()
        .deliver("🧪 <b>Test Notification</b>\n\nIf you see this, Telegram integration is working!")
        .await?;

    println!("✅ Test notification sent!");
    Ok(())
}
