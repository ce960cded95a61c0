use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "bridgewatch",
    about = "Cross-chain bridge health monitoring and incident alerting",
    version,
    long_about = None
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, default_value = "bridgewatch.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (API server + scheduler + monitor)
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one check pass immediately and print the results
    Check {
        /// Check a single bridge by name instead of all active bridges
        #[arg(long)]
        bridge: Option<String>,
    },

    /// List monitored bridges with their latest status
    Bridges,

    /// List incidents
    Incidents {
        /// Show only active incidents
        #[arg(long)]
        active: bool,

        /// Maximum number of incidents to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Seed the default bridge set (Stargate, Hop, Arbitrum, Optimism, Polygon)
    Seed,

    /// Subscribe a recipient to a bridge's alerts
    Subscribe {
        /// Push recipient id
        #[arg(long)]
        recipient: i64,

        /// Bridge name
        #[arg(long)]
        bridge: String,

        /// Also alert on SLOW readings
        #[arg(long)]
        slow: bool,
    },
}

fn one_shot_monitor(
    config: &bridgewatch::config::Config,
    pool: bridgewatch::storage::Pool,
) -> bridgewatch::monitor::BridgeMonitor {
    let notifier = Arc::new(bridgewatch::notify::Notifier::new(
        pool.clone(),
        Arc::new(bridgewatch::notify::LogSender),
        config.alert_cooldown(),
    ));
    bridgewatch::monitor::BridgeMonitor::new(
        pool,
        Arc::new(bridgewatch::probes::BridgeProber::default()),
        Some(notifier),
        bridgewatch::broadcast::StatusBroadcast::default(),
        config.monitor_config(),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = bridgewatch::config::Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            tracing::info!(bind = %config.bind, "Starting bridgewatch daemon");
            bridgewatch::serve(config).await?;
        }
        Commands::Check { bridge } => {
            let pool = bridgewatch::storage::open_pool(&config.db_path)?;
            let monitor = one_shot_monitor(&config, pool.clone());

            match bridge {
                Some(name) => {
                    let bridge = bridgewatch::storage::get_bridge_by_name(&pool, &name)?
                        .ok_or_else(|| anyhow::anyhow!("Bridge '{}' not found", name))?;
                    let record = monitor.check_bridge(&bridge).await?;
                    println!(
                        "{}: {} ({})",
                        bridge.name,
                        record.status,
                        record
                            .response_time_ms
                            .map(|ms| format!("{}ms", ms))
                            .unwrap_or_else(|| "timeout".to_string()),
                    );
                }
                None => {
                    let summary = monitor.check_all().await?;
                    println!(
                        "Check completed: {}/{} successful",
                        summary.ok, summary.total
                    );

                    println!("\n{:<20} | {:<8} | {:<10} | Checked at", "Bridge", "Status", "Response");
                    println!("{:-<20}-|-{:-<8}-|-{:-<10}-|-{:-<25}", "", "", "", "");
                    for bridge in bridgewatch::storage::list_bridges(&pool, true)? {
                        if let Some(s) = bridgewatch::storage::latest_status(&pool, bridge.id)? {
                            let response = s
                                .response_time_ms
                                .map(|ms| format!("{}ms", ms))
                                .unwrap_or_else(|| "timeout".to_string());
                            println!(
                                "{:<20} | {:<8} | {:<10} | {}",
                                bridge.name,
                                s.status.as_str(),
                                response,
                                s.checked_at.to_rfc3339()
                            );
                        }
                    }
                }
            }
        }
        Commands::Bridges => {
            let pool = bridgewatch::storage::open_pool(&config.db_path)?;
            let bridges = bridgewatch::storage::list_bridges(&pool, false)?;
            if bridges.is_empty() {
                println!("No bridges configured. Run 'bridgewatch seed' to add the defaults.");
            } else {
                println!("{:<4} | {:<20} | {:<8} | {:<8} | Endpoint", "Id", "Name", "Active", "Status");
                println!("{:-<4}-|-{:-<20}-|-{:-<8}-|-{:-<8}-|-{:-<40}", "", "", "", "", "");
                for bridge in bridges {
                    let status = bridgewatch::storage::latest_status(&pool, bridge.id)?
                        .map(|s| s.status.as_str())
                        .unwrap_or("UNKNOWN");
                    println!(
                        "{:<4} | {:<20} | {:<8} | {:<8} | {}",
                        bridge.id, bridge.name, bridge.is_active, status, bridge.api_endpoint
                    );
                }
            }
        }
        Commands::Incidents { active, limit } => {
            let pool = bridgewatch::storage::open_pool(&config.db_path)?;
            let manager = bridgewatch::storage::incidents::IncidentManager::new(pool);
            let incidents = manager.list(None, active, limit)?;
            if incidents.is_empty() {
                println!("No incidents found.");
            } else {
                println!("{:<36} | {:<10} | {:<8} | {:<25} | Title", "Id", "Severity", "State", "Started at");
                println!("{:-<36}-|-{:-<10}-|-{:-<8}-|-{:-<25}-|-{:-<30}", "", "", "", "", "");
                for i in incidents {
                    println!(
                        "{:<36} | {:<10} | {:<8} | {:<25} | {}",
                        i.id,
                        i.severity.as_str(),
                        i.state,
                        i.started_at.to_rfc3339(),
                        i.title
                    );
                }
            }
        }
        Commands::Seed => {
            let pool = bridgewatch::storage::open_pool(&config.db_path)?;
            let count = bridgewatch::storage::seed_bridges(&pool)?;
            println!("Seeded {} bridges.", count);
        }
        Commands::Subscribe {
            recipient,
            bridge,
            slow,
        } => {
            let pool = bridgewatch::storage::open_pool(&config.db_path)?;
            let b = bridgewatch::storage::get_bridge_by_name(&pool, &bridge)?
                .ok_or_else(|| anyhow::anyhow!("Bridge '{}' not found", bridge))?;
            bridgewatch::storage::users::subscribe(&pool, recipient, b.id, true, true, slow)?;
            println!("Subscribed {} to {} alerts.", recipient, b.name);
        }
    }

    Ok(())
}
