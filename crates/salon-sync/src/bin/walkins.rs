//! # walkins
//!
//! Reception tool: prints the salon's in-progress walk-in visits.
//!
//! ```text
//! walkins [--config <path>] [--watch]
//!
//!   --config <path>   client.toml to load (default: platform config dir)
//!   --watch           keep polling until Ctrl+C
//! ```
//!
//! Log level follows `RUST_LOG` (default `info,salon=debug`).

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salon_sync::{ActiveWalkInsMonitor, ClientConfig, HttpSalonApi, WalkInsSnapshot};

struct Args {
    config: Option<PathBuf>,
    watch: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        watch: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--watch" => args.watch = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,salon=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_snapshot(snapshot: &WalkInsSnapshot) {
    if snapshot.sessions.is_empty() {
        println!("No active walk-ins");
        return;
    }

    for session in &snapshot.sessions {
        let customer = session.customer();
        println!(
            "{}  {:<24} {:>3} service(s)  {}",
            session.session_id,
            customer.name,
            session.services.len(),
            session.running_total()
        );
    }
    println!(
        "{} visit(s), {} open service(s), {} in progress",
        snapshot.sessions.len(),
        snapshot.open_services(),
        snapshot.running_total()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = parse_args()?;
    let config = ClientConfig::load(args.config)?;
    info!(
        terminal = %config.terminal.name,
        api = %config.api.base_url,
        "Configuration loaded"
    );

    let api = Arc::new(HttpSalonApi::from_config(&config)?);
    let monitor = ActiveWalkInsMonitor::from_config(api, &config);

    monitor.load().await?;
    print_snapshot(&monitor.snapshot().await);

    if !args.watch {
        return Ok(());
    }

    let handle = monitor.spawn();
    let mut ticker = tokio::time::interval(monitor.interval());
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = handle.snapshot().await;
                if let Some(err) = &snapshot.last_error {
                    warn!(error = %err, "Showing last known walk-ins");
                }
                print_snapshot(&snapshot);
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}
