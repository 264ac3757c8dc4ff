// Chat fleet command line
//
// `run` drives real browsers through WebDriver, `simulate` runs the same
// fleet against an in-memory chat service, and `probe` checks a single
// agent end to end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use chat_fleet::agent::interruptible_sleep;
use chat_fleet::config::{DelayRange, PacingSettings};
use chat_fleet::logging::init_logging;
use chat_fleet::{
    AgentIdentity, DriverFactory, FleetConfig, FleetSupervisor, Gender, ScriptedFactory,
    WebDriverFactory,
};

/// Visitors who write to simulated agents
const VISITORS: &[&str] = &["alex", "sam", "jordan", "riley", "casey", "morgan"];

/// Openers used by simulated visitors
const OPENERS: &[&str] = &[
    "hi",
    "hello there",
    "how are you?",
    "what's up",
    "where are you from?",
    "nice to meet you",
    "what do you do?",
];

#[derive(Parser)]
#[command(name = "chat-fleet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a supervised fleet of chat agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); built-in defaults when absent
    #[arg(short, long, global = true, env = "CHAT_FLEET_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fleet against the configured chat service
    Run {
        /// Run browsers without a window
        #[arg(long)]
        headless: bool,

        /// Stop after this many seconds instead of the configured duration
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Run the fleet against a simulated chat service
    Simulate {
        /// Male agents (overrides the configuration)
        #[arg(long)]
        male: Option<usize>,

        /// Female agents (overrides the configuration)
        #[arg(long)]
        female: Option<usize>,

        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,

        /// Seconds between simulated inbound messages
        #[arg(long, default_value_t = 2.0)]
        message_interval: f64,

        /// Shorten every pause
        #[arg(long)]
        fast: bool,
    },

    /// Log in one agent, monitor for a while, then print its status
    Probe {
        /// Display name
        #[arg(long)]
        name: String,

        /// Gender tag (male or female)
        #[arg(long, default_value = "male")]
        gender: Gender,

        /// Age typed into the login form
        #[arg(long, default_value_t = 25)]
        age: u8,

        /// Seconds to monitor
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FleetConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => FleetConfig::default(),
    };

    if matches!(cli.command, Commands::Config) {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(config.debug, config.log_file.as_deref())?;

    match cli.command {
        Commands::Run { headless, duration } => {
            config.headless |= headless;
            if let Some(secs) = duration {
                config.run_duration_secs = Some(secs);
            }
            let factory = WebDriverFactory::from_config(&config)?;
            let fleet = Arc::new(FleetSupervisor::new(config, factory)?);
            let duration = fleet.config().run_duration();
            drive(&fleet, duration).await?;
        }

        Commands::Simulate {
            male,
            female,
            duration,
            message_interval,
            fast,
        } => {
            if let Some(male) = male {
                config.agents.male = male;
            }
            if let Some(female) = female {
                config.agents.female = female;
            }
            if fast {
                config.pacing = PacingSettings {
                    idle_poll: DelayRange::new(0.05, 0.1),
                    empty_panel_secs: 0.1,
                    ..PacingSettings::immediate()
                };
                config.conversation.typing_delay = DelayRange::zero();
                config.conversation.post_send_delay = DelayRange::zero();
            }

            let factory = ScriptedFactory::new(config.selectors.clone());
            let seed = config.seed;
            let fleet = Arc::new(FleetSupervisor::new(config, factory)?);

            let traffic = tokio::spawn(simulate_traffic(
                Arc::clone(&fleet),
                chat_fleet::config::secs(message_interval).max(Duration::from_millis(10)),
                seed,
            ));
            drive(&fleet, Some(Duration::from_secs(duration))).await?;
            traffic.abort();

            let ledger = fleet.factory().ledger();
            log::info!(
                "Sessions opened {}, closed {}, leaked {}",
                ledger.opened(),
                ledger.closed(),
                ledger.live()
            );
        }

        Commands::Probe {
            name,
            gender,
            age,
            seconds,
        } => {
            let identity = AgentIdentity::new(name, gender, age);
            let factory = WebDriverFactory::from_config(&config)?;
            let fleet = Arc::new(FleetSupervisor::with_roster(config, factory, vec![identity])?);
            let status = drive(&fleet, Some(Duration::from_secs(seconds))).await?;
            if status.agents.iter().all(|agent| agent.last_failure.is_some()) {
                anyhow::bail!("Probe agent did not complete its run");
            }
        }

        Commands::Config => {}
    }

    Ok(())
}

/// Start the fleet, report status until the run ends, then stop it
async fn drive<F: DriverFactory>(
    fleet: &Arc<FleetSupervisor<F>>,
    duration: Option<Duration>,
) -> Result<chat_fleet::FleetStatus> {
    let signals = {
        let fleet = Arc::clone(fleet);
        tokio::spawn(async move {
            shutdown_signal().await;
            log::info!("Interrupt received, shutting down");
            fleet.request_shutdown();
        })
    };

    match fleet.start_all().await {
        Ok(running) => log::info!("Fleet {} started with {} running agents", fleet.run_id(), running),
        Err(e) => log::warn!("Fleet did not start: {}", e),
    }

    wait_for_end(fleet, duration).await;
    fleet.stop_all().await;
    signals.abort();

    let status = fleet.status_snapshot();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(status)
}

async fn wait_for_end<F: DriverFactory>(fleet: &FleetSupervisor<F>, duration: Option<Duration>) {
    let shutdown = fleet.shutdown_token();
    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let period = Duration::from_secs(fleet.config().status_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            () = &mut deadline => {
                log::info!("Run duration reached");
                break;
            }
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let status = fleet.status_snapshot();
                log::info!(
                    "Status: {}/{} agents active, {}s elapsed",
                    status.active,
                    status.total,
                    fleet.uptime().as_secs()
                );
            }
        }
    }
}

/// Deliver inbound messages to random simulated agents
async fn simulate_traffic(fleet: Arc<FleetSupervisor<ScriptedFactory>>, every: Duration, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let shutdown = fleet.shutdown_token();
    let mut sequence = 0u64;

    while interruptible_sleep(&shutdown, every).await {
        let mut scripts = fleet.factory().scripts();
        scripts.sort_by(|a, b| a.0.cmp(&b.0));
        let Some((agent, script)) = scripts.choose(&mut rng) else {
            continue;
        };
        let visitor = VISITORS.choose(&mut rng).copied().unwrap_or("visitor");
        let opener = OPENERS.choose(&mut rng).copied().unwrap_or("hi");

        // Numbered so repeated openers are not treated as already seen
        sequence += 1;
        let text = format!("{opener} #{sequence}");
        log::debug!("Simulated {} -> {}: {}", visitor, agent, text);
        script.push_message(visitor, text);
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
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
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
