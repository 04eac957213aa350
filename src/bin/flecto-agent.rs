//! Reference agent: keeps a match tree in sync with a Flecto manager.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use flecto_manager::config::ObservabilityConfig;
use flecto_manager::lifecycle::{spawn_signal_handler, Shutdown};
use flecto_manager::model::{AgentType, JsonDuration};
use flecto_manager::observability::logging;
use flecto_manager::sync::{ManagerClient, Snapshot, Syncer};

#[derive(Parser)]
#[command(name = "flecto-agent")]
#[command(about = "Sidecar that serves published redirects and pages", long_about = None)]
struct Cli {
    /// Manager base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    manager: String,

    /// API token with read access on the project.
    #[arg(short, long)]
    token: String,

    #[arg(long)]
    namespace: String,

    #[arg(long)]
    project: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync continuously and heartbeat until interrupted
    Run {
        /// Name reported to the manager.
        #[arg(long, default_value = "flecto-agent")]
        name: String,

        #[arg(long, value_enum, default_value_t = Kind::Default)]
        kind: Kind,

        /// Poll interval, e.g. `10s` or `1m`.
        #[arg(long, default_value = "10s")]
        interval: JsonDuration,
    },
    /// Fetch the published state once and resolve a request
    Match { host: String, uri: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Default,
    Traefik,
    Caddy,
    Nginx,
}

impl From<Kind> for AgentType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Default => AgentType::Default,
            Kind::Traefik => AgentType::Traefik,
            Kind::Caddy => AgentType::Caddy,
            Kind::Nginx => AgentType::Nginx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&ObservabilityConfig::default())?;
    let client = ManagerClient::new(&cli.manager, &cli.token, &cli.namespace, &cli.project)?;

    match cli.command {
        Commands::Run {
            name,
            kind,
            interval,
        } => {
            let interval: Duration = interval.into();
            let syncer = Syncer::new(client, &name, kind.into(), interval);
            let shutdown = Shutdown::new();
            spawn_signal_handler(shutdown.clone());
            syncer.run(shutdown.subscribe()).await;
        }
        Commands::Match { host, uri } => {
            let version = client.version().await?;
            let snapshot =
                Snapshot::compile(version, client.redirects().await?, client.pages().await?)?;
            if let Some(found) = snapshot.redirects.find(&host, &uri) {
                println!("{} {}", found.status_code(), found.target);
            } else if let Some(page) = snapshot.pages.find(&host, &uri) {
                println!("200 {}", page.content_type.mime());
                println!("{}", String::from_utf8_lossy(&page.content));
            } else {
                println!("404");
            }
        }
    }
    Ok(())
}
