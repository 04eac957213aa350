//! Flecto Manager
//!
//! Stores redirects and static pages per project, stages edits as drafts,
//! publishes them atomically and serves the published state to agents.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    FLECTO MANAGER                     │
//!                    │                                                      │
//!   editor ──────────┼─▶ http::management ──▶ drafts ──┐                    │
//!                    │                                 ▼                    │
//!                    │         http::management ──▶ publish ──▶ store (redb)│
//!                    │                                              ▲       │
//!   agent ───────────┼─▶ http::agent_api ─────────────────────────┘       │
//!     │              │        │                                             │
//!     │              │        └──▶ agents::registry ──▶ agents::sampler ──▶ │──▶ Prometheus
//!     │              │                                                      │
//!     │              │  config · observability · lifecycle                  │
//!     │              └──────────────────────────────────────────────────────┘
//!     ▼
//!   sync::Syncer ──▶ matching::{RedirectTree, PageTree} ──▶ proxy
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use flecto_manager::agents::MetricsSampler;
use flecto_manager::config::{load_config, ManagerConfig};
use flecto_manager::http::{AppState, HttpServer};
use flecto_manager::lifecycle::{spawn_signal_handler, Shutdown};
use flecto_manager::model::{now_millis, ResourcePermission};
use flecto_manager::observability::{logging, metrics};
use flecto_manager::publish::{PageLimits, Publisher};
use flecto_manager::store::Store;

#[derive(Parser)]
#[command(name = "flecto-manager")]
#[command(about = "Redirect and page manager for edge agents", long_about = None)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(short, long, default_value = "flecto.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the agent sampler
    Serve,
    /// Load and validate the configuration, then exit
    CheckConfig,
    /// Manage namespaces
    #[command(subcommand)]
    Namespace(NamespaceCommand),
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage API tokens
    #[command(subcommand)]
    Token(TokenCommand),
    /// Publish the drafts of a project
    Publish { namespace: String, project: String },
}

#[derive(Subcommand)]
enum NamespaceCommand {
    Create {
        code: String,
        #[arg(long)]
        name: Option<String>,
    },
    Delete { code: String },
}

#[derive(Subcommand)]
enum ProjectCommand {
    Create {
        namespace: String,
        code: String,
        #[arg(long)]
        name: Option<String>,
    },
    Delete { namespace: String, code: String },
}

#[derive(Subcommand)]
enum TokenCommand {
    Create(TokenArgs),
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long)]
    name: String,

    /// Grant every permission on every project.
    #[arg(long)]
    admin: bool,

    /// Read access, as `namespace` or `namespace/project`. Repeatable.
    #[arg(long)]
    read: Vec<String>,

    /// Write access, as `namespace` or `namespace/project`. Repeatable.
    #[arg(long)]
    write: Vec<String>,
}

impl TokenArgs {
    fn permissions(&self) -> Vec<ResourcePermission> {
        let grant = |scope: &String, write: bool| {
            let (namespace, project) = match scope.split_once('/') {
                Some((ns, proj)) => (ns.to_string(), Some(proj.to_string())),
                None => (scope.clone(), None),
            };
            ResourcePermission {
                namespace,
                project,
                read: true,
                write,
            }
        };
        self.read
            .iter()
            .map(|scope| grant(scope, false))
            .chain(self.write.iter().map(|scope| grant(scope, true)))
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::CheckConfig => {
            println!("{}: ok", cli.config.display());
        }
        Commands::Namespace(command) => {
            let store = Store::from_config(&config.database)?;
            match command {
                NamespaceCommand::Create { code, name } => {
                    let name = name.unwrap_or_else(|| code.clone());
                    let namespace = store.create_namespace(&code, &name, now_millis())?;
                    println!("{}", serde_json::to_string_pretty(&namespace)?);
                }
                NamespaceCommand::Delete { code } => store.delete_namespace(&code)?,
            }
        }
        Commands::Project(command) => {
            let store = Store::from_config(&config.database)?;
            match command {
                ProjectCommand::Create {
                    namespace,
                    code,
                    name,
                } => {
                    let name = name.unwrap_or_else(|| code.clone());
                    let project = store.create_project(&namespace, &code, &name, now_millis())?;
                    println!("{}", serde_json::to_string_pretty(&project)?);
                }
                ProjectCommand::Delete { namespace, code } => {
                    store.delete_project(&namespace, &code)?
                }
            }
        }
        Commands::Token(TokenCommand::Create(args)) => {
            let store = Store::from_config(&config.database)?;
            let (secret, token) =
                store.create_token(&args.name, args.admin, args.permissions(), now_millis())?;
            eprintln!("token {} created; the secret is shown only once", token.id);
            println!("{secret}");
        }
        Commands::Publish { namespace, project } => {
            let store = Store::from_config(&config.database)?;
            let publisher = Publisher::new(store, PageLimits::from(&config.page));
            let published = publisher.publish(&namespace, &project)?;
            println!("{}", serde_json::to_string_pretty(&published)?);
        }
    }
    Ok(())
}

async fn serve(config: ManagerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("flecto-manager v{} starting", env!("CARGO_PKG_VERSION"));

    let store = Store::from_config(&config.database)?;
    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let sampler = if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.listen_address.parse()?;
        metrics::init_metrics(addr, config.metrics.sample_interval())?;
        let sampler = MetricsSampler::new(
            store.clone(),
            config.agent.offline_threshold_ms(),
            config.metrics.sample_interval(),
        );
        let signal = shutdown.subscribe();
        Some(tokio::spawn(async move { sampler.run(signal).await }))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.http.listen_address).await?;
    let server = HttpServer::new(AppState::new(store, &config), &config.http);
    server.run(listener, shutdown.clone()).await?;

    shutdown.trigger();
    if let Some(sampler) = sampler {
        sampler.await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
