//! Command-line host for the zonesync reconciliation engine.
//!
//! Wires the JSON file stores into a [`ServiceContext`] and dispatches one
//! subcommand per invocation. `daemon` keeps the scheduler loop alive until
//! ctrl-c.

mod commands;
mod stores;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use commands::App;
use stores::FileStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zonesync_core::services::ConflictResolutionChoice;
use zonesync_core::traits::{AccountRepository, InMemoryProviderRegistry};
use zonesync_core::{CoreResult, ServiceContext};
use zonesync_provider::{
    ApiEnvironment, ProviderCredentials, RequestBudget, DEFAULT_REQUESTS_PER_MINUTE,
};

#[derive(Parser)]
#[command(name = "zonesync", version, about = "DNS reconciliation between a local control plane and a remote provider")]
struct Cli {
    /// Directory holding the JSON state files
    #[arg(long, global = true, default_value = "./zonesync-data")]
    data_dir: PathBuf,

    /// Raise the log filter to debug
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile desired records with the remote provider
    Sync {
        /// Account id or name; every account when omitted
        #[arg(long)]
        account: Option<String>,
        /// Limit the run to one domain
        #[arg(long)]
        domain: Option<String>,
        /// Bypass the freshness check
        #[arg(long)]
        force: bool,
        /// Compute and print the plan without applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// List remote domains and classify how they are hosted
    Discover {
        #[arg(long)]
        account: Option<String>,
    },
    /// Show accounts, domains and recent run state
    Status {
        #[arg(long)]
        account: Option<String>,
    },
    /// Show recent record changes for one domain
    History {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        domain: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Inspect and resolve queued conflicts
    Conflicts {
        #[command(subcommand)]
        command: ConflictsCommand,
    },
    /// Manage provider accounts and credentials
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommand,
    },
    /// Run the scheduler loop until ctrl-c
    Daemon,
}

#[derive(Subcommand)]
enum ConflictsCommand {
    /// List pending conflicts
    List {
        #[arg(long)]
        account: Option<String>,
    },
    /// Resolve one pending conflict
    Resolve {
        /// Conflict id from `conflicts list`
        id: String,
        /// Which side wins
        #[arg(long = "use", value_enum)]
        choice: ResolutionArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolutionArg {
    /// Keep the local values and push them to the remote
    Local,
    /// Keep the remote values and import them locally
    Remote,
    /// Dismiss without applying either side
    Ignore,
}

impl From<ResolutionArg> for ConflictResolutionChoice {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Local => Self::Local,
            ResolutionArg::Remote => Self::Remote,
            ResolutionArg::Ignore => Self::Ignore,
        }
    }
}

#[derive(Subcommand)]
enum CredentialsCommand {
    /// Save credentials, creating the account when it does not exist
    Save {
        /// Account display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
        #[arg(long, value_enum, default_value_t = EnvArg::Production)]
        env: EnvArg,
    },
    /// Check credentials against the live API without saving anything
    Validate {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
        #[arg(long, value_enum, default_value_t = EnvArg::Production)]
        env: EnvArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EnvArg {
    Production,
    Ote,
}

impl From<EnvArg> for ApiEnvironment {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::Production => Self::Production,
            EnvArg::Ote => Self::Ote,
        }
    }
}

fn godaddy_credentials(key: String, secret: String, env: EnvArg) -> ProviderCredentials {
    ProviderCredentials::Godaddy {
        api_key: key,
        api_secret: secret,
        environment: env.into(),
    }
}

/// The shared request budget follows the tightest configured account so one
/// chatty account cannot starve the rest of the provider's quota.
async fn budget_rate(store: &FileStore) -> u32 {
    match store.find_all().await {
        Ok(accounts) => accounts
            .iter()
            .map(|a| a.config.requests_per_minute)
            .min()
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE),
        Err(e) => {
            log::warn!("Failed to load accounts for budget sizing: {e}");
            DEFAULT_REQUESTS_PER_MINUTE
        }
    }
}

async fn run(cli: Cli) -> CoreResult<bool> {
    let store = Arc::new(FileStore::new(cli.data_dir));
    let budget = Arc::new(RequestBudget::new(budget_rate(&store).await));

    let ctx = Arc::new(ServiceContext {
        credential_store: store.clone(),
        accounts: store.clone(),
        registry: Arc::new(InMemoryProviderRegistry::new()),
        catalog: store.clone(),
        sync_log: store.clone(),
        history: store.clone(),
        conflicts: store.clone(),
        baselines: store.clone(),
        desired: store,
        budget,
    });

    let app = App::new(ctx);
    app.restore().await?;

    match cli.command {
        Command::Sync {
            account,
            domain,
            force,
            dry_run,
        } => {
            app.sync(account.as_deref(), domain.as_deref(), force, dry_run)
                .await
        }
        Command::Discover { account } => {
            app.discover(account.as_deref()).await?;
            Ok(true)
        }
        Command::Status { account } => {
            app.status(account.as_deref()).await?;
            Ok(true)
        }
        Command::History {
            account,
            domain,
            limit,
        } => {
            app.history(account.as_deref(), &domain, limit).await?;
            Ok(true)
        }
        Command::Conflicts { command } => {
            match command {
                ConflictsCommand::List { account } => {
                    app.conflicts_list(account.as_deref()).await?;
                }
                ConflictsCommand::Resolve { id, choice } => {
                    app.conflicts_resolve(&id, choice.into()).await?;
                }
            }
            Ok(true)
        }
        Command::Credentials { command } => match command {
            CredentialsCommand::Save {
                name,
                key,
                secret,
                env,
            } => {
                app.credentials_save(&name, godaddy_credentials(key, secret, env))
                    .await?;
                Ok(true)
            }
            CredentialsCommand::Validate { key, secret, env } => {
                app.credentials_validate(godaddy_credentials(key, secret, env))
                    .await
            }
        },
        Command::Daemon => {
            app.daemon().await?;
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
