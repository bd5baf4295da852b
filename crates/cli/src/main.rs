//! Cartkit CLI - sync and reconcile a storefront session from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the session's cart and wishlist and print them
//! cartkit sync
//!
//! # Apply product changes from a JSON file to the cart and push them
//! cartkit reconcile --changes changes.json --push
//!
//! # Toggle wishlist entries
//! cartkit reconcile --changes liked.json --target wishlist --toggle --push
//! ```
//!
//! # Commands
//!
//! - `sync` - Bootstrap a session and print the snapshot
//! - `reconcile` - Bootstrap, apply product changes, print the snapshot
//!
//! Configuration is read from the environment; see `cartkit_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use cartkit_storefront::StoreConfig;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cartkit")]
#[command(author, version, about = "Cartkit session tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the server cart and wishlist and print the session snapshot
    Sync,
    /// Apply product changes to the cart or wishlist
    Reconcile {
        /// JSON file holding an array of product states
        #[arg(short, long)]
        changes: PathBuf,

        /// Which list to reconcile
        #[arg(short, long, value_enum, default_value_t = Target::Cart)]
        target: Target,

        /// Treat wishlist changes as explicit user toggles (wishlist only)
        #[arg(long)]
        toggle: bool,

        /// Send the changes to the backend after applying them locally
        #[arg(long)]
        push: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Cart,
    Wishlist,
}

impl Cli {
    /// Reject flag combinations clap cannot express on its own.
    fn validate(&self) -> Result<(), clap::Error> {
        if let Commands::Reconcile {
            target: Target::Cart,
            toggle: true,
            ..
        } = self.command
        {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--toggle only applies to --target wishlist",
            ));
        }
        Ok(())
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StoreConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json_logs: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartkit_storefront=info,cartkit=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    // Logs go to stderr so stdout stays parseable JSON
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.json_logs);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli.command, config).await {
        let event_id = sentry::capture_error(&e);
        tracing::error!(error = %e, sentry_event_id = %event_id, "Command failed");
        // process::exit skips destructors; flush Sentry first
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StoreConfig) -> cartkit_storefront::Result<()> {
    match command {
        Commands::Sync => commands::sync::run(&config).await,
        Commands::Reconcile {
            changes,
            target,
            toggle,
            push,
        } => {
            let options = commands::reconcile::Options {
                changes,
                target,
                toggle,
                push,
            };
            commands::reconcile::run(&config, options).await
        }
    }
}
