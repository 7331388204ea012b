//! Tableside CLI - the staff back office and order tracking from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (tokens are kept under TABLESIDE_DATA_DIR)
//! tableside login -e owner@cafe.com -p secret1
//!
//! # Work the order queue
//! tableside orders list --status pending
//! tableside orders advance 42
//!
//! # Follow live notifications for your store
//! tableside watch
//!
//! # Follow one order as a customer would
//! tableside track 42
//! ```
//!
//! # Environment Variables
//!
//! - `TABLESIDE_API_URL` - Backend REST base URL (required)
//! - `TABLESIDE_LOG_FORMAT` - `json` for structured logs
//! - `RUST_LOG` - Log filter (default `tableside=info`)
//! - `SENTRY_DSN` - Error reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tableside_client::telemetry::{init_sentry, init_tracing};
use tableside_client::{AppContext, ClientConfig};
use tableside_core::{NotificationId, OrderId, OrderStatus};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "tableside")]
#[command(author, version, about = "Tableside QR ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a staff member
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the stored tokens
    Logout,
    /// Register a staff account
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        name: String,
    },
    /// Show the signed-in account
    Whoami,
    /// Work the order queue
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// List menu items
    Menus,
    /// List seats and their QR URLs
    Seats,
    /// Manage notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },
    /// Follow live notifications for your store
    Watch,
    /// Follow one order until it is picked up or cancelled
    Track {
        order_id: i64,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders in this status (pending, preparing, completed, picked-up, cancelled)
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to its next status
    Advance { order_id: i64 },
    /// Cancel an order
    Cancel { order_id: i64 },
}

#[derive(Subcommand)]
enum NotificationsAction {
    /// List notifications and the unread count
    List,
    /// Mark one notification read
    Read { notification_id: i64 },
    /// Mark every notification read
    ReadAll,
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(1);
    }

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be up before the subscriber so its layer sees events
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let ctx = AppContext::from_config(config)?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, email, password).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Signup {
            email,
            password,
            name,
        } => commands::auth::signup(&ctx, email, password, name).await,
        Commands::Whoami => commands::auth::whoami(&ctx).await,
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::orders::list(&ctx, status).await,
            OrdersAction::Advance { order_id } => {
                commands::orders::advance(&ctx, OrderId::new(order_id)).await
            }
            OrdersAction::Cancel { order_id } => {
                commands::orders::cancel(&ctx, OrderId::new(order_id)).await
            }
        },
        Commands::Menus => commands::catalog::menus(&ctx).await,
        Commands::Seats => commands::catalog::seats(&ctx).await,
        Commands::Notifications { action } => match action {
            NotificationsAction::List => commands::notifications::list(&ctx).await,
            NotificationsAction::Read { notification_id } => {
                commands::notifications::read(&ctx, NotificationId::new(notification_id)).await
            }
            NotificationsAction::ReadAll => commands::notifications::read_all(&ctx).await,
        },
        Commands::Watch => commands::notifications::watch(&ctx).await,
        Commands::Track { order_id } => commands::track::track(&ctx, OrderId::new(order_id)).await,
    }
}
