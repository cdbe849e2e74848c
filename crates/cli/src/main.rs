//! Food Order CLI - browse the menu, manage an account and build a cart.
//!
//! # Usage
//!
//! ```bash
//! # Browse the menu against the configured Appwrite project
//! fo-cli menu --category burgers --query bacon
//!
//! # Same, against the sample catalog
//! fo-cli --offline crates/client/fixtures/catalog.yaml menu
//!
//! # Build a cart and print the totals
//! fo-cli order classic-cheeseburger classic-cheeseburger pepperoni-pizza \
//!     --with classic-cheeseburger:extra-cheese
//!
//! # Commands that need a session sign in first
//! fo-cli --login demo@example.com --login-password demo-password whoami
//! ```
//!
//! # Environment Variables
//!
//! See `food_order_client::config` for the Appwrite settings. `SENTRY_DSN`
//! and `SENTRY_ENVIRONMENT` enable error tracking in both modes.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use food_order_client::backend::{InMemoryBackend, SignInForm};
use food_order_client::config::{AppConfig, SentryConfig};
use food_order_client::state::AppState;
use food_order_client::{AppError, Result};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fo-cli")]
#[command(author, version, about = "Food Order command-line client")]
struct Cli {
    /// Use the in-memory backend seeded from this fixture instead of Appwrite
    #[arg(long, global = true, value_name = "FIXTURE")]
    offline: Option<PathBuf>,

    /// Sign in with this email before running the command
    #[arg(long, global = true, value_name = "EMAIL", requires = "login_password")]
    login: Option<String>,

    /// Password for --login
    #[arg(long, global = true, value_name = "PASSWORD", requires = "login")]
    login_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List menu items
    Menu {
        /// Category id, or "all"
        #[arg(short, long)]
        category: Option<String>,

        /// Search text matched against item names
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of items
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// List categories
    Categories,
    /// Show one menu item and its customizations
    Item {
        /// Menu item id
        id: String,
    },
    /// Create an account and sign in
    SignUp {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Sign in and show the account
    SignIn {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    SignOut,
    /// Show who is signed in
    Whoami,
    /// Edit the signed-in user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Build a cart from menu item ids and print it
    Order {
        /// Menu item ids; repeat an id to add another unit
        #[arg(required = true)]
        items: Vec<String>,

        /// Add a customization to every unit of an item (`<item-id>:<customization-id>`)
        #[arg(short, long = "with", value_name = "ITEM:CUSTOMIZATION")]
        with: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change the display name
    SetName {
        name: String,
    },
    /// Upload an image as the avatar
    Avatar {
        path: PathBuf,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(std::borrow::Cow::Owned),
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

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&SentryConfig::from_env());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "food_order=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli).await {
        e.report();
        #[allow(clippy::print_stderr)]
        {
            eprintln!("error: {}", e.user_message());
        }
        std::process::exit(1);
    }
}

async fn build_state(offline: Option<PathBuf>) -> Result<AppState> {
    match offline {
        Some(path) => {
            tracing::info!(fixture = %path.display(), "Using in-memory backend");
            let backend = InMemoryBackend::from_fixture_file(&path).await?;
            Ok(AppState::with_backend(backend))
        }
        None => {
            let config = AppConfig::from_env()?;
            tracing::debug!(?config, "Loaded configuration");
            Ok(AppState::new(config)?)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let state = build_state(cli.offline).await?;

    if let (Some(email), Some(password)) = (cli.login.as_deref(), cli.login_password.as_deref()) {
        let form = SignInForm::parse(email, password)?;
        state.auth().sign_in(state.backend(), &form).await?;
    } else {
        state.restore_session().await;
    }

    match cli.command {
        Commands::Menu {
            category,
            query,
            limit,
        } => {
            commands::catalog::menu(&state, category.as_deref(), query.as_deref(), limit).await?;
        }
        Commands::Categories => commands::catalog::categories(&state).await?,
        Commands::Item { id } => commands::catalog::item(&state, &id).await?,
        Commands::SignUp {
            name,
            email,
            password,
        } => commands::account::sign_up(&state, &name, &email, &password).await?,
        Commands::SignIn { email, password } => {
            commands::account::sign_in(&state, &email, &password).await?;
        }
        Commands::SignOut => commands::account::sign_out(&state).await?,
        Commands::Whoami => commands::account::whoami(&state),
        Commands::Profile { action } => match action {
            ProfileAction::SetName { name } => commands::account::set_name(&state, &name).await?,
            ProfileAction::Avatar { path } => commands::account::avatar(&state, &path).await?,
        },
        Commands::Order { items, with } => {
            let extras = commands::order::parse_customizations(&with)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            commands::order::order(&state, &items, &extras).await?;
        }
    }
    Ok(())
}
