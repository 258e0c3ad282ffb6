//! Annya CLI - Cart and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two of a product to the cart
//! annya cart add ring-1 --name "Solitaire Ring" --price 1000 --qty 2
//!
//! # Apply a coupon
//! annya coupon apply FESTIVE10
//!
//! # Reserve stock and place a cash-on-delivery order
//! annya checkout --email priya@example.in --phone 9876543210 \
//!     --first-name Priya --last-name Sharma --address "12 Banjara Hills" \
//!     --city Hyderabad --postal-code 500034
//! ```
//!
//! # Commands
//!
//! - `cart` - Add, remove, update, show or clear cart lines
//! - `coupon` - Apply or remove a coupon
//! - `reserve` - Reserve stock for every cart line
//! - `checkout` - Reserve, then submit the order
//!
//! Configuration comes from `ANNYA_*` environment variables (see
//! `annya_storefront::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use annya_storefront::config::StorefrontConfig;
use annya_storefront::{AppState, CheckoutError};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "annya")]
#[command(author, version, about = "Annya storefront cart and checkout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cart lines
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the applied coupon
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Reserve stock for every cart line
    Reserve,
    /// Reserve stock and place the order
    Checkout(commands::checkout::CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product (merges with an existing line)
    Add {
        /// Product ID
        id: String,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Unit price in rupees
        #[arg(short, long)]
        price: Decimal,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,

        /// Product category
        #[arg(long)]
        category: Option<String>,

        /// Product image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a line's quantity (below 1 removes it)
    Set {
        /// Product ID
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Show the cart
    Show,
    /// Empty the cart and drop the coupon
    Clear,
}

#[derive(Subcommand)]
enum CouponAction {
    /// Verify a code and apply it
    Apply {
        /// Coupon code
        code: String,
    },
    /// Remove the applied coupon
    Remove,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = StorefrontConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "annya_storefront=info,annya=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        match e.downcast_ref::<CheckoutError>() {
            Some(err) => tracing::error!(error = %err, "{}", err.user_message()),
            None => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                qty,
                category,
                image,
            } => commands::cart::add(&state, id, name, price, qty, category, image)?,
            CartAction::Remove { id } => commands::cart::remove(&state, &id)?,
            CartAction::Set { id, qty } => commands::cart::set_quantity(&state, &id, qty)?,
            CartAction::Show => commands::cart::show(&state)?,
            CartAction::Clear => commands::cart::clear(&state)?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code } => commands::coupon::apply(&state, &code).await?,
            CouponAction::Remove => commands::coupon::remove(&state)?,
        },
        Commands::Reserve => commands::checkout::reserve(&state).await?,
        Commands::Checkout(args) => commands::checkout::run(&state, args).await?,
    }
    Ok(())
}
