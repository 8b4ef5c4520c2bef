//! ShopHub CLI - browse the catalog, fill a cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! shophub featured
//! shophub products --limit 30 --search phone
//! shophub category smartphones --page 2
//!
//! # Cart
//! shophub cart add 12 --quantity 2 --size M
//! shophub cart show
//!
//! # Account
//! shophub account login -e demo@shophub.com -p demo123
//! shophub merge both
//!
//! # Checkout
//! shophub checkout --email demo@shophub.com ...
//! ```
//!
//! Session state (cart, signed-in user) lives in `SHOPHUB_DATA_DIR` and
//! carries over between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use shophub_storefront::AppError;
use shophub_storefront::config::{LatencyConfig, StorefrontConfig};

mod commands;

use commands::Context;
use commands::account::AccountAction;
use commands::cart::CartAction;
use commands::checkout::CheckoutArgs;
use commands::merge::MergeChoice;

#[derive(Parser)]
#[command(name = "shophub")]
#[command(author, version, about = "ShopHub storefront CLI")]
struct Cli {
    /// Directory holding session state (overrides `SHOPHUB_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skip simulated network delays
    #[arg(long, global = true)]
    no_delay: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Number of products to fetch
        #[arg(short, long, default_value_t = 20)]
        limit: u32,

        /// Only show products whose title, brand or category match
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show featured products
    Featured,
    /// List categories
    Categories,
    /// List one category's products
    Category {
        /// Category slug (e.g. `smartphones`)
        slug: String,

        /// Products per page
        #[arg(short, long, default_value_t = 20)]
        limit: u32,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single product
    Product {
        /// Product ID
        id: i64,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in, sign up and manage the profile
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Decide what happens to the cart from before signing in
    Merge {
        /// Which cart to keep
        #[arg(value_enum)]
        choice: Option<MergeChoice>,
    },
    /// Place an order for the cart
    Checkout(Box<CheckoutArgs>),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shophub_storefront=info,shophub_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            commands::print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if cli.no_delay {
        config.latency = LatencyConfig::none();
    }

    let mut ctx = Context::open(&config)?;

    let result = match cli.command {
        Commands::Products { limit, search } => {
            commands::catalog::products(&ctx, limit, search.as_deref()).await
        }
        Commands::Featured => commands::catalog::featured(&ctx).await,
        Commands::Categories => commands::catalog::categories(&ctx).await,
        Commands::Category { slug, limit, page } => {
            commands::catalog::category(&ctx, &slug, limit, page).await
        }
        Commands::Product { id } => commands::catalog::product(&ctx, id).await,
        Commands::Cart { action } => commands::cart::run(&mut ctx, action).await,
        Commands::Account { action } => commands::account::run(&mut ctx, action).await,
        Commands::Merge { choice } => commands::merge::run(&mut ctx, choice),
        Commands::Checkout(args) => commands::checkout::run(&mut ctx, *args).await,
    };

    ctx.close();
    result
}
