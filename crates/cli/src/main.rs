//! Shopfront CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shopfront products
//! shopfront products --category Shirts
//! shopfront products --featured
//! shopfront categories
//! shopfront product 1
//!
//! # Manage the cart
//! shopfront cart add 1 --quantity 2
//! shopfront cart update 1 3
//! shopfront cart show
//!
//! # Place an order
//! shopfront checkout --full-name "Jane Doe" --email jane@example.com \
//!     --address "123 Main St" --city Springfield --postal-code 12345 \
//!     --country US --phone 555-0100
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_URL` - Gateway base URL (default `http://127.0.0.1:5000`)
//! - `SHOPFRONT_DATA_DIR` - Where the cart is persisted (default `.shopfront`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shopfront_client::{CartStore, CatalogClient, FileStorage, ShippingForm};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront terminal storefront")]
struct Cli {
    /// Gateway base URL
    #[arg(long, env = "SHOPFRONT_API_URL", default_value = "http://127.0.0.1:5000")]
    api_url: String,

    /// Directory holding the persisted cart
    #[arg(long, env = "SHOPFRONT_DATA_DIR", default_value = ".shopfront")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only featured products
        #[arg(long, conflicts_with = "trending")]
        featured: bool,

        /// Only trending products
        #[arg(long)]
        trending: bool,
    },
    /// List product categories
    Categories,
    /// Show one product by ID or document key
    Product {
        id: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID or document key
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        id: i64,
    },
    /// Set the quantity of a cart line (0 or less removes it)
    Update {
        id: i64,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long)]
    country: String,
    #[arg(long)]
    phone: String,
}

impl From<CheckoutArgs> for ShippingForm {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            full_name: args.full_name,
            email: args.email,
            address: args.address,
            city: args.city,
            postal_code: args.postal_code,
            country: args.country,
            phone: args.phone,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Plain output: the CLI talks to people, not log collectors
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront=info,shopfront_client=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogClient::new(&cli.api_url)?;
    let mut cart = CartStore::new(FileStorage::in_dir(&cli.data_dir));

    match cli.command {
        Commands::Products {
            category,
            featured,
            trending,
        } => {
            commands::catalog::products(&catalog, category.as_deref(), featured, trending).await?;
        }
        Commands::Categories => commands::catalog::categories(&catalog).await?,
        Commands::Product { id } => commands::catalog::product(&catalog, &id).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&cart),
            CartAction::Add { id, quantity } => {
                commands::cart::add(&catalog, &mut cart, &id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&mut cart, id.into()),
            CartAction::Update { id, quantity } => {
                commands::cart::update(&mut cart, id.into(), quantity);
            }
            CartAction::Clear => commands::cart::clear(&mut cart),
        },
        Commands::Checkout(args) => {
            commands::checkout::checkout(catalog, &mut cart, &args.into()).await?;
        }
    }
    Ok(())
}
