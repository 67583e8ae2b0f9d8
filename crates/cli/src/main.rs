//! Storefront CLI - command-line views over the session, cart and order stores.
//!
//! Durable state lives in a JSON file (`STOREFRONT_STATE_PATH`), so every
//! invocation starts the way a reloaded page would.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts for the password on stdin when --password is omitted)
//! sf-cli login -e ada@example.com
//!
//! # Browse
//! sf-cli products list --size M --sort asc
//! sf-cli products show 64a1f0c2e4b0a1b2c3d4e5f6
//!
//! # Shop
//! sf-cli cart add 64a1f0c2e4b0a1b2c3d4e5f6 -q 2
//! sf-cli cart show
//! sf-cli order place
//!
//! sf-cli logout
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use storefront_sync::{ClientConfig, Storefront};
use storefront_sync_core::{Email, PriceSort, Size};

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Storefront client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and load the profile
    Login {
        #[arg(short, long)]
        email: Email,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register(RegisterArgs),
    /// End the session and forget the cart
    Logout,
    /// View or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check out and manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(clap::Args)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(short, long)]
    email: Email,

    #[arg(long)]
    phone: String,

    /// Read from stdin when omitted
    #[arg(short, long)]
    password: Option<String>,

    #[arg(long)]
    street: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    pincode: u32,

    /// Profile image file
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Fetch and print the profile
    Show,
    /// Change selected fields
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(short, long)]
        email: Option<Email>,

        #[arg(long)]
        phone: Option<String>,

        /// Profile image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for PriceSort {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Ascending,
            SortOrder::Desc => Self::Descending,
        }
    }
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Title substring
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        size: Option<Size>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
    },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Fetch and print the cart
    Show,
    /// Add a product
    Add {
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Decrease a product's quantity by one
    Decrease { product_id: String },
    /// Remove a product's line
    Remove { product_id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Turn the cart into an order
    Place {
        /// Do not allow cancelling the order later
        #[arg(long)]
        final_sale: bool,
    },
    /// Cancel an order
    Cancel { order_id: String },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_sync=info,sf_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let config = ClientConfig::from_env()?;
    let storefront = Storefront::open(&config)?;

    let result = dispatch(&storefront, cli.command).await;
    if let Err(e) = &result
        && e.is_unauthorized()
    {
        tracing::warn!("Session expired, log in again");
        commands::auth::end_session(&storefront);
    }
    result
}

async fn dispatch(storefront: &Storefront, command: Commands) -> Result<(), commands::CliError> {
    match command {
        Commands::Login { email, password } => {
            commands::auth::login(storefront, &email, password).await?;
        }
        Commands::Register(args) => commands::auth::register(storefront, args).await?,
        Commands::Logout => commands::auth::logout(storefront),
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(storefront).await?,
            ProfileAction::Update {
                first_name,
                last_name,
                email,
                phone,
                image,
            } => {
                commands::profile::update(
                    storefront,
                    commands::profile::Changes {
                        first_name,
                        last_name,
                        email,
                        phone,
                        image,
                    },
                )
                .await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                name,
                size,
                min_price,
                max_price,
                sort,
            } => {
                let filter = storefront_sync_core::ProductFilter {
                    name,
                    size,
                    price_greater_than: min_price,
                    price_less_than: max_price,
                    price_sort: sort.map(PriceSort::from),
                };
                commands::products::list(storefront, &filter).await?;
            }
            ProductsAction::Show { id } => commands::products::show(storefront, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(storefront, product_id, quantity).await?,
            CartAction::Decrease { product_id } => {
                commands::cart::decrease(storefront, product_id).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(storefront, product_id).await?;
            }
            CartAction::Clear => commands::cart::clear(storefront).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place { final_sale } => {
                commands::order::place(storefront, !final_sale).await?;
            }
            OrderAction::Cancel { order_id } => {
                commands::order::cancel(storefront, order_id).await?;
            }
        },
    }
    Ok(())
}
