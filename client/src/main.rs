//! Basket CLI - inspect and drive a device's cart and wishlist from a shell.
//!
//! Reads `BASKET_*` configuration from the environment (and `.env`), keeps
//! device-local state in `BASKET_STORAGE_PATH`, and prints results as JSON.

use basket_client::storage::DEVICE_ID_KEY;
use basket_client::{Basket, Config};
use basket_engine::WishlistItem;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "basket")]
#[command(about = "Device-scoped cart and wishlist client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the device id, or forget it with --reset
    Device {
        #[arg(long)]
        reset: bool,
    },
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Wishlist operations
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// List product categories
    Categories,
}

#[derive(Debug, Subcommand)]
enum CartAction {
    Show,
    Add {
        product_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Remove {
        item_id: String,
    },
    Qty {
        item_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
enum WishlistAction {
    Show,
    Add {
        product_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        price: String,
        #[arg(long, default_value = "")]
        image: String,
    },
    Remove {
        item_id: String,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basket_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let cli = Cli::parse();

    tracing::debug!(api_url = %config.api_url, storage = %config.storage_path.display(), "Starting basket");
    let basket = Basket::from_config(&config)?;

    match cli.command {
        Commands::Device { reset: true } => {
            basket.local().backend().remove_item(DEVICE_ID_KEY)?;
            tracing::info!("Device id cleared");
        }
        Commands::Device { reset: false } => print_json(&basket.device_id())?,
        Commands::Cart { action } => match action {
            CartAction::Show => print_json(&basket.cart().fetch_cart().await)?,
            CartAction::Add {
                product_id,
                name,
                price,
                image,
                quantity,
            } => {
                let cart = basket
                    .cart()
                    .add_to_cart(&product_id, &name, price, &image, quantity)
                    .await;
                print_json(&cart)?;
            }
            CartAction::Remove { item_id } => {
                print_json(&basket.cart().remove_from_cart(&item_id).await)?;
            }
            CartAction::Qty { item_id, quantity } => {
                print_json(&basket.cart().update_cart_quantity(&item_id, quantity).await)?;
            }
            CartAction::Clear => basket.cart().clear_cart().await,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => print_json(&basket.wishlist().get_wishlist().await)?,
            WishlistAction::Add {
                product_id,
                title,
                price,
                image,
            } => {
                let item = WishlistItem::new(product_id, title, price, image);
                print_json(&basket.wishlist().add_wishlist_item(item).await)?;
            }
            WishlistAction::Remove { item_id } => {
                print_json(&basket.wishlist().remove_wishlist_item(&item_id).await)?;
            }
            WishlistAction::Clear => basket.wishlist().clear_wishlist().await,
        },
        Commands::Categories => print_json(&basket.categories().categories().await)?,
    }

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
