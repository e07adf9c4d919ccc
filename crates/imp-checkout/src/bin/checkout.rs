//! # Checkout CLI
//!
//! Places one order from a JSON request and prints the result.
//!
//! ## Usage
//! ```bash
//! cargo run -p imp-checkout --bin checkout -- order.json
//!
//! # Read the request from stdin, against a specific database
//! cat order.json | cargo run -p imp-checkout --bin checkout -- --db ./imp_dev.db -
//! ```
//!
//! ## Request Shape
//! ```json
//! {
//!   "customer": {
//!     "email": "ada@example.com", "name": "Ada Lovelace",
//!     "addressLine1": "1 Engine Row", "city": "London",
//!     "postcode": "N1 1AA", "country": "GB"
//!   },
//!   "shippingCents": 399,
//!   "items": [{ "productId": "...", "quantity": 2, "unitPriceCents": 450 }],
//!   "discountCode": "SAVE20"
//! }
//! ```
//!
//! Prints the placed order as JSON. On failure prints `{ "code", "message" }`
//! and exits with status 1.

use anyhow::{bail, Context};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use imp_checkout::{Checkout, CheckoutConfig};
use imp_core::PlaceOrderRequest;

struct Args {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    request: Option<PathBuf>,
}

fn print_help() {
    println!("Imp Checkout");
    println!();
    println!("Usage: checkout [OPTIONS] [REQUEST_FILE | -]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir/checkout.toml)");
    println!("  -d, --db <PATH>      Database file, overrides config and IMP_DATABASE_PATH");
    println!("  -h, --help           Show this help message");
    println!();
    println!("Reads the order request from stdin when no file (or '-') is given.");
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        config: None,
        db: None,
        request: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--db" | "-d" => {
                let path = iter.next().context("--db needs a path")?;
                args.db = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "-" => args.request = None,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => args.request = Some(PathBuf::from(other)),
        }
    }

    Ok(Some(args))
}

fn read_request(path: Option<&PathBuf>) -> anyhow::Result<PlaceOrderRequest> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read request file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Cannot read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&contents).context("Request is not a valid PlaceOrderRequest")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,imp=debug,sqlx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let mut config = CheckoutConfig::load(args.config)?;
    if let Some(db) = args.db {
        config.database.path = db;
    }
    info!(database = %config.database.path.display(), "Starting checkout");

    let request = read_request(args.request.as_ref())?;
    let checkout = Checkout::from_config(config).await?;

    match checkout.place_order(&request).await {
        Ok(placed) => {
            println!("{}", serde_json::to_string_pretty(&placed)?);
            checkout.database().close().await;
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err.to_response())?);
            checkout.database().close().await;
            std::process::exit(1);
        }
    }
}
