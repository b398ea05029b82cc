//! # Seed Data Generator
//!
//! Populates a data directory with a demo catalog and, optionally, the
//! first admin account.
//!
//! ## Usage
//! ```bash
//! # Seed the configured data directory
//! cargo run -p stockroom-store --bin seed
//!
//! # Seed a specific directory and create an admin
//! cargo run -p stockroom-store --bin seed -- \
//!     --data-dir ./data --admin-user root --admin-password Rootpass1
//! ```
//!
//! The catalog is only seeded when it is empty; rerunning is harmless.

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_core::{Money, NewProduct};
use stockroom_store::{Store, StoreConfig};

/// Demo catalog: (name, description, price in cents, quantity)
const PRODUCTS: &[(&str, &str, i64, u32)] = &[
    ("Ballpoint Pen", "Blue ink, medium point", 150, 120),
    ("Gel Pen", "Black ink, 0.5 mm", 220, 80),
    ("Pencil HB", "Graphite, pre-sharpened", 60, 200),
    ("Eraser", "Latex-free", 90, 150),
    ("A5 Notebook", "Ruled, 96 sheets", 450, 60),
    ("A4 Notebook", "Squared, 120 sheets", 620, 45),
    ("Sticky Notes", "76 x 76 mm, yellow, 100 sheets", 310, 90),
    ("Stapler", "Desktop, 20-sheet capacity", 1290, 15),
    ("Staples 26/6", "Box of 1000", 240, 70),
    ("Highlighter Set", "4 colours", 560, 40),
    ("Ruler 30 cm", "Transparent plastic", 180, 55),
    ("Scissors", "Stainless steel, 21 cm", 790, 25),
];

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Populate a Stockroom data directory with demo data")]
struct SeedArgs {
    /// Data directory; defaults to the configured one
    #[arg(long, env = "STOCKROOM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Username of the first admin account
    #[arg(long, requires = "admin_password")]
    admin_user: Option<String>,

    /// Password of the first admin account
    #[arg(long, env = "STOCKROOM_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = SeedArgs::parse();

    let mut config = StoreConfig::load(args.config)?;
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    let store = Store::open(config).await?;
    info!(path = %store.data_dir().display(), "Seeding store");

    let existing = store.catalog().count().await?;
    if existing > 0 {
        warn!(existing, "Catalog already has products, skipping catalog seed");
    } else {
        for (name, description, cents, quantity) in PRODUCTS {
            let draft =
                NewProduct::new(*name, Money::from_cents(*cents), *quantity).description(*description);
            store.catalog().add(draft).await?;
        }
        info!(count = PRODUCTS.len(), "Catalog seeded");
    }

    if let (Some(user), Some(password)) = (args.admin_user, args.admin_password) {
        match store.credentials().bootstrap_admin(&user, &password).await {
            Ok(admin) => info!(id = admin.id, username = %admin.username, "Admin account created"),
            Err(e) => warn!(username = %user, error = %e, "Admin account not created"),
        }
    }

    let overview = store.stats().overview().await?;
    info!(
        products = overview.product_count,
        stock_units = overview.stock_units,
        stock_value = %overview.stock_value,
        users = overview.user_count,
        "Seed complete"
    );

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom=trace` - Show trace for stockroom crates only
/// - Default: INFO, DEBUG for stockroom crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
