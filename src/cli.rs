use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TechServe - order OS installation services
#[derive(Parser)]
#[command(name = "techserve")]
#[command(about = "Order and track TechServe OS installations from the terminal")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dry-run mode: build and print the order payload without submitting it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Use the seeded in-memory backend instead of the order API.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the operating systems and versions currently on offer
    Catalog,
    /// Run the order wizard from a JSON draft and submit the order
    Order {
        /// Path to the order draft
        #[arg(short, long)]
        draft: PathBuf,
    },
    /// Look up your orders by email and phone
    Track {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        phone: String,
    },
    /// Show a single order by its order number
    Show {
        /// Order number, e.g. TS-4521230042
        order_number: String,
    },
    /// Validate a configuration file
    ValidateConfig {
        /// Path to configuration file to validate
        path: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
