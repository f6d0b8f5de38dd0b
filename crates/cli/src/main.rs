//! Kindred Care CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply portal migrations and create the session table
//! kindred migrate
//!
//! # Confirm a caregiver who signed up through the portal
//! kindred employee validate -e caregiver@example.com
//!
//! # Load hourly services, packages and caregiver profiles
//! kindred seed catalog --file crates/cli/seed/catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `employee create|validate|revoke|list` - Manage employee records
//! - `seed catalog` - Upsert catalog data from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(author, version, about = "Kindred Care operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage employee records
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum EmployeeAction {
    /// Create an employee record for an existing account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Validate the record immediately
        #[arg(long)]
        validated: bool,
    },
    /// Mark an employee as validated
    Validate {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Withdraw an employee's validation
    Revoke {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// List employee records
    List,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert services, packages and caregivers
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long, default_value = commands::seed::DEFAULT_CATALOG_FILE)]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Employee { action } => match action {
            EmployeeAction::Create { email, validated } => {
                commands::employee::create(&email, validated).await?;
            }
            EmployeeAction::Validate { email } => commands::employee::validate(&email).await?,
            EmployeeAction::Revoke { email } => commands::employee::revoke(&email).await?,
            EmployeeAction::List => commands::employee::list().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}
