use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, EnvFilter};

mod db;
mod error;
mod models;
mod serve;
mod structure;

#[derive(Parser)]
#[command(name = "yearbook-structure")]
#[command(about = "Yearbook structure aggregation for the digital yearbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import profiles from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        school_year: String,
    },
    /// Build the structure tree for one school year
    Structure {
        #[arg(long)]
        school_year: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve the structure endpoint over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv, school_year } => {
            let inserted = db::import_csv(&pool, &school_year, &csv).await?;
            println!("Inserted {inserted} profiles from {}.", csv.display());
        }
        Commands::Structure { school_year, out } => {
            let tree = structure::build_structure(&pool, &school_year).await?;
            let json = serde_json::to_string_pretty(&tree)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Structure written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Serve { port } => {
            serve::serve(pool, port).await?;
        }
    }

    Ok(())
}
