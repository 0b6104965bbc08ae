use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use seed::{SeedOptions, seed};
use server::{database::RedisBackend, store::Store};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Redis instance to seed
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Also create the demo company, its users, subscription and sample emissions
    #[arg(long)]
    demo: bool,

    #[arg(long, default_value_t = 30)]
    sample_emissions: usize,

    /// bcrypt work factor for the demo accounts
    #[arg(long, env = "PASSWORD_COST", default_value_t = 12)]
    password_cost: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    info!("Connecting to {}", args.redis_url);
    let backend = RedisBackend::connect(&args.redis_url)
        .await
        .context("Redis unreachable")?;
    let store = Store::new(Arc::new(backend));

    let report = seed(
        &store,
        &SeedOptions {
            demo: args.demo,
            password_cost: args.password_cost,
            sample_emissions: args.sample_emissions,
            progress: true,
        },
    )
    .await?;

    println!("{report:#?}");
    Ok(())
}
