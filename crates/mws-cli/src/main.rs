//! mws CLI - Restaurant reviews from the command line
//!
//! Every command goes through the offline-first engine: reads fall back to
//! the local mirror and writes are queued when the API is unreachable.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::{open_engine, EngineOptions};
use crate::commands::completions::run_completions;
use crate::commands::favorite::run_favorite;
use crate::commands::filters::{run_cuisines, run_neighborhoods};
use crate::commands::flush::run_flush;
use crate::commands::queue::run_queue;
use crate::commands::restaurants::run_restaurants;
use crate::commands::review::{build_review, run_review};
use crate::commands::reviews::run_reviews;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mws=info".parse().expect("valid directive"))
                .add_directive("mws_core=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let options = EngineOptions {
        db_path: cli.db_path,
        api_url: cli.api_url,
        offline: cli.offline,
    };
    let engine = open_engine(&options)?;

    match cli.command {
        Commands::Restaurants {
            cuisine,
            neighborhood,
            json,
        } => run_restaurants(&engine, cuisine.as_deref(), neighborhood.as_deref(), json).await?,
        Commands::Show { id, json } => run_show(&engine, id, json).await?,
        Commands::Reviews { id, json } => run_reviews(&engine, id, json).await?,
        Commands::Favorite { id, unset } => run_favorite(&engine, id, !unset).await?,
        Commands::Review {
            restaurant_id,
            name,
            rating,
            comments,
        } => {
            let review = build_review(restaurant_id, &name, rating, &comments)?;
            run_review(&engine, &review).await?;
        }
        Commands::Neighborhoods => run_neighborhoods(&engine).await?,
        Commands::Cuisines => run_cuisines(&engine).await?,
        Commands::Flush => run_flush(&engine).await?,
        Commands::Queue { json } => run_queue(&engine, json).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
