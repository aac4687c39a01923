use mws_core::{Engine, RestaurantClient};

use crate::error::CliError;

pub async fn run_neighborhoods(engine: &Engine) -> Result<(), CliError> {
    for neighborhood in RestaurantClient::new(engine).neighborhoods().await? {
        println!("{neighborhood}");
    }
    Ok(())
}

pub async fn run_cuisines(engine: &Engine) -> Result<(), CliError> {
    for cuisine in RestaurantClient::new(engine).cuisines().await? {
        println!("{cuisine}");
    }
    Ok(())
}
