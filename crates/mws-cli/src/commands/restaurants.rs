use mws_core::{Engine, RestaurantClient};

use crate::commands::common::{filter_value, format_restaurant_lines};
use crate::error::CliError;

pub async fn run_restaurants(
    engine: &Engine,
    cuisine: Option<&str>,
    neighborhood: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let client = RestaurantClient::new(engine);
    let restaurants = client
        .by_cuisine_and_neighborhood(&filter_value(cuisine), &filter_value(neighborhood))
        .await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&restaurants)?);
    } else {
        for line in format_restaurant_lines(&restaurants) {
            println!("{line}");
        }
    }

    Ok(())
}
