use mws_core::client::{image_url_for, url_for};
use mws_core::util::unix_timestamp_millis;
use mws_core::{Engine, Error, RestaurantClient};

use crate::commands::common::format_review_lines;
use crate::error::CliError;

pub async fn run_show(engine: &Engine, id: i64, as_json: bool) -> Result<(), CliError> {
    let client = RestaurantClient::new(engine);
    let details = match client.restaurant_with_reviews(id).await {
        Err(Error::NotFound(_)) => return Err(CliError::RestaurantNotFound(id)),
        other => other?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    let restaurant = &details.restaurant;
    println!(
        "{}{}",
        restaurant.name.as_deref().unwrap_or("(unnamed)"),
        if restaurant.is_favorite() { " ★" } else { "" }
    );
    if let Some(address) = &restaurant.address {
        println!("{address}");
    }
    println!(
        "{} · {}",
        restaurant.neighborhood.as_deref().unwrap_or("?"),
        restaurant.cuisine_type.as_deref().unwrap_or("?")
    );
    println!("page:  {}", url_for(restaurant));
    println!("image: {}", image_url_for(restaurant));
    println!();

    if details.reviews.is_empty() {
        println!("No reviews yet.");
    }
    for line in format_review_lines(&details.reviews, unix_timestamp_millis()) {
        println!("{line}");
    }
    Ok(())
}
