use mws_core::util::unix_timestamp_millis;
use mws_core::{Engine, RestaurantClient};

use crate::commands::common::format_review_lines;
use crate::error::CliError;

pub async fn run_reviews(engine: &Engine, id: i64, as_json: bool) -> Result<(), CliError> {
    let reviews = RestaurantClient::new(engine).reviews_for(id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&reviews)?);
    } else {
        for line in format_review_lines(&reviews, unix_timestamp_millis()) {
            println!("{line}");
        }
    }
    Ok(())
}
