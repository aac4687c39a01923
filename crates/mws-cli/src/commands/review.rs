use mws_core::{Engine, NewReview, RestaurantClient};

use crate::commands::common::normalize_text;
use crate::error::CliError;

pub fn build_review(
    restaurant_id: i64,
    name: &str,
    rating: u8,
    comment_parts: &[String],
) -> Result<NewReview, CliError> {
    let name = normalize_text(name).ok_or(CliError::EmptyReviewerName)?;
    let comments = normalize_text(&comment_parts.join(" ")).ok_or(CliError::EmptyComments)?;
    Ok(NewReview {
        restaurant_id,
        name,
        rating,
        comments,
    })
}

pub async fn run_review(engine: &Engine, review: &NewReview) -> Result<(), CliError> {
    let saved = RestaurantClient::new(engine).submit_review(review).await?;
    if saved.is_temporary() {
        println!(
            "Review saved offline as {}; it will be sent when the API is reachable",
            saved.temporary_id.as_deref().unwrap_or("pending")
        );
    } else {
        println!("{}", saved.id);
    }
    Ok(())
}
