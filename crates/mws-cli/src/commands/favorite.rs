use mws_core::{Engine, RestaurantClient};

use crate::error::CliError;

pub async fn run_favorite(engine: &Engine, id: i64, favorite: bool) -> Result<(), CliError> {
    let restaurant = RestaurantClient::new(engine)
        .toggle_favorite(id, favorite)
        .await?;

    let name = restaurant.name.as_deref().unwrap_or("restaurant");
    if restaurant.is_favorite() {
        println!("★ {name} ({id}) marked as favorite");
    } else {
        println!("{name} ({id}) removed from favorites");
    }
    Ok(())
}
