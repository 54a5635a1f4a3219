pub mod dto;
pub mod routes;

use std::sync::Arc;

use rocket::{routes, Build, Rocket};

use crate::bootstrap::AppState;
use crate::config::Config;

/// Assembles the quote service without launching it.
pub fn build_rocket(config: &Config) -> Rocket<Build> {
    let app_state = Arc::new(AppState::new(config));

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", config.bind_address.clone()));

    rocket::custom(figment).manage(app_state).mount(
        "/",
        routes![routes::query, routes::compute_swap, routes::shapes, routes::health],
    )
}
