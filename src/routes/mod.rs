/// Application routes configuration
use crate::handlers::{
    create_astronaut, create_mission, create_spaceship, get_astronaut, get_mission, get_spaceship,
    health, list_astronauts, list_available_spaceships, list_missions, list_spaceships,
    update_astronaut, update_mission, update_spaceship, AppState,
};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Missions
        .route("/missions", get(list_missions).post(create_mission))
        .route("/missions/:id", get(get_mission).put(update_mission))
        // Astronauts
        .route("/astronauts", get(list_astronauts).post(create_astronaut))
        .route("/astronauts/:id", get(get_astronaut).put(update_astronaut))
        // Spaceships
        .route("/spaceships", get(list_spaceships).post(create_spaceship))
        .route("/spaceships/available", get(list_available_spaceships))
        .route("/spaceships/:id", get(get_spaceship).put(update_spaceship))
        .with_state(state)
}
