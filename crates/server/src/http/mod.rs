use axum::{Router, routing::get};

use crate::{AppState, routes};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::users::router(&state))
        .merge(routes::categories::router(&state))
        .merge(routes::tasks::router(&state))
        .merge(routes::reminders::router(&state));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/db-test", get(routes::health::db_test))
        .nest("/api", api_routes)
        .with_state(state)
}
