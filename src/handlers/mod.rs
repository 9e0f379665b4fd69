pub mod orders;
pub mod staff;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// Every route the server exposes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(webhooks::router())
        .merge(staff::router(state.clone()))
        .with_state(state)
}
