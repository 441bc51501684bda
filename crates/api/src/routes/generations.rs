//! Route definitions for generation dispatch and the library.
//!
//! ```text
//! POST   /                create_generation
//! GET    /                list_generations
//! GET    /{id}            check_generation (drives the recovery path)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(generations::create_generation).get(generations::list_generations),
        )
        .route("/{id}", get(generations::check_generation))
}
