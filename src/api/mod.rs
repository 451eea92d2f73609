/// API routes and handlers
pub mod cleanup;
pub mod proposals;
pub mod responses;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(proposals::routes())
        .merge(responses::routes())
        .merge(cleanup::routes())
}
