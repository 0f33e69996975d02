// libs/catalog-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::catalog::CatalogService;

pub fn catalog_routes(catalog: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/therapies", post(handlers::create_therapy))
        .route("/therapies", get(handlers::list_therapies))
        .route("/therapies/{therapy_id}", get(handlers::get_therapy))
        .route("/therapists", post(handlers::create_therapist))
        .route("/therapists", get(handlers::list_active_therapists))
        .route("/therapists/{therapist_id}", get(handlers::get_therapist))
        .route(
            "/therapists/{therapist_id}/deactivate",
            post(handlers::deactivate_therapist),
        )
        .with_state(catalog)
}
