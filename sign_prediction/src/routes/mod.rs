mod health;
mod metrics;
mod pages;
mod predict;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use health::healthcheck;
pub use metrics::metrics_handler;
pub use pages::{index, upload_form};
pub use predict::predict;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/upload", get(upload_form))
        .route("/predict", post(predict))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
}
