mod labels;
mod model_service;
mod ort_service;
mod prediction;
mod routes;
mod server;
mod state;
mod telemetry;
mod transform;

#[cfg(test)]
mod test_support;

pub mod app;
pub mod config;

pub use app::start_app;
