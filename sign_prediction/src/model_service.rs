use ndarray::ArrayView4;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{0}")]
    InvalidConfig(String),
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A loaded classifier. `predict` takes a `(1, height, width, 3)` batch and
/// returns one score per class.
pub trait ModelService: Send + Sync + 'static {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ModelError>;
}
