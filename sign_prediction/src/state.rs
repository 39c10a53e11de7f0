use crate::{
    labels::LabelTable,
    model_service::ModelService,
    prediction::{classify, PredictionError, PredictionResult},
    transform::transform_image,
};
use std::sync::Arc;

/// Everything a request needs, built once at startup and read-only afterwards.
pub struct ServiceState {
    model: Option<Arc<dyn ModelService>>,
    labels: LabelTable,
    image_width: u32,
    image_height: u32,
}

impl ServiceState {
    pub fn new(
        model: Option<Arc<dyn ModelService>>,
        labels: LabelTable,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        Self {
            model,
            labels,
            image_width,
            image_height,
        }
    }

    pub fn model(&self) -> Result<&Arc<dyn ModelService>, PredictionError> {
        self.model.as_ref().ok_or(PredictionError::ModelNotLoaded)
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Blocking: decode, preprocess, run the model and pick the top class.
    pub fn predict_image(&self, image_data: &[u8]) -> Result<PredictionResult, PredictionError> {
        let model = self.model()?;
        let input = transform_image(image_data, self.image_width, self.image_height)?;
        let scores = model.predict(input.view())?;

        tracing::debug!("Model returned {} class scores", scores.len());
        classify(&scores, &self.labels)
    }
}
