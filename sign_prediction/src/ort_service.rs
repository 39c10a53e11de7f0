use crate::{
    config::ModelConfig,
    model_service::{ModelError, ModelService},
};
use ndarray::ArrayView4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

pub struct OrtModelService {
    sessions: Vec<Mutex<Session>>,
    counter: AtomicUsize,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelError> {
        model_config.validate().map_err(ModelError::InvalidConfig)?;

        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_path())
            })
            .collect::<Result<Vec<_>, ort::Error>>()
            .map_err(|e| ModelError::Load(e.to_string()))?;

        let output_name = sessions
            .first()
            .and_then(|session| session.outputs.first())
            .map(|output| output.name.clone())
            .ok_or_else(|| ModelError::Load("model declares no outputs".to_string()))?;

        tracing::info!(
            "Created {} ONNX sessions for {:?}, reading output {}",
            num_instances,
            model_config.get_path(),
            output_name
        );

        Ok(Self {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            counter: AtomicUsize::new(0),
            output_name,
        })
    }
}

impl ModelService for OrtModelService {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ModelError> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| ModelError::Inference(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| ModelError::Inference(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let (_shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("failed to extract tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use std::path::PathBuf;

    /// `fixtures/channel_mean.onnx`: ReduceMean over height and width of a
    /// `(1, height, width, 3)` input, output `scores` of shape `(1, 3)`.
    fn fixture_config(num_instances: usize) -> ModelConfig {
        ModelConfig {
            model_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"),
            onnx_file: "channel_mean.onnx".to_string(),
            num_instances,
            image_width: 6,
            image_height: 4,
        }
    }

    fn assert_scores(scores: &[f32], expected: &[f32]) {
        assert_eq!(scores.len(), expected.len());
        for (got, want) in scores.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{:?} != {:?}", scores, expected);
        }
    }

    #[test]
    fn test_fixture_model_runs_on_every_session() {
        let service = OrtModelService::new(&fixture_config(2)).unwrap();
        assert_eq!(service.output_name, "scores");
        assert_eq!(service.sessions.len(), 2);

        let input = Array4::<f32>::from_shape_fn((1, 4, 6, 3), |(_, _, _, channel)| {
            [1.0, 0.5, 0.25][channel]
        });

        for _ in 0..4 {
            let scores = service.predict(input.view()).unwrap();
            assert_scores(&scores, &[1.0, 0.5, 0.25]);
        }
    }

    #[test]
    fn test_non_standard_layout_input_is_copied() {
        let service = OrtModelService::new(&fixture_config(1)).unwrap();

        let nchw = Array4::<f32>::from_shape_fn((1, 3, 4, 6), |(_, channel, _, _)| {
            [0.2, 0.4, 0.6][channel]
        });
        let nhwc = nchw.view().permuted_axes([0, 2, 3, 1]);
        assert!(!nhwc.is_standard_layout());

        let scores = service.predict(nhwc).unwrap();

        assert_scores(&scores, &[0.2, 0.4, 0.6]);
    }

    #[test]
    fn test_missing_model_file_is_reported() {
        let model_config = ModelConfig {
            model_dir: PathBuf::from("./missing_models"),
            onnx_file: "sign_model.onnx".to_string(),
            num_instances: 1,
            image_width: 160,
            image_height: 160,
        };

        let result = OrtModelService::new(&model_config);

        assert!(matches!(result, Err(ModelError::InvalidConfig(_))));
    }
}
