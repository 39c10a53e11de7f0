use crate::{labels::LabelTable, model_service::ModelError, transform::TransformError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Model not loaded")]
    ModelNotLoaded,
    #[error("No file part in the request")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid image data: {0}")]
    InvalidImage(#[from] TransformError),
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("Model returned an empty output")]
    EmptyOutput,
    #[error("Predicted class {index} has no label ({labels} labels loaded)")]
    UnknownClass { index: usize, labels: usize },
    #[error("Prediction worker failed: {0}")]
    Worker(String),
}

impl PredictionError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::ModelNotLoaded => "model_not_loaded",
            PredictionError::NoFilePart => "no_file_part",
            PredictionError::NoSelectedFile => "no_selected_file",
            PredictionError::InvalidImage(_) => "invalid_image",
            PredictionError::UploadTooLarge(_) => "upload_too_large",
            PredictionError::Model(_) => "inference",
            PredictionError::EmptyOutput => "empty_output",
            PredictionError::UnknownClass { .. } => "unknown_class",
            PredictionError::Worker(_) => "worker",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub confidence: f32,
}

/// Index and value of the first maximum. NaN only wins when every score is
/// NaN, and then the first one is kept.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .reduce(|accum, score| {
            if score.1 > accum.1 || (accum.1.is_nan() && !score.1.is_nan()) {
                score
            } else {
                accum
            }
        })
}

pub fn classify(scores: &[f32], labels: &LabelTable) -> Result<PredictionResult, PredictionError> {
    let (index, confidence) = argmax(scores).ok_or(PredictionError::EmptyOutput)?;
    if confidence.is_nan() {
        return Err(PredictionError::Model(ModelError::Inference(
            "model returned only NaN scores".to_string(),
        )));
    }

    let prediction = if labels.is_empty() {
        index.to_string()
    } else {
        labels
            .get(index)
            .ok_or(PredictionError::UnknownClass {
                index,
                labels: labels.len(),
            })?
            .to_string()
    };

    Ok(PredictionResult {
        prediction,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> LabelTable {
        LabelTable::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.4, 0.2, 0.4]), Some((0, 0.4)));
        assert_eq!(argmax(&[0.9]), Some((0, 0.9)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.6]), Some((2, 0.6)));
        assert_eq!(argmax(&[0.3, f32::NAN, 0.1]), Some((0, 0.3)));
    }

    #[test]
    fn test_argmax_all_nan_keeps_first() {
        let (index, score) = argmax(&[f32::NAN, f32::NAN, f32::NAN]).unwrap();
        assert_eq!(index, 0);
        assert!(score.is_nan());
    }

    #[test]
    fn test_classify_rejects_all_nan_output() {
        let result = classify(&[f32::NAN, f32::NAN], &labels(&["no", "yes"]));

        assert!(matches!(
            result,
            Err(PredictionError::Model(ModelError::Inference(_)))
        ));
    }

    #[test]
    fn test_classify_maps_through_label_table() {
        let table = labels(&["hello", "no", "yes"]);

        let result = classify(&[0.05, 0.15, 0.8], &table).unwrap();

        assert_eq!(result.prediction, "yes");
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_classify_without_labels_uses_index() {
        let result = classify(&[0.2, 0.1, 0.3, 0.4], &LabelTable::default()).unwrap();

        assert_eq!(result.prediction, "3");
        assert_eq!(result.confidence, 0.4);
    }

    #[test]
    fn test_classify_index_outside_table() {
        let table = labels(&["hello", "no"]);

        let result = classify(&[0.1, 0.2, 0.7], &table);

        assert!(matches!(
            result,
            Err(PredictionError::UnknownClass {
                index: 2,
                labels: 2
            })
        ));
    }

    #[test]
    fn test_classify_empty_output() {
        let result = classify(&[], &labels(&["hello"]));
        assert!(matches!(result, Err(PredictionError::EmptyOutput)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(PredictionError::ModelNotLoaded.to_string(), "Model not loaded");
        assert_eq!(
            PredictionError::NoFilePart.to_string(),
            "No file part in the request"
        );
        assert_eq!(PredictionError::NoSelectedFile.to_string(), "No selected file");
    }
}
