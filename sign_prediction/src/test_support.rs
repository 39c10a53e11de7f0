use crate::{
    labels::LabelTable,
    model_service::{ModelError, ModelService},
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use ndarray::ArrayView4;
use std::{io::Cursor, sync::Mutex};

pub const BOUNDARY: &str = "X-SIGN-PREDICTION-BOUNDARY";

/// Returns fixed scores and remembers the shape and value range it was fed.
pub struct MockModelService {
    scores: Vec<f32>,
    pub seen: Mutex<Vec<(Vec<usize>, f32, f32)>>,
}

impl MockModelService {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ModelService for MockModelService {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ModelError> {
        let min = input.iter().copied().fold(f32::INFINITY, f32::min);
        let max = input.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        self.seen
            .lock()
            .unwrap()
            .push((input.shape().to_vec(), min, max));
        Ok(self.scores.clone())
    }
}

pub struct FailingModelService;

impl ModelService for FailingModelService {
    fn predict(&self, _input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::Inference("device lost".to_string()))
    }
}

pub fn labels(names: &[&str]) -> LabelTable {
    LabelTable::new(names.iter().map(|s| s.to_string()).collect())
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 200])
    });
    let mut image_data = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut image_data), ImageFormat::Png)
        .unwrap();
    image_data
}

/// Builds a `multipart/form-data` body from `(field name, filename, bytes)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
