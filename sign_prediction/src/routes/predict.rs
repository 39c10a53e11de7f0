use crate::{
    prediction::{PredictionError, PredictionResult},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::instrument;

const ROUTE: &str = "/predict";
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl PredictionError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictionError::NoFilePart
            | PredictionError::NoSelectedFile
            | PredictionError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            PredictionError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PredictionError::ModelNotLoaded
            | PredictionError::Model(_)
            | PredictionError::EmptyOutput
            | PredictionError::UnknownClass { .. }
            | PredictionError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// A body that cannot be parsed as multipart carries no file part.
impl From<MultipartError> for PredictionError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PredictionError::UploadTooLarge(err.body_text())
        } else {
            tracing::debug!("Malformed multipart body: {}", err.body_text());
            PredictionError::NoFilePart
        }
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, PredictionError> {
    state.metrics.record_request(ROUTE);
    let started = Instant::now();

    let result = run_prediction(&state, multipart).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    state.metrics.record_prediction_duration(elapsed_ms, ROUTE);

    match result {
        Ok(prediction) => {
            tracing::info!(
                "Predicted {} with confidence {:.3} in {}ms",
                prediction.prediction,
                prediction.confidence,
                elapsed_ms
            );
            Ok(Json(prediction))
        }
        Err(err) => {
            if err.status_code().is_server_error() {
                tracing::error!("Prediction failed: {}", err);
            } else {
                tracing::warn!("Rejected prediction request: {}", err);
            }
            state.metrics.record_prediction_error(err.kind());
            Err(err)
        }
    }
}

async fn run_prediction(
    state: &SharedState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PredictionResult, PredictionError> {
    state.service.model()?;

    let image_data = read_file_part(multipart).await?;

    let service = state.service.clone();
    tokio::task::spawn_blocking(move || service.predict_image(&image_data))
        .await
        .map_err(|e| PredictionError::Worker(e.to_string()))?
}

/// Bytes of the first `file` part that carries a filename.
async fn read_file_part(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes, PredictionError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("Request is not multipart: {}", rejection);
            return Err(PredictionError::NoFilePart);
        }
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = match field.file_name() {
            Some(file_name) => file_name.to_string(),
            // a plain form value, not an uploaded file
            None => continue,
        };
        if file_name.is_empty() {
            return Err(PredictionError::NoSelectedFile);
        }

        let image_data = field.bytes().await?;
        tracing::debug!("Received {} ({} bytes)", file_name, image_data.len());
        return Ok(image_data);
    }

    Err(PredictionError::NoFilePart)
}
