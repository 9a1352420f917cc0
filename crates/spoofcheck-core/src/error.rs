use thiserror::Error;

use crate::geometry::GeometryError;

/// Transport-level failure of the detection request.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("detection service returned HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

/// The service answered, but the body is not a detection list we understand.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("response is not a recognised detections document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("detection {index}: field `{field}` is not a finite number")]
    NonFinite { index: usize, field: &'static str },
    #[error("detection {index}: confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange { index: usize, value: f32 },
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("invalid input image: {0}")]
    InvalidImage(String),
    #[error("failed to encode canonical frame: {0}")]
    Encoding(#[source] image::ImageError),
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("detection deadline exceeded")]
    DeadlineExceeded,
    #[error("detection cancelled")]
    Cancelled,
}

impl From<GeometryError> for DetectionError {
    fn from(e: GeometryError) -> Self {
        DetectionError::InvalidImage(e.to_string())
    }
}
