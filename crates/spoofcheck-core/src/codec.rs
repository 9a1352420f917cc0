//! Wire codec for the detection service.
//!
//! Requests carry the canonical frame as PNG, either as a multipart form
//! (`images` + `confidence_threshold` parts) or as a JSON document with a
//! base64 `image` field. Responses are JSON detection lists in one of two
//! shapes: a batch of one (`[[...]]`, the older API) or a flat array.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::geometry::BoundingBox;

/// Multipart part carrying the PNG.
pub const IMAGE_FIELD: &str = "images";
pub const IMAGE_FILENAME: &str = "image.png";
pub const THRESHOLD_FIELD: &str = "confidence_threshold";

/// Body layout used for outbound requests. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Multipart,
    Json,
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "multipart" => Ok(Self::Multipart),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown wire format '{other}' (expected multipart or json)")),
        }
    }
}

/// A spoof device detection: bounding box plus confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedSpoof {
    pub bounding_box: BoundingBox,
    pub confidence: f32,
}

impl DetectedSpoof {
    pub fn new(bounding_box: BoundingBox, confidence: f32) -> Self {
        Self {
            bounding_box,
            confidence,
        }
    }
}

/// Flat wire representation of a detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct WireDetection {
    confidence: f32,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl Serialize for DetectedSpoof {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireDetection {
            confidence: self.confidence,
            xmin: self.bounding_box.xmin,
            ymin: self.bounding_box.ymin,
            xmax: self.bounding_box.xmax,
            ymax: self.bounding_box.ymax,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionsDocument {
    Batched(Vec<Vec<WireDetection>>),
    Flat(Vec<WireDetection>),
}

/// Outbound request body and its content type.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct JsonRequest<'a> {
    image: &'a str,
}

/// Build the request body for a PNG-encoded canonical frame.
pub fn encode_request(png: &[u8], confidence_threshold: f32, format: WireFormat) -> EncodedRequest {
    match format {
        WireFormat::Multipart => {
            let boundary = uuid::Uuid::new_v4().to_string();
            encode_multipart(png, confidence_threshold, &boundary)
        }
        WireFormat::Json => encode_json(png),
    }
}

/// Multipart body with an explicit boundary.
pub fn encode_multipart(png: &[u8], confidence_threshold: f32, boundary: &str) -> EncodedRequest {
    let mut body = Vec::with_capacity(png.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{IMAGE_FIELD}\"; filename=\"{IMAGE_FILENAME}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(png);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{THRESHOLD_FIELD}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
    body.extend_from_slice(format!("{confidence_threshold:.4}\r\n").as_bytes());
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    EncodedRequest {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    }
}

fn encode_json(png: &[u8]) -> EncodedRequest {
    let image = STANDARD.encode(png);
    // Serializing a struct with a single string field cannot fail.
    let body = serde_json::to_vec(&JsonRequest { image: &image }).unwrap_or_default();
    EncodedRequest {
        content_type: "application/json".to_string(),
        body,
    }
}

/// Decode a detection service response body.
///
/// `null`, `[]` and `[[]]` all decode to an empty list.
pub fn decode_response(body: &[u8]) -> Result<Vec<DetectedSpoof>, DecodeError> {
    let document: Option<DetectionsDocument> = serde_json::from_slice(body)?;
    let records = match document {
        None => Vec::new(),
        Some(DetectionsDocument::Batched(batches)) => {
            tracing::debug!(batches = batches.len(), "decoded batched detections response");
            batches.into_iter().next().unwrap_or_default()
        }
        Some(DetectionsDocument::Flat(records)) => {
            tracing::debug!(records = records.len(), "decoded flat detections response");
            records
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, r)| validate(index, r))
        .collect()
}

fn validate(index: usize, r: WireDetection) -> Result<DetectedSpoof, DecodeError> {
    for (field, value) in [
        ("xmin", r.xmin),
        ("ymin", r.ymin),
        ("xmax", r.xmax),
        ("ymax", r.ymax),
    ] {
        if !value.is_finite() {
            return Err(DecodeError::NonFinite { index, field });
        }
    }
    if !r.confidence.is_finite() {
        return Err(DecodeError::NonFinite {
            index,
            field: "confidence",
        });
    }
    if !(0.0..=1.0).contains(&r.confidence) {
        return Err(DecodeError::ConfidenceOutOfRange {
            index,
            value: r.confidence,
        });
    }
    Ok(DetectedSpoof::new(
        BoundingBox::new(r.xmin, r.ymin, r.xmax, r.ymax),
        r.confidence,
    ))
}
