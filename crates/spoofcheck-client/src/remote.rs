use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use spoofcheck_core::{
    decode_response, encode_request, map_to_original, normalize, CapturedImage, DetectedSpoof,
    DetectionError, EncodedRequest, LetterboxTransform, NetworkError, SpoofDetector,
};
use tokio::time::Instant;

use crate::config::{ClientConfig, ConfigError};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest response body accepted from the service.
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Spoof detector backed by the remote detection service.
///
/// Each call normalizes the image into a canonical frame, posts it to the
/// configured endpoint, and maps the returned boxes back into the image's
/// own coordinates. Calls are independent and may run concurrently.
pub struct RemoteSpoofDetector {
    config: ClientConfig,
    endpoint: Url,
    http: reqwest::Client,
}

impl RemoteSpoofDetector {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let endpoint = Url::parse(&config.endpoint).map_err(|e| ConfigError::Invalid {
            key: "endpoint",
            value: config.endpoint.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("spoofcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        tracing::info!(
            endpoint = %endpoint,
            frame_side = config.frame_side,
            wire_format = ?config.wire_format,
            "remote spoof detector configured"
        );

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Detect, giving up at `deadline` with [`DetectionError::DeadlineExceeded`].
    pub async fn detect_with_deadline(
        &self,
        image: &CapturedImage,
        deadline: Instant,
    ) -> Result<Vec<DetectedSpoof>, DetectionError> {
        match tokio::time::timeout_at(deadline, self.run(image)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(endpoint = %self.endpoint, "detection deadline exceeded");
                Err(DetectionError::DeadlineExceeded)
            }
        }
    }

    /// Detect until `cancel` completes; the in-flight request is dropped and
    /// [`DetectionError::Cancelled`] returned if it wins the race.
    ///
    /// Any future works as the signal, e.g. a `oneshot::Receiver` or
    /// `Notify::notified()`; its output is ignored. The configured timeout
    /// still applies.
    pub async fn detect_until<C>(
        &self,
        image: &CapturedImage,
        cancel: C,
    ) -> Result<Vec<DetectedSpoof>, DetectionError>
    where
        C: Future,
    {
        let deadline = Instant::now() + self.config.timeout();
        tokio::select! {
            result = self.detect_with_deadline(image, deadline) => result,
            _ = cancel => {
                tracing::info!("detection cancelled by caller");
                Err(DetectionError::Cancelled)
            }
        }
    }

    async fn run(&self, image: &CapturedImage) -> Result<Vec<DetectedSpoof>, DetectionError> {
        let (request, transform) = self.prepare(image)?;
        let body = self.exchange(request).await?;
        let canvas_detections = decode_response(&body)?;
        let detections = map_to_original(&canvas_detections, &transform);

        tracing::info!(
            width = image.width(),
            height = image.height(),
            detections = detections.len(),
            "spoof detection complete"
        );
        Ok(detections)
    }

    /// Normalize and encode. The canonical frame does not outlive this call;
    /// only the encoded body and the transform go on to the network stage.
    fn prepare(
        &self,
        image: &CapturedImage,
    ) -> Result<(EncodedRequest, LetterboxTransform), DetectionError> {
        let frame = normalize(image, self.config.frame_side)?;
        let png = frame.encode_png()?;
        let request = encode_request(
            &png,
            self.config.confidence_threshold,
            self.config.wire_format,
        );
        Ok((request, *frame.transform()))
    }

    async fn exchange(&self, request: EncodedRequest) -> Result<Vec<u8>, NetworkError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            content_type = %request.content_type,
            bytes = request.body.len(),
            "posting canonical frame"
        );

        let mut response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            tracing::warn!(status, endpoint = %self.endpoint, "detection service rejected request");
            return Err(NetworkError::Status(status));
        }

        let limit = MAX_RESPONSE_BYTES;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            tracing::warn!(status, limit, "detection response too large");
            return Err(NetworkError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > limit {
                tracing::warn!(status, limit, "detection response too large");
                return Err(NetworkError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(status, bytes = body.len(), "detection response received");
        Ok(body)
    }
}

impl SpoofDetector for RemoteSpoofDetector {
    async fn detect_spoof_devices(
        &self,
        image: &CapturedImage,
    ) -> Result<Vec<DetectedSpoof>, DetectionError> {
        let deadline = Instant::now() + self.config.timeout();
        self.detect_with_deadline(image, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ClientConfig::new("https://x.test/detect", "k");
        config.frame_side = 0;
        assert!(RemoteSpoofDetector::new(config).is_err());
    }

    #[tokio::test]
    async fn test_invalid_image_fails_before_network() {
        // Nothing listens on this endpoint; an empty image must fail first.
        let detector =
            RemoteSpoofDetector::new(ClientConfig::new("http://127.0.0.1:9/detect", "k")).unwrap();
        let image = CapturedImage::new(image::DynamicImage::new_rgb8(0, 0));
        let err = detector.detect_spoof_devices(&image).await.unwrap_err();
        assert!(matches!(err, DetectionError::InvalidImage(_)));
    }
}
