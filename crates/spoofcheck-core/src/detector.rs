use std::future::Future;

use crate::aggregate::{evaluate, spoof_score, SpoofVerdict};
use crate::capture::CapturedImage;
use crate::codec::DetectedSpoof;
use crate::error::DetectionError;
use crate::geometry::BoundingBox;

/// Anything that can locate spoof devices in an image.
///
/// Detections are returned in the coordinate space of the upright input
/// image. Scoring is built on top of [`SpoofDetector::detect_spoof_devices`].
pub trait SpoofDetector: Send + Sync {
    fn detect_spoof_devices(
        &self,
        image: &CapturedImage,
    ) -> impl Future<Output = Result<Vec<DetectedSpoof>, DetectionError>> + Send;

    /// Highest confidence among detections enclosing `roi` (all detections
    /// when `roi` is `None`); `0.0` if there are none.
    fn detect_spoof_score(
        &self,
        image: &CapturedImage,
        roi: Option<BoundingBox>,
    ) -> impl Future<Output = Result<f32, DetectionError>> + Send {
        async move {
            let detections = self.detect_spoof_devices(image).await?;
            Ok(spoof_score(&detections, roi.as_ref()))
        }
    }

    /// Score the image and compare against `threshold`.
    fn is_spoof(
        &self,
        image: &CapturedImage,
        roi: Option<BoundingBox>,
        threshold: f32,
    ) -> impl Future<Output = Result<SpoofVerdict, DetectionError>> + Send {
        async move {
            let detections = self.detect_spoof_devices(image).await?;
            Ok(evaluate(&detections, roi.as_ref(), threshold))
        }
    }
}
