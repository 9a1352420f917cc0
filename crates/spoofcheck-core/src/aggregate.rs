//! Reduction of spoof device detections to a single score.
//!
//! A face is considered presented on a spoof device when some detected device
//! fully encloses the face. Detections that do not contain the region of
//! interest are ignored: a phone lying elsewhere in the frame says nothing
//! about the face itself.

use crate::codec::DetectedSpoof;
use crate::geometry::BoundingBox;

/// Default score at or above which an image is reported as a spoof.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Result of evaluating detections against a region of interest.
#[derive(Debug, Clone)]
pub struct SpoofVerdict {
    /// Highest confidence among detections enclosing the ROI (0.0 if none).
    pub score: f32,
    /// Whether `score` reached the threshold.
    pub is_spoof: bool,
    /// Number of detections that enclosed the ROI.
    pub contributing: usize,
}

/// Maximum confidence among detections whose box contains `roi`.
///
/// With no ROI every detection counts. Returns `0.0` when nothing remains.
pub fn spoof_score(detections: &[DetectedSpoof], roi: Option<&BoundingBox>) -> f32 {
    enclosing(detections, roi)
        .map(|d| d.confidence)
        .fold(0.0f32, f32::max)
}

/// Score the detections and compare against `threshold`.
pub fn evaluate(
    detections: &[DetectedSpoof],
    roi: Option<&BoundingBox>,
    threshold: f32,
) -> SpoofVerdict {
    let score = spoof_score(detections, roi);
    SpoofVerdict {
        score,
        is_spoof: score >= threshold,
        contributing: enclosing(detections, roi).count(),
    }
}

fn enclosing<'a>(
    detections: &'a [DetectedSpoof],
    roi: Option<&'a BoundingBox>,
) -> impl Iterator<Item = &'a DetectedSpoof> + 'a {
    detections
        .iter()
        .filter(move |d| roi.map_or(true, |r| d.bounding_box.contains_box(r)))
}
