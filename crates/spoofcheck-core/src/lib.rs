//! spoofcheck-core — letterbox geometry, canonical frame normalization,
//! detection wire codec and spoof scoring.
//!
//! Nothing in this crate performs network I/O. A [`SpoofDetector`]
//! implementation (see `spoofcheck-client`) ties the pieces together:
//!
//! 1. [`normalize`] the image into an `L×L` [`CanonicalFrame`], recording the
//!    [`LetterboxTransform`] used;
//! 2. [`encode_request`] the frame's PNG;
//! 3. [`decode_response`] the service's reply;
//! 4. [`map_to_original`] with the same transform;
//! 5. optionally reduce with [`spoof_score`].

pub mod aggregate;
pub mod capture;
pub mod codec;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod normalize;

pub use aggregate::{evaluate, spoof_score, SpoofVerdict, DEFAULT_CONFIDENCE_THRESHOLD};
pub use capture::{CapturedImage, Orientation};
pub use codec::{decode_response, encode_request, DetectedSpoof, EncodedRequest, WireFormat};
pub use detector::SpoofDetector;
pub use error::{DecodeError, DetectionError, NetworkError};
pub use geometry::{BoundingBox, GeometryError, LetterboxTransform, Point};
pub use mapping::{map_to_original, mirror_all};
pub use normalize::{normalize, CanonicalFrame, DEFAULT_FRAME_SIDE};
