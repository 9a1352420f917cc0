//! spoofcheck-client — spoof device detection against a remote inference service.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use spoofcheck_client::{ClientConfig, RemoteSpoofDetector};
//! use spoofcheck_core::{CapturedImage, SpoofDetector};
//!
//! let detector = RemoteSpoofDetector::new(ClientConfig::from_env()?)?;
//! let image = CapturedImage::open(std::path::Path::new("face.jpg"))?;
//! let score = detector.detect_spoof_score(&image, None).await?;
//! println!("spoof score: {score:.2}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod remote;

pub use cache::{cache_key, CacheKey, CachedDetector};
pub use config::{ClientConfig, ConfigError};
pub use remote::{RemoteSpoofDetector, API_KEY_HEADER, MAX_RESPONSE_BYTES};
