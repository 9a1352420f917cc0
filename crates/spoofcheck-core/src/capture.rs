use std::borrow::Cow;
use std::path::Path;

use image::DynamicImage;

use crate::error::DetectionError;

/// How stored pixels must be transformed to appear upright on screen
/// (EXIF orientation tag semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    NoTransforms,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Rotate90FlipH,
    Rotate270FlipH,
}

impl Orientation {
    /// Parse an EXIF orientation value (1-8).
    pub fn from_exif(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::NoTransforms),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Rotate90FlipH),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Rotate270FlipH),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub fn to_exif(self) -> u8 {
        match self {
            Self::NoTransforms => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Rotate90FlipH => 5,
            Self::Rotate90 => 6,
            Self::Rotate270FlipH => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Whether width and height swap when displayed.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Rotate90FlipH | Self::Rotate270FlipH
        )
    }
}

/// A captured image: stored pixels plus display orientation.
///
/// All coordinates produced by detection refer to the upright image, i.e.
/// `width()`×`height()` after the orientation has been applied.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: DynamicImage,
    orientation: Orientation,
}

impl CapturedImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            orientation: Orientation::NoTransforms,
        }
    }

    pub fn with_orientation(pixels: DynamicImage, orientation: Orientation) -> Self {
        Self {
            pixels,
            orientation,
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DetectionError> {
        let pixels = image::load_from_memory(bytes)
            .map_err(|e| DetectionError::InvalidImage(format!("cannot decode image: {e}")))?;
        Ok(Self::new(pixels))
    }

    /// Open and decode an image file.
    pub fn open(path: &Path) -> Result<Self, DetectionError> {
        let pixels = image::open(path).map_err(|e| {
            DetectionError::InvalidImage(format!("cannot open {}: {e}", path.display()))
        })?;
        Ok(Self::new(pixels))
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Stored pixels, before orientation is applied.
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    /// Upright width.
    pub fn width(&self) -> u32 {
        if self.orientation.swaps_axes() {
            self.pixels.height()
        } else {
            self.pixels.width()
        }
    }

    /// Upright height.
    pub fn height(&self) -> u32 {
        if self.orientation.swaps_axes() {
            self.pixels.width()
        } else {
            self.pixels.height()
        }
    }

    /// The image as it is displayed.
    pub fn upright(&self) -> Cow<'_, DynamicImage> {
        let p = &self.pixels;
        match self.orientation {
            Orientation::NoTransforms => Cow::Borrowed(p),
            Orientation::Rotate90 => Cow::Owned(p.rotate90()),
            Orientation::Rotate180 => Cow::Owned(p.rotate180()),
            Orientation::Rotate270 => Cow::Owned(p.rotate270()),
            Orientation::FlipHorizontal => Cow::Owned(p.fliph()),
            Orientation::FlipVertical => Cow::Owned(p.flipv()),
            Orientation::Rotate90FlipH => Cow::Owned(p.rotate90().fliph()),
            Orientation::Rotate270FlipH => Cow::Owned(p.rotate270().fliph()),
        }
    }
}

impl From<DynamicImage> for CapturedImage {
    fn from(pixels: DynamicImage) -> Self {
        Self::new(pixels)
    }
}
