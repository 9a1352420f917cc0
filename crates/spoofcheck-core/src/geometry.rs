//! Letterbox geometry: the forward mapping from an arbitrary image size into
//! a fixed square canvas, and its exact inverse.
//!
//! The forward map scales uniformly by `s = min(L / w, L / h)` and centres the
//! scaled image inside the `L×L` canvas. Detections come back from the service
//! in canvas coordinates; [`LetterboxTransform::inverse_box`] projects them
//! back into the caller's pixel space.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("image dimensions must be positive and finite, got {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("canvas side length must be positive and finite, got {0}")]
    InvalidSide(f64),
}

/// A point in either original-image or canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box. Always normalized so that `xmin <= xmax` and `ymin <= ymax`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            xmin: a.x.min(b.x),
            ymin: a.y.min(b.y),
            xmax: a.x.max(b.x),
            ymax: a.y.max(b.y),
        }
    }

    /// Build a box from edge coordinates, swapping them if given out of order.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::from_corners(Point::new(xmin, ymin), Point::new(xmax, ymax))
    }

    /// Build a box from its top-left origin and size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn min(&self) -> Point {
        Point::new(self.xmin, self.ymin)
    }

    pub fn max(&self) -> Point {
        Point::new(self.xmax, self.ymax)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// True if `other` lies entirely within this box (edges inclusive).
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min()) && self.contains_point(other.max())
    }

    /// Reflect horizontally about the vertical centreline of an image of the given width.
    pub fn mirrored(&self, image_width: f64) -> Self {
        Self::new(
            image_width - self.xmin,
            self.ymin,
            image_width - self.xmax,
            self.ymax,
        )
    }
}

/// Uniform scale + translation taking original-image coordinates into a
/// square canvas of side `side`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
    pub side: f64,
    pub source_width: f64,
    pub source_height: f64,
}

impl LetterboxTransform {
    /// Compute the letterbox transform for an image of `width`×`height`
    /// into a `side`×`side` canvas.
    pub fn fit(width: f64, height: f64, side: f64) -> Result<Self, GeometryError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(GeometryError::InvalidDimensions { width, height });
        }
        if !side.is_finite() || side <= 0.0 {
            return Err(GeometryError::InvalidSide(side));
        }

        let scale = (side / width).min(side / height);
        Ok(Self {
            scale,
            tx: (side - width * scale) / 2.0,
            ty: (side - height * scale) / 2.0,
            side,
            source_width: width,
            source_height: height,
        })
    }

    pub fn forward(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.tx, p.y * self.scale + self.ty)
    }

    pub fn inverse(&self, p: Point) -> Point {
        Point::new((p.x - self.tx) / self.scale, (p.y - self.ty) / self.scale)
    }

    /// Map a box into canvas space, corner by corner.
    pub fn forward_box(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(self.forward(b.min()), self.forward(b.max()))
    }

    /// Map a canvas-space box back into original-image space, corner by corner.
    pub fn inverse_box(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(self.inverse(b.min()), self.inverse(b.max()))
    }

    /// Size of the source image once scaled into the canvas.
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.source_width * self.scale, self.source_height * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-3;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_landscape_letterbox() {
        let t = LetterboxTransform::fit(1920.0, 1080.0, 640.0).unwrap();
        assert!((t.scale - 640.0 / 1920.0).abs() < 1e-12);
        assert!(t.tx.abs() < 1e-9);
        // 1080 * (1/3) = 360 → 140 px bars top and bottom
        assert!((t.ty - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_portrait_letterbox() {
        let t = LetterboxTransform::fit(3024.0, 4032.0, 640.0).unwrap();
        assert!((t.scale - 640.0 / 4032.0).abs() < 1e-12);
        assert!(t.ty.abs() < 1e-9);
        let (w, _) = t.scaled_size();
        assert!((t.tx - (640.0 - w) / 2.0).abs() < 1e-9);
        assert!(t.tx > 0.0);
    }

    #[test]
    fn test_square_fills_canvas() {
        let t = LetterboxTransform::fit(320.0, 320.0, 640.0).unwrap();
        assert!((t.scale - 2.0).abs() < 1e-12);
        assert_eq!(t.tx, 0.0);
        assert_eq!(t.ty, 0.0);
    }

    #[test]
    fn test_aspect_preserved() {
        for &(w, h) in &[(1.0, 1000.0), (4000.0, 3000.0), (17.0, 5.0), (640.0, 480.0)] {
            let t = LetterboxTransform::fit(w, h, 640.0).unwrap();
            let (sw, sh) = t.scaled_size();
            assert!((sw / w - sh / h).abs() < 1e-12);
            assert!(sw <= 640.0 + 1e-9 && sh <= 640.0 + 1e-9);
            // The longer side always spans the canvas.
            assert!((sw.max(sh) - 640.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_round_trip_points() {
        let sizes = [(1920.0, 1080.0), (3024.0, 4032.0), (1.0, 1.0), (7.0, 9000.0)];
        for &(w, h) in &sizes {
            let t = LetterboxTransform::fit(w, h, 640.0).unwrap();
            for i in 0..=10 {
                for j in 0..=10 {
                    let p = Point::new(w * i as f64 / 10.0, h * j as f64 / 10.0);
                    assert!(approx(t.inverse(t.forward(p)), p), "{w}x{h} {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_corners_map_to_drawn_region() {
        let t = LetterboxTransform::fit(1920.0, 1080.0, 640.0).unwrap();
        assert!(approx(t.forward(Point::new(0.0, 0.0)), Point::new(0.0, 140.0)));
        assert!(approx(
            t.forward(Point::new(1920.0, 1080.0)),
            Point::new(640.0, 500.0)
        ));
    }

    #[test]
    fn test_box_round_trip() {
        let t = LetterboxTransform::fit(1280.0, 720.0, 640.0).unwrap();
        let canvas = BoundingBox::new(100.0, 200.0, 400.0, 380.0);
        let original = t.inverse_box(&canvas);
        let back = t.forward_box(&original);
        assert!(approx(back.min(), canvas.min()));
        assert!(approx(back.max(), canvas.max()));
    }

    #[test]
    fn test_rejects_zero_and_nan() {
        assert!(matches!(
            LetterboxTransform::fit(0.0, 100.0, 640.0),
            Err(GeometryError::InvalidDimensions { .. })
        ));
        assert!(LetterboxTransform::fit(100.0, -1.0, 640.0).is_err());
        assert!(LetterboxTransform::fit(f64::NAN, 100.0, 640.0).is_err());
        assert!(matches!(
            LetterboxTransform::fit(100.0, 100.0, 0.0),
            Err(GeometryError::InvalidSide(_))
        ));
    }

    #[test]
    fn test_box_normalizes_corners() {
        let b = BoundingBox::new(10.0, 20.0, 5.0, 2.0);
        assert_eq!(b, BoundingBox::new(5.0, 2.0, 10.0, 20.0));
        assert_eq!(b.width(), 5.0);
        assert_eq!(b.height(), 18.0);
    }

    #[test]
    fn test_contains_box_edges_inclusive() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_box(&outer));
        assert!(outer.contains_box(&BoundingBox::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_box(&BoundingBox::new(90.0, 90.0, 110.0, 95.0)));
    }

    #[test]
    fn test_mirror_twice_is_identity() {
        let b = BoundingBox::new(12.5, 30.0, 200.0, 90.0);
        let once = b.mirrored(640.0);
        assert_eq!(once, BoundingBox::new(440.0, 30.0, 627.5, 90.0));
        assert_eq!(once.mirrored(640.0), b);
    }
}
