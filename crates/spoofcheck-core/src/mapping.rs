use crate::codec::DetectedSpoof;
use crate::geometry::LetterboxTransform;

/// Project canvas-space detections back into original-image coordinates.
/// Order and confidences are preserved.
pub fn map_to_original(
    detections: &[DetectedSpoof],
    transform: &LetterboxTransform,
) -> Vec<DetectedSpoof> {
    detections
        .iter()
        .map(|d| DetectedSpoof::new(transform.inverse_box(&d.bounding_box), d.confidence))
        .collect()
}

impl DetectedSpoof {
    /// The same detection reflected about the vertical centreline of an image
    /// `image_width` wide. Useful when the image is shown mirrored, e.g. a
    /// front camera preview.
    pub fn mirrored(&self, image_width: f64) -> Self {
        Self::new(self.bounding_box.mirrored(image_width), self.confidence)
    }
}

/// Mirror every detection; see [`DetectedSpoof::mirrored`].
pub fn mirror_all(detections: &[DetectedSpoof], image_width: f64) -> Vec<DetectedSpoof> {
    detections.iter().map(|d| d.mirrored(image_width)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn close(a: &BoundingBox, b: &BoundingBox) -> bool {
        (a.xmin - b.xmin).abs() < 1e-3
            && (a.ymin - b.ymin).abs() < 1e-3
            && (a.xmax - b.xmax).abs() < 1e-3
            && (a.ymax - b.ymax).abs() < 1e-3
    }

    #[test]
    fn test_maps_canvas_box_to_original() {
        // 1920x1080 → scale 1/3, ty = 140
        let t = LetterboxTransform::fit(1920.0, 1080.0, 640.0).unwrap();
        let canvas = [DetectedSpoof::new(BoundingBox::new(100.0, 240.0, 400.0, 440.0), 0.8)];
        let mapped = map_to_original(&canvas, &t);
        assert_eq!(mapped.len(), 1);
        assert!(close(
            &mapped[0].bounding_box,
            &BoundingBox::new(300.0, 300.0, 1200.0, 900.0)
        ));
        assert_eq!(mapped[0].confidence, 0.8);
    }

    #[test]
    fn test_mapping_then_forward_reproduces_canvas_box() {
        let t = LetterboxTransform::fit(3024.0, 4032.0, 640.0).unwrap();
        let canvas = vec![
            DetectedSpoof::new(BoundingBox::new(0.0, 0.0, 640.0, 640.0), 0.4),
            DetectedSpoof::new(BoundingBox::new(150.0, 33.3, 321.0, 500.7), 0.7),
        ];
        let mapped = map_to_original(&canvas, &t);
        for (c, m) in canvas.iter().zip(&mapped) {
            assert!(close(&t.forward_box(&m.bounding_box), &c.bounding_box));
        }
    }

    #[test]
    fn test_preserves_order() {
        let t = LetterboxTransform::fit(640.0, 480.0, 640.0).unwrap();
        let canvas: Vec<_> = (0..5)
            .map(|i| {
                let f = i as f64 * 10.0;
                DetectedSpoof::new(BoundingBox::new(f, 100.0, f + 5.0, 110.0), i as f32 / 10.0)
            })
            .collect();
        let mapped = map_to_original(&canvas, &t);
        let confidences: Vec<f32> = mapped.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.0, 0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_mirror_twice_is_identity() {
        let d = DetectedSpoof::new(BoundingBox::new(10.0, 20.0, 110.0, 220.0), 0.66);
        let once = d.mirrored(1000.0);
        assert_eq!(once.bounding_box, BoundingBox::new(890.0, 20.0, 990.0, 220.0));
        assert_eq!(once.confidence, 0.66);
        assert_eq!(once.mirrored(1000.0), d);
    }

    #[test]
    fn test_mirror_all() {
        let dets = [
            DetectedSpoof::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.1),
            DetectedSpoof::new(BoundingBox::new(90.0, 0.0, 100.0, 10.0), 0.2),
        ];
        let mirrored = mirror_all(&dets, 100.0);
        assert_eq!(mirrored[0].bounding_box, dets[1].bounding_box);
        assert_eq!(mirrored[1].bounding_box, dets[0].bounding_box);
    }
}
