use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A point in image-pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Point {
    fn from(p: [f32; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Axis-aligned bounding box with format conversion utilities.
///
/// Supports three bounding box formats:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - XYSR: Center X, Center Y, Scale (area), Ratio (w/h), the Kalman measurement space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from XYSR format (center x, center y, scale, ratio).
    ///
    /// A non-positive `scale * ratio` yields a zero-sized box at the center.
    pub fn from_xysr(cx: f64, cy: f64, scale: f64, ratio: f64) -> Self {
        let wr = scale * ratio;
        let (width, height) = if wr > 0.0 && scale.is_finite() {
            let w = wr.sqrt();
            (w, scale / w)
        } else {
            (0.0, 0.0)
        };
        Self {
            x: (cx - width / 2.0) as f32,
            y: (cy - height / 2.0) as f32,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to XYSR format: (center_x, center_y, area, width / height).
    pub fn to_xysr(&self) -> [f64; 4] {
        let (cx, cy) = self.center();
        let w = self.width as f64;
        let h = self.height as f64;
        let ratio = if h > 0.0 { w / h } else { 0.0 };
        [cx as f64, cy as f64, w * h, ratio]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn centroid(&self) -> Point {
        let (cx, cy) = self.center();
        Point::new(cx, cy)
    }

    /// Get the area of the bounding box. Inverted boxes have zero area.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Zero when the boxes do not overlap, when either box has zero area,
    /// or when the union is not positive.
    pub fn iou(&self, other: &Rect) -> f32 {
        let area_a = self.area();
        let area_b = other.area();
        if area_a <= 0.0 || area_b <= 0.0 {
            return 0.0;
        }

        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = area_a + area_b - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f64> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b) as f64;
        }
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_xysr_conversions() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        let xysr = rect.to_xysr();
        assert_eq!(xysr[0], 25.0);
        assert_eq!(xysr[1], 40.0);
        assert_eq!(xysr[2], 1200.0);
        assert!((xysr[3] - 0.75).abs() < 1e-9);

        let back = Rect::from_xysr(xysr[0], xysr[1], xysr[2], xysr[3]);
        assert!((back.x - 10.0).abs() < 1e-4);
        assert!((back.y - 20.0).abs() < 1e-4);
        assert!((back.width - 30.0).abs() < 1e-4);
        assert!((back.height - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_from_xysr_degenerate_scale() {
        let rect = Rect::from_xysr(50.0, 60.0, -4.0, 1.0);
        assert_eq!(rect.area(), 0.0);
        assert_eq!(rect.center(), (50.0, 60.0));
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection: 5x5 = 25
        // Union: 100 + 100 - 25 = 175
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_zero_area() {
        let a = Rect::new(5.0, 5.0, 0.0, 0.0);
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 10.0, 10.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let ious = iou_batch(&a, &b);
        assert_eq!(ious.dim(), (2, 1));
        assert!((ious[[0, 0]] - 1.0).abs() < 1e-9);
        assert_eq!(ious[[1, 0]], 0.0);
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(10.0, 10.0);
        let b = Point::new(13.0, 14.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
