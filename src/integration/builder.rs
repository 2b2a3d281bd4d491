//! Builder for creating Detection objects from various box formats.

use crate::tracker::{Detection, Rect};

/// Builder for `Detection` values from detector output.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: u32,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box from a center point and size, as YOLO-style heads emit.
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn class_id(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn build(self) -> Detection {
        let bbox = Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2);
        Detection::from_rect(bbox, self.score, self.class_id)
    }
}
