use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::rect::{Point, Rect};

/// A face reported by the engine, in sensor pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub top_left: Point,
    pub bottom_right: Point,
    /// Detector confidence in [0, 1].
    pub score: f32,
    pub landmarks: FaceLandmarks,
}

impl FaceRegion {
    pub fn new(rect: Rect, score: f32) -> Self {
        Self {
            top_left: rect.top_left(),
            bottom_right: rect.bottom_right(),
            score,
            landmarks: FaceLandmarks::estimated_for(&rect),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.top_left, self.bottom_right)
    }

    /// Counts as a present face: score strictly above `threshold`, a
    /// non-negative top-left, and a bottom-right past it on both axes.
    pub fn is_acceptable(&self, threshold: f32) -> bool {
        self.score > threshold && self.rect().is_well_formed()
    }
}

/// A labelled object box, in sensor pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRegion {
    pub rect: Rect,
    pub label: String,
    pub score: f32,
}

impl ObjectRegion {
    pub fn new(rect: Rect, label: impl Into<String>, score: f32) -> Self {
        Self {
            rect,
            label: label.into(),
            score,
        }
    }
}
