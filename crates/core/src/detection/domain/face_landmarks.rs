//! 5-point face landmarks as reported alongside a detected face.

use crate::shared::rect::{Point, Rect};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceLandmarks {
    /// [left_eye, right_eye, nose, left_mouth, right_mouth], sensor pixels.
    points: [Point; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Point; 5]) -> Self {
        Self { points }
    }

    /// Landmarks laid out proportionally inside a face box.
    pub fn estimated_for(rect: &Rect) -> Self {
        let at = |fx: f64, fy: f64| Point::new(rect.x + rect.width * fx, rect.y + rect.height * fy);
        Self::new([
            at(0.3, 0.35),
            at(0.7, 0.35),
            at(0.5, 0.55),
            at(0.35, 0.75),
            at(0.65, 0.75),
        ])
    }

    pub fn points(&self) -> &[Point; 5] {
        &self.points
    }
}
