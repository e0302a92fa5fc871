use crate::detection::domain::detection_engine::SpoofResult;
use crate::detection::domain::face_region::{FaceRegion, ObjectRegion};

/// What one frame yielded for the active mode. Exactly one per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionOutcome {
    NoDetection,
    Face(FaceRegion),
    Objects(Vec<ObjectRegion>),
    Spoof(SpoofResult),
    Recognition {
        identity: Option<String>,
        similarity: f32,
    },
}
