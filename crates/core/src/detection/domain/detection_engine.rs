use std::sync::Arc;

use image::RgbImage;

use crate::detection::domain::engine_error::{EngineError, EngineErrorCode};
use crate::detection::domain::face_region::{FaceRegion, ObjectRegion};

/// An image in the engine's internal representation. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EngineImage {
    pixels: Arc<RgbImage>,
}

impl EngineImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Fixed-size face embedding compared by cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    /// Cosine similarity in [-1, 1]; zero for empty, zero-norm or
    /// mismatched vectors.
    pub fn similarity(&self, other: &FeatureVector) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        let norm_a = self.0.iter().map(|a| a * a).sum::<f32>().sqrt();
        let norm_b = other.0.iter().map(|b| b * b).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

/// Closest enrolled identity for a probe vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub identity: String,
    pub similarity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpoofLabel {
    Real,
    Fake,
}

/// Liveness verdict. `label` and `score` are meaningful only when
/// `error_code` is the engine's success code.
#[derive(Clone, Debug, PartialEq)]
pub struct SpoofResult {
    pub label: SpoofLabel,
    pub score: f32,
    /// Raw engine status; may fall outside the known table.
    pub error_code: i32,
}

impl SpoofResult {
    pub fn is_ok(&self) -> bool {
        self.error_code == EngineErrorCode::NoError.raw()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrolledIdentity {
    pub identity: String,
    pub uuid: String,
}

/// Opaque face and object analysis engine.
///
/// All calls are synchronous and may be invoked repeatedly from the
/// frame-delivery worker; implementations synchronise internally.
pub trait DetectionEngine: Send + Sync {
    /// Imports a packed RGB frame. `None` when the engine rejects it.
    fn preprocess(&self, frame: RgbImage) -> Option<EngineImage>;

    fn detect_largest_face(&self, image: &EngineImage) -> Option<FaceRegion>;

    fn detect_objects(&self, image: &EngineImage) -> Vec<ObjectRegion>;

    fn extract_feature_vector(&self, image: &EngineImage, face: &FaceRegion)
        -> Option<FeatureVector>;

    /// `Ok(None)` when nothing in the collection is similar enough.
    fn identify_top_candidate(
        &self,
        probe: &FeatureVector,
        collection: &str,
    ) -> Result<Option<Candidate>, EngineError>;

    fn enroll(
        &self,
        vector: &FeatureVector,
        identity: &str,
        collection: &str,
    ) -> Result<(), EngineError>;

    fn detect_spoof(&self, image: &EngineImage, face: &FaceRegion, threshold: f32) -> SpoofResult;

    fn list_identities(&self, collection: &str) -> Result<Vec<EnrolledIdentity>, EngineError>;

    fn remove(&self, identity: &str, collection: &str) -> Result<(), EngineError>;
}
