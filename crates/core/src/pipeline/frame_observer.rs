use crate::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use crate::detection::domain::face_region::FaceRegion;

/// Embedder hook run on the UI context, exactly once per processed frame.
///
/// Receives the engine and the preprocessed image so it can run its own
/// follow-up calls (quality checks, crops) without another round of
/// preprocessing.
pub trait FrameObserver: Send {
    fn on_detected(&mut self, engine: &dyn DetectionEngine, image: &EngineImage, face: &FaceRegion);

    fn on_not_detected(&mut self, engine: &dyn DetectionEngine, image: &EngineImage);
}
