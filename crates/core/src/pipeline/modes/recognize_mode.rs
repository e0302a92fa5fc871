use crate::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_region::FaceRegion;
use crate::pipeline::mode_controller::{ModeContext, ModeController};
use crate::pipeline::ui_state::LabelColor;
use crate::shared::constants::{RECOGNITION_ERROR_LABEL, UNKNOWN_PERSON_LABEL};
use crate::shared::pipeline_settings::Mode;
use crate::tracking::domain::detection_state_tracker::{DetectionStateTracker, EdgeEvent};

/// Identity reading for one frame. Similarity is left out so that score
/// jitter on the same person does not count as a change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionLabel {
    Known { identity: String },
    Unknown,
    Error,
}

/// Identifies the present face on every frame and updates the status
/// label only when the identity reading changes.
pub struct RecognizeMode {
    collection: String,
    identity: DetectionStateTracker<RecognitionLabel>,
}

impl RecognizeMode {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            identity: DetectionStateTracker::new(),
        }
    }

    fn identify(
        &self,
        engine: &dyn DetectionEngine,
        image: &EngineImage,
        face: &FaceRegion,
    ) -> (RecognitionLabel, f32) {
        let Some(vector) = engine.extract_feature_vector(image, face) else {
            log::debug!("Feature extraction failed");
            return (RecognitionLabel::Error, 0.0);
        };
        match engine.identify_top_candidate(&vector, &self.collection) {
            Ok(Some(candidate)) => (
                RecognitionLabel::Known {
                    identity: candidate.identity,
                },
                candidate.similarity,
            ),
            Ok(None) => (RecognitionLabel::Unknown, 0.0),
            Err(e) => {
                log::warn!("Identification in {} failed: {e}", self.collection);
                (RecognitionLabel::Error, 0.0)
            }
        }
    }
}

/// Status text and colour for a recognition reading.
pub fn recognition_label_text(label: &RecognitionLabel, similarity: f32) -> (String, LabelColor) {
    match label {
        RecognitionLabel::Known { identity } => (
            format!("{identity}\nConfidence: {:.2}%", similarity * 100.0),
            LabelColor::Green,
        ),
        RecognitionLabel::Unknown => (UNKNOWN_PERSON_LABEL.to_string(), LabelColor::Default),
        RecognitionLabel::Error => (RECOGNITION_ERROR_LABEL.to_string(), LabelColor::Red),
    }
}

impl ModeController for RecognizeMode {
    fn mode(&self) -> Mode {
        Mode::Recognize
    }

    fn on_presence_edge(
        &mut self,
        event: &EdgeEvent<()>,
        ctx: &mut ModeContext<'_>,
    ) -> Option<DetectionOutcome> {
        if let EdgeEvent::Disappeared(()) = event {
            self.identity.reset();
            ctx.on_ui(|ui| ui.status.clear());
        }
        None
    }

    fn on_frame(&mut self, ctx: &mut ModeContext<'_>) -> Option<DetectionOutcome> {
        let face = ctx.face()?;
        let (label, similarity) = self.identify(ctx.engine.as_ref(), ctx.image, face);

        if let Some(edge) = self.identity.observe(Some(label.clone())) {
            log::info!("Recognition: {:?}", edge.current());
            let (text, color) = recognition_label_text(&label, similarity);
            ctx.on_ui(move |ui| ui.status.set(text, color));
        }

        let identity = match label {
            RecognitionLabel::Known { identity } => Some(identity),
            _ => None,
        };
        Some(DetectionOutcome::Recognition {
            identity,
            similarity,
        })
    }

    fn reset(&mut self) {
        self.identity.reset();
    }
}
