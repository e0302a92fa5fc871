use crate::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::engine_error::EngineError;
use crate::detection::domain::face_region::FaceRegion;
use crate::pipeline::mode_controller::{ModeContext, ModeController};
use crate::shared::pipeline_settings::Mode;
use crate::tracking::domain::detection_state_tracker::EdgeEvent;

#[derive(Clone, Debug, PartialEq)]
pub enum EnrollOutcome {
    Enrolled { identity: String },
    /// Missing name, frame or face. Nothing was sent to the engine.
    Aborted,
    NoFeatureVector,
    Failed(EngineError),
}

/// UI-side enrollment controls: the enroll button and the frame/face pair
/// it would enroll.
#[derive(Default)]
pub struct EnrollPanel {
    available: bool,
    held: Option<(EngineImage, FaceRegion)>,
    last_outcome: Option<EnrollOutcome>,
}

impl EnrollPanel {
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn hold(&mut self, image: EngineImage, face: FaceRegion) {
        self.held = Some((image, face));
    }

    pub fn held_face(&self) -> Option<&FaceRegion> {
        self.held.as_ref().map(|(_, face)| face)
    }

    pub fn last_outcome(&self) -> Option<&EnrollOutcome> {
        self.last_outcome.as_ref()
    }

    /// Disables the button and drops the held pair.
    pub fn clear(&mut self) {
        self.available = false;
        self.held = None;
    }
}

/// Enrolls the held face under `name`.
///
/// Aborts without touching the engine when the name is blank or no
/// frame/face pair is held.
pub fn confirm_enrollment(
    panel: &mut EnrollPanel,
    name: &str,
    engine: &dyn DetectionEngine,
    collection: &str,
) -> EnrollOutcome {
    let name = name.trim();
    let outcome = match (&panel.held, name.is_empty()) {
        (Some((image, face)), false) => match engine.extract_feature_vector(image, face) {
            None => EnrollOutcome::NoFeatureVector,
            Some(vector) => match engine.enroll(&vector, name, collection) {
                Ok(()) => {
                    log::info!("Enrolled {name} into {collection}");
                    EnrollOutcome::Enrolled {
                        identity: name.to_string(),
                    }
                }
                Err(e) => {
                    log::warn!("Enrollment of {name} failed: {e}");
                    EnrollOutcome::Failed(e)
                }
            },
        },
        _ => {
            log::debug!("Enrollment aborted: name or face missing");
            EnrollOutcome::Aborted
        }
    };
    panel.last_outcome = Some(outcome.clone());
    outcome
}

/// Keeps the enroll button in step with face presence and holds the
/// latest accepted frame/face pair for [`confirm_enrollment`].
pub struct EnrollMode;

impl EnrollMode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnrollMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController for EnrollMode {
    fn mode(&self) -> Mode {
        Mode::Enroll
    }

    fn on_presence_edge(
        &mut self,
        event: &EdgeEvent<()>,
        ctx: &mut ModeContext<'_>,
    ) -> Option<DetectionOutcome> {
        match event {
            EdgeEvent::Appeared(()) => ctx.on_ui(|ui| ui.enroll.set_available(true)),
            EdgeEvent::Disappeared(()) => ctx.on_ui(|ui| ui.enroll.clear()),
            EdgeEvent::Changed { .. } => {}
        }
        None
    }

    fn on_frame(&mut self, ctx: &mut ModeContext<'_>) -> Option<DetectionOutcome> {
        if let Some(face) = ctx.face() {
            let image = ctx.image.clone();
            let face = face.clone();
            ctx.on_ui(move |ui| ui.enroll.hold(image, face));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::scripted_detection_engine::{
        Scene, ScriptedDetectionEngine, ScriptedFace,
    };
    use crate::shared::rect::Rect;
    use image::RgbImage;
    use rstest::rstest;

    fn engine(face: ScriptedFace) -> ScriptedDetectionEngine {
        ScriptedDetectionEngine::fixed(Scene {
            face: Some(face),
            ..Scene::default()
        })
    }

    fn held_panel(engine: &ScriptedDetectionEngine) -> EnrollPanel {
        let image = engine.preprocess(RgbImage::new(20, 20)).unwrap();
        let face = engine.detect_largest_face(&image).unwrap();
        let mut panel = EnrollPanel::default();
        panel.set_available(true);
        panel.hold(image, face);
        panel
    }

    #[test]
    fn test_enrolls_held_face() {
        let engine = engine(ScriptedFace::new(4));
        let mut panel = held_panel(&engine);

        let outcome = confirm_enrollment(&mut panel, "  Ada  ", &engine, "DEMO");

        assert_eq!(
            outcome,
            EnrollOutcome::Enrolled {
                identity: "Ada".into()
            }
        );
        assert_eq!(engine.list_identities("DEMO").unwrap()[0].identity, "Ada");
        assert_eq!(panel.last_outcome(), Some(&outcome));
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn test_blank_name_never_reaches_engine(#[case] name: &str) {
        let engine = engine(ScriptedFace::new(0));
        let mut panel = held_panel(&engine);

        let outcome = confirm_enrollment(&mut panel, name, &engine, "DEMO");

        assert_eq!(outcome, EnrollOutcome::Aborted);
        assert_eq!(engine.enroll_calls(), 0);
        assert!(engine.list_identities("DEMO").unwrap().is_empty());
    }

    #[test]
    fn test_missing_face_never_reaches_engine() {
        let engine = engine(ScriptedFace::new(0));
        let mut panel = EnrollPanel::default();

        let outcome = confirm_enrollment(&mut panel, "Ada", &engine, "DEMO");

        assert_eq!(outcome, EnrollOutcome::Aborted);
        assert_eq!(engine.enroll_calls(), 0);
    }

    #[test]
    fn test_unextractable_face() {
        let engine = engine(ScriptedFace::new(0).unextractable());
        let mut panel = held_panel(&engine);

        let outcome = confirm_enrollment(&mut panel, "Ada", &engine, "DEMO");

        assert_eq!(outcome, EnrollOutcome::NoFeatureVector);
        assert_eq!(engine.enroll_calls(), 0);
    }

    #[test]
    fn test_clear_drops_held_pair() {
        let mut panel = EnrollPanel::default();
        panel.set_available(true);
        panel.hold(
            EngineImage::new(RgbImage::new(2, 2)),
            FaceRegion::new(Rect::new(0.0, 0.0, 1.0, 1.0), 0.99),
        );

        panel.clear();

        assert!(!panel.is_available());
        assert!(panel.held_face().is_none());
    }
}
