use std::sync::Arc;

use crate::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_region::FaceRegion;
use crate::pipeline::modes::enroll_mode::EnrollMode;
use crate::pipeline::modes::object_tag_mode::ObjectTagMode;
use crate::pipeline::modes::recognize_mode::RecognizeMode;
use crate::pipeline::modes::spoof_check_mode::SpoofCheckMode;
use crate::pipeline::ui_context::UiTask;
use crate::pipeline::ui_state::{FrameGeometry, UiState};
use crate::shared::pipeline_settings::{Mode, PipelineSettings};
use crate::tracking::domain::detection_state_tracker::EdgeEvent;

/// Which engine call the pipeline runs for the active mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionKind {
    LargestFace,
    Objects,
}

/// Per-frame view handed to the active mode on the worker.
///
/// Modes never touch UI state directly; they queue effects with
/// [`on_ui`](Self::on_ui), which the pipeline ships to the UI context
/// together with the rest of the frame's report.
pub struct ModeContext<'a> {
    pub engine: &'a Arc<dyn DetectionEngine>,
    pub image: &'a EngineImage,
    pub detection: &'a DetectionOutcome,
    pub geometry: FrameGeometry,
    /// Snapshot taken when the frame entered the pipeline.
    pub object_detection_enabled: bool,
    effects: Vec<UiTask>,
}

impl<'a> ModeContext<'a> {
    pub fn new(
        engine: &'a Arc<dyn DetectionEngine>,
        image: &'a EngineImage,
        detection: &'a DetectionOutcome,
        geometry: FrameGeometry,
        object_detection_enabled: bool,
    ) -> Self {
        Self {
            engine,
            image,
            detection,
            geometry,
            object_detection_enabled,
            effects: Vec::new(),
        }
    }

    /// The accepted face of this frame, if any.
    pub fn face(&self) -> Option<&'a FaceRegion> {
        match self.detection {
            DetectionOutcome::Face(face) => Some(face),
            _ => None,
        }
    }

    pub fn on_ui(&mut self, task: impl FnOnce(&mut UiState) + Send + 'static) {
        self.effects.push(Box::new(task));
    }

    pub fn into_effects(self) -> Vec<UiTask> {
        self.effects
    }
}

/// One domain behaviour plugged into the frame pipeline.
///
/// Hooks run on the frame worker in this order: `on_presence_edge` (only
/// when face presence changed), then `on_frame`. Either may return a
/// refined outcome that replaces the raw detection for this frame.
pub trait ModeController: Send {
    fn mode(&self) -> Mode;

    fn detection_kind(&self) -> DetectionKind {
        DetectionKind::LargestFace
    }

    fn on_presence_edge(
        &mut self,
        _event: &EdgeEvent<()>,
        _ctx: &mut ModeContext<'_>,
    ) -> Option<DetectionOutcome> {
        None
    }

    fn on_frame(&mut self, _ctx: &mut ModeContext<'_>) -> Option<DetectionOutcome> {
        None
    }

    /// Forget anything carried over from the previous activation.
    fn reset(&mut self) {}
}

/// Face box only.
pub struct FaceDetectMode;

impl ModeController for FaceDetectMode {
    fn mode(&self) -> Mode {
        Mode::FaceDetect
    }
}

pub fn build_mode(settings: &PipelineSettings) -> Box<dyn ModeController> {
    match settings.mode {
        Mode::FaceDetect => Box::new(FaceDetectMode),
        Mode::Enroll => Box::new(EnrollMode::new()),
        Mode::Recognize => Box::new(RecognizeMode::new(&settings.collection)),
        Mode::SpoofCheck => Box::new(SpoofCheckMode::new(settings.spoof_threshold)),
        Mode::ObjectTag => Box::new(ObjectTagMode::new(&settings.ignore_label)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mode_matches_settings() {
        for &mode in Mode::ALL {
            let settings = PipelineSettings {
                mode,
                ..PipelineSettings::default()
            };
            assert_eq!(build_mode(&settings).mode(), mode);
        }
    }

    #[test]
    fn test_only_object_tag_detects_objects() {
        for &mode in Mode::ALL {
            let settings = PipelineSettings {
                mode,
                ..PipelineSettings::default()
            };
            let expected = if mode == Mode::ObjectTag {
                DetectionKind::Objects
            } else {
                DetectionKind::LargestFace
            };
            assert_eq!(build_mode(&settings).detection_kind(), expected);
        }
    }
}
