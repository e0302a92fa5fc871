use crate::detection::domain::detection_engine::{SpoofLabel, SpoofResult};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::engine_error::EngineErrorCode;
use crate::pipeline::mode_controller::{ModeContext, ModeController};
use crate::pipeline::ui_state::LabelColor;
use crate::shared::pipeline_settings::Mode;
use crate::tracking::domain::detection_state_tracker::EdgeEvent;

/// Runs liveness classification once per appearance of a face.
pub struct SpoofCheckMode {
    threshold: f32,
}

impl SpoofCheckMode {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

/// Status text and colour for a liveness verdict.
pub fn spoof_label_text(result: &SpoofResult) -> (String, LabelColor) {
    if !result.is_ok() {
        let label = EngineErrorCode::label_for_raw(result.error_code);
        return (format!("Error: {label}"), LabelColor::White);
    }
    match result.label {
        SpoofLabel::Real => (
            format!("Real Face\nScore: {:.2}", result.score),
            LabelColor::Green,
        ),
        SpoofLabel::Fake => (
            format!("Fake Face\nScore: {:.2}", result.score),
            LabelColor::Red,
        ),
    }
}

impl ModeController for SpoofCheckMode {
    fn mode(&self) -> Mode {
        Mode::SpoofCheck
    }

    fn on_presence_edge(
        &mut self,
        event: &EdgeEvent<()>,
        ctx: &mut ModeContext<'_>,
    ) -> Option<DetectionOutcome> {
        match event {
            EdgeEvent::Appeared(()) | EdgeEvent::Changed { .. } => {
                let face = ctx.face()?;
                let result = ctx.engine.detect_spoof(ctx.image, face, self.threshold);
                log::info!(
                    "Spoof check: {:?} score {:.2} ({})",
                    result.label,
                    result.score,
                    EngineErrorCode::label_for_raw(result.error_code)
                );
                let (text, color) = spoof_label_text(&result);
                ctx.on_ui(move |ui| ui.status.set(text, color));
                Some(DetectionOutcome::Spoof(result))
            }
            EdgeEvent::Disappeared(()) => {
                ctx.on_ui(|ui| ui.status.clear());
                None
            }
        }
    }
}
