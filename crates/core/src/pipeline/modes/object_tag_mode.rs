use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_region::ObjectRegion;
use crate::overlay::domain::overlay_renderer::OverlayCategory;
use crate::overlay::domain::overlay_surface::{OverlayColor, ShapeSpec};
use crate::pipeline::mode_controller::{DetectionKind, ModeContext, ModeController};
use crate::shared::pipeline_settings::Mode;

/// Labels every detected object except the ignored class, rebuilding the
/// object overlay set each frame while object detection is enabled.
pub struct ObjectTagMode {
    ignore_label: String,
    showing: bool,
}

impl ObjectTagMode {
    pub fn new(ignore_label: &str) -> Self {
        Self {
            ignore_label: ignore_label.to_string(),
            showing: false,
        }
    }
}

impl ModeController for ObjectTagMode {
    fn mode(&self) -> Mode {
        Mode::ObjectTag
    }

    fn detection_kind(&self) -> DetectionKind {
        DetectionKind::Objects
    }

    fn on_frame(&mut self, ctx: &mut ModeContext<'_>) -> Option<DetectionOutcome> {
        if !ctx.object_detection_enabled {
            if self.showing {
                self.showing = false;
                ctx.on_ui(|ui| ui.renderer.remove_all(OverlayCategory::Objects));
            }
            return None;
        }

        let objects: Vec<ObjectRegion> = match ctx.detection {
            DetectionOutcome::Objects(all) => all
                .iter()
                .filter(|o| o.label != self.ignore_label)
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        self.showing = true;

        let geometry = ctx.geometry;
        let shown = objects.clone();
        ctx.on_ui(move |ui| {
            let transformer = ui.transformer(geometry);
            let specs = shown
                .into_iter()
                .filter_map(|o| {
                    let rect = transformer.apply(&o.rect)?;
                    Some(ShapeSpec::new(rect, OverlayColor::Yellow).with_label(o.label))
                })
                .collect();
            ui.renderer.sync_category(OverlayCategory::Objects, specs);
        });
        Some(DetectionOutcome::Objects(objects))
    }

    fn reset(&mut self) {
        self.showing = false;
    }
}
