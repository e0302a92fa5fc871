use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_region::FaceRegion;
use crate::overlay::domain::overlay_renderer::ShapeId;
use crate::overlay::domain::overlay_surface::OverlayColor;
use crate::pipeline::mode_controller::{DetectionKind, ModeContext, ModeController};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::ui_context::{UiHandle, UiTask};
use crate::pipeline::ui_state::FrameGeometry;
use crate::shared::frame::{FrameBuffer, FrameConversionError};
use crate::shared::log_throttle::LogThrottle;
use crate::shared::rect::Size;
use crate::tracking::domain::detection_state_tracker::{DetectionStateTracker, EdgeEvent};

/// Toggles written by the UI side and read lock-free by the worker.
///
/// The epoch advances on every activation change; a frame whose epoch
/// is stale by the time its detection finishes is discarded.
#[derive(Debug, Default)]
pub struct PipelineControls {
    epoch: AtomicU64,
    object_detection: AtomicBool,
}

impl PipelineControls {
    pub fn new(object_detection: bool) -> Self {
        Self {
            epoch: AtomicU64::new(0),
            object_detection: AtomicBool::new(object_detection),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Returns the new epoch.
    pub fn advance_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn object_detection_enabled(&self) -> bool {
        self.object_detection.load(Ordering::Acquire)
    }

    pub fn set_object_detection(&self, enabled: bool) {
        self.object_detection.store(enabled, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    processed: AtomicU64,
    skipped: AtomicU64,
    discarded: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub skipped: u64,
    pub discarded: u64,
    /// Frames that never reached the pipeline, inferred from sequence gaps.
    pub dropped: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SkipReason {
    Conversion(FrameConversionError),
    Preprocess,
}

/// What became of one delivered frame.
#[derive(Debug, PartialEq)]
pub enum FrameDisposition {
    /// Transient failure; the next frame is processed normally.
    Skipped(SkipReason),
    /// The session was reset while the frame was in flight.
    Discarded,
    Processed(DetectionOutcome),
}

/// Per-frame orchestration on the frame-delivery worker.
///
/// Flow: `convert → preprocess → detect → presence tracking → mode → one UI report`
///
/// Everything user-facing produced by a frame (mode effects, the face box,
/// the observer callback) travels to the UI context as a single task
/// tagged with the frame's epoch.
pub struct FramePipeline {
    engine: Arc<dyn DetectionEngine>,
    mode: Box<dyn ModeController>,
    presence: DetectionStateTracker<()>,
    controls: Arc<PipelineControls>,
    stats: Arc<PipelineStats>,
    ui: UiHandle,
    logger: Box<dyn PipelineLogger>,
    mirrored: bool,
    face_score_threshold: f32,
    seen_epoch: u64,
    last_sequence: Option<u64>,
    skip_log: LogThrottle,
    drop_log: LogThrottle,
}

impl FramePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<dyn DetectionEngine>,
        mode: Box<dyn ModeController>,
        controls: Arc<PipelineControls>,
        stats: Arc<PipelineStats>,
        ui: UiHandle,
        logger: Box<dyn PipelineLogger>,
        mirrored: bool,
        face_score_threshold: f32,
        log_interval: Duration,
    ) -> Self {
        let seen_epoch = controls.epoch();
        Self {
            engine,
            mode,
            presence: DetectionStateTracker::new(),
            controls,
            stats,
            ui,
            logger,
            mirrored,
            face_score_threshold,
            seen_epoch,
            last_sequence: None,
            skip_log: LogThrottle::new(log_interval),
            drop_log: LogThrottle::new(log_interval),
        }
    }

    pub fn is_face_present(&self) -> bool {
        self.presence.is_present()
    }

    pub fn process(&mut self, frame: FrameBuffer) -> FrameDisposition {
        let epoch = self.controls.epoch();
        if epoch != self.seen_epoch {
            log::debug!("Epoch {} -> {epoch}, resetting detection state", self.seen_epoch);
            self.presence.reset();
            self.mode.reset();
            self.seen_epoch = epoch;
            self.last_sequence = None;
        }
        let object_detection = self.controls.object_detection_enabled();
        let sequence = frame.sequence();
        self.account_drops(sequence);
        let geometry = FrameGeometry {
            source: Size::new(f64::from(frame.width()), f64::from(frame.height())),
            mirrored: self.mirrored,
        };

        let t0 = Instant::now();
        let rgb = match frame.into_rgb() {
            Ok(rgb) => rgb,
            Err(e) => return self.skip(sequence, SkipReason::Conversion(e)),
        };
        self.logger.timing("convert", elapsed_ms(t0));

        let t0 = Instant::now();
        let Some(image) = self.engine.preprocess(rgb) else {
            return self.skip(sequence, SkipReason::Preprocess);
        };
        self.logger.timing("preprocess", elapsed_ms(t0));

        let kind = self.mode.detection_kind();
        let t0 = Instant::now();
        let detection = self.detect(kind, &image, object_detection);
        self.logger.timing("detect", elapsed_ms(t0));

        if self.controls.epoch() != epoch {
            log::debug!("Discarding frame #{sequence}: session reset while in flight");
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return FrameDisposition::Discarded;
        }

        let face = match &detection {
            DetectionOutcome::Face(face) => Some(face.clone()),
            _ => None,
        };
        let edge = match kind {
            DetectionKind::LargestFace => self.presence.observe(face.as_ref().map(|_| ())),
            DetectionKind::Objects => None,
        };
        match &edge {
            Some(EdgeEvent::Appeared(())) => log::info!("Face appeared (frame #{sequence})"),
            Some(EdgeEvent::Disappeared(())) => log::info!("Face disappeared (frame #{sequence})"),
            _ => {}
        }

        let t0 = Instant::now();
        let mut ctx =
            ModeContext::new(&self.engine, &image, &detection, geometry, object_detection);
        let from_edge = edge
            .as_ref()
            .and_then(|e| self.mode.on_presence_edge(e, &mut ctx));
        let from_frame = self.mode.on_frame(&mut ctx);
        let effects = ctx.into_effects();
        self.logger.timing("mode", elapsed_ms(t0));

        let outcome = from_frame.or(from_edge).unwrap_or(detection);
        if let DetectionOutcome::Objects(objects) = &outcome {
            self.logger.metric("object_count", objects.len() as f64);
        }

        self.report(epoch, kind, geometry, image, face, effects);
        self.logger.frame(sequence);
        self.stats.processed.fetch_add(1, Ordering::Relaxed);
        FrameDisposition::Processed(outcome)
    }

    fn detect(
        &self,
        kind: DetectionKind,
        image: &EngineImage,
        object_detection: bool,
    ) -> DetectionOutcome {
        match kind {
            DetectionKind::LargestFace => match self.engine.detect_largest_face(image) {
                Some(face) if face.is_acceptable(self.face_score_threshold) => {
                    DetectionOutcome::Face(face)
                }
                Some(face) => {
                    log::trace!("Rejecting face with score {:.2}", face.score);
                    DetectionOutcome::NoDetection
                }
                None => DetectionOutcome::NoDetection,
            },
            DetectionKind::Objects if object_detection => {
                DetectionOutcome::Objects(self.engine.detect_objects(image))
            }
            DetectionKind::Objects => DetectionOutcome::NoDetection,
        }
    }

    fn report(
        &self,
        epoch: u64,
        kind: DetectionKind,
        geometry: FrameGeometry,
        image: EngineImage,
        face: Option<FaceRegion>,
        effects: Vec<UiTask>,
    ) {
        let engine = self.engine.clone();
        self.ui.dispatch_for_epoch(epoch, move |ui| {
            for effect in effects {
                effect(ui);
            }
            if kind == DetectionKind::LargestFace {
                match &face {
                    Some(face) => {
                        if let Some(rect) = ui.transformer(geometry).apply(&face.rect()) {
                            ui.renderer
                                .update_or_create(ShapeId::FACE, rect, OverlayColor::Green, None);
                        }
                    }
                    None => ui.renderer.hide(ShapeId::FACE),
                }
            }
            if let Some(observer) = ui.record_frame() {
                match &face {
                    Some(face) => observer.on_detected(engine.as_ref(), &image, face),
                    None => observer.on_not_detected(engine.as_ref(), &image),
                }
            }
        });
    }

    fn account_drops(&mut self, sequence: u64) {
        if let Some(last) = self.last_sequence {
            let gap = sequence.saturating_sub(last + 1);
            if gap > 0 {
                let total = self.stats.dropped.fetch_add(gap, Ordering::Relaxed) + gap;
                self.logger.metric("dropped_frames", total as f64);
                if self.drop_log.should_log() {
                    log::debug!("{total} late frames dropped so far");
                }
            }
        }
        self.last_sequence = Some(sequence);
    }

    fn skip(&mut self, sequence: u64, reason: SkipReason) -> FrameDisposition {
        let skipped = self.stats.skipped.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("Skipping frame #{sequence}: {reason:?}");
        if self.skip_log.should_log() {
            log::debug!("{skipped} frames skipped so far (latest: {reason:?})");
        }
        FrameDisposition::Skipped(reason)
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.logger.summary();
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_engine::{
        Candidate, EnrolledIdentity, FeatureVector, SpoofResult,
    };
    use crate::detection::domain::engine_error::EngineError;
    use crate::detection::domain::face_region::ObjectRegion;
    use crate::detection::infrastructure::scripted_detection_engine::{
        Scene, ScriptedDetectionEngine, ScriptedFace,
    };
    use crate::overlay::domain::overlay_renderer::OverlayRenderer;
    use crate::overlay::infrastructure::recording_overlay_surface::RecordingOverlaySurface;
    use crate::pipeline::frame_observer::FrameObserver;
    use crate::pipeline::mode_controller::FaceDetectMode;
    use crate::pipeline::modes::object_tag_mode::ObjectTagMode;
    use crate::pipeline::modes::spoof_check_mode::SpoofCheckMode;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::ui_context::UiContext;
    use crate::pipeline::ui_state::UiState;
    use crate::shared::frame::PixelFormat;
    use crate::shared::pipeline_settings::Mode;
    use image::RgbImage;
    use rstest::rstest;
    use std::sync::Mutex;

    const W: u32 = 64;
    const H: u32 = 48;

    /// Records `true` for every detected frame and `false` otherwise.
    struct RecordingObserver(Arc<Mutex<Vec<bool>>>);

    impl FrameObserver for RecordingObserver {
        fn on_detected(&mut self, _: &dyn DetectionEngine, _: &EngineImage, _: &FaceRegion) {
            self.0.lock().unwrap().push(true);
        }

        fn on_not_detected(&mut self, _: &dyn DetectionEngine, _: &EngineImage) {
            self.0.lock().unwrap().push(false);
        }
    }

    /// Face-detect behaviour that also records presence edges.
    struct EdgeRecorder(Arc<Mutex<Vec<String>>>);

    impl ModeController for EdgeRecorder {
        fn mode(&self) -> Mode {
            Mode::FaceDetect
        }

        fn on_presence_edge(
            &mut self,
            event: &EdgeEvent<()>,
            _ctx: &mut ModeContext<'_>,
        ) -> Option<DetectionOutcome> {
            let name = match event {
                EdgeEvent::Appeared(()) => "appeared",
                EdgeEvent::Changed { .. } => "changed",
                EdgeEvent::Disappeared(()) => "disappeared",
            };
            self.0.lock().unwrap().push(name.to_string());
            None
        }
    }

    /// Advances the epoch from inside detection, as a deactivation racing
    /// with an in-flight frame would.
    struct EpochBumpingEngine {
        inner: ScriptedDetectionEngine,
        controls: Arc<PipelineControls>,
    }

    impl DetectionEngine for EpochBumpingEngine {
        fn preprocess(&self, frame: RgbImage) -> Option<EngineImage> {
            self.inner.preprocess(frame)
        }

        fn detect_largest_face(&self, image: &EngineImage) -> Option<FaceRegion> {
            self.controls.advance_epoch();
            self.inner.detect_largest_face(image)
        }

        fn detect_objects(&self, image: &EngineImage) -> Vec<ObjectRegion> {
            self.inner.detect_objects(image)
        }

        fn extract_feature_vector(
            &self,
            image: &EngineImage,
            face: &FaceRegion,
        ) -> Option<FeatureVector> {
            self.inner.extract_feature_vector(image, face)
        }

        fn identify_top_candidate(
            &self,
            probe: &FeatureVector,
            collection: &str,
        ) -> Result<Option<Candidate>, EngineError> {
            self.inner.identify_top_candidate(probe, collection)
        }

        fn enroll(
            &self,
            vector: &FeatureVector,
            identity: &str,
            collection: &str,
        ) -> Result<(), EngineError> {
            self.inner.enroll(vector, identity, collection)
        }

        fn detect_spoof(
            &self,
            image: &EngineImage,
            face: &FaceRegion,
            threshold: f32,
        ) -> SpoofResult {
            self.inner.detect_spoof(image, face, threshold)
        }

        fn list_identities(&self, collection: &str) -> Result<Vec<EnrolledIdentity>, EngineError> {
            self.inner.list_identities(collection)
        }

        fn remove(&self, identity: &str, collection: &str) -> Result<(), EngineError> {
            self.inner.remove(identity, collection)
        }
    }

    struct Harness {
        pipeline: FramePipeline,
        ui: UiContext,
        controls: Arc<PipelineControls>,
        stats: Arc<PipelineStats>,
        surface: RecordingOverlaySurface,
        observed: Arc<Mutex<Vec<bool>>>,
    }

    impl Harness {
        fn new(engine: Arc<dyn DetectionEngine>, mode: Box<dyn ModeController>) -> Self {
            Self::with_controls(engine, mode, Arc::new(PipelineControls::new(true)))
        }

        fn with_controls(
            engine: Arc<dyn DetectionEngine>,
            mode: Box<dyn ModeController>,
            controls: Arc<PipelineControls>,
        ) -> Self {
            let surface = RecordingOverlaySurface::new();
            let observed = Arc::new(Mutex::new(Vec::new()));
            let state = UiState::new(
                OverlayRenderer::new(Box::new(surface.clone())),
                Size::new(f64::from(W) * 2.0, f64::from(H) * 2.0),
                Some(Box::new(RecordingObserver(observed.clone()))),
                Duration::from_secs(10),
            );
            let ui = UiContext::manual(state);
            let stats = Arc::new(PipelineStats::default());
            let pipeline = FramePipeline::new(
                engine,
                mode,
                controls.clone(),
                stats.clone(),
                ui.handle(),
                Box::new(NullPipelineLogger),
                false,
                0.9,
                Duration::from_secs(10),
            );
            Self {
                pipeline,
                ui,
                controls,
                stats,
                surface,
                observed,
            }
        }

        fn process(&mut self, tag: u8, sequence: u64) -> FrameDisposition {
            let disposition = self.pipeline.process(frame(tag, sequence));
            self.ui.run_pending();
            disposition
        }

        /// What a deactivation does: new epoch, UI reset.
        fn reset_session(&mut self) {
            let epoch = self.controls.advance_epoch();
            self.ui.handle().dispatch(move |ui| ui.reset(epoch));
            self.ui.run_pending();
        }

        fn observed(&self) -> Vec<bool> {
            self.observed.lock().unwrap().clone()
        }
    }

    fn frame(tag: u8, sequence: u64) -> FrameBuffer {
        let len = PixelFormat::Rgb8.buffer_len(W, H);
        FrameBuffer::new(vec![tag; len], W, H, PixelFormat::Rgb8, sequence)
    }

    fn face_scene(face: ScriptedFace) -> Arc<dyn DetectionEngine> {
        Arc::new(ScriptedDetectionEngine::fixed(Scene {
            face: Some(face),
            ..Scene::default()
        }))
    }

    /// Tag 1 shows a face, anything else is empty.
    fn toggling_engine() -> Arc<ScriptedDetectionEngine> {
        Arc::new(ScriptedDetectionEngine::new(Arc::new(|tag| Scene {
            face: (tag == 1).then(|| ScriptedFace::new(0)),
            ..Scene::default()
        })))
    }

    #[rstest]
    #[case::below_gate(0.85, false)]
    #[case::at_gate(0.9, false)]
    #[case::above_gate(0.97, true)]
    fn test_face_score_gate(#[case] score: f32, #[case] accepted: bool) {
        let mut h = Harness::new(
            face_scene(ScriptedFace::new(0).with_score(score)),
            Box::new(FaceDetectMode),
        );

        let disposition = h.process(0, 0);

        match disposition {
            FrameDisposition::Processed(DetectionOutcome::Face(face)) => {
                assert!(accepted);
                assert_eq!(face.score, score);
            }
            FrameDisposition::Processed(DetectionOutcome::NoDetection) => assert!(!accepted),
            other => panic!("unexpected disposition {other:?}"),
        }
        assert_eq!(h.observed(), vec![accepted]);
        assert_eq!(h.surface.visible_count(), usize::from(accepted));
    }

    #[test]
    fn test_face_box_is_scaled_to_surface() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));

        h.process(0, 0);

        let shapes = h.surface.visible_shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].color, OverlayColor::Green);
        // Face bounds are 0.3/0.2/0.3/0.5 of the frame; surface is twice the frame
        let r = shapes[0].rect;
        approx::assert_relative_eq!(r.x, 0.3 * 128.0, epsilon = 1e-9);
        approx::assert_relative_eq!(r.height, 0.5 * 96.0, epsilon = 1e-9);
    }

    #[test]
    fn test_face_box_hidden_when_face_leaves() {
        let engine = toggling_engine();
        let mut h = Harness::new(engine, Box::new(FaceDetectMode));

        h.process(1, 0);
        assert_eq!(h.surface.visible_count(), 1);
        h.process(0, 1);
        assert_eq!(h.surface.visible_count(), 0);
        assert_eq!(h.surface.created(), 1);
    }

    #[test]
    fn test_truncated_frame_is_skipped_and_next_frame_proceeds() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));
        let short = FrameBuffer::new(vec![0; 10], W, H, PixelFormat::Rgb8, 0);

        let disposition = h.pipeline.process(short);
        h.ui.run_pending();

        assert_eq!(
            disposition,
            FrameDisposition::Skipped(SkipReason::Conversion(FrameConversionError::Truncated {
                expected: PixelFormat::Rgb8.buffer_len(W, H),
                actual: 10,
            }))
        );
        assert!(h.observed().is_empty());
        assert!(matches!(h.process(0, 1), FrameDisposition::Processed(_)));
        assert_eq!(h.stats.snapshot().skipped, 1);
        assert_eq!(h.stats.snapshot().processed, 1);
    }

    #[test]
    fn test_unsupported_format_is_skipped() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));
        let len = PixelFormat::Nv12.buffer_len(W, H);
        let nv12 = FrameBuffer::new(vec![0; len], W, H, PixelFormat::Nv12, 0);

        assert_eq!(
            h.pipeline.process(nv12),
            FrameDisposition::Skipped(SkipReason::Conversion(FrameConversionError::Unsupported(
                PixelFormat::Nv12
            )))
        );
    }

    #[test]
    fn test_rejected_preprocess_is_skipped() {
        let engine = Arc::new(ScriptedDetectionEngine::fixed(Scene {
            reject: true,
            ..Scene::default()
        }));
        let mut h = Harness::new(engine, Box::new(FaceDetectMode));

        assert_eq!(
            h.process(0, 0),
            FrameDisposition::Skipped(SkipReason::Preprocess)
        );
        assert!(h.observed().is_empty());
    }

    #[test]
    fn test_epoch_change_mid_frame_discards_result() {
        let controls = Arc::new(PipelineControls::new(true));
        let engine = Arc::new(EpochBumpingEngine {
            inner: ScriptedDetectionEngine::fixed(Scene {
                face: Some(ScriptedFace::new(0)),
                ..Scene::default()
            }),
            controls: controls.clone(),
        });
        let edges = Arc::new(Mutex::new(Vec::new()));
        let mut h = Harness::with_controls(
            engine,
            Box::new(EdgeRecorder(edges.clone())),
            controls,
        );

        assert_eq!(h.process(0, 0), FrameDisposition::Discarded);

        assert!(h.observed().is_empty());
        assert!(edges.lock().unwrap().is_empty());
        assert_eq!(h.surface.created(), 0);
        assert_eq!(h.stats.snapshot().discarded, 1);
        assert!(!h.pipeline.is_face_present());
    }

    #[test]
    fn test_report_from_superseded_epoch_is_dropped() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));

        // The UI has already adopted a newer epoch when this frame's report lands
        h.ui.handle().dispatch(|ui| ui.reset(1));
        h.process(0, 0);

        assert_eq!(h.surface.created(), 0);
        assert!(h.observed().is_empty());
    }

    #[test]
    fn test_reset_erases_report_queued_before_it() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));

        h.pipeline.process(frame(0, 0));
        h.reset_session();

        assert_eq!(h.surface.visible_count(), 0);
    }

    #[test]
    fn test_one_observer_call_per_processed_frame() {
        let engine = toggling_engine();
        let mut h = Harness::new(engine, Box::new(SpoofCheckMode::new(0.5)));
        let tags = [1, 1, 0, 0, 1, 0, 1, 1, 1, 0];

        for (seq, tag) in tags.iter().enumerate() {
            h.process(*tag, seq as u64);
        }

        let expected: Vec<bool> = tags.iter().map(|t| *t == 1).collect();
        assert_eq!(h.observed(), expected);
        let reported = h.ui.query(|ui| ui.frames_reported()).unwrap();
        assert_eq!(reported, tags.len() as u64);
    }

    #[test]
    fn test_spoof_check_runs_once_per_appearance() {
        let engine = toggling_engine();
        let mut h = Harness::new(engine.clone(), Box::new(SpoofCheckMode::new(0.5)));

        for (seq, tag) in [1, 1, 1, 0, 1, 1].iter().enumerate() {
            h.process(*tag, seq as u64);
        }

        assert_eq!(engine.spoof_calls(), 2);
        let status = h.ui.query(|ui| ui.status.text.clone()).unwrap();
        assert_eq!(status, "Real Face\nScore: 0.90");
    }

    #[test]
    fn test_repeated_resets_produce_no_duplicate_disappearance() {
        let edges = Arc::new(Mutex::new(Vec::new()));
        let mut h = Harness::new(toggling_engine(), Box::new(EdgeRecorder(edges.clone())));

        h.process(1, 0);
        h.reset_session();
        h.reset_session();
        h.process(0, 1);
        h.process(0, 2);
        h.reset_session();
        h.process(1, 3);

        let edges = edges.lock().unwrap().clone();
        assert_eq!(edges, vec!["appeared", "appeared"]);
    }

    #[test]
    fn test_sequence_gaps_count_as_dropped() {
        let mut h = Harness::new(face_scene(ScriptedFace::new(0)), Box::new(FaceDetectMode));

        for seq in [0, 1, 5, 6, 8] {
            h.process(0, seq);
        }

        assert_eq!(h.stats.snapshot().dropped, 4);
        assert_eq!(h.stats.snapshot().processed, 5);
    }

    #[test]
    fn test_object_toggle_is_read_per_frame() {
        let engine = Arc::new(ScriptedDetectionEngine::cycling(10, 5));
        let mut h = Harness::new(engine, Box::new(ObjectTagMode::new("person")));

        match h.process(0, 0) {
            FrameDisposition::Processed(DetectionOutcome::Objects(objects)) => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].label, "cup");
            }
            other => panic!("unexpected disposition {other:?}"),
        }
        assert_eq!(h.surface.live_count(), 1);

        h.controls.set_object_detection(false);
        assert_eq!(
            h.process(1, 1),
            FrameDisposition::Processed(DetectionOutcome::NoDetection)
        );
        assert_eq!(h.surface.live_count(), 0);
    }
}
