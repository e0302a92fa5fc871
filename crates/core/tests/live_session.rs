use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;

use facestream_core::capture::domain::capture_device::Facing;
use facestream_core::capture::infrastructure::synthetic_capture_backend::SyntheticCaptureBackend;
use facestream_core::capture::infrastructure::threaded_capture_session::ThreadedCaptureSession;
use facestream_core::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use facestream_core::detection::domain::face_region::FaceRegion;
use facestream_core::detection::infrastructure::scripted_detection_engine::{
    embedding_for, Scene, ScriptedDetectionEngine, ScriptedFace,
};
use facestream_core::overlay::infrastructure::recording_overlay_surface::RecordingOverlaySurface;
use facestream_core::pipeline::frame_observer::FrameObserver;
use facestream_core::pipeline::live_session::LiveSession;
use facestream_core::pipeline::ui_state::LabelColor;
use facestream_core::shared::pipeline_settings::{Mode, PipelineSettings};
use facestream_core::shared::rect::{Rect, Size};

type Session = LiveSession<ThreadedCaptureSession<SyntheticCaptureBackend>>;

struct Counts {
    detected: Arc<AtomicU64>,
    not_detected: Arc<AtomicU64>,
}

impl FrameObserver for Counts {
    fn on_detected(&mut self, _: &dyn DetectionEngine, _: &EngineImage, _: &FaceRegion) {
        self.detected.fetch_add(1, Ordering::Relaxed);
    }

    fn on_not_detected(&mut self, _: &dyn DetectionEngine, _: &EngineImage) {
        self.not_detected.fetch_add(1, Ordering::Relaxed);
    }
}

struct Fixture {
    session: Session,
    surface: RecordingOverlaySurface,
    engine: Arc<ScriptedDetectionEngine>,
    detected: Arc<AtomicU64>,
    not_detected: Arc<AtomicU64>,
}

fn open(mode: Mode, facing: Facing, engine: ScriptedDetectionEngine) -> Fixture {
    let settings = PipelineSettings {
        mode,
        facing,
        ..PipelineSettings::default()
    };
    let engine = Arc::new(engine);
    let surface = RecordingOverlaySurface::new();
    let detected = Arc::new(AtomicU64::new(0));
    let not_detected = Arc::new(AtomicU64::new(0));
    let backend = SyntheticCaptureBackend::new().with_frame_interval(Duration::from_millis(5));
    let session = LiveSession::open(
        ThreadedCaptureSession::new(backend),
        engine.clone(),
        settings,
        Box::new(surface.clone()),
        Size::new(640.0, 360.0),
        Some(Box::new(Counts {
            detected: detected.clone(),
            not_detected: not_detected.clone(),
        })),
        None,
    )
    .unwrap();
    Fixture {
        session,
        surface,
        engine,
        detected,
        not_detected,
    }
}

fn with_face(face: ScriptedFace) -> ScriptedDetectionEngine {
    ScriptedDetectionEngine::fixed(Scene {
        face: Some(face),
        ..Scene::default()
    })
}

fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

fn status(session: &mut Session) -> (String, LabelColor) {
    session
        .query(|ui| (ui.status.text.clone(), ui.status.color))
        .unwrap()
}

#[test]
fn test_front_camera_face_box_is_mirrored_onto_surface() {
    let mut f = open(Mode::FaceDetect, Facing::Front, with_face(ScriptedFace::new(0)));
    f.session.activate().unwrap();

    let surface = f.surface.clone();
    eventually("face box", || surface.visible_count() == 1);

    // 1280x720 negotiated, 640x360 surface: face at x=384, w=384 in the frame
    let shape = f.surface.visible_shapes()[0].clone();
    let expected = Rect::new((1.0 - 0.3) * 640.0 - 192.0, 72.0, 192.0, 180.0);
    assert_relative_eq!(shape.rect.x, expected.x, epsilon = 1e-6);
    assert_relative_eq!(shape.rect.y, expected.y, epsilon = 1e-6);
    assert_relative_eq!(shape.rect.width, expected.width, epsilon = 1e-6);
    assert_relative_eq!(shape.rect.height, expected.height, epsilon = 1e-6);
    assert_eq!(f.surface.created(), 1);
}

#[test]
fn test_recognize_shows_enrolled_identity() {
    let engine = with_face(ScriptedFace::new(0));
    engine.enroll(&embedding_for(0), "Ada", "DEMO").unwrap();
    let mut f = open(Mode::Recognize, Facing::Back, engine);
    f.session.activate().unwrap();

    eventually("recognition label", || {
        status(&mut f.session).0 == "Ada\nConfidence: 100.00%"
    });
    assert_eq!(status(&mut f.session).1, LabelColor::Green);
}

#[test]
fn test_spoof_label_survives_reactivation_cycle() {
    let mut f = open(
        Mode::SpoofCheck,
        Facing::Back,
        with_face(ScriptedFace::new(0).with_liveness(0.2)),
    );
    f.session.activate().unwrap();
    eventually("first verdict", || !status(&mut f.session).0.is_empty());
    assert_eq!(
        status(&mut f.session),
        ("Fake Face\nScore: 0.20".to_string(), LabelColor::Red)
    );

    f.session.deactivate();
    f.session.deactivate();
    assert!(!f.session.is_active());
    assert!(status(&mut f.session).0.is_empty());
    assert_eq!(f.surface.visible_count(), 0);

    f.session.activate().unwrap();
    eventually("second verdict", || !status(&mut f.session).0.is_empty());
    assert!(f.engine.spoof_calls() >= 2);
}

#[test]
fn test_object_overlays_follow_toggle() {
    let engine = ScriptedDetectionEngine::fixed(Scene {
        face: None,
        objects: vec![
            (Rect::new(0.1, 0.1, 0.2, 0.2), "cup".to_string()),
            (Rect::new(0.5, 0.1, 0.2, 0.4), "person".to_string()),
            (Rect::new(0.6, 0.6, 0.3, 0.3), "chair".to_string()),
        ],
        reject: false,
    });
    let mut f = open(Mode::ObjectTag, Facing::Back, engine);
    f.session.activate().unwrap();

    let surface = f.surface.clone();
    eventually("object boxes", || surface.live_count() == 2);
    let mut labels: Vec<String> = f
        .surface
        .visible_shapes()
        .into_iter()
        .filter_map(|s| s.label)
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["chair", "cup"]);

    f.session.set_object_detection(false);
    eventually("objects cleared", || surface.live_count() == 0);
    assert!(!f.session.settings().object_detection_enabled);
}

#[test]
fn test_observer_runs_once_per_reported_frame() {
    let mut f = open(
        Mode::FaceDetect,
        Facing::Back,
        ScriptedDetectionEngine::cycling(6, 3),
    );
    f.session.activate().unwrap();
    eventually("some frames", || f.session.stats().processed >= 30);
    f.session.deactivate();

    let processed = f.session.stats().processed;
    let state = f.session.shutdown().unwrap();
    let observed = f.detected.load(Ordering::Relaxed) + f.not_detected.load(Ordering::Relaxed);
    assert_eq!(observed, state.frames_reported());
    assert!(observed <= processed);
    assert!(f.detected.load(Ordering::Relaxed) > 0);
    assert!(f.not_detected.load(Ordering::Relaxed) > 0);
}
