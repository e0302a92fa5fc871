use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use facestream_core::capture::domain::capture_device::Facing;
use facestream_core::capture::infrastructure::synthetic_capture_backend::SyntheticCaptureBackend;
use facestream_core::capture::infrastructure::threaded_capture_session::ThreadedCaptureSession;
use facestream_core::detection::domain::detection_engine::{DetectionEngine, EngineImage};
use facestream_core::detection::domain::face_region::FaceRegion;
use facestream_core::detection::infrastructure::scripted_detection_engine::{
    embedding_for, ScriptedDetectionEngine,
};
use facestream_core::overlay::infrastructure::recording_overlay_surface::RecordingOverlaySurface;
use facestream_core::pipeline::frame_observer::FrameObserver;
use facestream_core::pipeline::live_session::LiveSession;
use facestream_core::pipeline::pipeline_logger::SessionStatsLogger;
use facestream_core::shared::pipeline_settings::{Mode, PipelineSettings};
use facestream_core::shared::rect::Size;

/// Name under which the scripted "person 0" is known in recognize mode.
const DEMO_IDENTITY: &str = "Demo Person";

/// Runs a live face analysis session against a synthetic camera.
#[derive(Parser)]
#[command(name = "facestream")]
struct Cli {
    /// Mode: face-detect, enroll, recognize, spoof-check or object-tag.
    #[arg(long)]
    mode: Option<String>,

    /// Camera facing: front or back.
    #[arg(long)]
    facing: Option<String>,

    /// Stop after this many processed frames.
    #[arg(long, default_value = "150")]
    frames: u64,

    /// Synthetic camera frame rate.
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Frames per scripted scene cycle (face visible, then absent).
    /// Divisors of 256 keep the cycle regular.
    #[arg(long, default_value = "32")]
    period: u32,

    /// Frames of each cycle during which a face is visible.
    #[arg(long, default_value = "20")]
    on_frames: u32,

    /// Name to enroll once a face is held (enroll mode).
    #[arg(long)]
    enroll_name: Option<String>,

    /// Disable object detection (object-tag mode).
    #[arg(long)]
    no_objects: bool,

    /// Settings file; defaults to the per-user config location.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back before running.
    #[arg(long)]
    save_settings: bool,

    /// Print the enrolled identities when the session ends.
    #[arg(long)]
    list_identities: bool,
}

/// Counts frame reports as they reach the UI context.
struct FrameCounter {
    detected: Arc<AtomicU64>,
    not_detected: Arc<AtomicU64>,
}

impl FrameObserver for FrameCounter {
    fn on_detected(
        &mut self,
        _engine: &dyn DetectionEngine,
        _image: &EngineImage,
        _face: &FaceRegion,
    ) {
        self.detected.fetch_add(1, Ordering::Relaxed);
    }

    fn on_not_detected(&mut self, _engine: &dyn DetectionEngine, _image: &EngineImage) {
        self.not_detected.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let settings = build_settings(&cli)?;
    check_enroll_name(&cli, &settings)?;
    if 256 % cli.period != 0 {
        log::warn!(
            "Scene tags wrap every 256 frames; period {} does not divide 256, \
             so the face cycle will be irregular at each wrap",
            cli.period
        );
    }

    if cli.save_settings {
        match &cli.settings {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
        log::info!("Settings saved");
    }

    let engine = Arc::new(ScriptedDetectionEngine::cycling(cli.period, cli.on_frames));
    if settings.mode == Mode::Recognize {
        engine.enroll(&embedding_for(0), DEMO_IDENTITY, &settings.collection)?;
    }

    let backend = SyntheticCaptureBackend::new()
        .with_frame_interval(Duration::from_secs_f64(1.0 / f64::from(cli.fps)));
    let source = ThreadedCaptureSession::new(backend)
        .with_preferred_resolutions(settings.preferred_resolutions.clone())
        .with_log_interval(Duration::from_secs(settings.log_interval_secs));
    let surface = RecordingOverlaySurface::new();
    let detected = Arc::new(AtomicU64::new(0));
    let not_detected = Arc::new(AtomicU64::new(0));
    let observer = FrameCounter {
        detected: detected.clone(),
        not_detected: not_detected.clone(),
    };

    let mut session = LiveSession::open(
        source,
        engine,
        settings.clone(),
        Box::new(surface.clone()),
        Size::new(640.0, 360.0),
        Some(Box::new(observer)),
        Some(Box::new(SessionStatsLogger::default())),
    )?;
    session.activate()?;

    let mut enroll_name = cli.enroll_name.clone();
    let mut last_status = String::new();
    let deadline = Instant::now() + max_runtime(cli.frames, cli.fps);
    while session.stats().processed < cli.frames {
        if Instant::now() > deadline {
            log::warn!("Stopping before {} frames were processed", cli.frames);
            break;
        }
        let status = session.query(|ui| ui.status.text.clone()).unwrap_or_default();
        if status != last_status {
            println!("[{}] {}", settings.mode, display_status(&status));
            last_status = status;
        }
        if let Some(name) = enroll_name.as_deref() {
            let ready = session
                .query(|ui| ui.enroll.is_available() && ui.enroll.held_face().is_some())
                .unwrap_or(false);
            if ready {
                if let Some(outcome) = session.confirm_enrollment(name) {
                    println!("Enrollment: {outcome:?}");
                }
                enroll_name = None;
            }
        }
        thread::sleep(Duration::from_millis(20));
    }

    session.deactivate();
    let stats = session.stats();
    let dropped = session.dropped_frames();
    let identities = if cli.list_identities {
        Some(session.identities().list(&settings.collection)?)
    } else {
        None
    };
    session.shutdown();

    println!(
        "Processed {} frames ({} skipped, {} discarded, {} dropped late)",
        stats.processed, stats.skipped, stats.discarded, dropped
    );
    println!(
        "Face reported in {} frames, absent in {}",
        detected.load(Ordering::Relaxed),
        not_detected.load(Ordering::Relaxed)
    );
    println!(
        "Overlay shapes: {} created, {} updates, {} destroyed",
        surface.created(),
        surface.updated(),
        surface.destroyed()
    );
    if let Some(identities) = identities {
        println!("Identities in {}:", settings.collection);
        for entry in identities {
            println!("  {}  {}", entry.identity, entry.uuid);
        }
    }
    Ok(())
}

fn build_settings(cli: &Cli) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let stored = match &cli.settings {
        Some(path) if path.exists() => PipelineSettings::load_from(path)?,
        Some(_) => PipelineSettings::default(),
        None => PipelineSettings::load(),
    };
    build_settings_over(cli, stored)
}

/// Applies command-line overrides on top of stored settings.
fn build_settings_over(
    cli: &Cli,
    mut settings: PipelineSettings,
) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    if let Some(mode) = &cli.mode {
        settings.mode = mode.parse()?;
    }
    if let Some(facing) = &cli.facing {
        settings.facing = parse_facing(facing)?;
    }
    if cli.no_objects {
        settings.object_detection_enabled = false;
    }
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.frames == 0 {
        return Err("Frame count must be positive".into());
    }
    if !(1..=120).contains(&cli.fps) {
        return Err(format!("FPS must be between 1 and 120, got {}", cli.fps).into());
    }
    if cli.period == 0 || cli.on_frames > cli.period {
        return Err(format!(
            "Face frames ({}) must not exceed a positive period ({})",
            cli.on_frames, cli.period
        )
        .into());
    }
    if cli.enroll_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err("Enroll name must not be blank".into());
    }
    Ok(())
}

/// The mode may come from the settings file, so this runs on the merged settings.
fn check_enroll_name(cli: &Cli, settings: &PipelineSettings) -> Result<(), String> {
    if cli.enroll_name.is_some() && settings.mode != Mode::Enroll {
        return Err(format!(
            "--enroll-name requires enroll mode, but the session runs in {} mode",
            settings.mode
        ));
    }
    Ok(())
}

fn parse_facing(facing: &str) -> Result<Facing, String> {
    match facing {
        "front" => Ok(Facing::Front),
        "back" => Ok(Facing::Back),
        other => Err(format!("Facing must be 'front' or 'back', got '{other}'")),
    }
}

/// Frame budget at the nominal rate, plus slack for slow machines.
fn max_runtime(frames: u64, fps: u32) -> Duration {
    Duration::from_secs_f64(frames as f64 / f64::from(fps) * 4.0 + 5.0)
}

fn display_status(status: &str) -> String {
    if status.is_empty() {
        "(cleared)".to_string()
    } else {
        status.replace('\n', " | ")
    }
}
