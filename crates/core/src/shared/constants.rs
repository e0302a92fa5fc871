/// Minimum detector confidence for a face to count as present. Exclusive.
pub const FACE_SCORE_THRESHOLD: f32 = 0.9;

/// Decision threshold handed to spoof classification.
pub const SPOOF_THRESHOLD: f32 = 0.5;

/// Capture resolutions in order of preference: 720p, 1080p, 480p.
pub const PREFERRED_RESOLUTIONS: &[(u32, u32)] = &[(1280, 720), (1920, 1080), (640, 480)];

pub const DEFAULT_COLLECTION: &str = "DEMO";

/// Object label excluded from object tagging overlays.
pub const DEFAULT_IGNORE_LABEL: &str = "person";

/// Minimum spacing between repeated diagnostic log lines.
pub const LOG_INTERVAL_SECS: u64 = 10;

pub const UNKNOWN_PERSON_LABEL: &str = "Unknown person";
pub const RECOGNITION_ERROR_LABEL: &str = "Recognition Error";
