use std::fmt;

use thiserror::Error;

/// Status codes reported by the detection engine.
///
/// Discriminants are the engine's raw values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EngineErrorCode {
    NoError = 0,
    InvalidLicense,
    FileReadFail,
    UnsupportedImageFormat,
    UnsupportedModel,
    NoFaceInFrame,
    Failed,
    CollectionCreationError,
    DatabaseConnectionError,
    EnrollmentError,
    MaxCollectionSizeExceeded,
    NoRecordFound,
    NoCollectionFound,
    CollectionDeletionError,
    ExtremeFaceAngle,
    FaceTooClose,
    FaceTooFar,
    FaceTooSmall,
    FaceNotCentered,
    EyesClosed,
    MaskDetected,
    TooDark,
    TooBright,
}

const ALL_CODES: [EngineErrorCode; 23] = [
    EngineErrorCode::NoError,
    EngineErrorCode::InvalidLicense,
    EngineErrorCode::FileReadFail,
    EngineErrorCode::UnsupportedImageFormat,
    EngineErrorCode::UnsupportedModel,
    EngineErrorCode::NoFaceInFrame,
    EngineErrorCode::Failed,
    EngineErrorCode::CollectionCreationError,
    EngineErrorCode::DatabaseConnectionError,
    EngineErrorCode::EnrollmentError,
    EngineErrorCode::MaxCollectionSizeExceeded,
    EngineErrorCode::NoRecordFound,
    EngineErrorCode::NoCollectionFound,
    EngineErrorCode::CollectionDeletionError,
    EngineErrorCode::ExtremeFaceAngle,
    EngineErrorCode::FaceTooClose,
    EngineErrorCode::FaceTooFar,
    EngineErrorCode::FaceTooSmall,
    EngineErrorCode::FaceNotCentered,
    EngineErrorCode::EyesClosed,
    EngineErrorCode::MaskDetected,
    EngineErrorCode::TooDark,
    EngineErrorCode::TooBright,
];

pub const UNKNOWN_ERROR_LABEL: &str = "UNKNOWN ERROR";

impl EngineErrorCode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| ALL_CODES.get(i))
            .copied()
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    /// User-facing label, as shown in status text.
    pub fn label(self) -> &'static str {
        match self {
            EngineErrorCode::NoError => "NO ERROR",
            EngineErrorCode::InvalidLicense => "INVALID LICENSE",
            EngineErrorCode::FileReadFail => "FILE READ FAIL",
            EngineErrorCode::UnsupportedImageFormat => "UNSUPPORTED IMAGE FORMAT",
            EngineErrorCode::UnsupportedModel => "UNSUPPORTED MODEL",
            EngineErrorCode::NoFaceInFrame => "NO FACE IN FRAME",
            EngineErrorCode::Failed => "FAILED",
            EngineErrorCode::CollectionCreationError => "COLLECTION_CREATION_ERROR",
            EngineErrorCode::DatabaseConnectionError => "DATABASE_CONNECTION_ERROR",
            EngineErrorCode::EnrollmentError => "ENROLLMENT_ERROR",
            EngineErrorCode::MaxCollectionSizeExceeded => "MAX_COLLECTION_SIZE_EXCEEDED",
            EngineErrorCode::NoRecordFound => "NO RECORD FOUND",
            EngineErrorCode::NoCollectionFound => "NO COLLECTION FOUND",
            EngineErrorCode::CollectionDeletionError => "COLLECTION DELETION ERROR",
            EngineErrorCode::ExtremeFaceAngle => "EXTREME FACE ANGLE",
            EngineErrorCode::FaceTooClose => "FACE TOO CLOSE",
            EngineErrorCode::FaceTooFar => "FACE TOO FAR",
            EngineErrorCode::FaceTooSmall => "FACE TOO SMALL",
            EngineErrorCode::FaceNotCentered => "FACE NOT CENTERED",
            EngineErrorCode::EyesClosed => "EYES CLOSED",
            EngineErrorCode::MaskDetected => "MASK DETECTED",
            EngineErrorCode::TooDark => "TOO DARK",
            EngineErrorCode::TooBright => "TOO BRIGHT",
        }
    }

    /// Label for a raw code; codes outside the table map to `UNKNOWN ERROR`.
    pub fn label_for_raw(raw: i32) -> &'static str {
        Self::from_raw(raw).map_or(UNKNOWN_ERROR_LABEL, Self::label)
    }
}

impl fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure reported by an engine call that mutates or queries collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {}", .code.label(), .message)]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
