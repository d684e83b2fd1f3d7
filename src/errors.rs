//! # Error Types Module
//!
//! This module defines the error types used across the fridge tracker.
//! Camera and recognition failures have their own enums so callers can
//! tell a retryable device problem from a failed model call; `AppError`
//! is what the view controller surfaces to the user.

use thiserror::Error;

/// Failures acquiring or reading the camera device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The platform refused access to the device
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    /// No device at the configured location
    #[error("Camera not found: {0}")]
    NotFound(String),
    /// Another capture session holds the device
    #[error("Camera busy: {0}")]
    Busy(String),
    /// Frame could not be read, decoded or encoded
    #[error("Camera error: {0}")]
    Other(String),
}

impl CameraError {
    /// Localization key for the user-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied(_) => "error-camera-permission",
            CameraError::NotFound(_) => "error-camera-not-found",
            CameraError::Busy(_) => "error-camera-busy",
            CameraError::Other(_) => "error-camera-other",
        }
    }
}

/// Failures talking to the hosted model or decoding its answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// No API key configured
    #[error("Recognition credentials are missing")]
    MissingCredentials,
    /// An image operation was called with no images
    #[error("No images to recognise")]
    NoImages,
    /// Network or client failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status from the endpoint
    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },
    /// The model answered without any usable content
    #[error("Empty model response")]
    EmptyResponse,
    /// The response text did not match the declared schema
    #[error("Could not decode model response: {0}")]
    Decode(String),
}

/// Errors surfaced by the view controller
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// Single-item, shop or receipt recognition failed
    #[error("Recognition failed: {0}")]
    Recognition(#[from] RecognitionError),
    /// Recipe suggestion failed or returned too few recipes
    #[error("Recipe suggestion failed: {0}")]
    RecipeFailure(RecognitionError),
    /// No ingredients to build recipes from
    #[error("The fridge is too empty for recipe ideas")]
    EmptyFridge,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("No item with id {0}")]
    UnknownItem(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An action arrived that the current screen does not accept
    #[error("Action not available on the {0} screen")]
    WrongScreen(&'static str),
    #[error("No capture session is open")]
    NoCaptureSession,
    /// A recognition call is still pending
    #[error("Still working on the previous request")]
    Busy,
}

impl AppError {
    /// Localization key for the user-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::Camera(e) => e.message_key(),
            AppError::Recognition(RecognitionError::MissingCredentials)
            | AppError::RecipeFailure(RecognitionError::MissingCredentials) => {
                "error-missing-credentials"
            }
            AppError::Recognition(_) => "error-recognition-failed",
            AppError::RecipeFailure(_) => "error-recipe-failed",
            AppError::EmptyFridge => "error-fridge-empty",
            AppError::Storage(_) => "error-storage",
            AppError::UnknownItem(_) => "error-unknown-item",
            AppError::InvalidInput(_) => "error-invalid-input",
            AppError::WrongScreen(_) => "error-wrong-screen",
            AppError::NoCaptureSession => "error-no-capture",
            AppError::Busy => "error-busy",
        }
    }

    /// Camera errors offer a retry that re-acquires the device
    pub fn is_retryable_camera_error(&self) -> bool {
        matches!(self, AppError::Camera(_))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Storage(format!("{err:#}"))
    }
}
