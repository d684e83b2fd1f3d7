//! # Configuration Module
//!
//! This module defines configuration structures for the fridge tracker:
//! recognition endpoint settings, capture limits and storage location.
//! Defaults live in constants; `AppConfig::from_env` overrides them from
//! environment variables (after `.env` loading in `main`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

// Constants for default configuration
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_MAX_DIMENSION: u32 = 800; // Longest side of a captured frame
pub const DEFAULT_JPEG_QUALITY: u8 = 70;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const INVENTORY_SLOT: &str = "smart_fridge_inventory";
pub const DATA_DIR_NAME: &str = "smart-fridge";

/// Recognition endpoint configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// API key for the hosted model; absent means every call fails fast
    pub api_key: Option<String>,
    /// Base URL of the generative API
    pub api_base: String,
    /// Model used for analysis, identification, receipts and recipes
    pub model: String,
    /// Model used for recipe image generation
    pub image_model: String,
    /// Per-request timeout; `None` leaves timing to the transport
    pub request_timeout: Option<Duration>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout: None,
        }
    }
}

/// Frame processing limits for the capture component
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Longest side of an encoded frame in pixels
    pub max_dimension: u32,
    /// JPEG quality, 1 to 100
    pub jpeg_quality: u8,
    /// Folder the camera device reads stills from
    pub camera_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            camera_dir: default_data_dir().join("camera"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub recognition: RecognitionConfig,
    pub capture: CaptureConfig,
    /// Directory holding the inventory slot
    pub data_dir: PathBuf,
    /// Storage slot name for the inventory
    pub inventory_slot: String,
    /// UI and recipe language ("en" or "zh")
    pub language: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            capture: CaptureConfig::default(),
            data_dir: default_data_dir(),
            inventory_slot: INVENTORY_SLOT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl AppConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        config.recognition.api_key = get("GEMINI_API_KEY");
        if let Some(base) = get("SMART_FRIDGE_API_BASE") {
            config.recognition.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("SMART_FRIDGE_MODEL") {
            config.recognition.model = model;
        }
        if let Some(model) = get("SMART_FRIDGE_IMAGE_MODEL") {
            config.recognition.image_model = model;
        }
        if let Some(secs) = get("SMART_FRIDGE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("SMART_FRIDGE_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
            config.recognition.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(dir) = get("SMART_FRIDGE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.capture.camera_dir = config.data_dir.join("camera");
        }
        if let Some(dir) = get("SMART_FRIDGE_CAMERA_DIR") {
            config.capture.camera_dir = PathBuf::from(dir);
        }
        if let Some(dim) = get("SMART_FRIDGE_MAX_DIMENSION") {
            config.capture.max_dimension = dim
                .trim()
                .parse()
                .context("SMART_FRIDGE_MAX_DIMENSION must be a positive integer")?;
        }
        if let Some(quality) = get("SMART_FRIDGE_JPEG_QUALITY") {
            config.capture.jpeg_quality = quality
                .trim()
                .parse()
                .context("SMART_FRIDGE_JPEG_QUALITY must be between 1 and 100")?;
        }
        if let Some(lang) = get("SMART_FRIDGE_LANG") {
            config.language = lang;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the capture pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.capture.max_dimension == 0 {
            anyhow::bail!("max dimension must be greater than zero");
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            anyhow::bail!(
                "JPEG quality must be between 1 and 100, got {}",
                self.capture.jpeg_quality
            );
        }
        Ok(())
    }
}

/// Platform data directory, falling back to the working directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert!(config.recognition.api_key.is_none());
        assert_eq!(config.capture.max_dimension, 800);
        assert_eq!(config.inventory_slot, "smart_fridge_inventory");
        assert!(config.recognition.request_timeout.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("SMART_FRIDGE_API_BASE", "http://localhost:9000/"),
            ("SMART_FRIDGE_DATA_DIR", "/tmp/fridge"),
            ("SMART_FRIDGE_REQUEST_TIMEOUT_SECS", "30"),
            ("SMART_FRIDGE_LANG", "zh"),
        ]))
        .unwrap();

        assert_eq!(config.recognition.api_key.as_deref(), Some("secret"));
        assert_eq!(config.recognition.api_base, "http://localhost:9000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fridge"));
        assert_eq!(config.capture.camera_dir, PathBuf::from("/tmp/fridge/camera"));
        assert_eq!(
            config.recognition.request_timeout,
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.language, "zh");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.recognition.api_key.is_none());
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("SMART_FRIDGE_JPEG_QUALITY", "0")]));
        assert!(result.is_err());
    }
}
