//! # Image Capture Module
//!
//! Wraps a camera device, grabs still frames, downsamples them and keeps the
//! encoded frames of one capture session in order.
//!
//! The device is an exclusive resource: a `CaptureSession` holds it from
//! `start` until `finish`, `close` or drop, whichever comes first.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;
use crate::errors::CameraError;

pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// A captured frame ready to send inline to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Base64 of the JPEG bytes
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// A camera that can be acquired for exclusive use
pub trait CameraDevice: Send + Sync {
    /// Acquire the device. Dropping the returned stream releases it.
    fn open(&self) -> Result<Box<dyn FrameStream>, CameraError>;

    /// Human readable location, for logs and error messages
    fn describe(&self) -> String;
}

/// An acquired camera feed
pub trait FrameStream: Send {
    /// The current frame
    fn grab_frame(&mut self) -> Result<DynamicImage, CameraError>;
}

/// Camera backed by a directory that a phone or webcam tool drops stills into.
///
/// The current frame is the most recently modified supported image file.
#[derive(Debug, Clone)]
pub struct FolderCamera {
    dir: PathBuf,
    in_use: Arc<AtomicBool>,
}

impl FolderCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check_directory(&self) -> Result<(), CameraError> {
        let location = self.describe();
        match fs::read_dir(&self.dir) {
            Ok(_) => Ok(()),
            Err(e) => Err(map_io_error(e, &location)),
        }
    }
}

impl CameraDevice for FolderCamera {
    fn open(&self) -> Result<Box<dyn FrameStream>, CameraError> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CameraError::Busy(self.describe()));
        }

        let lease = CameraLease {
            in_use: Arc::clone(&self.in_use),
        };

        // The lease is dropped on the error path, releasing the device again
        self.check_directory()?;

        info!(camera = %self.describe(), "Camera acquired");
        Ok(Box::new(FolderStream {
            dir: self.dir.clone(),
            _lease: lease,
        }))
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Marks a device as in use until dropped
#[derive(Debug)]
struct CameraLease {
    in_use: Arc<AtomicBool>,
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
        debug!("Camera released");
    }
}

struct FolderStream {
    dir: PathBuf,
    _lease: CameraLease,
}

impl FrameStream for FolderStream {
    fn grab_frame(&mut self) -> Result<DynamicImage, CameraError> {
        let location = self.dir.display().to_string();
        let entries = fs::read_dir(&self.dir).map_err(|e| map_io_error(e, &location))?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() || !is_supported_image_format(&path) {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }

        let (_, path) = newest.ok_or_else(|| {
            CameraError::Other(format!("no frame available in {location}"))
        })?;

        debug!(frame = %path.display(), "Grabbing frame");
        image::open(&path)
            .map_err(|e| CameraError::Other(format!("failed to decode {}: {e}", path.display())))
    }
}

fn map_io_error(err: io::Error, location: &str) -> CameraError {
    match err.kind() {
        io::ErrorKind::NotFound => CameraError::NotFound(location.to_string()),
        io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(location.to_string()),
        _ => CameraError::Other(format!("{location}: {err}")),
    }
}

/// Validate if a file holds a supported still image using image::guess_format
pub fn is_supported_image_format(file_path: &Path) -> bool {
    let Ok(file) = File::open(file_path) else {
        return false;
    };
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; FORMAT_DETECTION_BUFFER_SIZE];

    match reader.read(&mut buffer) {
        Ok(bytes_read) if bytes_read >= MIN_FORMAT_BYTES => {
            buffer.truncate(bytes_read);
            match image::guess_format(&buffer) {
                Ok(format) => matches!(
                    format,
                    ImageFormat::Png
                        | ImageFormat::Jpeg
                        | ImageFormat::Bmp
                        | ImageFormat::Tiff
                        | ImageFormat::WebP
                ),
                Err(_) => false,
            }
        }
        _ => false,
    }
}

/// Target size with the longest side capped at `max_dimension`; never upscales
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    if width >= height {
        let scaled = (u64::from(height) * u64::from(max_dimension) + u64::from(width) / 2)
            / u64::from(width);
        (max_dimension, (scaled as u32).max(1))
    } else {
        let scaled = (u64::from(width) * u64::from(max_dimension) + u64::from(height) / 2)
            / u64::from(height);
        ((scaled as u32).max(1), max_dimension)
    }
}

/// Downscale, JPEG-encode and base64-encode a frame
pub fn encode_frame(
    frame: &DynamicImage,
    max_dimension: u32,
    jpeg_quality: u8,
) -> Result<EncodedImage, CameraError> {
    let (width, height) = scaled_dimensions(frame.width(), frame.height(), max_dimension);
    let rgb = if (width, height) == (frame.width(), frame.height()) {
        frame.to_rgb8()
    } else {
        frame
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality)
        .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|e| CameraError::Other(format!("failed to encode frame: {e}")))?;

    Ok(EncodedImage {
        mime_type: JPEG_MIME_TYPE.to_string(),
        data: STANDARD.encode(&jpeg),
        width,
        height,
    })
}

/// One open camera overlay: acquisition, captured frames, release
pub struct CaptureSession {
    device: Arc<dyn CameraDevice>,
    stream: Option<Box<dyn FrameStream>>,
    images: Vec<EncodedImage>,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl CaptureSession {
    /// Create a session; the device is not touched until `start`
    pub fn new(device: Arc<dyn CameraDevice>, config: &CaptureConfig) -> Self {
        Self {
            device,
            stream: None,
            images: Vec::new(),
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Acquire the camera; a no-op when already acquired
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.stream.is_some() {
            return Ok(());
        }
        match self.device.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                warn!(camera = %self.device.describe(), error = %e, "Camera acquisition failed");
                Err(e)
            }
        }
    }

    /// Release whatever is held and acquire from scratch
    pub fn retry(&mut self) -> Result<(), CameraError> {
        self.stream = None;
        self.start()
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Grab, downscale and append the current frame; returns the new count
    pub fn capture_frame(&mut self) -> Result<usize, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::Other("camera has not been started".to_string()))?;
        let frame = stream.grab_frame()?;
        let encoded = encode_frame(&frame, self.max_dimension, self.jpeg_quality)?;
        debug!(
            width = encoded.width,
            height = encoded.height,
            bytes_b64 = encoded.data.len(),
            "Frame captured"
        );
        self.images.push(encoded);
        Ok(self.images.len())
    }

    /// Remove one captured frame; `None` when the index is out of range
    pub fn remove_at(&mut self, index: usize) -> Option<EncodedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn images(&self) -> &[EncodedImage] {
        &self.images
    }

    /// Hand back every captured frame and release the camera
    pub fn finish(mut self) -> Vec<EncodedImage> {
        self.stream = None;
        info!(image_count = self.images.len(), "Capture session finished");
        std::mem::take(&mut self.images)
    }

    /// Release the camera and drop the frames
    pub fn close(mut self) {
        self.stream = None;
        info!("Capture session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_scaled_dimensions_landscape() {
        assert_eq!(scaled_dimensions(1600, 1200, 800), (800, 600));
    }

    #[test]
    fn test_scaled_dimensions_portrait() {
        assert_eq!(scaled_dimensions(1000, 2000, 800), (400, 800));
    }

    #[test]
    fn test_scaled_dimensions_never_upscales() {
        assert_eq!(scaled_dimensions(640, 480, 800), (640, 480));
    }

    #[test]
    fn test_encode_frame_produces_jpeg() {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(1200, 300));
        let encoded = encode_frame(&frame, 800, 70).unwrap();
        assert_eq!((encoded.width, encoded.height), (800, 200));
        assert_eq!(encoded.mime_type, "image/jpeg");

        let bytes = STANDARD.decode(&encoded.data).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let camera = FolderCamera::new("/definitely/not/a/camera");
        assert!(matches!(camera.open(), Err(CameraError::NotFound(_))));
        // A failed open must not leave the device marked busy
        assert!(matches!(camera.open(), Err(CameraError::NotFound(_))));
    }
}
