//! Shared fakes for the integration tests: a scripted model, a folder
//! camera with one still in it, and an in-memory controller.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use smart_fridge::capture::{CameraDevice, FolderCamera};
use smart_fridge::config::{CaptureConfig, RecognitionConfig, INVENTORY_SLOT};
use smart_fridge::controller::{Controller, FixedClock};
use smart_fridge::errors::RecognitionError;
use smart_fridge::food_model::{Category, FoodItem};
use smart_fridge::inventory::InventoryStore;
use smart_fridge::recognition::{
    GenerationOutput, GenerationRequest, GenerativeModel, InlineImage, RecognitionClient,
};
use smart_fridge::storage::{MemoryStorage, StorageBackend};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(2024, 5, 1)
}

pub fn food(id: &str, name: &str, category: Category, expiry: Option<NaiveDate>) -> FoodItem {
    FoodItem {
        id: id.to_string(),
        name: name.to_string(),
        name_en: None,
        name_zh: None,
        category,
        production_date: None,
        purchase_date: day(2024, 4, 20),
        expiry_date: expiry,
        weight: None,
        percentage: 100,
    }
}

/// Answers text requests from a queue and image requests per recipe name
#[derive(Default)]
pub struct ScriptedModel {
    answers: Mutex<VecDeque<Result<GenerationOutput, RecognitionError>>>,
    /// (substring of the image prompt, delay before answering)
    image_delays: Mutex<Vec<(String, Duration)>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_text(&self, text: &str) {
        self.answers.lock().unwrap().push_back(Ok(GenerationOutput {
            text: Some(text.to_string()),
            images: vec![],
        }));
    }

    pub fn push_error(&self, err: RecognitionError) {
        self.answers.lock().unwrap().push_back(Err(err));
    }

    pub fn delay_image(&self, recipe: &str, delay: Duration) {
        self.image_delays
            .lock()
            .unwrap()
            .push((recipe.to_string(), delay));
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutput, RecognitionError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.wants_image {
            let found = self
                .image_delays
                .lock()
                .unwrap()
                .iter()
                .find(|(name, _)| request.prompt.contains(name.as_str()))
                .cloned();
            let Some((name, delay)) = found else {
                return Ok(GenerationOutput::default());
            };
            tokio::time::sleep(delay).await;
            return Ok(GenerationOutput {
                text: None,
                images: vec![InlineImage {
                    mime_type: "image/png".to_string(),
                    data: name,
                }],
            });
        }

        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RecognitionError::EmptyResponse))
    }
}

pub fn recognition_config() -> RecognitionConfig {
    RecognitionConfig {
        api_key: Some("test-key".to_string()),
        ..RecognitionConfig::default()
    }
}

/// A folder camera with one small still already in it
pub fn camera_with_frame() -> (TempDir, Arc<FolderCamera>) {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "frame.png");
    let camera = Arc::new(FolderCamera::new(dir.path()));
    (dir, camera)
}

pub fn write_frame(dir: &Path, name: &str) {
    let frame = image::RgbImage::from_pixel(64, 48, image::Rgb([200, 180, 40]));
    frame.save(dir.join(name)).unwrap();
}

pub fn capture_config(camera_dir: &Path) -> CaptureConfig {
    CaptureConfig {
        camera_dir: camera_dir.to_path_buf(),
        ..CaptureConfig::default()
    }
}

pub struct Harness {
    pub controller: Controller,
    pub model: Arc<ScriptedModel>,
    pub storage: MemoryStorage,
    pub camera_dir: TempDir,
}

/// Controller over in-memory storage seeded with `items`, fixed at `today()`
pub fn harness(items: &[FoodItem]) -> Harness {
    let mut storage = MemoryStorage::new();
    if !items.is_empty() {
        storage
            .save(INVENTORY_SLOT, &serde_json::to_string(items).unwrap())
            .unwrap();
    }
    let store = InventoryStore::load(Box::new(storage.clone()), INVENTORY_SLOT).unwrap();

    let model = ScriptedModel::new();
    let recognition = RecognitionClient::new(model.clone(), &recognition_config());
    let (camera_dir, camera) = camera_with_frame();
    let camera: Arc<dyn CameraDevice> = camera;

    let controller = Controller::new(
        store,
        recognition,
        camera,
        capture_config(camera_dir.path()),
    )
    .with_clock(Box::new(FixedClock(today())));

    Harness {
        controller,
        model,
        storage,
        camera_dir,
    }
}

pub fn stored_items(storage: &MemoryStorage) -> Vec<FoodItem> {
    match storage.get(INVENTORY_SLOT) {
        Some(json) => serde_json::from_str(&json).unwrap(),
        None => vec![],
    }
}

pub fn recipe_json(names: &[&str]) -> String {
    let recipes: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "description": format!("{name} for tonight"),
                "ingredientsAvailable": ["Yogurt"],
                "ingredientsMissing": [],
                "steps": ["Mix", "Serve"],
                "videos": [],
                "imageUrl": null
            })
        })
        .collect();
    serde_json::json!({ "recipes": recipes }).to_string()
}
