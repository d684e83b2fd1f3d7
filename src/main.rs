use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use smart_fridge::capture::FolderCamera;
use smart_fridge::config::AppConfig;
use smart_fridge::controller::Controller;
use smart_fridge::inventory::InventoryStore;
use smart_fridge::localization::get_localization_manager;
use smart_fridge::recognition::RecognitionClient;
use smart_fridge::storage::FileStorage;

/// Track what is in your fridge from photos
#[derive(Debug, Parser)]
#[command(name = "smart-fridge", version, about)]
struct Args {
    /// Directory holding the inventory file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Folder the camera reads still images from
    #[arg(long)]
    camera_dir: Option<PathBuf>,

    /// Interface and recipe language (en or zh)
    #[arg(long)]
    lang: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so they do not interleave with the screen
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.camera_dir {
        config.capture.camera_dir = dir;
    }
    if let Some(lang) = args.lang {
        config.language = lang;
    }

    if get_localization_manager().is_none() {
        warn!("Translations unavailable, showing message keys");
    }
    if config.recognition.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; recognition and recipes will fail");
    }

    info!(data_dir = %config.data_dir.display(), "Opening inventory");
    let storage = FileStorage::open(config.data_dir.clone())?;
    let store = InventoryStore::load(Box::new(storage), &config.inventory_slot)?;
    info!(items = store.len(), "Inventory loaded");

    let recognition = RecognitionClient::gemini(&config.recognition)?;
    let camera = Arc::new(FolderCamera::new(config.capture.camera_dir.clone()));
    info!(camera = %config.capture.camera_dir.display(), "Using folder camera");

    let controller = Controller::new(store, recognition, camera, config.capture.clone())
        .with_language(config.language.clone());

    smart_fridge::ui::run(controller).await
}
