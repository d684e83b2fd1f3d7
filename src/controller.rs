//! # View Controller
//!
//! The fridge tracker's screen state machine. All state lives in one
//! `Controller`: the current [`Screen`] (which owns any staged record), the
//! capture overlay, a loading flag and the last error. Front ends call the
//! action methods and re-render from the getters.
//!
//! Screens and transitions:
//!
//! - **Inventory** → capture overlay (Add / Shop / Receipt), AddForm (manual), Recipes
//! - capture overlay → AddForm, ShopResult or ReceiptReview, by mode
//! - AddForm, ReceiptReview → Inventory on confirm or cancel
//! - ShopResult → Inventory, or AddForm via "add anyway"
//! - Recipes → Inventory
//!
//! Any failed recognition or recipe request lands back on Inventory with the
//! inventory untouched and the error kept until dismissed.

use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::capture::{CameraDevice, CaptureSession};
use crate::config::CaptureConfig;
use crate::errors::AppError;
use crate::food_model::{ReceiptData, SearchResult, StagedField, StagedItem};
use crate::inventory::{ConsumptionOutcome, InventoryStore};
use crate::matcher::{find_duplicate, MatchStrategy, SubstringMatcher};
use crate::recipes::{derive_recipes, spawn_image_backfill, ImageUpdate, RecipeBoard};
use crate::recognition::RecognitionClient;

/// Source of "today" for dates and expiry maths
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A fixed date, for tests and reproducible runs
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// What the capture overlay was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Photograph a new item for the inventory
    Add,
    /// Photograph a shop item to check for duplicates
    Shop,
    /// Photograph a receipt to add its lines
    Receipt,
}

/// The screen currently shown
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Inventory,
    AddForm(StagedItem),
    ShopResult(SearchResult),
    ReceiptReview(ReceiptData),
    Recipes(RecipeBoard),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Inventory => "inventory",
            Screen::AddForm(_) => "add-form",
            Screen::ShopResult(_) => "shop-result",
            Screen::ReceiptReview(_) => "receipt-review",
            Screen::Recipes(_) => "recipes",
        }
    }
}

/// Name reported by `WrongScreen` while the overlay covers the screen
pub const OVERLAY_NAME: &str = "capture";

/// The modal camera overlay
pub struct CaptureOverlay {
    pub mode: CaptureMode,
    session: CaptureSession,
}

impl CaptureOverlay {
    pub fn image_count(&self) -> usize {
        self.session.images().len()
    }

    /// Whether the camera is currently held
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }
}

pub struct Controller {
    store: InventoryStore,
    recognition: RecognitionClient,
    camera: Arc<dyn CameraDevice>,
    capture_config: CaptureConfig,
    matcher: Box<dyn MatchStrategy>,
    clock: Box<dyn Clock>,
    language: String,
    screen: Screen,
    overlay: Option<CaptureOverlay>,
    loading: bool,
    error: Option<AppError>,
    next_board_id: u64,
    image_tx: UnboundedSender<ImageUpdate>,
    image_rx: UnboundedReceiver<ImageUpdate>,
}

impl Controller {
    pub fn new(
        store: InventoryStore,
        recognition: RecognitionClient,
        camera: Arc<dyn CameraDevice>,
        capture_config: CaptureConfig,
    ) -> Self {
        let (image_tx, image_rx) = mpsc::unbounded_channel();
        Self {
            store,
            recognition,
            camera,
            capture_config,
            matcher: Box::new(SubstringMatcher),
            clock: Box::new(SystemClock),
            language: crate::config::DEFAULT_LANGUAGE.to_string(),
            screen: Screen::Inventory,
            overlay: None,
            loading: false,
            error: None,
            next_board_id: 1,
            image_tx,
            image_rx,
        }
    }

    pub fn with_matcher(mut self, matcher: Box<dyn MatchStrategy>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn overlay(&self) -> Option<&CaptureOverlay> {
        self.overlay.as_ref()
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Always false between actions; see `ensure_idle`
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // ------------------------------------------------------------------
    // Capture overlay
    // ------------------------------------------------------------------

    /// Open the camera overlay from the inventory screen.
    ///
    /// A camera failure leaves the overlay open (inactive) so the user can retry.
    /// Opening again while the overlay is up only switches its mode; the
    /// photos taken so far are kept.
    pub fn open_capture(&mut self, mode: CaptureMode) -> Result<(), AppError> {
        self.ensure_idle()?;
        if let Some(overlay) = self.overlay.as_mut() {
            if overlay.mode != mode {
                info!(from = ?overlay.mode, to = ?mode, "Capture mode switched");
                overlay.mode = mode;
            }
            return Ok(());
        }
        self.expect_inventory()?;

        let mut session = CaptureSession::new(Arc::clone(&self.camera), &self.capture_config);
        let started = session.start();
        self.overlay = Some(CaptureOverlay { mode, session });
        info!(?mode, "Capture overlay opened");

        started.map_err(|e| self.fail(e.into()))
    }

    /// Re-acquire the camera from scratch after a failure
    pub fn retry_camera(&mut self) -> Result<(), AppError> {
        let overlay = self.overlay.as_mut().ok_or(AppError::NoCaptureSession)?;
        let result = overlay.session.retry();
        match result {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Grab the current frame; returns how many frames are held
    pub fn capture_frame(&mut self) -> Result<usize, AppError> {
        let overlay = self.overlay.as_mut().ok_or(AppError::NoCaptureSession)?;
        let result = overlay.session.capture_frame();
        result.map_err(|e| self.fail(e.into()))
    }

    /// Drop a captured frame before sending
    pub fn remove_frame(&mut self, index: usize) -> Result<(), AppError> {
        let overlay = self.overlay.as_mut().ok_or(AppError::NoCaptureSession)?;
        match overlay.session.remove_at(index) {
            Some(_) => Ok(()),
            None => Err(self.fail(AppError::InvalidInput(format!(
                "photo {} does not exist",
                index + 1
            )))),
        }
    }

    /// Dismiss the overlay without recognising anything
    pub fn close_capture(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            overlay.session.close();
        }
    }

    /// Release the camera, send the photos for recognition and move to the
    /// screen that matches the capture mode
    pub async fn finish_capture(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        let overlay = self.overlay.take().ok_or(AppError::NoCaptureSession)?;
        let mode = overlay.mode;
        let images = overlay.session.finish();

        if images.is_empty() {
            return Err(self.fail(AppError::InvalidInput(
                "take at least one photo first".to_string(),
            )));
        }

        let today = self.today();
        self.loading = true;
        let outcome = match mode {
            CaptureMode::Add => self
                .recognition
                .analyze_item(&images, today)
                .await
                .map(|analysis| Screen::AddForm(analysis.into_staged(today))),
            CaptureMode::Shop => {
                self.recognition
                    .identify_item(&images)
                    .await
                    .map(|identification| {
                        let scanned = identification.scanned_names();
                        let matched =
                            find_duplicate(self.matcher.as_ref(), &scanned, self.store.items())
                                .cloned();
                        Screen::ShopResult(SearchResult {
                            scanned,
                            category: identification.category,
                            matched,
                        })
                    })
            }
            CaptureMode::Receipt => self
                .recognition
                .parse_receipt(&images, today)
                .await
                .map(Screen::ReceiptReview),
        };
        self.loading = false;

        match outcome {
            Ok(screen) => {
                info!(?mode, screen = screen.name(), "Recognition result staged");
                self.screen = screen;
                Ok(())
            }
            Err(e) => {
                self.screen = Screen::Inventory;
                Err(self.fail(e.into()))
            }
        }
    }

    // ------------------------------------------------------------------
    // Add form
    // ------------------------------------------------------------------

    /// Open an empty add form without a photo
    pub fn start_manual_add(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.expect_inventory()?;
        self.screen = Screen::AddForm(StagedItem::blank(self.today()));
        Ok(())
    }

    pub fn edit_staged(&mut self, field: StagedField, value: &str) -> Result<(), AppError> {
        let result = match &mut self.screen {
            Screen::AddForm(staged) => staged.set_field(field, value),
            other => Err(AppError::WrongScreen(other.name())),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Commit the staged item; returns the new item's id
    pub fn confirm_add(&mut self) -> Result<String, AppError> {
        self.ensure_idle()?;
        let staged = match std::mem::replace(&mut self.screen, Screen::Inventory) {
            Screen::AddForm(staged) => staged,
            other => {
                let name = other.name();
                self.screen = other;
                return Err(self.fail(AppError::WrongScreen(name)));
            }
        };

        let item = match staged.clone().commit() {
            Ok(item) => item,
            Err(e) => {
                // Keep the form so the user can fix it
                self.screen = Screen::AddForm(staged);
                return Err(self.fail(e));
            }
        };

        let id = item.id.clone();
        self.store.add(item).map_err(|e| self.fail(e))?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Shop result
    // ------------------------------------------------------------------

    /// Stage the scanned shop item in the add form
    pub fn add_scanned_anyway(&mut self) -> Result<(), AppError> {
        let today = self.today();
        let staged = match &self.screen {
            Screen::ShopResult(result) => StagedItem {
                name: result.scanned.name.clone(),
                name_en: result.scanned.name_en.clone(),
                name_zh: result.scanned.name_zh.clone(),
                category: result.category,
                ..StagedItem::blank(today)
            },
            other => {
                let name = other.name();
                return Err(self.fail(AppError::WrongScreen(name)));
            }
        };
        self.screen = Screen::AddForm(staged);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Receipt review
    // ------------------------------------------------------------------

    pub fn remove_receipt_line(&mut self, index: usize) -> Result<(), AppError> {
        let result = match &mut self.screen {
            Screen::ReceiptReview(receipt) => receipt.remove_line(index).map(|_| ()),
            other => Err(AppError::WrongScreen(other.name())),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Add every remaining receipt line; returns how many were added
    pub fn confirm_receipt(&mut self) -> Result<usize, AppError> {
        self.ensure_idle()?;
        let receipt = match &self.screen {
            Screen::ReceiptReview(receipt) => receipt.clone(),
            other => {
                let name = other.name();
                return Err(self.fail(AppError::WrongScreen(name)));
            }
        };

        let purchase_date = receipt.purchase_date.unwrap_or_else(|| self.today());
        let items = receipt
            .lines
            .into_iter()
            .map(|line| line.into_food_item(purchase_date))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(e))?;

        let count = items.len();
        self.store.add_all(items).map_err(|e| self.fail(e))?;
        self.screen = Screen::Inventory;
        info!(count, "Receipt lines added");
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    pub fn set_consumption(
        &mut self,
        id: &str,
        percentage: i32,
    ) -> Result<ConsumptionOutcome, AppError> {
        self.ensure_idle()?;
        self.ensure_no_overlay()?;
        self.store
            .set_consumption(id, percentage)
            .map_err(|e| self.fail(e))
    }

    pub fn discard(&mut self, id: &str) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.ensure_no_overlay()?;
        self.store.discard(id).map(|_| ()).map_err(|e| self.fail(e))
    }

    // ------------------------------------------------------------------
    // Recipes
    // ------------------------------------------------------------------

    /// Fetch recipes for near-expiry items and start picture backfill
    pub async fn request_recipes(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.expect_inventory()?;

        let today = self.today();
        self.loading = true;
        let outcome =
            derive_recipes(&self.recognition, self.store.items(), today, &self.language).await;
        self.loading = false;

        match outcome {
            Ok((ingredients, recipes)) => {
                let board_id = self.next_board_id;
                self.next_board_id += 1;
                spawn_image_backfill(&self.recognition, board_id, &recipes, self.image_tx.clone());
                self.screen = Screen::Recipes(RecipeBoard {
                    id: board_id,
                    ingredients,
                    recipes,
                });
                Ok(())
            }
            Err(e) => {
                self.screen = Screen::Inventory;
                Err(self.fail(e))
            }
        }
    }

    /// Route one picture update to the recipes screen; stale updates are dropped
    pub fn apply_image_update(&mut self, update: ImageUpdate) -> bool {
        match &mut self.screen {
            Screen::Recipes(board) => board.apply(update),
            _ => {
                debug!(board_id = update.board_id, "Recipes screen gone, dropping image update");
                false
            }
        }
    }

    /// Apply every picture update that has already arrived
    pub fn drain_image_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.image_rx.try_recv() {
            if self.apply_image_update(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next picture update (never resolves while none are in flight)
    pub async fn next_image_update(&mut self) -> Option<ImageUpdate> {
        self.image_rx.recv().await
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Return to the inventory, discarding any staged record or open overlay
    pub fn back_to_inventory(&mut self) {
        self.close_capture();
        if !matches!(self.screen, Screen::Inventory) {
            debug!(from = self.screen.name(), "Returning to inventory");
        }
        self.screen = Screen::Inventory;
    }

    /// Store the failure of an action that never reached the controller,
    /// such as an unparseable position, so it replaces any older error
    pub fn report_error(&mut self, err: AppError) {
        debug!(error = %err, "Front end error recorded");
        self.error = Some(err);
    }

    /// Reject actions while a recognition call is in flight.
    ///
    /// Every action borrows the controller mutably for its whole run, so
    /// with a single owner (the terminal loop) nothing can observe
    /// `loading` mid-call. The guard matters once the controller is shared
    /// behind a lock that is released across the model call.
    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.loading {
            Err(AppError::Busy)
        } else {
            Ok(())
        }
    }

    /// The overlay is modal: nothing under it can be acted on
    fn ensure_no_overlay(&mut self) -> Result<(), AppError> {
        if self.overlay.is_some() {
            Err(self.fail(AppError::WrongScreen(OVERLAY_NAME)))
        } else {
            Ok(())
        }
    }

    fn expect_inventory(&mut self) -> Result<(), AppError> {
        self.ensure_no_overlay()?;
        match &self.screen {
            Screen::Inventory => Ok(()),
            other => {
                let name = other.name();
                Err(self.fail(AppError::WrongScreen(name)))
            }
        }
    }

    /// Record the error for display and hand it back to the caller
    fn fail(&mut self, err: AppError) -> AppError {
        warn!(error = %err, screen = self.screen.name(), "Action failed");
        self.error = Some(err.clone());
        err
    }
}
