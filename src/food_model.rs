//! # Food Data Model
//!
//! This module defines the records that flow through the fridge tracker:
//! committed inventory items, the staged item under edit, receipt lines,
//! shop-mode search results and recipe suggestions.
//!
//! ## Core Concepts
//!
//! - **FoodItem**: a committed inventory entry, owned by the inventory store
//! - **StagedItem**: a scanned or manually started item awaiting confirmation
//! - **ExpiryStatus**: how close an item is to its expiry date
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use smart_fridge::food_model::{Category, ExpiryStatus, StagedItem};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let mut staged = StagedItem::blank(today);
//! staged.name = "Yogurt".to_string();
//! staged.category = Category::Dairy;
//! staged.expiry_date = today.succ_opt();
//!
//! let item = staged.commit().unwrap();
//! assert_eq!(item.percentage, 100);
//! assert_eq!(item.expiry_status(today), ExpiryStatus::Urgent);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::AppError;

/// Upper bound (inclusive) of the near-expiry window, in days
pub const URGENT_WINDOW_DAYS: i64 = 3;

/// Full remaining fraction for a freshly committed item
pub const FULL_PERCENTAGE: u8 = 100;

/// Longest accepted item name after trimming
pub const MAX_NAME_LENGTH: usize = 255;

/// Closed set of food categories understood by the recognition schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Vegetable,
    Fruit,
    Meat,
    Dairy,
    Drink,
    Snack,
    Condiment,
    #[default]
    Other,
}

impl Category {
    /// Every category, in the order the schema declares them
    pub const ALL: [Category; 8] = [
        Category::Vegetable,
        Category::Fruit,
        Category::Meat,
        Category::Dairy,
        Category::Drink,
        Category::Snack,
        Category::Condiment,
        Category::Other,
    ];

    /// Wire name used in the model schema and in persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vegetable => "Vegetable",
            Category::Fruit => "Fruit",
            Category::Meat => "Meat",
            Category::Dairy => "Dairy",
            Category::Drink => "Drink",
            Category::Snack => "Snack",
            Category::Condiment => "Condiment",
            Category::Other => "Other",
        }
    }

    /// Display icon, fixed per category
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Vegetable => "🥬",
            Category::Fruit => "🍎",
            Category::Meat => "🥩",
            Category::Dairy => "🥛",
            Category::Drink => "🧃",
            Category::Snack => "🍪",
            Category::Condiment => "🧂",
            Category::Other => "📦",
        }
    }

    /// Case-insensitive lookup by wire name
    pub fn parse(input: &str) -> Option<Category> {
        let wanted = input.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed inventory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    /// Opaque unique identifier
    pub id: String,

    /// Primary display name
    pub name: String,

    /// English name, when the model provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    /// Chinese name, when the model provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_zh: Option<String>,

    pub category: Category,

    #[serde(default)]
    pub production_date: Option<NaiveDate>,

    /// Day the item entered the fridge
    pub purchase_date: NaiveDate,

    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,

    /// Free-text magnitude and unit (e.g. "500 g", "1 L")
    #[serde(default)]
    pub weight: Option<String>,

    /// Remaining fraction, 1 to 100 for any persisted item
    pub percentage: u8,
}

impl FoodItem {
    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }

    /// Calendar days until expiry, negative once expired
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|expiry| days_until_expiry(expiry, today))
    }

    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::from_days(self.days_until_expiry(today))
    }

    /// Name to show for the given language code ("zh" prefers the Chinese name)
    pub fn display_name(&self, language: &str) -> &str {
        localized_name(&self.name, &self.name_en, &self.name_zh, language)
    }

    /// Every populated name field, primary name first
    pub fn names(&self) -> Vec<&str> {
        populated_names(&self.name, &self.name_en, &self.name_zh)
    }
}

/// Calendar-day difference between `expiry` and `today`
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// Freshness classification of an item relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Expiry date already passed
    Expired,
    /// Expires within the near-expiry window (0 to 3 days)
    Urgent,
    /// Expires later than the near-expiry window
    Fresh,
    /// No expiry date known
    Unknown,
}

impl ExpiryStatus {
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            None => ExpiryStatus::Unknown,
            Some(d) if d < 0 => ExpiryStatus::Expired,
            Some(d) if d <= URGENT_WINDOW_DAYS => ExpiryStatus::Urgent,
            Some(_) => ExpiryStatus::Fresh,
        }
    }

    /// Localization key for the status label
    pub fn message_key(&self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "status-expired",
            ExpiryStatus::Urgent => "status-urgent",
            ExpiryStatus::Fresh => "status-fresh",
            ExpiryStatus::Unknown => "status-unknown",
        }
    }
}

/// Editable fields of a staged item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedField {
    Name,
    NameEn,
    NameZh,
    Category,
    ProductionDate,
    PurchaseDate,
    ExpiryDate,
    Weight,
}

impl StagedField {
    pub fn parse(input: &str) -> Option<StagedField> {
        match input.trim().to_lowercase().as_str() {
            "name" => Some(StagedField::Name),
            "name_en" | "en" => Some(StagedField::NameEn),
            "name_zh" | "zh" => Some(StagedField::NameZh),
            "category" | "cat" => Some(StagedField::Category),
            "production" | "produced" => Some(StagedField::ProductionDate),
            "purchase" | "bought" => Some(StagedField::PurchaseDate),
            "expiry" | "expires" => Some(StagedField::ExpiryDate),
            "weight" => Some(StagedField::Weight),
            _ => None,
        }
    }
}

/// A food item under edit, never persisted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StagedItem {
    pub name: String,
    pub name_en: Option<String>,
    pub name_zh: Option<String>,
    pub category: Category,
    pub production_date: Option<NaiveDate>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub weight: Option<String>,
}

impl StagedItem {
    /// Empty staged item for manual entry, purchased today
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            purchase_date: Some(today),
            ..Default::default()
        }
    }

    /// Set one field from user text. Empty text clears optional fields.
    pub fn set_field(&mut self, field: StagedField, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        match field {
            StagedField::Name => self.name = validate_item_name(value)?,
            StagedField::NameEn => self.name_en = non_empty(value),
            StagedField::NameZh => self.name_zh = non_empty(value),
            StagedField::Category => {
                self.category = Category::parse(value).ok_or_else(|| {
                    AppError::InvalidInput(format!("unknown category: {value}"))
                })?;
            }
            StagedField::ProductionDate => self.production_date = parse_optional_date(value)?,
            StagedField::PurchaseDate => self.purchase_date = parse_optional_date(value)?,
            StagedField::ExpiryDate => self.expiry_date = parse_optional_date(value)?,
            StagedField::Weight => self.weight = non_empty(value),
        }
        Ok(())
    }

    /// Turn the staged record into a committed item with a fresh id.
    ///
    /// The purchase date must already be set; callers stage with today's date.
    pub fn commit(self) -> Result<FoodItem, AppError> {
        let name = validate_item_name(&self.name)?;
        let purchase_date = self
            .purchase_date
            .ok_or_else(|| AppError::InvalidInput("purchase date is required".to_string()))?;

        Ok(FoodItem {
            id: new_item_id(),
            name,
            name_en: self.name_en,
            name_zh: self.name_zh,
            category: self.category,
            production_date: self.production_date,
            purchase_date,
            expiry_date: self.expiry_date,
            weight: self.weight,
            percentage: FULL_PERCENTAGE,
        })
    }
}

/// Names recognised for a scanned item, used by shop mode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScannedNames {
    pub name: String,
    pub name_en: Option<String>,
    pub name_zh: Option<String>,
}

impl ScannedNames {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn names(&self) -> Vec<&str> {
        populated_names(&self.name, &self.name_en, &self.name_zh)
    }

    pub fn display_name(&self, language: &str) -> &str {
        localized_name(&self.name, &self.name_en, &self.name_zh, language)
    }
}

/// Outcome of a shop-mode scan
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub scanned: ScannedNames,
    pub category: Category,
    /// Snapshot of the inventory item that looks like the scanned one
    pub matched: Option<FoodItem>,
}

/// One candidate line read off a receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub name: String,
    pub name_en: Option<String>,
    pub name_zh: Option<String>,
    pub category: Category,
    pub quantity: Option<String>,
}

impl ReceiptLine {
    /// Commit the line as a full inventory item bought on `purchase_date`
    pub fn into_food_item(self, purchase_date: NaiveDate) -> Result<FoodItem, AppError> {
        StagedItem {
            name: self.name,
            name_en: self.name_en,
            name_zh: self.name_zh,
            category: self.category,
            production_date: None,
            purchase_date: Some(purchase_date),
            expiry_date: None,
            weight: self.quantity,
        }
        .commit()
    }
}

/// A parsed receipt under review
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptData {
    pub purchase_date: Option<NaiveDate>,
    pub lines: Vec<ReceiptLine>,
}

impl ReceiptData {
    /// Drop a line before commit
    pub fn remove_line(&mut self, index: usize) -> Result<ReceiptLine, AppError> {
        if index >= self.lines.len() {
            return Err(AppError::InvalidInput(format!(
                "receipt line {} does not exist",
                index + 1
            )));
        }
        Ok(self.lines.remove(index))
    }
}

/// External video reference attached to a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoLink {
    pub title: String,
    pub url: String,
    pub platform: String,
}

/// A recipe suggestion; ingredient lists are not checked against the inventory
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients_available: Vec<String>,
    pub ingredients_missing: Vec<String>,
    pub steps: Vec<String>,
    pub videos: Vec<VideoLink>,
    /// Image URL or `data:` URI
    pub image: Option<String>,
    /// Set while a generated image is still on its way
    pub image_loading: bool,
}

/// Validates a food item name
pub fn validate_item_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("item name is empty".to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::InvalidInput("item name is too long".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Parse a `YYYY-MM-DD` date typed by the user; empty input clears it
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, AppError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("not a YYYY-MM-DD date: {value}")))
}

pub fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn populated_names<'a>(
    name: &'a str,
    name_en: &'a Option<String>,
    name_zh: &'a Option<String>,
) -> Vec<&'a str> {
    [Some(name), name_en.as_deref(), name_zh.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect()
}

fn localized_name<'a>(
    name: &'a str,
    name_en: &'a Option<String>,
    name_zh: &'a Option<String>,
    language: &str,
) -> &'a str {
    let preferred = if language.starts_with("zh") {
        name_zh.as_deref()
    } else {
        name_en.as_deref()
    };
    match preferred {
        Some(n) if !n.trim().is_empty() => n,
        _ => name,
    }
}
