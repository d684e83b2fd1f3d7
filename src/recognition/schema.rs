//! Output schemas declared to the model and the typed records decoded from
//! its answers. Every answer passes through [`decode`], which strips code
//! fences, deserializes into the typed record and then validates it.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::errors::RecognitionError;
use crate::food_model::{
    Category, Recipe, ReceiptData, ReceiptLine, ScannedNames, StagedItem, VideoLink,
};

/// Fewest recipes a suggestion answer may carry
pub const MIN_RECIPES: usize = 3;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$")
        .expect("Code fence pattern should be valid");
}

/// Remove one enclosing Markdown code fence, if present
pub fn strip_code_fences(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

/// Semantic checks that serde cannot express
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Strip fences, deserialize and validate a model answer
pub fn decode<T>(raw: &str) -> Result<T, RecognitionError>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(RecognitionError::EmptyResponse);
    }
    let value: T =
        serde_json::from_str(body).map_err(|e| RecognitionError::Decode(e.to_string()))?;
    value.validate().map_err(RecognitionError::Decode)?;
    Ok(value)
}

/// `YYYY-MM-DD`, with `null`, `""` and `"null"` read as absent
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date '{s}'"))),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null"))
}

fn require_name(name: &str, what: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err(format!("{what} has an empty name"))
    } else {
        Ok(())
    }
}

fn category_schema() -> Value {
    let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    json!({ "type": "STRING", "enum": names })
}

fn nullable_string(description: &str) -> Value {
    json!({ "type": "STRING", "nullable": true, "description": description })
}

fn name_properties() -> serde_json::Map<String, Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "name".to_string(),
        json!({ "type": "STRING", "description": "Display name in the user's language" }),
    );
    props.insert("nameEn".to_string(), nullable_string("English name"));
    props.insert("nameZh".to_string(), nullable_string("Simplified Chinese name"));
    props.insert("category".to_string(), category_schema());
    props
}

// ============================================================================
// Single-item analysis
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnalysis {
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_zh: Option<String>,
    pub category: Category,
    #[serde(default, deserialize_with = "optional_date")]
    pub production_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_text")]
    pub weight: Option<String>,
}

impl Validate for ItemAnalysis {
    fn validate(&self) -> Result<(), String> {
        require_name(&self.name, "item")?;
        if let (Some(produced), Some(expires)) = (self.production_date, self.expiry_date) {
            if expires < produced {
                return Err(format!(
                    "expiry date {expires} is before production date {produced}"
                ));
            }
        }
        Ok(())
    }
}

impl ItemAnalysis {
    pub fn schema() -> Value {
        let mut props = name_properties();
        props.insert(
            "productionDate".to_string(),
            nullable_string("Production date as YYYY-MM-DD"),
        );
        props.insert(
            "expiryDate".to_string(),
            nullable_string("Expiry or best-before date as YYYY-MM-DD"),
        );
        props.insert(
            "weight".to_string(),
            nullable_string("Net weight or volume with unit, e.g. 500 g"),
        );
        json!({
            "type": "OBJECT",
            "properties": props,
            "required": ["name", "category"]
        })
    }

    /// Stage the analysis for user review, purchased today
    pub fn into_staged(self, today: NaiveDate) -> StagedItem {
        StagedItem {
            name: self.name.trim().to_string(),
            name_en: self.name_en,
            name_zh: self.name_zh,
            category: self.category,
            production_date: self.production_date,
            purchase_date: Some(today),
            expiry_date: self.expiry_date,
            weight: self.weight,
        }
    }
}

// ============================================================================
// Shop-item identification
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemIdentification {
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_zh: Option<String>,
    pub category: Category,
}

impl Validate for ItemIdentification {
    fn validate(&self) -> Result<(), String> {
        require_name(&self.name, "item")
    }
}

impl ItemIdentification {
    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": name_properties(),
            "required": ["name", "category"]
        })
    }

    pub fn scanned_names(&self) -> ScannedNames {
        ScannedNames {
            name: self.name.trim().to_string(),
            name_en: self.name_en.clone(),
            name_zh: self.name_zh.clone(),
        }
    }
}

// ============================================================================
// Receipt parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLineAnswer {
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub name_zh: Option<String>,
    pub category: Category,
    #[serde(default, deserialize_with = "optional_text")]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAnswer {
    #[serde(default, deserialize_with = "optional_date")]
    pub purchase_date: Option<NaiveDate>,
    pub items: Vec<ReceiptLineAnswer>,
}

impl Validate for ReceiptAnswer {
    fn validate(&self) -> Result<(), String> {
        for line in &self.items {
            require_name(&line.name, "receipt line")?;
        }
        Ok(())
    }
}

impl ReceiptAnswer {
    pub fn schema() -> Value {
        let mut line_props = name_properties();
        line_props.insert(
            "quantity".to_string(),
            nullable_string("Quantity or weight as printed, e.g. 2 x 1 L"),
        );
        json!({
            "type": "OBJECT",
            "properties": {
                "purchaseDate": nullable_string("Purchase date printed on the receipt as YYYY-MM-DD"),
                "items": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": line_props,
                        "required": ["name", "category"]
                    }
                }
            },
            "required": ["items"]
        })
    }

    pub fn into_receipt(self) -> ReceiptData {
        ReceiptData {
            purchase_date: self.purchase_date,
            lines: self
                .items
                .into_iter()
                .map(|line| ReceiptLine {
                    name: line.name.trim().to_string(),
                    name_en: line.name_en,
                    name_zh: line.name_zh,
                    category: line.category,
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Recipe suggestion
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAnswer {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients_available: Vec<String>,
    #[serde(default)]
    pub ingredients_missing: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub videos: Vec<VideoLink>,
    #[serde(default, deserialize_with = "optional_text")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeListAnswer {
    pub recipes: Vec<RecipeAnswer>,
}

impl Validate for RecipeListAnswer {
    fn validate(&self) -> Result<(), String> {
        if self.recipes.len() < MIN_RECIPES {
            return Err(format!(
                "expected at least {MIN_RECIPES} recipes, got {}",
                self.recipes.len()
            ));
        }
        for recipe in &self.recipes {
            require_name(&recipe.name, "recipe")?;
            if recipe.steps.is_empty() {
                return Err(format!("recipe '{}' has no steps", recipe.name));
            }
        }
        Ok(())
    }
}

impl RecipeListAnswer {
    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "recipes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "ingredientsAvailable": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "ingredientsMissing": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "steps": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "videos": {
                                "type": "ARRAY",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "title": { "type": "STRING" },
                                        "url": { "type": "STRING" },
                                        "platform": { "type": "STRING" }
                                    },
                                    "required": ["title", "url", "platform"]
                                }
                            },
                            "imageUrl": nullable_string("Direct URL of a photo of the finished dish")
                        },
                        "required": ["name", "description", "ingredientsAvailable", "ingredientsMissing", "steps", "videos"]
                    }
                }
            },
            "required": ["recipes"]
        })
    }

    /// Recipes in answer order; those without an image start out loading
    pub fn into_recipes(self) -> Vec<Recipe> {
        self.recipes
            .into_iter()
            .map(|answer| {
                let image_loading = answer.image_url.is_none();
                Recipe {
                    name: answer.name.trim().to_string(),
                    description: answer.description,
                    ingredients_available: answer.ingredients_available,
                    ingredients_missing: answer.ingredients_missing,
                    steps: answer.steps,
                    videos: answer.videos,
                    image: answer.image_url,
                    image_loading,
                }
            })
            .collect()
    }
}
