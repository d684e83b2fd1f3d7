//! # Recipe Deriver
//!
//! Picks the ingredients that need using up, asks the recognition client for
//! recipes, and fills in missing recipe pictures in the background.
//!
//! Picture generation runs as one independent task per recipe. Each task
//! sends an [`ImageUpdate`] naming its slot; [`RecipeBoard::apply`] is the
//! only place that writes the result, so completions may arrive in any
//! order (or never) without touching other slots.

use chrono::NaiveDate;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::food_model::{FoodItem, Recipe, URGENT_WINDOW_DAYS};
use crate::recognition::RecognitionClient;

/// Below this many near-expiry items the list is padded with other items
pub const MIN_URGENT_INGREDIENTS: usize = 2;

/// How many extra items padding may add
pub const PADDING_LIMIT: usize = 3;

/// Ingredient names for a recipe request, most urgent first.
///
/// Items expiring in 0 to 3 days are taken in ascending order of days left;
/// when fewer than two qualify, up to three other items are appended in
/// inventory order.
pub fn select_ingredients(items: &[FoodItem], today: NaiveDate, language: &str) -> Vec<String> {
    let mut urgent: Vec<(i64, &FoodItem)> = items
        .iter()
        .filter_map(|item| {
            item.days_until_expiry(today)
                .filter(|days| (0..=URGENT_WINDOW_DAYS).contains(days))
                .map(|days| (days, item))
        })
        .collect();
    urgent.sort_by_key(|(days, _)| *days);

    let mut selected: Vec<&FoodItem> = urgent.into_iter().map(|(_, item)| item).collect();

    if selected.len() < MIN_URGENT_INGREDIENTS {
        let padding: Vec<&FoodItem> = items
            .iter()
            .filter(|item| !selected.iter().any(|chosen| chosen.id == item.id))
            .take(PADDING_LIMIT)
            .collect();
        debug!(padding = padding.len(), "Padding recipe ingredients");
        selected.extend(padding);
    }

    selected
        .into_iter()
        .map(|item| item.display_name(language).to_string())
        .collect()
}

/// Select ingredients and fetch recipe suggestions for them
pub async fn derive_recipes(
    client: &RecognitionClient,
    items: &[FoodItem],
    today: NaiveDate,
    language: &str,
) -> Result<(Vec<String>, Vec<Recipe>), AppError> {
    let ingredients = select_ingredients(items, today, language);
    if ingredients.is_empty() {
        info!("No ingredients available for recipe suggestions");
        return Err(AppError::EmptyFridge);
    }

    info!(ingredients = ?ingredients, "Requesting recipe suggestions");
    let recipes = client
        .suggest_recipes(&ingredients, language)
        .await
        .map_err(AppError::RecipeFailure)?;

    Ok((ingredients, recipes))
}

/// A finished picture generation for one recipe slot
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpdate {
    /// Board the recipe belongs to
    pub board_id: u64,
    /// Position of the recipe on that board
    pub index: usize,
    /// Generated image, `None` when generation failed or returned nothing
    pub image: Option<String>,
}

/// Spawn one picture generation task per recipe without an image.
///
/// Returns the number of tasks started. Tasks are never cancelled.
pub fn spawn_image_backfill(
    client: &RecognitionClient,
    board_id: u64,
    recipes: &[Recipe],
    updates: UnboundedSender<ImageUpdate>,
) -> usize {
    let mut spawned = 0;
    for (index, recipe) in recipes.iter().enumerate() {
        if recipe.image.is_some() {
            continue;
        }
        let client = client.clone();
        let updates = updates.clone();
        let name = recipe.name.clone();
        let description = recipe.description.clone();

        tokio::spawn(async move {
            let image = match client.generate_recipe_image(&name, &description).await {
                Ok(image) => image,
                Err(e) => {
                    warn!(recipe = %name, error = %e, "Recipe image generation failed");
                    None
                }
            };
            // The receiver is gone once the controller is dropped
            let _ = updates.send(ImageUpdate {
                board_id,
                index,
                image,
            });
        });
        spawned += 1;
    }
    debug!(board_id, spawned, "Recipe image backfill started");
    spawned
}

/// The recipes screen's state
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeBoard {
    pub id: u64,
    /// Ingredients the request was built from
    pub ingredients: Vec<String>,
    pub recipes: Vec<Recipe>,
}

impl RecipeBoard {
    /// Apply one image update; returns whether a slot changed
    pub fn apply(&mut self, update: ImageUpdate) -> bool {
        if update.board_id != self.id {
            debug!(
                board_id = self.id,
                update_board = update.board_id,
                "Dropping image update for another board"
            );
            return false;
        }
        let Some(recipe) = self.recipes.get_mut(update.index) else {
            return false;
        };
        if update.image.is_some() {
            recipe.image = update.image;
        }
        recipe.image_loading = false;
        true
    }

    /// Recipes still waiting for a picture
    pub fn pending_images(&self) -> usize {
        self.recipes.iter().filter(|r| r.image_loading).count()
    }
}
