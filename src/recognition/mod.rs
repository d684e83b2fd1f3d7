//! # Recognition Client
//!
//! Turns captured images and ingredient lists into typed results by calling
//! a hosted multimodal model with a declared output schema.
//!
//! - `model`: the `GenerativeModel` transport trait
//! - `gemini`: the Gemini REST implementation
//! - `schema`: output schemas, typed answers and boundary validation
//! - `prompts`: prompt text per operation
//!
//! Every failure (missing key, transport, empty or malformed answer) comes
//! back as a `RecognitionError`; nothing is retried here.

pub mod gemini;
pub mod model;
pub mod prompts;
pub mod schema;

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::capture::EncodedImage;
use crate::config::RecognitionConfig;
use crate::errors::RecognitionError;
use crate::food_model::{Recipe, ReceiptData};

pub use gemini::GeminiModel;
pub use model::{GenerationOutput, GenerationRequest, GenerativeModel, InlineImage};
pub use schema::{ItemAnalysis, ItemIdentification, ReceiptAnswer, RecipeListAnswer};

/// The recognition operations, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analysis,
    Identification,
    ReceiptParse,
    RecipeSuggestion,
    RecipeImage,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Analysis => "analysis",
            Operation::Identification => "identification",
            Operation::ReceiptParse => "receipt-parse",
            Operation::RecipeSuggestion => "recipe-suggestion",
            Operation::RecipeImage => "recipe-image",
        }
    }
}

/// Recognition operations over a shared model handle.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct RecognitionClient {
    model: Arc<dyn GenerativeModel>,
    text_model: String,
    image_model: String,
}

impl RecognitionClient {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &RecognitionConfig) -> Self {
        Self {
            model,
            text_model: config.model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// Client over the Gemini REST transport
    pub fn gemini(config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        let model = GeminiModel::new(config)?;
        Ok(Self::new(Arc::new(model), config))
    }

    /// Read a single item's name, category, dates and weight
    pub async fn analyze_item(
        &self,
        images: &[EncodedImage],
        today: NaiveDate,
    ) -> Result<ItemAnalysis, RecognitionError> {
        require_images(images)?;
        self.structured(
            Operation::Analysis,
            prompts::analysis_prompt(today),
            images,
            ItemAnalysis::schema(),
        )
        .await
    }

    /// Identify a shop item by name and category only
    pub async fn identify_item(
        &self,
        images: &[EncodedImage],
    ) -> Result<ItemIdentification, RecognitionError> {
        require_images(images)?;
        self.structured(
            Operation::Identification,
            prompts::identification_prompt(),
            images,
            ItemIdentification::schema(),
        )
        .await
    }

    /// Read a receipt's date and food lines
    pub async fn parse_receipt(
        &self,
        images: &[EncodedImage],
        today: NaiveDate,
    ) -> Result<ReceiptData, RecognitionError> {
        require_images(images)?;
        let answer: ReceiptAnswer = self
            .structured(
                Operation::ReceiptParse,
                prompts::receipt_prompt(today),
                images,
                ReceiptAnswer::schema(),
            )
            .await?;
        Ok(answer.into_receipt())
    }

    /// Ask for at least three recipes using `ingredients`
    pub async fn suggest_recipes(
        &self,
        ingredients: &[String],
        language: &str,
    ) -> Result<Vec<Recipe>, RecognitionError> {
        if ingredients.is_empty() {
            return Err(RecognitionError::Decode(
                "no ingredients to suggest recipes for".to_string(),
            ));
        }
        let answer: RecipeListAnswer = self
            .structured(
                Operation::RecipeSuggestion,
                prompts::recipe_prompt(ingredients, language),
                &[],
                RecipeListAnswer::schema(),
            )
            .await?;
        Ok(answer.into_recipes())
    }

    /// Generate a picture of the dish; `Ok(None)` when the model returned no image
    pub async fn generate_recipe_image(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Option<String>, RecognitionError> {
        let request = GenerationRequest {
            model: self.image_model.clone(),
            prompt: prompts::recipe_image_prompt(name, description),
            images: Vec::new(),
            response_schema: None,
            wants_image: true,
        };
        let output = self.model.generate(request).await?;
        let image = output.images.first().map(InlineImage::to_data_uri);
        info!(
            operation = Operation::RecipeImage.as_str(),
            recipe = %name,
            generated = image.is_some(),
            "Recipe image generation finished"
        );
        Ok(image)
    }

    async fn structured<T>(
        &self,
        operation: Operation,
        prompt: String,
        images: &[EncodedImage],
        schema: Value,
    ) -> Result<T, RecognitionError>
    where
        T: serde::de::DeserializeOwned + schema::Validate,
    {
        let request = GenerationRequest {
            model: self.text_model.clone(),
            prompt,
            images: images.to_vec(),
            response_schema: Some(schema),
            wants_image: false,
        };

        let result = async {
            let output = self.model.generate(request).await?;
            let text = output.text.ok_or(RecognitionError::EmptyResponse)?;
            schema::decode::<T>(&text)
        }
        .await;

        match &result {
            Ok(_) => info!(operation = operation.as_str(), "Recognition succeeded"),
            Err(e) => warn!(operation = operation.as_str(), error = %e, "Recognition failed"),
        }
        result
    }
}

fn require_images(images: &[EncodedImage]) -> Result<(), RecognitionError> {
    if images.is_empty() {
        Err(RecognitionError::NoImages)
    } else {
        Ok(())
    }
}
