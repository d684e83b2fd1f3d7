//! Transport seam between the recognition client and a hosted model.

use async_trait::async_trait;
use serde_json::Value;

use crate::capture::EncodedImage;
use crate::errors::RecognitionError;

/// One structured-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// Inline image payloads sent after the prompt, in order
    pub images: Vec<EncodedImage>,
    /// Declared JSON output schema; `None` for free-form or image output
    pub response_schema: Option<Value>,
    /// Ask the model to answer with generated image parts
    pub wants_image: bool,
}

/// An inline image returned by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl InlineImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// What came back from a call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationOutput {
    /// Concatenated text parts, if any
    pub text: Option<String>,
    pub images: Vec<InlineImage>,
}

/// A hosted generative model
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationOutput, RecognitionError>;
}
