//! ============================================================================
//! Gemini transport - generateContent over REST
//! ============================================================================
//! Sends one prompt plus inline JPEG parts to a Gemini model and collects
//! the text and inline image parts of the first candidate.
//! ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::model::{GenerationOutput, GenerationRequest, GenerativeModel, InlineImage};
use crate::config::RecognitionConfig;
use crate::errors::RecognitionError;

/// Gemini generateContent client
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

impl GeminiModel {
    pub fn new(config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RecognitionError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutput, RecognitionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RecognitionError::MissingCredentials)?;

        info!(
            model = %request.model,
            image_count = request.images.len(),
            structured = request.response_schema.is_some(),
            "Calling Gemini"
        );

        let body = GenerateContentRequest::from(request.clone());
        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(format!("Failed to call Gemini API: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Gemini API returned an error status");
            return Err(RecognitionError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            RecognitionError::Decode(format!("Failed to parse Gemini response envelope: {e}"))
        })?;

        let output = parsed.into_output();
        debug!(
            text_len = output.text.as_ref().map_or(0, String::len),
            image_count = output.images.len(),
            "Gemini call completed"
        );
        Ok(output)
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<GenerationRequest> for GenerateContentRequest {
    fn from(request: GenerationRequest) -> Self {
        let mut parts = vec![Part {
            text: Some(request.prompt),
            inline_data: None,
        }];
        parts.extend(request.images.into_iter().map(|image| Part {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type,
                data: image.data,
            }),
        }));

        let generation_config = if request.wants_image {
            Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            })
        } else {
            request.response_schema.map(|schema| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
                response_modalities: None,
            })
        };

        Self {
            contents: vec![Content {
                parts,
                role: Some("user".to_string()),
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn into_output(self) -> GenerationOutput {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let mut text = String::new();
        let mut images = Vec::new();
        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(blob) = part.inline_data {
                images.push(InlineImage {
                    mime_type: blob.mime_type,
                    data: blob.data,
                });
            }
        }

        GenerationOutput {
            text: if text.trim().is_empty() { None } else { Some(text) },
            images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::EncodedImage;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest {
            model: "m".to_string(),
            prompt: "what is this".to_string(),
            images: vec![EncodedImage {
                mime_type: "image/jpeg".to_string(),
                data: "AAAA".to_string(),
                width: 1,
                height: 1,
            }],
            response_schema: Some(json!({"type": "OBJECT"})),
            wants_image: false,
        };

        let body = serde_json::to_value(GenerateContentRequest::from(request)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "what is this");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_image_request_asks_for_image_modality() {
        let request = GenerationRequest {
            model: "m".to_string(),
            prompt: "draw".to_string(),
            images: vec![],
            response_schema: None,
            wants_image: true,
        };
        let body = serde_json::to_value(GenerateContentRequest::from(request)).unwrap();
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
    }

    #[test]
    fn test_response_collects_text_and_images() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "{\"a\":"},
                        {"text": "1}"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBO"}}
                    ]
                }
            }]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let output = parsed.into_output();
        assert_eq!(output.text.as_deref(), Some("{\"a\":1}"));
        assert_eq!(output.images.len(), 1);
        assert_eq!(output.images[0].to_data_uri(), "data:image/png;base64,iVBO");
    }

    #[test]
    fn test_empty_candidates_give_empty_output() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed.into_output(), GenerationOutput::default());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let model = GeminiModel::new(&RecognitionConfig::default()).unwrap();
        let result = model
            .generate(GenerationRequest {
                model: "m".to_string(),
                prompt: "p".to_string(),
                images: vec![],
                response_schema: None,
                wants_image: false,
            })
            .await;
        assert_eq!(result, Err(RecognitionError::MissingCredentials));
    }
}
