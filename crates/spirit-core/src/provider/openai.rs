//! OpenAI Images API client for card illustrations.
//!
//! Requests a single square image as inline base64 so callers never fetch a
//! remote URL, then decodes it to PNG bytes.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ImageGenerator, RenderedImage};
use crate::card::prompt;
use crate::config::OpenAiConfig;
use crate::error::{SpiritError, SpiritResult};

/// Client for generating card illustrations with DALL-E.
#[derive(Clone)]
pub struct OpenAiImageClient {
    api_key: String,
    model: String,
    size: String,
    quality: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u32,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

impl OpenAiImageClient {
    /// Create a new client from configuration. Fails when no API key is set.
    pub fn new(config: &OpenAiConfig, client: reqwest::Client) -> SpiritResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SpiritError::config("OPENAI_API_KEY is not set"))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

/// Decode the first inline image of an Images API response body.
fn decode_image(body: &str) -> SpiritResult<Vec<u8>> {
    let parsed: ImagesResponse = serde_json::from_str(body).map_err(|e| {
        SpiritError::MalformedResponse(format!("failed to parse Images API response: {}", e))
    })?;

    let b64 = parsed
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .ok_or_else(|| {
            SpiritError::MalformedResponse("No image data returned from DALL-E".to_string())
        })?;

    base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| SpiritError::MalformedResponse(format!("invalid base64 image data: {}", e)))
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate_image(&self, image_prompt: &str) -> SpiritResult<RenderedImage> {
        let request = ImagesRequest {
            model: &self.model,
            prompt: prompt::image_prompt(image_prompt),
            n: 1,
            size: &self.size,
            quality: &self.quality,
            response_format: "b64_json",
        };

        debug!(model = %self.model, size = %self.size, "Calling Images API");
        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpiritError::Transport(format!(
                "Images API error (HTTP {}): {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let bytes = decode_image(&body)?;
        debug!(size = bytes.len(), "Image decoded");

        Ok(RenderedImage::png(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_inline_image() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG fake");
        let body = format!(r#"{{"created":1,"data":[{{"b64_json":"{}"}}]}}"#, b64);
        assert_eq!(decode_image(&body).unwrap(), b"\x89PNG fake".to_vec());
    }

    #[test]
    fn test_missing_payload() {
        for body in [r#"{"data":[]}"#, r#"{"data":[{"url":"https://x"}]}"#, r#"{}"#] {
            let err = decode_image(body).unwrap_err();
            assert!(matches!(err, SpiritError::MalformedResponse(_)), "{}", body);
        }
    }

    #[test]
    fn test_bad_base64() {
        let err = decode_image(r#"{"data":[{"b64_json":"***"}]}"#).unwrap_err();
        assert!(err.to_string().contains("base64"));
    }
}
