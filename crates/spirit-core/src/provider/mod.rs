//! Generative AI provider adapters.
//!
//! The quiz only talks to providers through [`CardGenerator`] and
//! [`ImageGenerator`]; concrete clients live in the submodules.

pub mod anthropic;
pub mod openai;

use async_trait::async_trait;

use crate::card::Card;
use crate::error::SpiritResult;
use crate::quiz::model::AnswerSet;

pub use anthropic::AnthropicCardClient;
pub use openai::OpenAiImageClient;

/// Illustration bytes for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl RenderedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "image/png".to_string(),
        }
    }
}

/// Text generation: answers in, card out.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate_card(&self, answers: &AnswerSet) -> SpiritResult<Card>;
}

/// Image generation: card image prompt in, image bytes out.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, image_prompt: &str) -> SpiritResult<RenderedImage>;
}
