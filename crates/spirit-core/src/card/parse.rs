//! Parsing of provider text into a validated card.

use crate::error::{SpiritError, SpiritResult};

use super::model::Card;

/// Strip an optional markdown code fence (with optional language tag) around a payload.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let body = rest[tag_len..].trim_start();

    body.strip_suffix("```").unwrap_or(body).trim_end()
}

/// Parse and validate a card from the provider's raw text.
pub fn parse_card(text: &str) -> SpiritResult<Card> {
    let json = strip_code_fence(text);

    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SpiritError::MalformedResponse(format!("card text is not JSON: {}", e)))?;

    let card: Card = serde_json::from_value(value)
        .map_err(|e| SpiritError::schema(format!("card JSON does not match schema: {}", e)))?;

    card.validate()?;
    Ok(card)
}
