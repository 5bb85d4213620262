//! Card domain models.

use serde::{Deserialize, Serialize};

use crate::error::{SpiritError, SpiritResult};

/// Lowest stat value a generated card may carry.
pub const STAT_MIN: i64 = 7;
/// Highest stat value a generated card may carry.
pub const STAT_MAX: i64 = 10;

/// A generated spirit animal card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub element: String,
    pub personality: String,
    pub backstory: String,
    pub stats: Stats,
    pub special_move: SpecialMove,
    pub rarity: String,
    #[serde(rename = "imagePrompt")]
    pub image_prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub courage: i64,
    pub kindness: i64,
    pub magic: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMove {
    pub name: String,
    pub description: String,
}

impl Card {
    /// Check the invariants the provider was asked to honour.
    pub fn validate(&self) -> SpiritResult<()> {
        let required = [
            ("name", &self.name),
            ("element", &self.element),
            ("personality", &self.personality),
            ("backstory", &self.backstory),
            ("special_move.name", &self.special_move.name),
            ("special_move.description", &self.special_move.description),
            ("rarity", &self.rarity),
            ("imagePrompt", &self.image_prompt),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SpiritError::schema(format!("field '{}' is empty", field)));
            }
        }

        for (stat, value) in self.stats.named() {
            if !(STAT_MIN..=STAT_MAX).contains(&value) {
                return Err(SpiritError::schema(format!(
                    "stat '{}' is {}, expected {}-{}",
                    stat, value, STAT_MIN, STAT_MAX
                )));
            }
        }

        Ok(())
    }
}

impl Stats {
    /// Stats paired with their lowercase names, in display order.
    pub fn named(&self) -> [(&'static str, i64); 3] {
        [
            ("courage", self.courage),
            ("kindness", self.kindness),
            ("magic", self.magic),
        ]
    }
}

#[cfg(test)]
pub(crate) fn sample_card() -> Card {
    Card {
        name: "Ember Kit".to_string(),
        element: "Fire".to_string(),
        personality: "A fearless little flame who never backs down.".to_string(),
        backstory: "Born in a volcano's heart. It guards the sky village.".to_string(),
        stats: Stats { courage: 10, kindness: 8, magic: 9 },
        special_move: SpecialMove {
            name: "Blaze Pounce".to_string(),
            description: "Leaps through the air wrapped in golden flames.".to_string(),
        },
        rarity: "Ultra Rare".to_string(),
        image_prompt: "A tiny golden fox kit with flame tail".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_card() {
        assert!(sample_card().validate().is_ok());
    }

    #[test]
    fn test_stat_out_of_range() {
        let mut card = sample_card();
        card.stats.magic = 11;
        let err = card.validate().unwrap_err();
        assert!(matches!(err, SpiritError::SchemaValidation(_)));
        assert!(err.to_string().contains("magic"));

        card.stats.magic = 6;
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_empty_field_rejected() {
        let mut card = sample_card();
        card.image_prompt = "  ".to_string();
        let err = card.validate().unwrap_err();
        assert!(err.to_string().contains("imagePrompt"));
    }

    #[test]
    fn test_image_prompt_field_name() {
        let json = serde_json::to_value(sample_card()).unwrap();
        assert!(json.get("imagePrompt").is_some());
        assert!(json.get("special_move").is_some());
        assert!(json.get("image_prompt").is_none());
    }
}
