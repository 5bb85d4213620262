//! Prompt construction for the text and image providers.

use crate::quiz::model::AnswerSet;

/// Style value that selects the bold tone.
const BOLD_STYLE: &str = "Boy";

const BOLD_HINT: &str = "Give the spirit animal a cool, adventurous, bold vibe — think tough but cute, spiky details, fierce eyes, action-ready poses.";

const GRACEFUL_HINT: &str = "Give the spirit animal a graceful, sparkly, elegant vibe — think flowing details, gentle eyes, jewel accents, magical princess energy.";

const BOLD_ART_DIRECTION: &str = "boy — bold, adventurous, action-ready style with cool spiky or armored details";

const GRACEFUL_ART_DIRECTION: &str = "girl — graceful, sparkly, elegant style with flowing or jeweled details";

/// Tone hint for the given style.
pub fn style_hint(style: &str) -> &'static str {
    if style == BOLD_STYLE {
        BOLD_HINT
    } else {
        GRACEFUL_HINT
    }
}

fn art_direction(style: &str) -> &'static str {
    if style == BOLD_STYLE {
        BOLD_ART_DIRECTION
    } else {
        GRACEFUL_ART_DIRECTION
    }
}

/// Build the instruction asking the text provider for a card as JSON.
pub fn card_prompt(answers: &AnswerSet) -> String {
    let AnswerSet { style, color, personality, place, element } = answers;
    let hint = style_hint(style);
    let direction = art_direction(style);

    format!(
        r#"You are a magical spirit animal card creator for kids. Based on these answers, create a unique baby spirit animal trading card.

The child's answers:
- Style: {style}
- Favorite color: {color}
- Personality type: {personality}
- Favorite place: {place}
- Chosen element: {element}

{hint}

Create a cute, magical baby spirit animal that matches these choices. The animal should be creative and fantastical (not just a regular animal — think crystal foxes, cloud bunnies, ember kittens, etc).

Return ONLY valid JSON with this exact structure, no markdown, no commentary:
{{
  "name": "Creative Spirit Animal Name",
  "element": "{element}",
  "personality": "A fun 1-sentence personality description",
  "backstory": "A magical 2-3 sentence backstory about this baby spirit animal. Keep it kid-friendly and enchanting.",
  "stats": {{
    "courage": <number 7-10>,
    "kindness": <number 7-10>,
    "magic": <number 7-10>
  }},
  "special_move": {{
    "name": "Cool Move Name",
    "description": "A short, exciting description of the special move"
  }},
  "rarity": "Ultra Rare",
  "imagePrompt": "A detailed prompt to generate an adorable baby fantasy animal illustration for a {direction}. Include: the specific animal type, {color} color theme, {element} element visual effects, cute baby proportions, sparkles and magical aura, fantasy trading card art style, centered composition, vibrant colors"
}}"#
    )
}

/// Wrap a card's image prompt in the fixed illustration style.
pub fn image_prompt(card_prompt: &str) -> String {
    format!(
        "Digital illustration for a children's trading card game: {}. Style: adorable, magical, glowing, fantasy art, soft lighting, no text or words in the image.",
        card_prompt
    )
}
