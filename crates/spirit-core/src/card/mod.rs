//! Spirit animal cards.
//!
//! Builds the generation prompts, and turns provider text into validated
//! [`Card`](model::Card) values.

pub mod model;
pub mod parse;
pub mod prompt;

pub use model::{Card, SpecialMove, Stats};
pub use parse::{parse_card, strip_code_fence};
