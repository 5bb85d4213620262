//! Spirit Card Core Library
//!
//! Quiz state machine, generative AI adapters, card presentation and export
//! for the spirit animal card creator.

pub mod card;
pub mod config;
pub mod error;
pub mod export;
pub mod present;
pub mod provider;
pub mod quiz;
pub mod session;

pub use error::{SpiritError, SpiritResult};
