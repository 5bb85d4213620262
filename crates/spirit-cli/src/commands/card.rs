//! One-shot card generation.

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::Args;
use colored::Colorize;
use spirit_core::config::SpiritConfig;
use spirit_core::quiz::model::{AnswerSet, COLORS, ELEMENTS, PERSONALITIES, PLACES, STYLES};
use spirit_core::quiz::{PAINTING_MESSAGE, SUMMONING_MESSAGE};
use spirit_core::session::Generators;
use std::path::PathBuf;
use tracing::warn;

use crate::output;

#[derive(Args)]
pub struct CardArgs {
    #[arg(long, value_parser = PossibleValuesParser::new(STYLES.iter().copied()))]
    pub style: String,

    #[arg(long, value_parser = PossibleValuesParser::new(COLORS.iter().copied()))]
    pub color: String,

    #[arg(long, value_parser = PossibleValuesParser::new(PERSONALITIES.iter().copied()))]
    pub personality: String,

    #[arg(long, value_parser = PossibleValuesParser::new(PLACES.iter().copied()))]
    pub place: String,

    #[arg(long, value_parser = PossibleValuesParser::new(ELEMENTS.iter().copied()))]
    pub element: String,

    /// Save the generated illustration to this path
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Export the finished card as a PNG to this path
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub async fn execute(args: CardArgs, config: &SpiritConfig) -> Result<()> {
    let generators = Generators::from_config(config).context("Cannot generate without provider credentials")?;
    let answers = AnswerSet {
        style: args.style,
        color: args.color,
        personality: args.personality,
        place: args.place,
        element: args.element,
    };

    let spinner = output::spinner(SUMMONING_MESSAGE);
    let card = generators.cards.generate_card(&answers).await;
    spinner.finish_and_clear();
    let card = card.context("Failed to generate spirit animal card")?;

    output::print_card(&card);

    if args.image.is_none() && args.export.is_none() {
        return Ok(());
    }

    let spinner = output::spinner(PAINTING_MESSAGE);
    let image = generators.images.generate_image(&card.image_prompt).await;
    spinner.finish_and_clear();

    let image = match image {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(error = %e, "Image generation failed");
            println!("{}", "Could not paint the illustration, using the element icon.".yellow());
            None
        }
    };

    if let (Some(path), Some(image)) = (&args.image, &image) {
        std::fs::write(path, &image.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "Illustration saved to".green(), path.display());
    }

    if let Some(path) = &args.export {
        output::export_card(&card, image.as_ref(), path);
    }

    Ok(())
}
