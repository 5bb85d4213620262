//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use spirit_core::card::Card;
use spirit_core::export::{export_file_name, export_png, wrap_text};
use spirit_core::present::{CardView, StatBar};
use spirit_core::provider::RenderedImage;
use spirit_core::quiz::model::Question;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const WIDTH: usize = 56;
const BAR_CELLS: i64 = 10;

pub fn print_banner() {
    println!();
    println!("  {}", "Baby Spirit Animal".magenta().bold());
    println!("  {}", "Trading Card Creator ✨".bold());
    println!();
}

/// Five progress dots: answered, current, upcoming.
pub fn progress_line(current: usize) -> String {
    (0..Question::ALL.len())
        .map(|i| {
            if i < current {
                "●".yellow().to_string()
            } else if i == current {
                "●".magenta().bold().to_string()
            } else {
                "○".dimmed().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Parse `#rrggbb`.
fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn themed(text: &str, hex: &str) -> ColoredString {
    match hex_rgb(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn stat_cells(stat: &StatBar) -> (usize, usize) {
    let filled = (stat.fill_percent * BAR_CELLS / 100).clamp(0, BAR_CELLS) as usize;
    (filled, BAR_CELLS as usize - filled)
}

/// Print a card.
pub fn print_card(card: &Card) {
    let view = CardView::new(card, None);
    let [accent, _, _] = view.theme.gradient;
    let rule = themed(&"═".repeat(WIDTH), accent);

    println!();
    println!("{}", rule);
    println!("  {}", format!("⭐ {} ⭐", view.rarity.to_uppercase()).yellow().bold());
    println!("  {}", view.name.bold());
    println!(
        "  {}",
        themed(&format!("{} {} Element {}", view.theme.icon, view.element, view.theme.icon), accent)
    );
    println!();
    for line in wrap_text(&format!("“{}”", view.personality), WIDTH - 2) {
        println!("  {}", line.italic());
    }
    for line in wrap_text(&view.backstory, WIDTH - 2) {
        println!("  {}", line.dimmed());
    }
    println!();
    for stat in &view.stats {
        let (filled, empty) = stat_cells(stat);
        println!(
            "  {} {:<9} {}{} {}",
            stat.icon,
            stat.label,
            themed(&"█".repeat(filled), accent),
            "░".repeat(empty).dimmed(),
            stat.value
        );
    }
    println!();
    println!("  {}", format!("⚡ Special Move: {} ⚡", view.special_move_name).yellow().bold());
    for line in wrap_text(&view.special_move_description, WIDTH - 2) {
        println!("  {}", line);
    }
    println!("{}", rule);
    println!();
}

/// Write the card PNG. Failures are reported but never abort the command.
pub fn export_card(card: &Card, image: Option<&RenderedImage>, path: &Path) {
    let target = if path.is_dir() {
        path.join(export_file_name(card))
    } else {
        path.to_path_buf()
    };

    let written = export_png(card, image)
        .map_err(anyhow::Error::from)
        .and_then(|png| std::fs::write(&target, png).map_err(anyhow::Error::from));

    match written {
        Ok(()) => println!("{} {}", "📥 Card saved to".green(), target.display()),
        Err(e) => {
            warn!(error = %e, path = %target.display(), "Download failed");
            println!("{}", "Could not save the card.".yellow());
        }
    }
}
