//! Card export.
//!
//! Lays the card out as an SVG document and rasterizes it to PNG with a
//! transparent background. The illustration is embedded as a data URL so the
//! snapshot never needs to fetch anything.

use askama::Template;
use base64::Engine;
use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::card::Card;
use crate::error::{SpiritError, SpiritResult};
use crate::present::CardView;
use crate::provider::RenderedImage;

/// Upscaling factor applied when rasterizing.
pub const EXPORT_SCALE: f32 = 2.0;

/// File name stem used when the card has no name.
pub const FALLBACK_NAME: &str = "spirit-animal";

const CARD_WIDTH: i64 = 400;
const CONTENT_WIDTH: i64 = 360;
const BAR_WIDTH: i64 = 220;

struct SvgLine {
    y: i64,
    text: String,
}

struct SvgStat {
    y: i64,
    label: &'static str,
    icon: &'static str,
    value: i64,
    fill_width: i64,
}

#[derive(Template)]
#[template(path = "card.svg")]
struct CardSvg<'a> {
    view: &'a CardView,
    width: i64,
    height: i64,
    stop_a: &'static str,
    stop_b: &'static str,
    stop_c: &'static str,
    image_href: Option<String>,
    image_y: i64,
    personality: Vec<SvgLine>,
    backstory: Vec<SvgLine>,
    stats: Vec<SvgStat>,
    move_top: i64,
    move_height: i64,
    move_title_y: i64,
    move_lines: Vec<SvgLine>,
}

/// Greedy word wrap on character count.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn place_lines(lines: Vec<String>, first_y: i64, line_height: i64) -> Vec<SvgLine> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| SvgLine {
            y: first_y + i as i64 * line_height,
            text,
        })
        .collect()
}

/// Inline data URL for an image.
pub fn data_url(image: &RenderedImage) -> String {
    format!(
        "data:{};base64,{}",
        image.content_type,
        base64::engine::general_purpose::STANDARD.encode(&image.bytes)
    )
}

/// Render the card as a standalone SVG document.
pub fn render_svg(card: &Card, image: Option<&RenderedImage>) -> SpiritResult<String> {
    let view = CardView::new(card, image.map(data_url));
    let [stop_a, stop_b, stop_c] = view.theme.gradient;

    let image_y = 96;
    let mut y = image_y + CONTENT_WIDTH + 28;

    let personality = place_lines(wrap_text(&format!("“{}”", view.personality), 52), y, 18);
    y += personality.len() as i64 * 18 + 6;

    let backstory = place_lines(wrap_text(&view.backstory, 62), y, 15);
    y += backstory.len() as i64 * 15 + 8;

    let stats = view
        .stats
        .iter()
        .enumerate()
        .map(|(i, s)| SvgStat {
            y: y + i as i64 * 22,
            label: s.label,
            icon: s.icon,
            value: s.value,
            fill_width: (BAR_WIDTH * s.fill_percent / 100).max(0),
        })
        .collect::<Vec<_>>();
    y += stats.len() as i64 * 22 + 4;

    let move_top = y;
    let move_title_y = move_top + 22;
    let move_lines = place_lines(wrap_text(&view.special_move_description, 62), move_title_y + 18, 15);
    let move_height = 22 + 18 + move_lines.len() as i64 * 15;
    let height = move_top + move_height + 20;

    let svg = CardSvg {
        view: &view,
        width: CARD_WIDTH,
        height,
        stop_a,
        stop_b,
        stop_c,
        image_href: view.image_src.clone(),
        image_y,
        personality,
        backstory,
        stats,
        move_top,
        move_height,
        move_title_y,
        move_lines,
    };

    Ok(svg.render()?)
}

static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

fn fonts() -> Arc<usvg::fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "Loaded system fonts for export");
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document to PNG at `scale`, keeping transparency.
pub fn rasterize(svg: &str, scale: f32) -> SpiritResult<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| SpiritError::Export(format!("invalid card SVG: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SpiritError::Export(format!("cannot allocate {}x{} canvas", width, height)))?;

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| SpiritError::Export(format!("PNG encoding failed: {}", e)))
}

/// Export a card (with its illustration, if any) as a PNG snapshot.
pub fn export_png(card: &Card, image: Option<&RenderedImage>) -> SpiritResult<Vec<u8>> {
    let svg = render_svg(card, image)?;
    let png = rasterize(&svg, EXPORT_SCALE)?;
    debug!(size = png.len(), name = %card.name, "Card exported");
    Ok(png)
}

/// Download file name for a card.
pub fn export_file_name(card: &Card) -> String {
    let name: String = card
        .name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if name.is_empty() {
        format!("{}-card.png", FALLBACK_NAME)
    } else {
        format!("{}-card.png", name)
    }
}
