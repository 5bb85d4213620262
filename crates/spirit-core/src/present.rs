//! Card presentation.
//!
//! Turns a [`Card`] and an optional image reference into a [`CardView`] that
//! both the HTML page and the SVG export render from.

use crate::card::Card;

/// Colour palette and icon for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementTheme {
    pub element: &'static str,
    pub icon: &'static str,
    /// Three gradient stops, start to end.
    pub gradient: [&'static str; 3],
    pub glow: &'static str,
    pub accent: &'static str,
}

pub const ELEMENT_THEMES: [ElementTheme; 6] = [
    ElementTheme {
        element: "Fire",
        icon: "🔥",
        gradient: ["#f97316", "#ef4444", "#eab308"],
        glow: "rgba(255,100,0,0.5)",
        accent: "#fed7aa",
    },
    ElementTheme {
        element: "Water",
        icon: "💧",
        gradient: ["#3b82f6", "#06b6d4", "#2dd4bf"],
        glow: "rgba(0,150,255,0.5)",
        accent: "#a5f3fc",
    },
    ElementTheme {
        element: "Earth",
        icon: "🌿",
        gradient: ["#16a34a", "#10b981", "#a3e635"],
        glow: "rgba(0,200,100,0.5)",
        accent: "#bbf7d0",
    },
    ElementTheme {
        element: "Air",
        icon: "💨",
        gradient: ["#7dd3fc", "#818cf8", "#c084fc"],
        glow: "rgba(150,130,255,0.5)",
        accent: "#c7d2fe",
    },
    ElementTheme {
        element: "Light",
        icon: "✨",
        gradient: ["#fde047", "#fbbf24", "#fdba74"],
        glow: "rgba(255,220,50,0.5)",
        accent: "#fef08a",
    },
    ElementTheme {
        element: "Dream",
        icon: "🌙",
        gradient: ["#a855f7", "#ec4899", "#e879f9"],
        glow: "rgba(200,100,255,0.5)",
        accent: "#e9d5ff",
    },
];

/// Element whose theme is used for unknown elements.
pub const DEFAULT_ELEMENT: &str = "Dream";

// Index of the Dream theme in ELEMENT_THEMES.
const DEFAULT_THEME: usize = 5;

/// Theme for an element, by exact match. Unknown elements get the Dream theme.
pub fn theme_for(element: &str) -> &'static ElementTheme {
    ELEMENT_THEMES
        .iter()
        .find(|t| t.element == element)
        .unwrap_or(&ELEMENT_THEMES[DEFAULT_THEME])
}

/// Bar fill for a stat on a 0-10 scale. Not clamped.
pub fn stat_fill_percent(value: i64) -> i64 {
    value * 10
}

/// One stat bar on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBar {
    pub label: &'static str,
    pub icon: &'static str,
    pub value: i64,
    pub fill_percent: i64,
}

/// Everything needed to draw a card.
#[derive(Debug, Clone)]
pub struct CardView {
    pub name: String,
    pub element: String,
    pub rarity: String,
    pub personality: String,
    pub backstory: String,
    pub special_move_name: String,
    pub special_move_description: String,
    pub theme: &'static ElementTheme,
    pub stats: Vec<StatBar>,
    /// Image source (URL or data URL). `None` shows the element icon instead.
    pub image_src: Option<String>,
}

impl CardView {
    pub fn new(card: &Card, image_src: Option<String>) -> Self {
        let stats = [
            ("Courage", "⚔️", card.stats.courage),
            ("Kindness", "💖", card.stats.kindness),
            ("Magic", "🔮", card.stats.magic),
        ]
        .into_iter()
        .map(|(label, icon, value)| StatBar {
            label,
            icon,
            value,
            fill_percent: stat_fill_percent(value),
        })
        .collect();

        Self {
            name: card.name.clone(),
            element: card.element.clone(),
            rarity: card.rarity.clone(),
            personality: card.personality.clone(),
            backstory: card.backstory.clone(),
            special_move_name: card.special_move.name.clone(),
            special_move_description: card.special_move.description.clone(),
            theme: theme_for(&card.element),
            stats,
            image_src,
        }
    }

    /// CSS `linear-gradient` for the card border.
    pub fn gradient_css(&self) -> String {
        let [a, b, c] = self.theme.gradient;
        format!("linear-gradient(135deg, {}, {}, {})", a, b, c)
    }
}
