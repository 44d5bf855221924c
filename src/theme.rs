use crate::error::CardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const BLUE: Rgb = Rgb(30, 90, 200);
    pub const RED: Rgb = Rgb(200, 30, 40);
    pub const GOLD: Rgb = Rgb(212, 175, 55);
    pub const PURPLE: Rgb = Rgb(128, 50, 168);
    pub const TEAL: Rgb = Rgb(0, 128, 128);
    pub const PINK: Rgb = Rgb(232, 92, 160);

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Rgb(r, g, b))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (idx, ch) in hex.chars().enumerate() {
                    let v = ch.to_digit(16)? as u8;
                    channels[idx] = v * 16 + v;
                }
                Some(Rgb(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The closed set of card categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Normal,
    Annoying,
    Mythical,
    Magic,
    Buff,
    Debuff,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Normal,
        Category::Annoying,
        Category::Mythical,
        Category::Magic,
        Category::Buff,
        Category::Debuff,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Normal => "normal",
            Category::Annoying => "annoying",
            Category::Mythical => "mythical",
            Category::Magic => "magic",
            Category::Buff => "buff",
            Category::Debuff => "debuff",
        }
    }

    /// Capitalised name used on the type line, e.g. `Mythical`.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Normal => "Normal",
            Category::Annoying => "Annoying",
            Category::Mythical => "Mythical",
            Category::Magic => "Magic",
            Category::Buff => "Buff",
            Category::Debuff => "Debuff",
        }
    }

    pub fn theme(self) -> Theme {
        let (accent, class_icon) = match self {
            Category::Normal => (Rgb::BLUE, "creature"),
            Category::Annoying => (Rgb::RED, "creature"),
            Category::Mythical => (Rgb::GOLD, "creature"),
            Category::Magic => (Rgb::PURPLE, "magic"),
            Category::Buff => (Rgb::TEAL, "buff"),
            Category::Debuff => (Rgb::PINK, "debuff"),
        };
        Theme {
            category: self,
            accent,
            class_icon,
        }
    }
}

impl FromStr for Category {
    type Err = CardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| CardError::CategoryUnknown(value.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour and class icon derived from a card's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub category: Category,
    pub accent: Rgb,
    pub class_icon: &'static str,
}

impl Theme {
    /// Type line text, e.g. `Mythical Encounter`.
    pub fn type_line(&self) -> String {
        format!("{} Encounter", self.category.display_name())
    }
}

/// Exact, case-sensitive lookup of a category string.
pub fn resolve_theme(category: &str) -> Result<Theme, CardError> {
    category.parse::<Category>().map(Category::theme)
}
