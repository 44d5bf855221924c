use crate::config::{AssetConfig, Config, FontSource, FontSpec};
use crate::error::CardError;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use ttf_parser::Face;
use usvg::fontdb::{Database, Family, Query, Stretch, Style, Weight};

static SYSTEM_FONTS: Lazy<Database> = Lazy::new(|| {
    let mut db = Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    db
});

/// The three text styles of the details panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Title,
    Type,
    Body,
}

impl TextStyle {
    fn index(self) -> usize {
        match self {
            TextStyle::Title => 0,
            TextStyle::Type => 1,
            TextStyle::Body => 2,
        }
    }
}

/// Rendered size of one line of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextExtent {
    pub width: f32,
    /// Distance from the top of the line box to the baseline.
    pub ascent: f32,
    /// Distance from the baseline to the lowest descender.
    pub descent: f32,
}

impl TextExtent {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Fonts for every text style plus the database the rasterizer draws with.
///
/// Built once per batch and only read afterwards.
pub struct FontBook {
    db: Arc<Database>,
    styles: [StyleFont; 3],
    fast_metrics: bool,
}

struct StyleFont {
    family: String,
    size: f32,
    face: Option<FontFace>,
}

impl FontBook {
    pub fn load(config: &Config) -> Result<Self, CardError> {
        let text = &config.text;
        let wants_system = [&text.title, &text.type_line, &text.body]
            .iter()
            .any(|spec| matches!(spec.source, FontSource::System(_)));
        let mut db = if wants_system {
            SYSTEM_FONTS.clone()
        } else {
            Database::new()
        };

        let styles = [
            load_style(&text.title, &config.assets, &mut db)?,
            load_style(&text.type_line, &config.assets, &mut db)?,
            load_style(&text.body, &config.assets, &mut db)?,
        ];

        Ok(Self {
            db: Arc::new(db),
            styles,
            fast_metrics: text.fast_text_metrics,
        })
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    pub fn family(&self, style: TextStyle) -> &str {
        &self.styles[style.index()].family
    }

    pub fn size(&self, style: TextStyle) -> f32 {
        self.styles[style.index()].size
    }

    pub fn measure(&self, text: &str, style: TextStyle) -> TextExtent {
        let font = &self.styles[style.index()];
        let face = if self.fast_metrics { None } else { font.face.as_ref() };
        match face {
            Some(face) => face.measure(text, font.size),
            None => fallback_extent(text, font.size),
        }
    }
}

fn load_style(spec: &FontSpec, assets: &AssetConfig, db: &mut Database) -> Result<StyleFont, CardError> {
    match &spec.source {
        FontSource::File(path) => {
            let path = assets.font_path(path);
            let data = std::fs::read(&path).map_err(|_| CardError::FontMissing(path.clone()))?;
            let face = FontFace::new(data, 0).ok_or_else(|| CardError::FontMissing(path.clone()))?;
            let family = face.family_name().unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("sans-serif")
                    .to_string()
            });
            db.load_font_data(face.data.clone());
            tracing::debug!(path = %path.display(), family = %family, "loaded font file");
            Ok(StyleFont {
                family,
                size: spec.size,
                face: Some(face),
            })
        }
        FontSource::System(family) => {
            let face = query_system_face(db, family);
            if face.is_none() {
                tracing::debug!(family = %family, "no system face found, using width table");
            }
            Ok(StyleFont {
                family: family.clone(),
                size: spec.size,
                face,
            })
        }
    }
}

fn query_system_face(db: &Database, family: &str) -> Option<FontFace> {
    let name = family.trim().trim_matches('"').trim_matches('\'');
    let family = match name.to_ascii_lowercase().as_str() {
        "" | "sans-serif" | "system-ui" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    };
    let query = Query {
        families: &[family],
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontFace::new(data.to_vec(), index))
        .flatten()
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1) as f32;
        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
        })
    }

    fn family_name(&self) -> Option<String> {
        let face = Face::parse(&self.data, self.index).ok()?;
        face.names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
            .find_map(|name| name.to_string())
    }

    fn measure(&self, text: &str, font_size: f32) -> TextExtent {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;

        if text.is_ascii() {
            for byte in text.bytes() {
                let advance = self.ascii_advances[byte as usize];
                width += if advance == 0 { fallback } else { advance as f32 * scale };
            }
        } else if let Ok(face) = Face::parse(&self.data, self.index) {
            for ch in text.chars() {
                width += face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| advance as f32 * scale)
                    .unwrap_or(fallback);
            }
        } else {
            width = fallback_width(text, font_size);
        }

        TextExtent {
            width,
            ascent: self.ascender * scale,
            descent: -self.descender * scale,
        }
    }
}

fn fallback_extent(text: &str, font_size: f32) -> TextExtent {
    TextExtent {
        width: fallback_width(text, font_size),
        ascent: font_size * 0.8,
        descent: font_size * 0.2,
    }
}

fn fallback_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Advance widths in ems for a typical humanist sans.
pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
        '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.33,
        'i' | 'j' | 'l' | 'I' => 0.24,
        'f' | 'r' | 't' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.946,
        _ => 0.568,
    }
}
