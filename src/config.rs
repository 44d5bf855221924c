use crate::theme::Rgb;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Proportional anchors and fixed pixel sizes of the card template.
///
/// Fractions are relative to the full canvas (base layout plus border);
/// everything else is in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub border_size: u32,
    pub description_left: f32,
    pub details_top: f32,
    pub artwork_anchor: f32,
    pub accent_line_y: f32,
    pub accent_line_width: f32,
    pub class_medallion_top: f32,
    pub class_medallion_radius: f32,
    pub class_medallion_ring: f32,
    pub class_icon_scale: f32,
    pub diamond_x: f32,
    pub diamond_y: f32,
    pub diamond_side: f32,
    pub diamond_stroke: f32,
    pub attribute_top: f32,
    pub attribute_pitch: f32,
    pub attribute_radius: f32,
    pub attribute_ring: f32,
    pub attribute_icon_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            border_size: 5,
            description_left: 0.30,
            details_top: 0.68,
            artwork_anchor: 0.60,
            accent_line_y: 0.623,
            accent_line_width: 20.0,
            class_medallion_top: 0.56,
            class_medallion_radius: 65.0,
            class_medallion_ring: 10.0,
            class_icon_scale: 0.15,
            diamond_x: 0.92,
            diamond_y: 0.623,
            diamond_side: 28.0,
            diamond_stroke: 4.0,
            attribute_top: 0.71,
            attribute_pitch: 100.0,
            attribute_radius: 35.0,
            attribute_ring: 5.0,
            attribute_icon_scale: 0.09,
        }
    }
}

/// Where a text style's font comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontSource {
    /// Font file, relative to the asset root unless absolute.
    File(PathBuf),
    /// Family name looked up in the system font database.
    System(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub source: FontSource,
    pub size: f32,
}

impl FontSpec {
    fn file(path: &str, size: f32) -> Self {
        Self {
            source: FontSource::File(PathBuf::from(path)),
            size,
        }
    }
}

/// What to do when the body text runs past the bottom border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Draw anyway and log a warning; the rasterizer drops what falls outside.
    Allow,
    /// Fail the card with `TextOverflow`.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    pub title: FontSpec,
    pub type_line: FontSpec,
    pub body: FontSpec,
    pub wrap_chars: usize,
    pub line_spacing: f32,
    pub title_gap: f32,
    pub type_gap: f32,
    pub block_gap: f32,
    pub fast_text_metrics: bool,
    pub overflow: OverflowPolicy,
}

impl Default for TextConfig {
    fn default() -> Self {
        let base = 30.0;
        Self {
            title: FontSpec::file("fonts/asap_symbol.otf", base + 10.0),
            type_line: FontSpec::file("fonts/EduSABeginner_bold.ttf", base - 10.0),
            body: FontSpec::file("fonts/EduSABeginner.ttf", base),
            wrap_chars: 40,
            line_spacing: 5.0,
            title_gap: 5.0,
            type_gap: 10.0,
            block_gap: 10.0,
            fast_text_metrics: false,
            overflow: OverflowPolicy::Allow,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Palette {
    pub border: Rgb,
    pub medallion_fill: Rgb,
    pub title: Rgb,
    pub body: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            border: Rgb::BLACK,
            medallion_fill: Rgb::BLACK,
            title: Rgb::BLACK,
            body: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub layout_dir: PathBuf,
    pub artwork_dir: PathBuf,
    pub icon_dir: PathBuf,
    pub layout_file: String,
    pub icon_extension: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            layout_dir: PathBuf::from("assets"),
            artwork_dir: PathBuf::from("images"),
            icon_dir: PathBuf::from("icons"),
            layout_file: "layout.png".to_string(),
            icon_extension: "png".to_string(),
        }
    }
}

impl AssetConfig {
    /// Resolves a font path against the asset root.
    pub fn font_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cards"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub palette: Palette,
    pub assets: AssetConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Defaults with every text style mapped to one system family and the
    /// calibrated width table; needs no font files.
    pub fn with_system_fonts(family: &str) -> Self {
        let mut config = Config::default();
        for spec in [
            &mut config.text.title,
            &mut config.text.type_line,
            &mut config.text.body,
        ] {
            spec.source = FontSource::System(family.to_string());
        }
        config.text.fast_text_metrics = true;
        config
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    border: Option<String>,
    medallion_fill: Option<String>,
    title: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextConfigFile {
    title: Option<FontSpec>,
    type_line: Option<FontSpec>,
    body: Option<FontSpec>,
    font_size: Option<f32>,
    wrap_chars: Option<usize>,
    line_spacing: Option<f32>,
    title_gap: Option<f32>,
    type_gap: Option<f32>,
    block_gap: Option<f32>,
    fast_text_metrics: Option<bool>,
    overflow: Option<OverflowPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetConfigFile {
    root: Option<PathBuf>,
    layout_dir: Option<PathBuf>,
    artwork_dir: Option<PathBuf>,
    icon_dir: Option<PathBuf>,
    layout_file: Option<String>,
    icon_extension: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfig>,
    text: Option<TextConfigFile>,
    palette: Option<PaletteFile>,
    assets: Option<AssetConfigFile>,
    output_dir: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }

    if let Some(text) = parsed.text {
        // A base size rescales all three styles the way the card template
        // derives them: title +10, type -10.
        if let Some(base) = text.font_size {
            config.text.title.size = base + 10.0;
            config.text.type_line.size = (base - 10.0).max(1.0);
            config.text.body.size = base;
        }
        if let Some(v) = text.title {
            config.text.title = v;
        }
        if let Some(v) = text.type_line {
            config.text.type_line = v;
        }
        if let Some(v) = text.body {
            config.text.body = v;
        }
        if let Some(v) = text.wrap_chars {
            config.text.wrap_chars = v.max(1);
        }
        if let Some(v) = text.line_spacing {
            config.text.line_spacing = v;
        }
        if let Some(v) = text.title_gap {
            config.text.title_gap = v;
        }
        if let Some(v) = text.type_gap {
            config.text.type_gap = v;
        }
        if let Some(v) = text.block_gap {
            config.text.block_gap = v;
        }
        if let Some(v) = text.fast_text_metrics {
            config.text.fast_text_metrics = v;
        }
        if let Some(v) = text.overflow {
            config.text.overflow = v;
        }
    }

    if let Some(palette) = parsed.palette {
        if let Some(v) = palette.border {
            config.palette.border = parse_color(&v)?;
        }
        if let Some(v) = palette.medallion_fill {
            config.palette.medallion_fill = parse_color(&v)?;
        }
        if let Some(v) = palette.title {
            config.palette.title = parse_color(&v)?;
        }
        if let Some(v) = palette.body {
            config.palette.body = parse_color(&v)?;
        }
    }

    if let Some(assets) = parsed.assets {
        if let Some(v) = assets.root {
            config.assets.root = v;
        }
        if let Some(v) = assets.layout_dir {
            config.assets.layout_dir = v;
        }
        if let Some(v) = assets.artwork_dir {
            config.assets.artwork_dir = v;
        }
        if let Some(v) = assets.icon_dir {
            config.assets.icon_dir = v;
        }
        if let Some(v) = assets.layout_file {
            config.assets.layout_file = v;
        }
        if let Some(v) = assets.icon_extension {
            config.assets.icon_extension = v;
        }
    }

    if let Some(dir) = parsed.output_dir {
        config.output.dir = dir;
    }

    Ok(config)
}

fn parse_color(value: &str) -> anyhow::Result<Rgb> {
    Rgb::from_hex(value).ok_or_else(|| anyhow::anyhow!("invalid colour `{value}`, expected #rrggbb"))
}
