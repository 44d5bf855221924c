use crate::assets::{AssetKind, AssetStore, RasterImage, load_image};
use crate::card::CardRecord;
use crate::config::{Config, OverflowPolicy};
use crate::error::{CardError, Result};
use crate::geometry::{LayoutGeometry, Medallion, Point};
use crate::text::{TextBlock, advance_cursor, effect_text, wrap};
use crate::text_metrics::{FontBook, TextStyle};
use crate::theme::{Rgb, Theme};
use serde::Serialize;

/// Shared, read-only collaborators of a render.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a Config,
    pub fonts: &'a FontBook,
    pub assets: &'a dyn AssetStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Base,
    Artwork,
    ClassIcon,
    AttributeIcon,
}

/// One paint operation. Later elements cover earlier ones.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Fill {
        color: Rgb,
    },
    Image {
        role: ImageRole,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(skip)]
        image: RasterImage,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        color: Rgb,
    },
    Medallion {
        medallion: Medallion,
        fill: Rgb,
        ring_color: Rgb,
    },
    Polygon {
        points: Vec<Point>,
        stroke: Rgb,
        stroke_width: f32,
    },
    Text {
        x: f32,
        baseline: f32,
        text: String,
        style: TextStyle,
        color: Rgb,
    },
}

/// The drawing surface of one card: its size and paint operations in order.
#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    elements: Vec<Element>,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            elements: vec![Element::Fill { color: background }],
        }
    }

    fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn medallions(&self) -> impl Iterator<Item = &Medallion> {
        self.elements.iter().filter_map(|el| match el {
            Element::Medallion { medallion, .. } => Some(medallion),
            _ => None,
        })
    }

    pub fn images(&self, role: ImageRole) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |el| matches!(el, Element::Image { role: r, .. } if *r == role))
    }

    pub fn text_lines(&self) -> impl Iterator<Item = (&str, f32)> {
        self.elements.iter().filter_map(|el| match el {
            Element::Text { text, baseline, .. } => Some((text.as_str(), *baseline)),
            _ => None,
        })
    }
}

/// A finished card, ready to be rasterized.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub canvas: Canvas,
    pub geometry: LayoutGeometry,
    pub theme: Theme,
    /// Icon keys whose overlay was skipped.
    pub missing_icons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Allocated,
    BasePasted,
    ArtworkPasted,
    OutlineDrawn,
    AttributesDrawn,
    Done,
}

/// Paints one card, stage by stage, onto a canvas it owns.
///
/// Stages must run in declaration order: `allocate`, `paste_base`,
/// `paste_artwork`, `draw_outline`, `draw_attribute_medallions`,
/// `draw_description_block`.
pub struct Composer<'a> {
    record: &'a CardRecord,
    theme: Theme,
    ctx: RenderContext<'a>,
    geometry: LayoutGeometry,
    canvas: Canvas,
    base: Option<RasterImage>,
    stage: Stage,
    missing_icons: Vec<String>,
}

impl<'a> Composer<'a> {
    /// Runs every stage in order.
    pub fn run(record: &'a CardRecord, theme: Theme, ctx: RenderContext<'a>) -> Result<RenderedCard> {
        let mut composer = Composer::allocate(record, theme, ctx)?;
        composer.paste_base();
        composer.paste_artwork()?;
        composer.draw_outline()?;
        composer.draw_attribute_medallions()?;
        composer.draw_description_block()?;
        Ok(composer.finish())
    }

    /// Sizes the canvas from the base layout plus the border on every side
    /// and fills it with the border colour.
    pub fn allocate(record: &'a CardRecord, theme: Theme, ctx: RenderContext<'a>) -> Result<Self> {
        let layout_key = record
            .layout
            .as_deref()
            .unwrap_or(ctx.config.assets.layout_file.as_str());
        let base = load_image(ctx.assets, AssetKind::Layout, layout_key)
            .ok_or_else(|| CardError::LayoutMissing(layout_key.to_string()))?;

        let border = ctx.config.layout.border_size;
        let width = base.width + 2 * border;
        let height = base.height + 2 * border;
        let geometry = LayoutGeometry::new(width as f32, height as f32, &ctx.config.layout);
        tracing::debug!(width, height, "allocated canvas");

        Ok(Self {
            record,
            theme,
            ctx,
            geometry,
            canvas: Canvas::new(width, height, ctx.config.palette.border),
            base: Some(base),
            stage: Stage::Allocated,
            missing_icons: Vec::new(),
        })
    }

    pub fn paste_base(&mut self) {
        self.enter(Stage::BasePasted);
        if let Some(base) = self.base.take() {
            let inset = self.geometry.border;
            self.canvas.push(Element::Image {
                role: ImageRole::Base,
                x: inset,
                y: inset,
                width: base.width as f32,
                height: base.height as f32,
                image: base,
            });
        }
    }

    /// Artwork at native size; parts outside the canvas are left to the
    /// rasterizer's viewport clip.
    pub fn paste_artwork(&mut self) -> Result<()> {
        self.enter(Stage::ArtworkPasted);
        let key = self.record.artwork.as_str();
        let art = load_image(self.ctx.assets, AssetKind::Artwork, key)
            .ok_or_else(|| CardError::ArtworkMissing(key.to_string()))?;
        let (width, height) = (art.width as f32, art.height as f32);
        let (x, y) = self.geometry.artwork_origin(width, height);
        self.canvas.push(Element::Image {
            role: ImageRole::Artwork,
            x,
            y,
            width,
            height,
            image: art,
        });
        Ok(())
    }

    /// Accent line, class medallion with its icon, and the diamond mark.
    pub fn draw_outline(&mut self) -> Result<()> {
        self.enter(Stage::OutlineDrawn);
        let accent = self.theme.accent;
        let line = self.geometry.accent_line;
        self.canvas.push(Element::Line {
            from: line.from,
            to: line.to,
            thickness: line.thickness,
            color: accent,
        });

        let medallion = self.geometry.class_medallion;
        self.push_medallion(medallion);
        let class_icon = self.theme.class_icon;
        let scale = self.geometry.class_icon_scale;
        self.overlay_or_skip(class_icon, medallion, scale, ImageRole::ClassIcon)?;

        let diamond = self.geometry.diamond;
        self.canvas.push(Element::Polygon {
            points: diamond.vertices().to_vec(),
            stroke: accent,
            stroke_width: diamond.stroke,
        });
        Ok(())
    }

    /// One medallion per attribute, top to bottom in record order.
    pub fn draw_attribute_medallions(&mut self) -> Result<()> {
        self.enter(Stage::AttributesDrawn);
        let record = self.record;
        let medallions = self.geometry.attribute_medallions(record.attributes.len());
        let scale = self.geometry.attribute_icon_scale;
        for (attribute, medallion) in record.attributes.iter().zip(medallions) {
            self.push_medallion(medallion);
            self.overlay_or_skip(&attribute.icon, medallion, scale, ImageRole::AttributeIcon)?;
        }
        Ok(())
    }

    /// Title, type line, description and effect, flowing downwards from the
    /// details anchor.
    pub fn draw_description_block(&mut self) -> Result<()> {
        self.enter(Stage::Done);
        let config = self.ctx.config;
        let text = &config.text;
        let palette = config.palette;
        let fonts = self.ctx.fonts;
        let x = self.geometry.description_left;
        let mut cursor = self.geometry.details_top;

        let title = self.record.name.to_uppercase();
        let extent = fonts.measure(&title, TextStyle::Title);
        self.push_text(x, cursor + extent.ascent, title, TextStyle::Title, palette.title);
        let mut bottom = cursor + extent.height();
        cursor = advance_cursor(cursor, extent.height(), text.title_gap);

        let type_line = self.theme.type_line();
        let extent = fonts.measure(&type_line, TextStyle::Type);
        self.push_text(x, cursor + extent.ascent, type_line, TextStyle::Type, self.theme.accent);
        bottom = bottom.max(cursor + extent.height());
        cursor = advance_cursor(cursor, extent.height(), text.type_gap);

        let description = self.record.description.clone();
        let effect = effect_text(self.record.effect.as_deref());
        for body in std::iter::once(description).chain(effect) {
            let (next, block_bottom) = self.draw_body_block(&body, x, cursor);
            cursor = next;
            bottom = bottom.max(block_bottom);
        }

        let limit = self.geometry.text_limit();
        if bottom > limit {
            match text.overflow {
                OverflowPolicy::Allow => {
                    tracing::warn!(card = %self.record.name, bottom, limit, "text runs past the card edge");
                }
                OverflowPolicy::Reject => {
                    return Err(CardError::TextOverflow { cursor: bottom, limit });
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> RenderedCard {
        debug_assert_eq!(self.stage, Stage::Done, "composer finished early");
        RenderedCard {
            canvas: self.canvas,
            geometry: self.geometry,
            theme: self.theme,
            missing_icons: self.missing_icons,
        }
    }

    /// Wraps and draws one body paragraph. Returns the cursor for the next
    /// block and the lowest descender drawn.
    fn draw_body_block(&mut self, body: &str, x: f32, top: f32) -> (f32, f32) {
        let config = self.ctx.config;
        let text = &config.text;
        let fonts = self.ctx.fonts;
        let lines = wrap(body, text.wrap_chars);
        if lines.is_empty() {
            return (top, top);
        }

        let (ascent, descent) = lines.iter().fold((0.0f32, 0.0f32), |(a, d), line| {
            let extent = fonts.measure(line, TextStyle::Body);
            (a.max(extent.ascent), d.max(extent.descent))
        });
        let block = TextBlock::flow(lines, top, ascent, fonts.size(TextStyle::Body), text.line_spacing);
        let mut bottom = top;
        for (line, baseline) in &block.lines {
            self.push_text(x, *baseline, line.clone(), TextStyle::Body, config.palette.body);
            bottom = baseline + descent;
        }
        (advance_cursor(block.end_y, descent, text.block_gap), bottom)
    }

    fn push_medallion(&mut self, medallion: Medallion) {
        self.canvas.push(Element::Medallion {
            medallion,
            fill: self.ctx.config.palette.medallion_fill,
            ring_color: self.theme.accent,
        });
    }

    fn push_text(&mut self, x: f32, baseline: f32, text: String, style: TextStyle, color: Rgb) {
        self.canvas.push(Element::Text {
            x,
            baseline,
            text,
            style,
            color,
        });
    }

    fn overlay_icon(&mut self, key: &str, medallion: Medallion, scale: f32, role: ImageRole) -> Result<()> {
        let icon = load_image(self.ctx.assets, AssetKind::Icon, key)
            .ok_or_else(|| CardError::IconMissing(key.to_string()))?;
        let (width, height) = icon.scaled_size(scale);
        let (x, y) = medallion.centered_origin(width, height);
        self.canvas.push(Element::Image {
            role,
            x,
            y,
            width,
            height,
            image: icon,
        });
        Ok(())
    }

    /// The one policy for missing icons: the ring is already drawn, the
    /// overlay is skipped and the card goes on.
    fn overlay_or_skip(&mut self, key: &str, medallion: Medallion, scale: f32, role: ImageRole) -> Result<()> {
        match self.overlay_icon(key, medallion, scale, role) {
            Err(CardError::IconMissing(key)) => {
                tracing::warn!(card = %self.record.name, icon = %key, "icon missing, drawing empty medallion");
                self.missing_icons.push(key);
                Ok(())
            }
            other => other,
        }
    }

    fn enter(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage {next:?} after {:?}", self.stage);
        tracing::trace!(stage = ?next, "composer stage");
        self.stage = next;
    }
}
