use crate::card::CardRecord;
use crate::compose::{Element, RenderedCard};
use crate::geometry::LayoutGeometry;
use crate::theme::Rgb;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Debug view of a rendered card: its anchors and every paint operation.
#[derive(Debug, Serialize)]
pub struct LayoutDump<'a> {
    pub name: &'a str,
    pub slug: String,
    pub category: &'static str,
    pub accent: Rgb,
    pub class_icon: &'static str,
    pub width: u32,
    pub height: u32,
    pub geometry: &'a LayoutGeometry,
    pub missing_icons: &'a [String],
    pub elements: &'a [Element],
}

impl<'a> LayoutDump<'a> {
    pub fn from_rendered(record: &'a CardRecord, rendered: &'a RenderedCard) -> Self {
        Self {
            name: &record.name,
            slug: record.slug(),
            category: rendered.theme.category.as_str(),
            accent: rendered.theme.accent,
            class_icon: rendered.theme.class_icon,
            width: rendered.canvas.width,
            height: rendered.canvas.height,
            geometry: &rendered.geometry,
            missing_icons: &rendered.missing_icons,
            elements: rendered.canvas.elements(),
        }
    }
}

pub fn write_layout_dump(path: &Path, record: &CardRecord, rendered: &RenderedCard) -> anyhow::Result<()> {
    let dump = LayoutDump::from_rendered(record, rendered);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
