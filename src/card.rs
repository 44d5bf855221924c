use crate::compose::{Composer, RenderContext, RenderedCard};
use crate::error::{CardError, Result};
use crate::render::write_png;
use crate::theme::resolve_theme;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// One card as described in the batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub name: String,
    #[serde(alias = "type")]
    pub category: String,
    #[serde(default, alias = "info")]
    pub description: String,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(rename = "image", alias = "artwork")]
    pub artwork: String,
    /// Base layout asset; the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl CardRecord {
    /// Output file stem, see [`slugify`].
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Lowercases `name` and maps everything outside `[a-z0-9_-]` to `_`, so
/// the slug is always a single path component.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' | '_' | '-' => ch,
            _ => '_',
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub icon: String,
}

/// Attribute name to icon key, in the order the record lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute, replacing the icon of an existing name in place.
    pub fn insert(&mut self, name: impl Into<String>, icon: impl Into<String>) {
        let (name, icon) = (name.into(), icon.into());
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.icon = icon,
            None => self.0.push(Attribute { name, icon }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }
}

impl<N: Into<String>, I: Into<String>> FromIterator<(N, I)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (name, icon) in iter {
            attributes.insert(name, icon);
        }
        attributes
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for attr in &self.0 {
            map.serialize_entry(&attr.name, &attr.icon)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = Attributes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to icon keys")
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Attributes, E> {
                Ok(Attributes::new())
            }

            fn visit_none<E: serde::de::Error>(self) -> std::result::Result<Attributes, E> {
                Ok(Attributes::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Attributes, A::Error> {
                let mut attributes = Attributes::new();
                while let Some((name, icon)) = access.next_entry::<String, String>()? {
                    attributes.insert(name, icon);
                }
                Ok(attributes)
            }
        }

        deserializer.deserialize_any(AttributesVisitor)
    }
}

/// Renders and exports a single card.
pub struct CardRenderer<'a> {
    record: CardRecord,
    ctx: RenderContext<'a>,
}

impl<'a> CardRenderer<'a> {
    pub fn new(record: CardRecord, ctx: RenderContext<'a>) -> Self {
        Self { record, ctx }
    }

    pub fn record(&self) -> &CardRecord {
        &self.record
    }

    pub fn render(&self) -> Result<RenderedCard> {
        if self.record.name.trim().is_empty() {
            return Err(CardError::EmptyName);
        }
        let theme = resolve_theme(&self.record.category)?;
        tracing::debug!(card = %self.record.name, category = %theme.category, "rendering card");
        Composer::run(&self.record, theme, self.ctx)
    }

    /// Renders the card and writes `<dir>/<slug>.png`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let rendered = self.render()?;
        self.save(&rendered, dir)
    }

    /// Writes an already rendered card to `<dir>/<slug>.png`.
    pub fn save(&self, rendered: &RenderedCard, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.png", self.record.slug()));
        write_png(&rendered.canvas, self.ctx.fonts, &path)?;
        tracing::info!(card = %self.record.name, path = %path.display(), "card exported");
        Ok(path)
    }
}
