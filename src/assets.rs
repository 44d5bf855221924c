use crate::config::AssetConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use resvg::tiny_skia::Pixmap;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Layout,
    Artwork,
    Icon,
}

/// Source of raster assets. `None` means the asset is absent or unreadable.
pub trait AssetStore: Send + Sync {
    fn fetch(&self, kind: AssetKind, key: &str) -> Option<Vec<u8>>;
}

/// Assets laid out on disk as `<root>/<layout_dir>`, `<root>/<artwork_dir>`
/// and `<root>/<icon_dir>/<key>.<ext>`.
#[derive(Debug, Clone)]
pub struct FsAssets {
    config: AssetConfig,
}

impl FsAssets {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    pub fn path(&self, kind: AssetKind, key: &str) -> PathBuf {
        let root = &self.config.root;
        match kind {
            AssetKind::Layout => root.join(&self.config.layout_dir).join(key),
            AssetKind::Artwork => root.join(&self.config.artwork_dir).join(key),
            AssetKind::Icon => root
                .join(&self.config.icon_dir)
                .join(format!("{key}.{}", self.config.icon_extension)),
        }
    }
}

impl AssetStore for FsAssets {
    fn fetch(&self, kind: AssetKind, key: &str) -> Option<Vec<u8>> {
        let path = self.path(kind, key);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "asset not readable");
                None
            }
        }
    }
}

/// In-memory assets, keyed by kind and lookup key.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: HashMap<(AssetKind, String), Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: AssetKind, key: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert((kind, key.into()), bytes);
    }

    pub fn with(mut self, kind: AssetKind, key: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(kind, key, bytes);
        self
    }
}

impl AssetStore for MemoryAssets {
    fn fetch(&self, kind: AssetKind, key: &str) -> Option<Vec<u8>> {
        self.entries.get(&(kind, key.to_string())).cloned()
    }
}

/// A decoded PNG asset: its native size plus the encoded bytes for embedding.
#[derive(Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    bytes: Arc<Vec<u8>>,
}

impl RasterImage {
    pub fn decode(bytes: Vec<u8>) -> Option<Self> {
        let pixmap = Pixmap::decode_png(&bytes).ok()?;
        Some(Self {
            width: pixmap.width(),
            height: pixmap.height(),
            bytes: Arc::new(bytes),
        })
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(self.bytes.as_slice()))
    }

    /// Native size multiplied by `scale`.
    pub fn scaled_size(&self, scale: f32) -> (f32, f32) {
        (self.width as f32 * scale, self.height as f32 * scale)
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Fetches and decodes one asset.
pub fn load_image(store: &dyn AssetStore, kind: AssetKind, key: &str) -> Option<RasterImage> {
    let image = store.fetch(kind, key).and_then(RasterImage::decode);
    if image.is_none() {
        tracing::debug!(?kind, key, "asset missing or not a PNG");
    }
    image
}

/// Encodes a solid-colour PNG; used for placeholder assets and tests.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Option<Vec<u8>> {
    let mut pixmap = Pixmap::new(width, height)?;
    pixmap.fill(resvg::tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    pixmap.encode_png().ok()
}
