pub mod assets;
pub mod batch;
pub mod card;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout_dump;
pub mod render;
pub mod text;
pub mod text_metrics;
pub mod theme;

pub use assets::{AssetKind, AssetStore, FsAssets, MemoryAssets};
pub use card::{CardRecord, CardRenderer};
#[cfg(feature = "cli")]
pub use cli::run;
pub use compose::{Canvas, RenderContext, RenderedCard};
pub use config::{Config, load_config};
pub use error::CardError;
pub use text_metrics::FontBook;
pub use theme::{Category, Rgb, Theme, resolve_theme};
