// wallpaper_core: responsive media backgrounds as a Rust/WASM engine.
// State, sizing and sequencing live here; the page-side host only touches the DOM.

mod config;
mod embed;
mod error;
mod geometry;
mod host;
mod instance;
mod lifecycle;
mod platform;
mod registry;
mod source;
mod types;
mod wallpaper;
mod wasm;

use wasm_bindgen::prelude::*;

pub use config::{Config, ConfigPatch, DEFAULT_EMBED_RATIO};
pub use embed::{EmbedSession, EmbedUrl, PendingEmbed};
pub use error::WallpaperError;
pub use geometry::fit;
pub use host::Host;
pub use instance::{Instance, LoadState, MediaLayer, TransitionAction};
pub use lifecycle::FADE_IN_DELAY_MS;
pub use platform::{is_mobile_agent, Platform, PlatformProbe};
pub use registry::Registry;
pub use source::{classify, embed_video_id, EmbedSource, MediaSource, RawSource, VideoDescriptor};
pub use types::*;
pub use wallpaper::Wallpaper;
pub use wasm::{JsHost, WasmWallpaper};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
