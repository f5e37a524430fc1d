// Instance options. Defaults are process-wide and mutable through `set_defaults`;
// each attach starts from a copy of them and layers its own patch on top.

use serde::{Deserialize, Serialize};

use crate::error::WallpaperError;
use crate::source::RawSource;

/// Height-to-width ratio assumed for remote embeds (16:9).
pub const DEFAULT_EMBED_RATIO: f64 = 0.5625;

/// Resolved options of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Start playback as soon as video is ready.
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Play while the pointer is over the container, pause when it leaves.
    #[serde(default)]
    pub hover_play: bool,
    #[serde(default = "default_true", rename = "loop")]
    pub looped: bool,
    #[serde(default = "default_true")]
    pub mute: bool,
    #[serde(default)]
    pub source: Option<RawSource>,
    /// Height-to-width ratio of remote embeds.
    #[serde(default = "default_embed_ratio")]
    pub embed_ratio: f64,
    /// Poster for remote embeds; a platform thumbnail is derived when absent.
    #[serde(default)]
    pub poster: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_embed_ratio() -> f64 {
    DEFAULT_EMBED_RATIO
}

impl Default for Config {
    fn default() -> Self {
        Config {
            autoplay: true,
            hover_play: false,
            looped: true,
            mute: true,
            source: None,
            embed_ratio: DEFAULT_EMBED_RATIO,
            poster: None,
        }
    }
}

impl Config {
    /// Copy of `self` with every field set in `patch` replaced.
    pub fn merged(&self, patch: ConfigPatch) -> Result<Config, WallpaperError> {
        let config = Config {
            autoplay: patch.autoplay.unwrap_or(self.autoplay),
            hover_play: patch.hover_play.unwrap_or(self.hover_play),
            looped: patch.looped.unwrap_or(self.looped),
            mute: patch.mute.unwrap_or(self.mute),
            source: patch.source.or_else(|| self.source.clone()),
            embed_ratio: patch.embed_ratio.unwrap_or(self.embed_ratio),
            poster: patch.poster.or_else(|| self.poster.clone()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WallpaperError> {
        if !self.embed_ratio.is_finite() || self.embed_ratio <= 0.0 {
            return Err(WallpaperError::InvalidConfig(format!(
                "embedRatio must be a positive number, got {}",
                self.embed_ratio
            )));
        }
        Ok(())
    }

    /// Width-to-height ratio used to size remote embeds.
    pub fn embed_aspect(&self) -> f64 {
        1.0 / self.embed_ratio
    }
}

/// Partial options as passed by JS; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, alias = "autoPlay")]
    pub autoplay: Option<bool>,
    #[serde(default)]
    pub hover_play: Option<bool>,
    #[serde(default, rename = "loop")]
    pub looped: Option<bool>,
    #[serde(default)]
    pub mute: Option<bool>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub embed_ratio: Option<f64>,
    #[serde(default)]
    pub poster: Option<String>,
}

impl ConfigPatch {
    pub fn from_json(json: &str) -> Result<Self, WallpaperError> {
        if json.trim().is_empty() {
            return Ok(ConfigPatch::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}
