// Strong typing over strings. Newtypes for instance/layer ids, value types for sizes and frames.
// Everything here crosses the JS boundary as JSON, so it all derives serde.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one attached wallpaper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn new(id: u32) -> Self {
        InstanceId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one media layer. Unique across all instances of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(u32);

impl LayerId {
    pub fn new(id: u32) -> Self {
        LayerId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load generation of an instance. Bumped by every `load`/`unload` that changes the source,
/// so completions belonging to a superseded request can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(u32);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// Host-side handle for the container element a wallpaper is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerKey(String);

impl ContainerKey {
    pub fn new(key: impl Into<String>) -> Self {
        ContainerKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Intrinsic size of decoded media, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Outer box of the container element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ContainerBox {
    pub width: f64,
    pub height: f64,
}

impl ContainerBox {
    pub fn new(width: f64, height: f64) -> Self {
        ContainerBox { width, height }
    }
}

/// Position and size applied to a media layer, relative to its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LayerFrame {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Kind of media a source resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Embed,
}

/// Whether a layer holds the requested content or a placeholder shown while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerRole {
    Content,
    Poster,
}

/// One `<source>` entry of a video layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTrack {
    pub src: String,
    pub mime: String,
}

/// What the host must build for a new media layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LayerSpec {
    Image {
        src: String,
    },
    Video {
        tracks: Vec<VideoTrack>,
        looped: bool,
        muted: bool,
    },
    Embed {
        element_id: String,
        src: String,
    },
}

impl LayerSpec {
    pub fn kind(&self) -> MediaKind {
        match self {
            LayerSpec::Image { .. } => MediaKind::Image,
            LayerSpec::Video { .. } => MediaKind::Video,
            LayerSpec::Embed { .. } => MediaKind::Embed,
        }
    }
}

/// Result of creating a layer: media served from cache may already be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LayerStatus {
    Pending,
    Decoded(Size),
}

/// Playback state reported by the remote embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

/// Imperative control of the remote embedded player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value")]
pub enum PlayerCommand {
    Play,
    Pause,
    Mute,
    SetQuality(String),
}

/// Asynchronous signal delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    /// Image finished decoding.
    ImageDecoded { layer: LayerId, size: Size },
    /// Video metadata (dimensions) became available.
    MetadataLoaded { layer: LayerId, size: Size },
    /// Opacity transition of a layer finished.
    TransitionEnd { layer: LayerId },
    /// Remote player bound to a layer is ready.
    PlayerReady { layer: LayerId },
    /// Remote player bound to a layer changed state.
    PlayerStateChange { layer: LayerId, state: PlayerState },
    /// The remote embedding API finished bootstrapping.
    EmbedApiReady,
    /// Viewport resized.
    Resize,
    PointerEnter { instance: InstanceId },
    PointerLeave { instance: InstanceId },
}
