// Per-container state: options, the loaded source and the stack of media layers.
// Layers are kept in stacking order; the last one is on top.

use crate::config::Config;
use crate::source::{MediaSource, RawSource};
use crate::types::*;

/// Lifecycle of an instance's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Empty,
    /// First media requested, nothing visible yet.
    Loading,
    /// Requested media is visible.
    Ready,
    /// New media requested while older media stays visible.
    Replacing,
    /// Fading out after `unload`; the source is still stored but no longer current.
    Unloading,
    /// Media faded out and removed.
    Unloaded,
}

/// What to do when a layer's opacity transition ends. Taken on first delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    /// Fade-in finished: remove every layer below this one.
    RemoveOlder,
    /// Poster fade-in finished: remove layers below from older generations, keep the
    /// content still loading for the poster's own generation.
    RemoveSuperseded,
    /// Fade-out finished: remove this layer; forget the source if `generation` is still current.
    Discard { generation: Generation },
}

/// One rendered piece of media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaLayer {
    pub id: LayerId,
    pub kind: MediaKind,
    pub role: LayerRole,
    pub generation: Generation,
    /// Image URL, for native cover styling.
    pub url: Option<String>,
    /// Known once the media reported ready; embeds carry a nominal size from the start.
    pub natural: Option<Size>,
    /// Width-to-height ratio replacing the natural one when fitting.
    pub ratio_override: Option<f64>,
    /// Sized by CSS; the geometry engine leaves it alone.
    pub native: bool,
    /// Fade-in requested.
    pub shown: bool,
    pub on_transition_end: Option<TransitionAction>,
}

impl MediaLayer {
    pub fn new(id: LayerId, kind: MediaKind, role: LayerRole, generation: Generation) -> Self {
        MediaLayer {
            id,
            kind,
            role,
            generation,
            url: None,
            natural: None,
            ratio_override: None,
            native: false,
            shown: false,
            on_transition_end: None,
        }
    }

    /// Has a size the geometry engine can work with.
    pub fn fittable(&self) -> bool {
        !self.native && self.natural.is_some_and(|size| size.is_positive())
    }
}

/// One attached container.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub key: ContainerKey,
    pub config: Config,
    /// Source as last requested; `None` when nothing is loaded.
    pub source: Option<RawSource>,
    pub media: Option<MediaSource>,
    pub generation: Generation,
    pub state: LoadState,
    pub layers: Vec<MediaLayer>,
    /// Layer whose remote player is attached.
    pub player: Option<LayerId>,
    /// Remote player has reached the playing state once for the current source.
    pub playing: bool,
    pub poster_loaded: bool,
    pub hover_bound: bool,
}

impl Instance {
    pub fn new(id: InstanceId, key: ContainerKey, config: Config) -> Self {
        Instance {
            id,
            key,
            config,
            source: None,
            media: None,
            generation: Generation::default(),
            state: LoadState::Empty,
            layers: Vec::new(),
            player: None,
            playing: false,
            poster_loaded: false,
            hover_bound: false,
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        self.media.as_ref().map(MediaSource::kind)
    }

    pub fn layer(&self, id: LayerId) -> Option<&MediaLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut MediaLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn owns(&self, id: LayerId) -> bool {
        self.layer(id).is_some()
    }

    /// Is `layer` from a superseded request and not yet on screen?
    pub fn is_stale(&self, layer: &MediaLayer) -> bool {
        layer.generation != self.generation && !layer.shown
    }

    /// Topmost video layer.
    pub fn video_layer(&self) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.kind == MediaKind::Video)
            .map(|l| l.id)
    }

    /// Drop a layer from the stack, detaching the remote player if it lived there.
    pub fn take_layer(&mut self, id: LayerId) -> Option<MediaLayer> {
        let index = self.layers.iter().position(|l| l.id == id)?;
        if self.player == Some(id) {
            self.player = None;
        }
        Some(self.layers.remove(index))
    }

    /// Remove and return the ids of every layer stacked below `id`.
    pub fn take_layers_below(&mut self, id: LayerId) -> Vec<LayerId> {
        let Some(index) = self.layers.iter().position(|l| l.id == id) else {
            return Vec::new();
        };
        let removed: Vec<LayerId> = self.layers.drain(..index).map(|l| l.id).collect();
        if self.player.is_some_and(|p| removed.contains(&p)) {
            self.player = None;
        }
        removed
    }

    /// Remove and return the ids of layers below `id` that belong to another generation.
    pub fn take_superseded_below(&mut self, id: LayerId) -> Vec<LayerId> {
        let Some(index) = self.layers.iter().position(|l| l.id == id) else {
            return Vec::new();
        };
        let generation = self.layers[index].generation;
        let removed: Vec<LayerId> = self.layers[..index]
            .iter()
            .filter(|l| l.generation != generation)
            .map(|l| l.id)
            .collect();
        self.layers.retain(|l| !removed.contains(&l.id));
        if self.player.is_some_and(|p| removed.contains(&p)) {
            self.player = None;
        }
        removed
    }

    /// Forget the loaded source so the next `load` starts fresh.
    pub fn clear_source(&mut self) {
        self.source = None;
        self.media = None;
        self.playing = false;
        self.poster_loaded = false;
    }
}
