// Media lifecycle: load -> wait for ready -> size -> fade in -> drop what is underneath.
// Rule: a layer only leaves the screen once something opaque covers it.
//
// Every load bumps the instance generation. Completions for layers of an older generation
// that never made it on screen are discarded along with their layer; the newest request wins.

use crate::embed::{thumbnail_url, EmbedUrl, PendingEmbed, NOMINAL_EMBED_HEIGHT, PLAYER_QUALITY};
use crate::error::WallpaperError;
use crate::host::Host;
use crate::instance::{LoadState, MediaLayer, TransitionAction};
use crate::registry::fit_instance;
use crate::source::{classify, EmbedSource, MediaSource, RawSource, VideoDescriptor};
use crate::types::*;
use crate::wallpaper::Wallpaper;

/// Delay before a new layer starts fading in, so the host has painted it transparent first.
pub const FADE_IN_DELAY_MS: u32 = 50;

impl<H: Host> Wallpaper<H> {
    /// Load `source` into an instance. Re-requesting the loaded source only re-announces it.
    pub fn load(&mut self, id: InstanceId, source: RawSource) -> Result<(), WallpaperError> {
        let instance = self
            .registry
            .get_mut(id)
            .ok_or(WallpaperError::UnknownInstance(id))?;

        // A source on its way out is not loaded, even if it is still stored.
        let unloading = instance.state == LoadState::Unloading;
        if !unloading && instance.source.as_ref() == Some(&source) {
            tracing::debug!(instance = %id, "source unchanged, re-announcing");
            self.host.emit_loaded(id);
            return Ok(());
        }

        let media = classify(&source);
        tracing::debug!(instance = %id, kind = ?media.kind(), "loading media");
        let same_video = matches!(
            (&instance.media, &media),
            (Some(MediaSource::Embed(prev)), MediaSource::Embed(next)) if prev.video_id == next.video_id
        );

        instance.generation = instance.generation.next();
        instance.state = if instance.layers.iter().any(|l| l.shown) {
            LoadState::Replacing
        } else {
            LoadState::Loading
        };
        instance.source = Some(source);
        instance.media = Some(media.clone());

        match media {
            MediaSource::Image(url) => self.load_image(id, url, LayerRole::Content),
            MediaSource::Video(descriptor) => self.load_video(id, descriptor),
            MediaSource::Embed(embed) => {
                instance.playing = false;
                // Another URL for the same video keeps the poster already on screen.
                if unloading || !same_video {
                    instance.poster_loaded = false;
                }
                self.load_embed(id, embed)
            }
        }
        Ok(())
    }

    /// Fade every visible layer out and forget the source once they are gone.
    pub fn unload(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        let instance = self
            .registry
            .get_mut(id)
            .ok_or(WallpaperError::UnknownInstance(id))?;

        instance.generation = instance.generation.next();
        let generation = instance.generation;

        // Layers that never showed have nothing to fade.
        let hidden: Vec<LayerId> = instance
            .layers
            .iter()
            .filter(|l| !l.shown)
            .map(|l| l.id)
            .collect();
        for layer in hidden {
            instance.take_layer(layer);
            self.host.remove_layer(layer);
        }

        if instance.layers.is_empty() {
            instance.clear_source();
            instance.state = LoadState::Unloaded;
            return Ok(());
        }

        let fading: Vec<LayerId> = instance.layers.iter().map(|l| l.id).collect();
        tracing::debug!(instance = %id, layers = fading.len(), "unloading media");
        instance.state = LoadState::Unloading;
        for layer in &mut instance.layers {
            layer.on_transition_end = Some(TransitionAction::Discard { generation });
        }
        for &layer in &fading {
            self.host.set_layer_opacity(layer, 0.0, 0);
        }

        if !self.platform.transitions {
            for layer in fading {
                self.transition_end(layer);
            }
        }
        Ok(())
    }

    /// Start playback on the remote player, or the native video element.
    pub fn play(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        self.playback(id, true)
    }

    pub fn pause(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        self.playback(id, false)
    }

    /// Deprecated alias of [`Wallpaper::pause`].
    pub fn stop(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        self.pause(id)
    }

    fn playback(&mut self, id: InstanceId, play: bool) -> Result<(), WallpaperError> {
        let instance = self
            .registry
            .get(id)
            .ok_or(WallpaperError::UnknownInstance(id))?;

        match (instance.kind(), instance.player) {
            (Some(MediaKind::Embed), Some(player)) => {
                let command = if play {
                    PlayerCommand::Play
                } else {
                    PlayerCommand::Pause
                };
                self.host.player_command(player, command);
            }
            _ => match instance.video_layer() {
                Some(video) if play => self.host.play_media(video),
                Some(video) => self.host.pause_media(video),
                None => tracing::trace!(instance = %id, "nothing to play"),
            },
        }
        Ok(())
    }

    fn load_image(&mut self, id: InstanceId, url: String, role: LayerRole) {
        let layer_id = self.allocate_layer();
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };

        let mut layer = MediaLayer::new(layer_id, MediaKind::Image, role, instance.generation);
        layer.url = Some(url.clone());
        instance.layers.push(layer);

        let status = self
            .host
            .create_layer(id, layer_id, &LayerSpec::Image { src: url });
        // Cache hit: decoded before we could wait for it.
        if let LayerStatus::Decoded(size) = status {
            self.media_ready(layer_id, size);
        }
    }

    fn load_video(&mut self, id: InstanceId, descriptor: VideoDescriptor) {
        if let Some(poster) = descriptor.poster.clone() {
            self.load_image(id, poster, LayerRole::Poster);
        }

        if self.platform.mobile {
            tracing::debug!(instance = %id, "mobile platform, showing poster only");
            return;
        }

        let layer_id = self.allocate_layer();
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };

        let spec = LayerSpec::Video {
            tracks: descriptor.tracks(),
            looped: instance.config.looped,
            muted: instance.config.mute,
        };
        instance.layers.push(MediaLayer::new(
            layer_id,
            spec.kind(),
            LayerRole::Content,
            instance.generation,
        ));

        if let LayerStatus::Decoded(size) = self.host.create_layer(id, layer_id, &spec) {
            self.media_ready(layer_id, size);
        }
    }

    fn load_embed(&mut self, id: InstanceId, embed: EmbedSource) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };

        if instance.poster_loaded {
            let generation = instance.generation;
            for poster in instance
                .layers
                .iter_mut()
                .filter(|l| l.role == LayerRole::Poster)
            {
                poster.generation = generation;
            }
        } else {
            instance.poster_loaded = true;
            let poster = instance
                .config
                .poster
                .clone()
                .unwrap_or_else(|| thumbnail_url(&embed.video_id));
            self.load_image(id, poster, LayerRole::Poster);
        }

        if self.platform.mobile {
            tracing::debug!(instance = %id, "mobile platform, showing poster only");
            return;
        }

        self.session.ensure_script(&mut self.host, &self.platform);

        if !self.session.is_ready() {
            let Some(instance) = self.registry.get(id) else {
                return;
            };
            self.session.enqueue(PendingEmbed {
                instance: id,
                generation: instance.generation,
                source: embed,
            });
            return;
        }

        self.mount_embed(id, &embed);
    }

    /// Build the embed iframe and bind a remote player to it. The layer stays transparent
    /// until the player first reports playing.
    fn mount_embed(&mut self, id: InstanceId, embed: &EmbedSource) {
        let layer_id = self.allocate_layer();
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };

        let element_id = format!("wallpaper-{id}-{layer_id}");
        let src = match (EmbedUrl {
            video_id: &embed.video_id,
            player_id: &element_id,
            looped: instance.config.looped,
            origin: &self.platform.origin,
        })
        .build(&self.platform)
        {
            Ok(src) => src,
            Err(err) => {
                tracing::warn!(instance = %id, %err, "could not build embed URL");
                return;
            }
        };

        let aspect = instance.config.embed_aspect();
        let mut layer = MediaLayer::new(
            layer_id,
            MediaKind::Embed,
            LayerRole::Content,
            instance.generation,
        );
        layer.natural = Some(Size::new(NOMINAL_EMBED_HEIGHT * aspect, NOMINAL_EMBED_HEIGHT));
        layer.ratio_override = Some(aspect);
        instance.layers.push(layer);
        instance.player = Some(layer_id);

        tracing::debug!(instance = %id, layer = %layer_id, video_id = %embed.video_id, "mounting embed");
        self.host.create_layer(
            id,
            layer_id,
            &LayerSpec::Embed {
                element_id: element_id.clone(),
                src,
            },
        );
        self.host
            .create_player(layer_id, &element_id, &embed.video_id);
        fit_instance(&mut self.host, instance);
    }

    /// Replay embeds parked while the remote API was loading. Requests whose instance has
    /// been detached or has moved on to another source are consumed without effect.
    pub(crate) fn drain_embeds(&mut self) {
        for request in self.session.mark_ready() {
            let current = self.registry.get(request.instance).is_some_and(|i| {
                i.generation == request.generation && i.kind() == Some(MediaKind::Embed)
            });
            if current {
                self.mount_embed(request.instance, &request.source);
            } else {
                tracing::debug!(instance = %request.instance, "discarding superseded embed request");
            }
        }
    }

    /// Image decoded or video metadata loaded.
    pub(crate) fn media_ready(&mut self, layer_id: LayerId, size: Size) {
        let Some(id) = self.registry.owner_of(layer_id) else {
            tracing::trace!(layer = %layer_id, "ready signal for removed layer");
            return;
        };
        let native_cover = self.platform.native_cover;
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        let Some(layer) = instance.layer(layer_id) else {
            return;
        };

        if layer.shown || layer.kind == MediaKind::Embed {
            tracing::trace!(layer = %layer_id, "duplicate ready signal");
            return;
        }
        if instance.is_stale(layer) {
            tracing::debug!(instance = %id, layer = %layer_id, "discarding superseded layer");
            instance.take_layer(layer_id);
            self.host.remove_layer(layer_id);
            return;
        }

        let Some(layer) = instance.layer_mut(layer_id) else {
            return;
        };
        let (kind, role) = (layer.kind, layer.role);
        layer.shown = true;
        if size.is_positive() {
            layer.natural = Some(size);
        } else {
            tracing::trace!(instance = %id, layer = %layer_id, ?size, "ready without a usable size, layer stays unfitted");
        }
        layer.on_transition_end = Some(match role {
            LayerRole::Content => TransitionAction::RemoveOlder,
            LayerRole::Poster => TransitionAction::RemoveSuperseded,
        });
        if kind == MediaKind::Image && native_cover {
            layer.native = true;
            if let Some(url) = &layer.url {
                self.host.apply_native_cover(layer_id, url);
            }
        }

        self.host
            .set_layer_opacity(layer_id, 1.0, FADE_IN_DELAY_MS);
        fit_instance(&mut self.host, instance);

        if role == LayerRole::Content {
            instance.state = LoadState::Ready;
            self.host.emit_loaded(id);

            if kind == MediaKind::Video {
                if instance.config.hover_play {
                    if !instance.hover_bound {
                        instance.hover_bound = true;
                        self.host.bind_hover(id);
                    }
                } else if instance.config.autoplay {
                    self.host.play_media(layer_id);
                }
            }
        }

        if !self.platform.transitions {
            self.transition_end(layer_id);
        }
    }

    /// Opacity transition finished. Each layer's pending action runs at most once.
    pub(crate) fn transition_end(&mut self, layer_id: LayerId) {
        let Some(id) = self.registry.owner_of(layer_id) else {
            return;
        };
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        let Some(action) = instance
            .layer_mut(layer_id)
            .and_then(|l| l.on_transition_end.take())
        else {
            tracing::trace!(layer = %layer_id, "transition end without pending action");
            return;
        };

        match action {
            TransitionAction::RemoveOlder => {
                let removed = instance.take_layers_below(layer_id);
                if !removed.is_empty() {
                    tracing::debug!(instance = %id, removed = removed.len(), "removing replaced layers");
                }
                for layer in removed {
                    self.host.remove_layer(layer);
                }
            }
            TransitionAction::RemoveSuperseded => {
                let removed = instance.take_superseded_below(layer_id);
                if !removed.is_empty() {
                    tracing::debug!(instance = %id, removed = removed.len(), "poster covers replaced layers");
                }
                for layer in removed {
                    self.host.remove_layer(layer);
                }
            }
            TransitionAction::Discard { generation } => {
                instance.take_layer(layer_id);
                self.host.remove_layer(layer_id);
                if instance.generation == generation {
                    instance.clear_source();
                    instance.state = LoadState::Unloaded;
                }
            }
        }
    }

    pub(crate) fn player_ready(&mut self, layer_id: LayerId) {
        let Some(id) = self.registry.owner_of(layer_id) else {
            return;
        };
        if !self.current_player(id, layer_id) {
            return;
        }
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };

        self.host.mark_embed_ready(layer_id);
        self.host.player_command(
            layer_id,
            PlayerCommand::SetQuality(PLAYER_QUALITY.to_string()),
        );
        if instance.config.mute {
            self.host.player_command(layer_id, PlayerCommand::Mute);
        }
        if instance.config.hover_play && !instance.hover_bound {
            instance.hover_bound = true;
            self.host.bind_hover(id);
        }
    }

    /// The first switch to playing is the embed's ready signal, not a request to keep playing.
    pub(crate) fn player_state(&mut self, layer_id: LayerId, state: PlayerState) {
        let Some(id) = self.registry.owner_of(layer_id) else {
            return;
        };
        if state != PlayerState::Playing || !self.current_player(id, layer_id) {
            return;
        }
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        if instance.playing {
            return;
        }

        instance.playing = true;
        if instance.config.hover_play || !instance.config.autoplay {
            self.host.player_command(layer_id, PlayerCommand::Pause);
        }

        instance.state = LoadState::Ready;
        self.host.emit_loaded(id);

        if let Some(layer) = instance.layer_mut(layer_id) {
            layer.shown = true;
            layer.on_transition_end = Some(TransitionAction::RemoveOlder);
        }
        self.host.set_layer_opacity(layer_id, 1.0, 0);

        if !self.platform.transitions {
            self.transition_end(layer_id);
        }
    }

    /// Is `layer_id` the player of the instance's current source? Drops the layer if it
    /// belongs to a superseded source and never showed.
    fn current_player(&mut self, id: InstanceId, layer_id: LayerId) -> bool {
        let Some(instance) = self.registry.get_mut(id) else {
            return false;
        };
        if instance.player != Some(layer_id) {
            tracing::trace!(layer = %layer_id, "event from detached player");
            return false;
        }
        let Some(layer) = instance.layer(layer_id) else {
            return false;
        };
        if layer.generation == instance.generation {
            return true;
        }
        if !layer.shown {
            tracing::debug!(instance = %id, layer = %layer_id, "discarding superseded embed");
            instance.take_layer(layer_id);
            self.host.remove_layer(layer_id);
        }
        false
    }
}
