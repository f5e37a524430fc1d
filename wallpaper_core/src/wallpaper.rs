// The engine: registry, process defaults and the remote-embed session, driven by a host.
// Single-threaded. Every entry point runs to completion; asynchronous work resumes
// through `handle_event`.

use crate::config::{Config, ConfigPatch};
use crate::embed::EmbedSession;
use crate::error::WallpaperError;
use crate::host::Host;
use crate::instance::Instance;
use crate::platform::Platform;
use crate::registry::{fit_instance, Registry};
use crate::types::*;

/// Responsive background engine for every wallpaper on a page.
#[derive(Debug)]
pub struct Wallpaper<H: Host> {
    pub(crate) host: H,
    pub(crate) platform: Platform,
    pub(crate) defaults: Config,
    pub(crate) registry: Registry,
    pub(crate) session: EmbedSession,
    next_layer: u32,
}

impl<H: Host> Wallpaper<H> {
    pub fn new(host: H, platform: Platform) -> Self {
        Wallpaper {
            host,
            platform,
            defaults: Config::default(),
            registry: Registry::new(),
            session: EmbedSession::new(),
            next_layer: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn defaults(&self) -> &Config {
        &self.defaults
    }

    pub fn session(&self) -> &EmbedSession {
        &self.session
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.registry.get(id)
    }

    pub fn instance_count(&self) -> usize {
        self.registry.len()
    }

    /// Merge `patch` into the defaults used by future attachments.
    pub fn set_defaults(&mut self, patch: ConfigPatch) -> Result<(), WallpaperError> {
        self.defaults = self.defaults.merged(patch).inspect_err(|err| {
            tracing::warn!(%err, "rejected default options");
        })?;
        Ok(())
    }

    /// Attach a wallpaper to the container `key` and load its initial source, if any.
    /// Attaching an already-attached container returns the existing instance.
    pub fn attach(
        &mut self,
        key: ContainerKey,
        patch: ConfigPatch,
    ) -> Result<InstanceId, WallpaperError> {
        if let Some(existing) = self.registry.find_by_key(&key) {
            tracing::debug!(instance = %existing, key = key.as_str(), "container already attached");
            return Ok(existing);
        }

        let mut config = self.defaults.merged(patch).inspect_err(|err| {
            tracing::warn!(%err, key = key.as_str(), "rejected wallpaper options");
        })?;
        let source = config.source.take();

        let id = self.registry.allocate_id();
        tracing::debug!(instance = %id, key = key.as_str(), "attaching wallpaper");
        self.host.mount_container(id, &key);
        self.registry.insert(Instance::new(id, key, config));
        self.registry.retain_listener(&mut self.host);

        if let Some(source) = source {
            self.load(id, source)?;
        }

        self.host.notify_ready(id);
        Ok(id)
    }

    /// Tear down one instance. The resize listener goes with the last one.
    pub fn detach(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        let instance = self
            .registry
            .remove(id)
            .ok_or(WallpaperError::UnknownInstance(id))?;

        tracing::debug!(instance = %id, layers = instance.layers.len(), "detaching wallpaper");
        if instance.hover_bound {
            self.host.unbind_hover(id);
        }
        self.host.unmount_container(id);
        self.registry.release_listener(&mut self.host);
        Ok(())
    }

    pub fn detach_all(&mut self) {
        for id in self.registry.ids() {
            // Ids come straight from the registry.
            let _ = self.detach(id);
        }
    }

    /// Refit one instance to its container.
    pub fn resize(&mut self, id: InstanceId) -> Result<(), WallpaperError> {
        let instance = self
            .registry
            .get(id)
            .ok_or(WallpaperError::UnknownInstance(id))?;
        fit_instance(&mut self.host, instance);
        Ok(())
    }

    /// Refit every instance.
    pub fn resize_all(&mut self) {
        for instance in self.registry.iter() {
            fit_instance(&mut self.host, instance);
        }
    }

    /// Resume whatever was waiting on `event`.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::ImageDecoded { layer, size } | HostEvent::MetadataLoaded { layer, size } => {
                self.media_ready(layer, size)
            }
            HostEvent::TransitionEnd { layer } => self.transition_end(layer),
            HostEvent::PlayerReady { layer } => self.player_ready(layer),
            HostEvent::PlayerStateChange { layer, state } => self.player_state(layer, state),
            HostEvent::EmbedApiReady => self.drain_embeds(),
            HostEvent::Resize => self.resize_all(),
            HostEvent::PointerEnter { instance } => self.hover(instance, true),
            HostEvent::PointerLeave { instance } => self.hover(instance, false),
        }
    }

    fn hover(&mut self, id: InstanceId, inside: bool) {
        let bound = self.registry.get(id).is_some_and(|i| i.hover_bound);
        if !bound {
            tracing::trace!(instance = %id, "pointer event without hover playback");
            return;
        }
        let result = if inside { self.play(id) } else { self.pause(id) };
        if let Err(err) = result {
            tracing::trace!(%err, "hover playback skipped");
        }
    }

    pub(crate) fn allocate_layer(&mut self) -> LayerId {
        let id = LayerId::new(self.next_layer);
        self.next_layer += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::{Call, RecordingHost};
    use crate::source::RawSource;

    fn engine() -> Wallpaper<RecordingHost> {
        let platform = Platform {
            native_cover: false,
            ..Default::default()
        };
        Wallpaper::new(RecordingHost::new(), platform)
    }

    #[test]
    fn attach_mounts_and_notifies_ready() {
        let mut wallpaper = engine();
        let id = wallpaper
            .attach(ContainerKey::new("hero"), ConfigPatch::default())
            .unwrap();

        let calls = &wallpaper.host().calls;
        assert_eq!(calls[0], Call::Mount(id));
        assert!(calls.contains(&Call::InstallResize));
        assert_eq!(calls.last(), Some(&Call::Ready(id)));
        // No source, nothing loaded.
        assert_eq!(wallpaper.host().loaded_count(id), 0);
    }

    #[test]
    fn attach_twice_reuses_instance() {
        let mut wallpaper = engine();
        let a = wallpaper
            .attach(ContainerKey::new("hero"), ConfigPatch::default())
            .unwrap();
        let b = wallpaper
            .attach(ContainerKey::new("hero"), ConfigPatch::default())
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(wallpaper.instance_count(), 1);
    }

    #[test]
    fn defaults_apply_to_later_attachments() {
        let mut wallpaper = engine();
        wallpaper
            .set_defaults(ConfigPatch {
                mute: Some(false),
                ..Default::default()
            })
            .unwrap();
        let id = wallpaper
            .attach(ContainerKey::new("hero"), ConfigPatch::default())
            .unwrap();
        assert!(!wallpaper.instance(id).unwrap().config.mute);
    }

    #[test]
    fn invalid_defaults_are_rejected() {
        let mut wallpaper = engine();
        let err = wallpaper
            .set_defaults(ConfigPatch {
                embed_ratio: Some(-1.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, WallpaperError::InvalidConfig(_)));
        assert_eq!(wallpaper.defaults().embed_ratio, 0.5625);
    }

    #[test]
    fn detaching_last_instance_silences_resize() {
        let mut wallpaper = engine();
        let a = wallpaper
            .attach(
                ContainerKey::new("a"),
                ConfigPatch {
                    source: Some(RawSource::from("a.jpg")),
                    ..Default::default()
                },
            )
            .unwrap();
        let layer = wallpaper.host().last_layer().unwrap();
        wallpaper.handle_event(HostEvent::ImageDecoded {
            layer,
            size: Size::new(400.0, 300.0),
        });

        wallpaper.detach(a).unwrap();
        assert!(!wallpaper.host().resize_listener);
        assert!(wallpaper.host().calls.contains(&Call::Unmount(a)));

        let frames_before = wallpaper.host().count(|c| matches!(c, Call::Frame(..)));
        assert!(frames_before > 0);
        wallpaper.handle_event(HostEvent::Resize);
        let frames_after = wallpaper.host().count(|c| matches!(c, Call::Frame(..)));
        assert_eq!(frames_before, frames_after);
    }

    #[test]
    fn detach_all_clears_registry() {
        let mut wallpaper = engine();
        wallpaper
            .attach(ContainerKey::new("a"), ConfigPatch::default())
            .unwrap();
        wallpaper
            .attach(ContainerKey::new("b"), ConfigPatch::default())
            .unwrap();
        wallpaper.detach_all();
        assert_eq!(wallpaper.instance_count(), 0);
        assert_eq!(
            wallpaper.host().count(|c| *c == Call::RemoveResize),
            1
        );
    }

    #[test]
    fn unknown_instance_is_an_error() {
        let mut wallpaper = engine();
        let err = wallpaper.detach(InstanceId::new(42)).unwrap_err();
        assert!(matches!(err, WallpaperError::UnknownInstance(_)));
    }
}
