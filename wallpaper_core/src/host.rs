// The engine never touches the DOM. Everything visible goes through this trait;
// everything asynchronous comes back as a `HostEvent`.

use crate::types::*;

/// DOM/layout, event dispatch and remote-player collaborators, as seen by the engine.
pub trait Host {
    // Layout

    /// Create the wrapper element that will hold the media layers of `instance`.
    fn mount_container(&mut self, instance: InstanceId, key: &ContainerKey);
    /// Remove the wrapper element and every layer left in it.
    fn unmount_container(&mut self, instance: InstanceId);
    fn container_box(&self, instance: InstanceId) -> ContainerBox;

    /// Insert a new, fully transparent media layer on top of the existing ones.
    fn create_layer(&mut self, instance: InstanceId, layer: LayerId, spec: &LayerSpec)
        -> LayerStatus;
    fn remove_layer(&mut self, layer: LayerId);
    fn set_layer_frame(&mut self, layer: LayerId, frame: LayerFrame);
    /// Change opacity after `delay_ms`; the host animates it and reports `TransitionEnd`.
    fn set_layer_opacity(&mut self, layer: LayerId, opacity: f64, delay_ms: u32);
    /// Let CSS size an image layer (`background-size: cover`).
    fn apply_native_cover(&mut self, layer: LayerId, url: &str);
    fn mark_embed_ready(&mut self, layer: LayerId);

    // Native media

    fn play_media(&mut self, layer: LayerId);
    fn pause_media(&mut self, layer: LayerId);

    // Events

    /// Raise the "loaded" notification and invoke the load callback.
    fn emit_loaded(&mut self, instance: InstanceId);
    /// Invoke the ready callback.
    fn notify_ready(&mut self, instance: InstanceId);
    /// Start reporting `PointerEnter`/`PointerLeave` for `instance`.
    fn bind_hover(&mut self, instance: InstanceId);
    fn unbind_hover(&mut self, instance: InstanceId);
    fn install_resize_listener(&mut self);
    fn remove_resize_listener(&mut self);

    // Remote player

    fn inject_embed_script(&mut self, src: &str);
    /// Instantiate a remote player on the iframe `element_id` of `layer`.
    fn create_player(&mut self, layer: LayerId, element_id: &str, video_id: &str);
    fn player_command(&mut self, layer: LayerId, command: PlayerCommand);
}

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::{BTreeMap, HashMap};

    use super::Host;
    use crate::types::*;

    /// Every host call, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Mount(InstanceId),
        Unmount(InstanceId),
        CreateLayer(InstanceId, LayerId, LayerSpec),
        RemoveLayer(LayerId),
        Frame(LayerId, LayerFrame),
        Opacity(LayerId, f64),
        NativeCover(LayerId, String),
        EmbedReady(LayerId),
        Play(LayerId),
        Pause(LayerId),
        Loaded(InstanceId),
        Ready(InstanceId),
        BindHover(InstanceId),
        UnbindHover(InstanceId),
        InstallResize,
        RemoveResize,
        Script(String),
        CreatePlayer(LayerId, String, String),
        Player(LayerId, PlayerCommand),
    }

    /// In-memory host that records calls and tracks which layers exist.
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub calls: Vec<Call>,
        pub boxes: HashMap<InstanceId, ContainerBox>,
        /// Image sources that decode synchronously (cache hits).
        pub cached: HashMap<String, Size>,
        pub layers: BTreeMap<LayerId, (InstanceId, LayerSpec)>,
        pub opacity: HashMap<LayerId, f64>,
        pub resize_listener: bool,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            RecordingHost::default()
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }

        pub fn loaded_count(&self, instance: InstanceId) -> usize {
            self.count(|c| *c == Call::Loaded(instance))
        }

        /// Live layers of an instance in stacking order.
        pub fn layers_of(&self, instance: InstanceId) -> Vec<LayerId> {
            self.layers
                .iter()
                .filter(|(_, (owner, _))| *owner == instance)
                .map(|(id, _)| *id)
                .collect()
        }

        pub fn opaque_layers_of(&self, instance: InstanceId) -> usize {
            self.layers_of(instance)
                .iter()
                .filter(|id| self.opacity.get(id).copied().unwrap_or(0.0) >= 1.0)
                .count()
        }

        pub fn last_frame(&self, layer: LayerId) -> Option<LayerFrame> {
            self.calls.iter().rev().find_map(|c| match c {
                Call::Frame(l, frame) if *l == layer => Some(*frame),
                _ => None,
            })
        }

        pub fn last_layer(&self) -> Option<LayerId> {
            self.layers.keys().next_back().copied()
        }
    }

    impl Host for RecordingHost {
        fn mount_container(&mut self, instance: InstanceId, _key: &ContainerKey) {
            self.calls.push(Call::Mount(instance));
        }

        fn unmount_container(&mut self, instance: InstanceId) {
            self.layers.retain(|_, (owner, _)| *owner != instance);
            self.calls.push(Call::Unmount(instance));
        }

        fn container_box(&self, instance: InstanceId) -> ContainerBox {
            self.boxes
                .get(&instance)
                .copied()
                .unwrap_or(ContainerBox::new(800.0, 600.0))
        }

        fn create_layer(
            &mut self,
            instance: InstanceId,
            layer: LayerId,
            spec: &LayerSpec,
        ) -> LayerStatus {
            self.layers.insert(layer, (instance, spec.clone()));
            self.opacity.insert(layer, 0.0);
            self.calls
                .push(Call::CreateLayer(instance, layer, spec.clone()));
            match spec {
                LayerSpec::Image { src } => match self.cached.get(src) {
                    Some(size) => LayerStatus::Decoded(*size),
                    None => LayerStatus::Pending,
                },
                _ => LayerStatus::Pending,
            }
        }

        fn remove_layer(&mut self, layer: LayerId) {
            self.layers.remove(&layer);
            self.opacity.remove(&layer);
            self.calls.push(Call::RemoveLayer(layer));
        }

        fn set_layer_frame(&mut self, layer: LayerId, frame: LayerFrame) {
            self.calls.push(Call::Frame(layer, frame));
        }

        fn set_layer_opacity(&mut self, layer: LayerId, opacity: f64, _delay_ms: u32) {
            self.opacity.insert(layer, opacity);
            self.calls.push(Call::Opacity(layer, opacity));
        }

        fn apply_native_cover(&mut self, layer: LayerId, url: &str) {
            self.calls.push(Call::NativeCover(layer, url.to_string()));
        }

        fn mark_embed_ready(&mut self, layer: LayerId) {
            self.calls.push(Call::EmbedReady(layer));
        }

        fn play_media(&mut self, layer: LayerId) {
            self.calls.push(Call::Play(layer));
        }

        fn pause_media(&mut self, layer: LayerId) {
            self.calls.push(Call::Pause(layer));
        }

        fn emit_loaded(&mut self, instance: InstanceId) {
            self.calls.push(Call::Loaded(instance));
        }

        fn notify_ready(&mut self, instance: InstanceId) {
            self.calls.push(Call::Ready(instance));
        }

        fn bind_hover(&mut self, instance: InstanceId) {
            self.calls.push(Call::BindHover(instance));
        }

        fn unbind_hover(&mut self, instance: InstanceId) {
            self.calls.push(Call::UnbindHover(instance));
        }

        fn install_resize_listener(&mut self) {
            self.resize_listener = true;
            self.calls.push(Call::InstallResize);
        }

        fn remove_resize_listener(&mut self) {
            self.resize_listener = false;
            self.calls.push(Call::RemoveResize);
        }

        fn inject_embed_script(&mut self, src: &str) {
            self.calls.push(Call::Script(src.to_string()));
        }

        fn create_player(&mut self, layer: LayerId, element_id: &str, video_id: &str) {
            self.calls.push(Call::CreatePlayer(
                layer,
                element_id.to_string(),
                video_id.to_string(),
            ));
        }

        fn player_command(&mut self, layer: LayerId, command: PlayerCommand) {
            self.calls.push(Call::Player(layer, command));
        }
    }
}
