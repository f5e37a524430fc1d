// Live instances and the single viewport-resize listener they share.
// The listener exists exactly while at least one instance is attached.

use std::collections::BTreeMap;

use crate::geometry;
use crate::host::Host;
use crate::instance::Instance;
use crate::types::{ContainerKey, InstanceId, LayerId};

#[derive(Debug, Default)]
pub struct Registry {
    instances: BTreeMap<InstanceId, Instance>,
    next_id: u32,
    resize_listener: bool,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, instance: Instance) {
        self.instances.insert(instance.id, instance);
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        self.instances.remove(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.keys().copied().collect()
    }

    pub fn find_by_key(&self, key: &ContainerKey) -> Option<InstanceId> {
        self.iter().find(|i| &i.key == key).map(|i| i.id)
    }

    /// Instance holding `layer`, if it still exists.
    pub fn owner_of(&self, layer: LayerId) -> Option<InstanceId> {
        self.iter().find(|i| i.owns(layer)).map(|i| i.id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn has_resize_listener(&self) -> bool {
        self.resize_listener
    }

    /// Install the resize listener on first attach.
    pub fn retain_listener<H: Host>(&mut self, host: &mut H) {
        if !self.resize_listener && !self.is_empty() {
            self.resize_listener = true;
            tracing::debug!("installing viewport resize listener");
            host.install_resize_listener();
        }
    }

    /// Remove the resize listener once the last instance is gone.
    pub fn release_listener<H: Host>(&mut self, host: &mut H) {
        if self.resize_listener && self.is_empty() {
            self.resize_listener = false;
            tracing::debug!("last instance detached, removing viewport resize listener");
            host.remove_resize_listener();
        }
    }
}

/// Refit every sized, script-managed layer of `instance` to its container.
pub fn fit_instance<H: Host>(host: &mut H, instance: &Instance) {
    let container = host.container_box(instance.id);
    for layer in instance.layers.iter().filter(|l| l.fittable()) {
        let Some(natural) = layer.natural else {
            continue;
        };
        match geometry::fit(container, natural, layer.ratio_override) {
            Ok(frame) => host.set_layer_frame(layer.id, frame),
            Err(err) => {
                tracing::trace!(instance = %instance.id, layer = %layer.id, %err, "layer not fitted")
            }
        }
    }
}
