// JS boundary. The page supplies a host object implementing the DOM side; everything crossing
// the boundary is a primitive or JSON text, parsed and validated here.

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::config::ConfigPatch;
use crate::error::WallpaperError;
use crate::host::Host;
use crate::platform::{Platform, PlatformProbe};
use crate::source::RawSource;
use crate::types::*;
use crate::wallpaper::Wallpaper;

#[wasm_bindgen]
extern "C" {
    /// Page-side collaborator. See the `Host` trait for the contract of each method.
    ///
    /// `emitLoaded` and `notifyReady` run from a microtask once the engine call that raised
    /// them has returned, so page callbacks behind them may call straight back into the engine.
    #[derive(Clone, Debug)]
    pub type JsHost;

    #[wasm_bindgen(js_name = queueMicrotask)]
    fn queue_microtask(callback: &JsValue);

    #[wasm_bindgen(method, js_name = mountContainer)]
    fn js_mount_container(this: &JsHost, instance: u32, key: &str);
    #[wasm_bindgen(method, js_name = unmountContainer)]
    fn js_unmount_container(this: &JsHost, instance: u32);
    #[wasm_bindgen(method, js_name = containerWidth)]
    fn js_container_width(this: &JsHost, instance: u32) -> f64;
    #[wasm_bindgen(method, js_name = containerHeight)]
    fn js_container_height(this: &JsHost, instance: u32) -> f64;

    /// Returns the natural size as `{"width":..,"height":..}` when the media is already decoded.
    #[wasm_bindgen(method, js_name = createLayer)]
    fn js_create_layer(this: &JsHost, instance: u32, layer: u32, spec_json: &str) -> Option<String>;
    #[wasm_bindgen(method, js_name = removeLayer)]
    fn js_remove_layer(this: &JsHost, layer: u32);
    #[wasm_bindgen(method, js_name = setLayerFrame)]
    fn js_set_layer_frame(this: &JsHost, layer: u32, width: f64, height: f64, left: f64, top: f64);
    #[wasm_bindgen(method, js_name = setLayerOpacity)]
    fn js_set_layer_opacity(this: &JsHost, layer: u32, opacity: f64, delay_ms: u32);
    #[wasm_bindgen(method, js_name = applyNativeCover)]
    fn js_apply_native_cover(this: &JsHost, layer: u32, url: &str);
    #[wasm_bindgen(method, js_name = markEmbedReady)]
    fn js_mark_embed_ready(this: &JsHost, layer: u32);

    #[wasm_bindgen(method, js_name = playMedia)]
    fn js_play_media(this: &JsHost, layer: u32);
    #[wasm_bindgen(method, js_name = pauseMedia)]
    fn js_pause_media(this: &JsHost, layer: u32);

    #[wasm_bindgen(method, js_name = emitLoaded)]
    fn js_emit_loaded(this: &JsHost, instance: u32);
    #[wasm_bindgen(method, js_name = notifyReady)]
    fn js_notify_ready(this: &JsHost, instance: u32);
    #[wasm_bindgen(method, js_name = bindHover)]
    fn js_bind_hover(this: &JsHost, instance: u32);
    #[wasm_bindgen(method, js_name = unbindHover)]
    fn js_unbind_hover(this: &JsHost, instance: u32);
    #[wasm_bindgen(method, js_name = installResizeListener)]
    fn js_install_resize_listener(this: &JsHost);
    #[wasm_bindgen(method, js_name = removeResizeListener)]
    fn js_remove_resize_listener(this: &JsHost);

    #[wasm_bindgen(method, js_name = injectEmbedScript)]
    fn js_inject_embed_script(this: &JsHost, src: &str);
    #[wasm_bindgen(method, js_name = createPlayer)]
    fn js_create_player(this: &JsHost, layer: u32, element_id: &str, video_id: &str);
    #[wasm_bindgen(method, js_name = playerCommand)]
    fn js_player_command(this: &JsHost, layer: u32, command_json: &str);
}

impl JsHost {
    /// The exported engine stays borrowed for the whole call, so re-entry must wait for it.
    fn deferred(&self, notify: impl FnOnce(&JsHost) + 'static) {
        let host = self.clone();
        queue_microtask(&Closure::once_into_js(move || notify(&host)));
    }
}

impl Host for JsHost {
    fn mount_container(&mut self, instance: InstanceId, key: &ContainerKey) {
        self.js_mount_container(instance.as_u32(), key.as_str());
    }

    fn unmount_container(&mut self, instance: InstanceId) {
        self.js_unmount_container(instance.as_u32());
    }

    fn container_box(&self, instance: InstanceId) -> ContainerBox {
        ContainerBox::new(
            self.js_container_width(instance.as_u32()),
            self.js_container_height(instance.as_u32()),
        )
    }

    fn create_layer(&mut self, instance: InstanceId, layer: LayerId, spec: &LayerSpec) -> LayerStatus {
        let spec_json = match serde_json::to_string(spec) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(layer = %layer, %err, "could not encode layer spec");
                return LayerStatus::Pending;
            }
        };
        let Some(decoded) = self.js_create_layer(instance.as_u32(), layer.as_u32(), &spec_json)
        else {
            return LayerStatus::Pending;
        };
        match serde_json::from_str::<Size>(&decoded) {
            Ok(size) => LayerStatus::Decoded(size),
            Err(err) => {
                tracing::warn!(layer = %layer, %err, "host returned an unreadable size");
                LayerStatus::Pending
            }
        }
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.js_remove_layer(layer.as_u32());
    }

    fn set_layer_frame(&mut self, layer: LayerId, frame: LayerFrame) {
        self.js_set_layer_frame(layer.as_u32(), frame.width, frame.height, frame.left, frame.top);
    }

    fn set_layer_opacity(&mut self, layer: LayerId, opacity: f64, delay_ms: u32) {
        self.js_set_layer_opacity(layer.as_u32(), opacity, delay_ms);
    }

    fn apply_native_cover(&mut self, layer: LayerId, url: &str) {
        self.js_apply_native_cover(layer.as_u32(), url);
    }

    fn mark_embed_ready(&mut self, layer: LayerId) {
        self.js_mark_embed_ready(layer.as_u32());
    }

    fn play_media(&mut self, layer: LayerId) {
        self.js_play_media(layer.as_u32());
    }

    fn pause_media(&mut self, layer: LayerId) {
        self.js_pause_media(layer.as_u32());
    }

    fn emit_loaded(&mut self, instance: InstanceId) {
        self.deferred(move |host| host.js_emit_loaded(instance.as_u32()));
    }

    fn notify_ready(&mut self, instance: InstanceId) {
        self.deferred(move |host| host.js_notify_ready(instance.as_u32()));
    }

    fn bind_hover(&mut self, instance: InstanceId) {
        self.js_bind_hover(instance.as_u32());
    }

    fn unbind_hover(&mut self, instance: InstanceId) {
        self.js_unbind_hover(instance.as_u32());
    }

    fn install_resize_listener(&mut self) {
        self.js_install_resize_listener();
    }

    fn remove_resize_listener(&mut self) {
        self.js_remove_resize_listener();
    }

    fn inject_embed_script(&mut self, src: &str) {
        self.js_inject_embed_script(src);
    }

    fn create_player(&mut self, layer: LayerId, element_id: &str, video_id: &str) {
        self.js_create_player(layer.as_u32(), element_id, video_id);
    }

    fn player_command(&mut self, layer: LayerId, command: PlayerCommand) {
        match serde_json::to_string(&command) {
            Ok(json) => self.js_player_command(layer.as_u32(), &json),
            Err(err) => tracing::warn!(layer = %layer, %err, "could not encode player command"),
        }
    }
}

fn to_js(err: WallpaperError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JSON text of `value`: strings pass through, anything else is stringified.
fn json_text(value: &JsValue) -> Result<String, WallpaperError> {
    if let Some(text) = value.as_string() {
        return Ok(text);
    }
    js_sys::JSON::stringify(value)
        .map(String::from)
        .map_err(|_| WallpaperError::Serialization("value is not JSON-serializable".to_string()))
}

/// Parse an options-like argument; `undefined` and `null` mean "nothing set".
fn parse_or_default<T: DeserializeOwned + Default>(value: &JsValue) -> Result<T, WallpaperError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    let text = json_text(value)?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&text)?)
}

/// Objects are video descriptors. Strings may be JSON text of either form or a bare URL.
fn parse_source(value: &JsValue) -> Result<RawSource, WallpaperError> {
    if let Some(text) = value.as_string() {
        return Ok(serde_json::from_str(&text).unwrap_or(RawSource::Url(text)));
    }
    Ok(serde_json::from_str(&json_text(value)?)?)
}

/// Engine handle exported to JavaScript.
#[wasm_bindgen]
pub struct WasmWallpaper {
    inner: Wallpaper<JsHost>,
}

#[wasm_bindgen]
impl WasmWallpaper {
    /// `platform` describes the page: `{ userAgent, nativeCover, transitions, protocol, host }`.
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsHost, platform: JsValue) -> Result<WasmWallpaper, JsValue> {
        let probe: PlatformProbe = parse_or_default(&platform).map_err(to_js)?;
        let platform = Platform::detect(probe);
        tracing::debug!(?platform, "wallpaper engine created");
        Ok(WasmWallpaper {
            inner: Wallpaper::new(host, platform),
        })
    }

    #[wasm_bindgen(js_name = setDefaults)]
    pub fn set_defaults(&mut self, options: JsValue) -> Result<(), JsValue> {
        let patch: ConfigPatch = parse_or_default(&options).map_err(to_js)?;
        self.inner.set_defaults(patch).map_err(to_js)
    }

    /// Returns the instance id used by every other call and by host callbacks.
    pub fn attach(&mut self, container_key: &str, options: JsValue) -> Result<u32, JsValue> {
        let patch: ConfigPatch = parse_or_default(&options).map_err(to_js)?;
        self.inner
            .attach(ContainerKey::new(container_key), patch)
            .map(|id| id.as_u32())
            .map_err(to_js)
    }

    pub fn detach(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.detach(InstanceId::new(instance)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = detachAll)]
    pub fn detach_all(&mut self) {
        self.inner.detach_all();
    }

    pub fn load(&mut self, instance: u32, source: JsValue) -> Result<(), JsValue> {
        let source = parse_source(&source).map_err(to_js)?;
        self.inner
            .load(InstanceId::new(instance), source)
            .map_err(to_js)
    }

    pub fn unload(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.unload(InstanceId::new(instance)).map_err(to_js)
    }

    pub fn play(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.play(InstanceId::new(instance)).map_err(to_js)
    }

    pub fn pause(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.pause(InstanceId::new(instance)).map_err(to_js)
    }

    /// Deprecated alias of `pause`.
    pub fn stop(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.stop(InstanceId::new(instance)).map_err(to_js)
    }

    pub fn resize(&mut self, instance: u32) -> Result<(), JsValue> {
        self.inner.resize(InstanceId::new(instance)).map_err(to_js)
    }

    /// Deliver an asynchronous host signal, e.g. `{ type: "TransitionEnd", layer: 3 }`.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event: JsValue) -> Result<(), JsValue> {
        let text = json_text(&event).map_err(to_js)?;
        let event: HostEvent = serde_json::from_str(&text)
            .map_err(WallpaperError::from)
            .map_err(to_js)?;
        self.inner.handle_event(event);
        Ok(())
    }

    #[wasm_bindgen(js_name = instanceCount)]
    pub fn instance_count(&self) -> usize {
        self.inner.instance_count()
    }
}
