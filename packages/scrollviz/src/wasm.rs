//! Browser bindings: the page drives a [`Visualiser`] through these exports.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, Request, RequestInit, RequestMode, Response};

use crate::camera::PerspectiveCamera;
use crate::config::{AppConfig, SceneConfig};
use crate::model_asset::ModelAsset;
use crate::render::overlay_style;
use crate::visualiser::{Viewport, Visualiser};

#[wasm_bindgen]
pub struct WasmVisualiser {
    inner: Rc<RefCell<WasmContext>>,
}

struct WasmContext {
    visualiser: Visualiser,
    /// Camera of the most recent frame, for uniform upload.
    last_camera: PerspectiveCamera,
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Create a visualiser for the page. `config_json` may be empty for the
/// procedural scene. Asset scenes start fetching their model immediately.
#[wasm_bindgen]
pub fn create_visualiser(
    config_json: &str,
    width: u32,
    height: u32,
    pixel_ratio: f32,
) -> Result<WasmVisualiser, JsValue> {
    init_panic_hook();

    let config = if config_json.trim().is_empty() {
        AppConfig::procedural()
    } else {
        AppConfig::from_json_str(config_json).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?
    };
    let model_url = match &config.scene {
        SceneConfig::Asset(asset) => Some(asset.url.clone()),
        SceneConfig::Procedural(_) => None,
    };

    let viewport = Viewport {
        width,
        height,
        pixel_ratio,
    };
    let visualiser = Visualiser::new(config, viewport)
        .map_err(|e| JsValue::from_str(&format!("Failed to build timeline: {}", e)))?;
    let last_camera = *visualiser.camera();

    let wasm = WasmVisualiser {
        inner: Rc::new(RefCell::new(WasmContext {
            visualiser,
            last_camera,
        })),
    };
    if let Some(url) = model_url {
        wasm.load_model(url);
    }
    Ok(wasm)
}

#[wasm_bindgen]
impl WasmVisualiser {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        panic!("Use create_visualiser constructor");
    }

    /// Scroll metrics of the tracked container.
    pub fn set_scroll(&self, scroll_top: f32, scroll_height: f32, client_height: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.visualiser.set_scroll(scroll_top, scroll_height, client_height);
    }

    pub fn set_progress(&self, progress: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.visualiser.set_progress(progress);
    }

    /// Pointer position in client pixels.
    pub fn set_pointer(&self, client_x: f32, client_y: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.visualiser.set_pointer(client_x, client_y);
    }

    pub fn resize(&self, width: u32, height: u32, pixel_ratio: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.visualiser.resize(width, height, pixel_ratio);
    }

    pub fn has_model(&self) -> bool {
        self.inner.borrow().visualiser.has_model()
    }

    pub fn duration(&self) -> f32 {
        self.inner.borrow().visualiser.timeline().duration()
    }

    /// Advance one frame. Applies overlay opacities to the DOM and returns the
    /// frame as JSON for the host renderer.
    pub fn frame(&self, dt: f32) -> String {
        let mut inner = self.inner.borrow_mut();
        let frame = inner.visualiser.frame(dt);
        inner.last_camera = frame.camera;
        apply_overlays(&frame.overlays);
        serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn camera_uniforms(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        bytemuck::bytes_of(&inner.last_camera.to_uniforms()).to_vec()
    }

    pub fn lighting_uniforms(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        bytemuck::bytes_of(&inner.visualiser.lighting().to_uniforms()).to_vec()
    }

    /// Fetch and install a model. Single attempt; failure leaves the scene
    /// without a model.
    pub fn load_model(&self, url: String) {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::spawn_local(async move {
            let asset = match fetch_bytes(&url).await {
                Ok(bytes) => ModelAsset::from_bytes(&url, &bytes),
                Err(e) => {
                    log::error!("Failed to fetch model '{}': {:?}", url, e);
                    return;
                }
            };
            match asset {
                Ok(asset) => {
                    let mut ctx = inner.borrow_mut();
                    match ctx.visualiser.install_model(&asset) {
                        Ok(()) => log::info!("Model '{}' installed", url),
                        Err(e) => log::error!("Failed to rebuild timeline for '{}': {}", url, e),
                    }
                }
                Err(e) => log::error!("Failed to load model '{}': {:#}", url, e),
            }
        });
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);
    let request = Request::new_with_str_and_init(url, &opts)?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn apply_overlays(overlays: &BTreeMap<String, f32>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    for (id, opacity) in overlays {
        let Some(element) = document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        let style = element.style();
        for (property, value) in overlay_style(*opacity) {
            if let Err(e) = style.set_property(property, &value) {
                log::warn!("Failed to set {} on overlay '{}': {:?}", property, id, e);
            }
        }
    }
}
