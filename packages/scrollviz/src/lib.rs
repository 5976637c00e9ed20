pub mod camera;
pub mod config;
pub mod easing;
pub mod input;
pub mod lighting;
pub mod model_asset;
pub mod render;
pub mod scene_builder;
pub mod scene_graph;
pub mod scene_state;
pub mod scroll;
pub mod storyboard;
pub mod timeline;
pub mod visualiser;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
