//! A small gallery of interactive 3D demos.
//!
//! Each demo owns a [`Scene`] and a camera; the [`Gallery`] keeps exactly
//! one of them mounted and routes input to it. Everything except the
//! [`Renderer`] runs without a window, which is how the headless mode and
//! the tests drive the demos.

pub mod app;
pub mod camera;
pub mod controls;
pub mod demos;
pub mod drag;
pub mod gallery;
pub mod input;
pub mod mesh;
pub mod model;
pub mod panel;
pub mod physics;
pub mod playback;
pub mod raycast;
pub mod render;
pub mod scatter;
pub mod scene;

pub use app::{print_summary, run_headless, Summary};
pub use camera::PerspectiveCamera;
pub use demos::Demo;
pub use gallery::{DemoKind, Gallery, GalleryConfig};
pub use input::{InputEvent, InputState, KeyCode, MouseButton, NamedKey, Viewport};
pub use playback::{Action, Playback};
pub use render::Renderer;
pub use scatter::ScatterMode;
pub use scene::{Light, Scene, SceneObject};
