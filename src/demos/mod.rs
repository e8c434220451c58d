//! The five demo scenes and the pieces they share.

mod cannon;
mod lerp;
mod loader;
mod raycaster;
mod transfer;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::gallery::{DemoKind, GalleryConfig};
use crate::input::{InputEvent, InputState, Viewport};
use crate::raycast::Ray;
use crate::scene::Scene;

pub use cannon::CannonDemo;
pub use lerp::{LerpDemo, SCROLL_PAGES};
pub use loader::{LoaderDemo, LIGHT_HEIGHT, LIGHT_X_MAX, LIGHT_X_MIN, LIGHT_X_STEP};
pub use raycaster::RaycasterDemo;
pub use transfer::{SphereMotion, TransferDemo};

/// A mounted demo. Dropping it releases everything it owns.
pub trait Demo {
    fn kind(&self) -> DemoKind;

    fn handle_event(&mut self, event: &InputEvent);

    /// Advances the demo by one frame of `dt` seconds.
    fn update(&mut self, dt: f32, input: &InputState);

    fn scene(&self) -> &Scene;

    fn camera(&self) -> &PerspectiveCamera;

    /// One-line state description shown in the window title and summaries.
    fn status(&self) -> String;

    fn resize(&mut self, viewport: Viewport);

    /// Blocks until any background work started on mount has finished.
    fn wait_for_assets(&mut self) {}

    fn unmount(&mut self) {}
}

/// Builds the demo for `kind`.
pub fn mount(kind: DemoKind, config: &GalleryConfig) -> Box<dyn Demo> {
    match kind {
        DemoKind::Transfer => Box::new(TransferDemo::new(config.viewport)),
        DemoKind::Cannon => Box::new(CannonDemo::new(config.viewport)),
        DemoKind::Lerp => Box::new(LerpDemo::new(config)),
        DemoKind::Raycaster => Box::new(RaycasterDemo::new(config.viewport)),
        DemoKind::Loader => Box::new(LoaderDemo::new(config)),
    }
}

/// Scene, camera and orbit controls as every demo sets them up.
pub(crate) struct Stage {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub viewport: Viewport,
    pointer: Vec2,
}

impl Stage {
    pub fn new(camera: PerspectiveCamera, target: Vec3, viewport: Viewport) -> Self {
        let mut camera = camera;
        camera.set_aspect(viewport.aspect());
        camera.look_at(target);
        Self {
            scene: Scene::new(),
            camera,
            controls: OrbitControls::new(target),
            viewport,
            pointer: Vec2::ZERO,
        }
    }

    /// Tracks the pointer and feeds the orbit controls.
    pub fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::PointerMoved(position) = *event {
            self.pointer = position;
        }
        self.controls.handle_event(event, self.viewport);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
    }

    pub fn update_camera(&mut self) {
        self.controls.update(&mut self.camera);
    }

    /// Ray from the camera through the last pointer position.
    pub fn pointer_ray(&self) -> Ray {
        self.camera.ray_from_ndc(self.viewport.to_ndc(self.pointer))
    }
}
