use glam::Vec3;

use super::{Demo, Stage};
use crate::camera::PerspectiveCamera;
use crate::gallery::{DemoKind, GalleryConfig};
use crate::input::{InputEvent, InputState, KeyCode, NamedKey, Viewport};
use crate::model::{LoadState, Model, ModelLoader};
use crate::panel::Slider;
use crate::scene::{Light, Material, Scene, SceneObject, ShadowSettings, Transform, WHITE};

/// Height of the key light above the model.
pub const LIGHT_HEIGHT: f32 = 10000.0;
/// Range and step of the light x slider.
pub const LIGHT_X_MIN: f32 = -10000.0;
pub const LIGHT_X_MAX: f32 = 10000.0;
pub const LIGHT_X_STEP: f32 = 100.0;
const LIGHT_DEPTH: f32 = 1.0;
const MODEL_SIZE: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Loading,
    Ready { parts: usize, triangles: usize },
    Failed(String),
}

/// Model viewer with a slider that swings the key light along x.
pub struct LoaderDemo {
    stage: Stage,
    loader: Option<ModelLoader>,
    status: Status,
    light_x: Slider,
}

impl LoaderDemo {
    pub fn new(config: &GalleryConfig) -> Self {
        let viewport = config.viewport;
        let camera = PerspectiveCamera::new(30.0, viewport.aspect(), 0.1, 2000.0)
            .with_position(Vec3::new(0.0, 0.0, 10.0));
        let stage = Stage::new(camera, Vec3::ZERO, viewport);
        log::info!("loading model {}", config.model_path.display());
        Self {
            stage,
            loader: Some(ModelLoader::spawn(&config.model_path)),
            status: Status::Loading,
            light_x: Slider::new(LIGHT_X_MIN, LIGHT_X_MAX, LIGHT_X_STEP, 5000.0),
        }
    }

    pub fn light_x(&self) -> f32 {
        self.light_x.value()
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            Status::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn finish(&mut self, state: LoadState) {
        match state {
            LoadState::Loading => {}
            LoadState::Ready(model) => self.install(model),
            LoadState::Failed(message) => {
                log::error!("error loading model: {message}");
                self.status = Status::Failed(message);
            }
        }
        self.loader = None;
    }

    /// Adds the model, normalized to a fixed size, plus its lights.
    fn install(&mut self, model: Model) {
        let normalizing = model.normalizing_transform(MODEL_SIZE);
        let scene = &mut self.stage.scene;
        for part in &model.parts {
            let mesh = scene.add_mesh(part.mesh.clone());
            let transform = Transform::from_matrix(normalizing * part.transform);
            scene.add_object(
                SceneObject::new(part.name.clone(), mesh, Material::lit(part.color))
                    .with_transform(transform)
                    .with_shadows(),
            );
        }
        scene.lights.push(Light::ambient(WHITE, 0.05));
        scene.lights.push(Light::Directional {
            position: Vec3::new(self.light_x.value(), LIGHT_HEIGHT, LIGHT_DEPTH),
            color: Vec3::ONE,
            intensity: 5.0,
            cast_shadow: true,
        });
        scene.shadows = Some(ShadowSettings {
            map_size: 2048,
            near: 1.0,
            far: 10000.0,
            extent: MODEL_SIZE,
        });
        self.status = Status::Ready {
            parts: model.parts.len(),
            triangles: model.triangle_count(),
        };
    }

    fn move_light(&mut self) {
        let x = self.light_x.value();
        for light in &mut self.stage.scene.lights {
            if let Light::Directional { position, .. } = light {
                position.x = x;
            }
        }
    }
}

impl Demo for LoaderDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Loader
    }

    fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::KeyDown(key) = *event {
            let moved = match key {
                KeyCode::LEFT => Some(self.light_x.nudge(-1)),
                KeyCode::RIGHT => Some(self.light_x.nudge(1)),
                KeyCode::Named(NamedKey::PageDown) => Some(self.light_x.nudge(-10)),
                KeyCode::Named(NamedKey::PageUp) => Some(self.light_x.nudge(10)),
                KeyCode::Named(NamedKey::Home) => Some(self.light_x.to_min()),
                KeyCode::Named(NamedKey::End) => Some(self.light_x.to_max()),
                _ => None,
            };
            if moved.is_some() {
                self.move_light();
            }
        }
        self.stage.handle_event(event);
    }

    fn update(&mut self, _dt: f32, _input: &InputState) {
        if let Some(state) = self.loader.as_mut().and_then(ModelLoader::poll) {
            self.finish(state);
        }
        self.stage.update_camera();
    }

    fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    fn camera(&self) -> &PerspectiveCamera {
        &self.stage.camera
    }

    fn status(&self) -> String {
        let model = match &self.status {
            Status::Loading => String::from("loading"),
            Status::Ready { parts, triangles } => format!("{parts} parts, {triangles} triangles"),
            Status::Failed(message) => format!("failed: {message}"),
        };
        format!("{model} | light x {:.0} [Left/Right]", self.light_x.value())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
    }

    fn wait_for_assets(&mut self) {
        if let Some(state) = self.loader.as_mut().and_then(ModelLoader::wait) {
            self.finish(state);
        }
    }

    fn unmount(&mut self) {
        if self.loader.take().is_some() {
            log::info!("model still loading; its result will be dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(model_path: PathBuf) -> GalleryConfig {
        GalleryConfig {
            model_path,
            ..GalleryConfig::default()
        }
    }

    fn key(demo: &mut LoaderDemo, key: KeyCode) {
        demo.handle_event(&InputEvent::KeyDown(key));
        demo.handle_event(&InputEvent::KeyUp(key));
    }

    fn key_light_x(demo: &LoaderDemo) -> Option<f32> {
        demo.scene().key_light().map(|light| match light {
            Light::Directional { position, .. } => position.x,
            Light::Ambient { .. } => f32::NAN,
        })
    }

    #[test]
    fn slider_limits_reach_the_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 4 0 0\nv 0 2 0\nf 1 2 3\n").unwrap();
        let mut demo = LoaderDemo::new(&config(path));

        // The slider is tracked before the light exists.
        key(&mut demo, KeyCode::Named(NamedKey::Home));
        assert_eq!(demo.light_x(), -10000.0);

        demo.wait_for_assets();
        assert_eq!(key_light_x(&demo), Some(-10000.0));

        key(&mut demo, KeyCode::Named(NamedKey::End));
        assert_eq!(demo.light_x(), 10000.0);
        assert_eq!(key_light_x(&demo), Some(10000.0));

        key(&mut demo, KeyCode::LEFT);
        key(&mut demo, KeyCode::Named(NamedKey::PageDown));
        assert_eq!(key_light_x(&demo), Some(8900.0));
    }

    #[test]
    fn model_is_normalized_and_casts_shadows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 10 10 10\nv 16 10 10\nv 10 13 10\nf 1 2 3\n").unwrap();
        let mut demo = LoaderDemo::new(&config(path));
        demo.wait_for_assets();

        assert!(!demo.is_loading());
        let bounds = demo.scene().bounds();
        assert!((bounds.max_extent() - MODEL_SIZE).abs() < 1e-4);
        assert!(bounds.center().length() < 1e-4);
        assert!(demo.scene().objects().iter().all(|o| o.cast_shadow && o.receive_shadow));
        assert_eq!(demo.scene().shadows.map(|s| s.map_size), Some(2048));
        assert!(demo.status().starts_with("1 parts, 1 triangles"));
    }

    #[test]
    fn failed_load_keeps_an_empty_scene() {
        let mut demo = LoaderDemo::new(&config(PathBuf::from("nowhere/scene.gltf")));
        demo.wait_for_assets();
        assert!(demo.failure().is_some());
        assert!(demo.scene().objects().is_empty());
        assert!(demo.scene().lights.is_empty());
        assert!(demo.status().starts_with("failed: "));
        demo.update(1.0 / 60.0, &InputState::new());
    }
}
