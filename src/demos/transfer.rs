use glam::Vec3;

use super::{Demo, Stage};
use crate::camera::PerspectiveCamera;
use crate::gallery::DemoKind;
use crate::input::{InputEvent, InputState, KeyCode, Viewport};
use crate::mesh::sphere;
use crate::scene::{rgb_from_hex, Light, Material, ObjectId, Scene, SceneObject, WHITE};

const ROTATION_STEP: f32 = 0.01;
const TRANSLATION_STEP: f32 = 0.1;

/// Toggles for the two per-frame motions of the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SphereMotion {
    pub rotate: bool,
    pub translate: bool,
}

/// A faceted sphere that can spin and drift, toggled with `R` and `M`.
pub struct TransferDemo {
    stage: Stage,
    sphere: ObjectId,
    motion: SphereMotion,
    /// Accumulated Euler angles; kept here so they grow without wrapping.
    angles: Vec3,
}

impl TransferDemo {
    pub fn new(viewport: Viewport) -> Self {
        let camera = PerspectiveCamera::new(75.0, viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(0.0, 0.0, 30.0));
        let mut stage = Stage::new(camera, Vec3::ZERO, viewport);

        let mesh = stage.scene.add_mesh(sphere(10.0, 8, 8));
        let sphere = stage.scene.add_object(SceneObject::new(
            "sphere",
            mesh,
            Material::lit(rgb_from_hex(0x525252)),
        ));
        stage
            .scene
            .lights
            .push(Light::directional(WHITE, 10.0, Vec3::new(25.0, 25.0, 25.0)));
        stage.scene.lights.push(Light::ambient(WHITE, 0.5));

        Self {
            stage,
            sphere,
            motion: SphereMotion::default(),
            angles: Vec3::ZERO,
        }
    }

    pub fn motion(&self) -> SphereMotion {
        self.motion
    }
}

impl Demo for TransferDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Transfer
    }

    fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(KeyCode::Character('R')) => {
                self.motion.rotate = !self.motion.rotate;
            }
            InputEvent::KeyDown(KeyCode::Character('M')) => {
                self.motion.translate = !self.motion.translate;
            }
            _ => {}
        }
        self.stage.handle_event(event);
    }

    fn update(&mut self, _dt: f32, _input: &InputState) {
        if let Some(sphere) = self.stage.scene.object_mut(self.sphere) {
            if self.motion.rotate {
                self.angles += Vec3::splat(ROTATION_STEP);
                sphere.transform.set_euler(self.angles);
            }
            if self.motion.translate {
                sphere.transform.position += Vec3::splat(TRANSLATION_STEP);
            }
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
        let on_off = |flag: bool| if flag { "on" } else { "off" };
        format!(
            "rotate {} [R], move {} [M]",
            on_off(self.motion.rotate),
            on_off(self.motion.translate)
        )
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(demo: &mut TransferDemo, key: char) {
        demo.handle_event(&InputEvent::KeyDown(KeyCode::Character(key)));
        demo.handle_event(&InputEvent::KeyUp(KeyCode::Character(key)));
    }

    #[test]
    fn sphere_is_still_until_toggled() {
        let mut demo = TransferDemo::new(Viewport::default());
        let input = InputState::new();
        demo.update(1.0 / 60.0, &input);
        let sphere = demo.scene().object(demo.sphere).unwrap();
        assert_eq!(sphere.transform.position, Vec3::ZERO);
        assert_eq!(demo.motion(), SphereMotion::default());
    }

    #[test]
    fn toggles_accumulate_per_frame() {
        let mut demo = TransferDemo::new(Viewport::default());
        let input = InputState::new();
        press(&mut demo, 'R');
        press(&mut demo, 'M');
        for _ in 0..10 {
            demo.update(1.0 / 60.0, &input);
        }
        let transform = demo.scene().object(demo.sphere).unwrap().transform;
        assert!((transform.position - Vec3::splat(1.0)).length() < 1e-4);
        assert!((transform.euler() - Vec3::splat(0.1)).length() < 1e-4);

        press(&mut demo, 'M');
        demo.update(1.0 / 60.0, &input);
        let position = demo.scene().object(demo.sphere).unwrap().transform.position;
        assert!((position - Vec3::splat(1.0)).length() < 1e-4);
        assert_eq!(demo.status(), "rotate on [R], move off [M]");
    }
}
