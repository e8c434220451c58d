use glam::Vec3;

use super::{Demo, Stage};
use crate::camera::PerspectiveCamera;
use crate::drag::DragState;
use crate::gallery::DemoKind;
use crate::input::{InputEvent, InputState, MouseButton, Viewport};
use crate::mesh::{cuboid, grid};
use crate::scene::{rgb_from_hex, Material, ObjectId, Scene, SceneObject, BLUE, GREEN, RED};

const GRID_CENTER_COLOR: u32 = 0x444444;
const GRID_COLOR: u32 = 0x888888;

/// Three cubes on a grid that can be dragged across the floor plane.
pub struct RaycasterDemo {
    stage: Stage,
    cubes: Vec<ObjectId>,
    drag: DragState,
}

impl RaycasterDemo {
    pub fn new(viewport: Viewport) -> Self {
        let camera = PerspectiveCamera::new(60.0, viewport.aspect(), 1.0, 1000.0)
            .with_position(Vec3::new(3.0, 5.0, 8.0));
        let mut stage = Stage::new(camera, Vec3::ZERO, viewport);

        stage.scene.lines = Some(grid(
            10.0,
            10,
            rgb_from_hex(GRID_CENTER_COLOR),
            rgb_from_hex(GRID_COLOR),
        ));
        let mesh = stage.scene.add_mesh(cuboid(Vec3::ONE));
        let cubes = [
            ("red", RED, Vec3::new(-1.0, 0.5, 0.0)),
            ("blue", BLUE, Vec3::new(1.0, 0.5, 0.0)),
            ("green", GREEN, Vec3::new(0.5, 0.5, 2.0)),
        ]
        .into_iter()
        .map(|(name, color, position)| {
            stage.scene.add_object(
                SceneObject::new(name, mesh, Material::unlit(rgb_from_hex(color))).at(position),
            )
        })
        .collect();

        Self {
            stage,
            cubes,
            drag: DragState::new(),
        }
    }

    pub fn cubes(&self) -> &[ObjectId] {
        &self.cubes
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn controls_enabled(&self) -> bool {
        self.stage.controls.enabled
    }
}

impl Demo for RaycasterDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Raycaster
    }

    fn handle_event(&mut self, event: &InputEvent) {
        self.stage.handle_event(event);
        match *event {
            InputEvent::PointerMoved(_) => {
                let ray = self.stage.pointer_ray();
                self.drag.pointer_move(&ray, &mut self.stage.scene);
            }
            InputEvent::PointerDown(MouseButton::LEFT) => {
                let ray = self.stage.pointer_ray();
                self.drag.pointer_down(
                    &ray,
                    &self.stage.scene,
                    &self.cubes,
                    &mut self.stage.controls,
                );
            }
            InputEvent::PointerUp(_) => self.drag.pointer_up(&mut self.stage.controls),
            _ => {}
        }
    }

    fn update(&mut self, _dt: f32, _input: &InputState) {
        self.stage.update_camera();
    }

    fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    fn camera(&self) -> &PerspectiveCamera {
        &self.stage.camera
    }

    fn status(&self) -> String {
        match self
            .drag
            .dragged()
            .and_then(|id| self.stage.scene.object(id))
        {
            Some(cube) => format!("dragging {}", cube.name),
            None => String::from("drag a cube with the left button"),
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    /// Pixel position of a world point in the demo's viewport.
    fn to_pixels(demo: &RaycasterDemo, point: Vec3) -> Vec2 {
        let ndc = demo.camera().view_proj().project_point3(point);
        let viewport = demo.stage.viewport;
        Vec2::new(
            (ndc.x + 1.0) / 2.0 * viewport.width as f32,
            (1.0 - ndc.y) / 2.0 * viewport.height as f32,
        )
    }

    #[test]
    fn dragging_slides_a_cube_across_the_floor() {
        let mut demo = RaycasterDemo::new(Viewport::default());
        let red = demo.cubes()[0];
        let start = to_pixels(&demo, Vec3::new(-1.0, 1.0, 0.0));
        demo.handle_event(&InputEvent::PointerMoved(start));
        demo.handle_event(&InputEvent::PointerDown(MouseButton::LEFT));
        assert!(demo.is_dragging());
        assert!(!demo.controls_enabled());
        assert_eq!(demo.status(), "dragging red");

        let end = to_pixels(&demo, Vec3::new(-3.0, 1.0, 1.0));
        demo.handle_event(&InputEvent::PointerMoved(end));
        let position = demo.scene().object(red).unwrap().transform.position;
        assert!((position.y - 0.5).abs() < 1e-3, "{position:?}");
        assert!(position.x < -2.5, "{position:?}");

        demo.handle_event(&InputEvent::PointerUp(MouseButton::LEFT));
        assert!(!demo.is_dragging());
        assert!(demo.controls_enabled());
    }

    #[test]
    fn clicking_empty_space_orbits_instead() {
        let mut demo = RaycasterDemo::new(Viewport::default());
        demo.handle_event(&InputEvent::PointerMoved(Vec2::new(5.0, 5.0)));
        demo.handle_event(&InputEvent::PointerDown(MouseButton::LEFT));
        assert!(!demo.is_dragging());
        assert!(demo.controls_enabled());
        demo.handle_event(&InputEvent::PointerMoved(Vec2::new(105.0, 5.0)));
        let before = demo.camera().position;
        demo.update(1.0 / 60.0, &InputState::new());
        assert!((demo.camera().position - before).length() > 0.1);
    }

    #[test]
    fn right_button_never_grabs() {
        let mut demo = RaycasterDemo::new(Viewport::default());
        let start = to_pixels(&demo, Vec3::new(1.0, 1.0, 0.0));
        demo.handle_event(&InputEvent::PointerMoved(start));
        demo.handle_event(&InputEvent::PointerDown(MouseButton::RIGHT));
        assert!(!demo.is_dragging());
    }
}
