use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use super::{Demo, Stage};
use crate::camera::PerspectiveCamera;
use crate::gallery::DemoKind;
use crate::input::{InputEvent, InputState, KeyCode, NamedKey, Viewport};
use crate::mesh::{plane, sphere};
use crate::panel::{Control, Folder, PropertyPanel, Slider};
use crate::physics::{BallDesc, BodyId, PhysicsWorld};
use crate::scene::{
    rgb_from_hex, Light, Material, ObjectId, Scene, SceneObject, Transform, LIME, RED, WHITE,
};

const GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);
const FIXED_STEP: f32 = 1.0 / 60.0;
const MAX_SUBSTEPS: u32 = 3;
const ROLL_SPEED: f32 = 2.0;
const BALL_RADIUS: f32 = 0.5;

const SPHERE_FOLDER: &str = "Sphere";
const FLOOR_FOLDER: &str = "Floor";
const AXES: [&str; 3] = ["Position X", "Position Y", "Position Z"];

/// A ball dropped onto a floor and pushed around with the arrow keys.
pub struct CannonDemo {
    stage: Stage,
    world: PhysicsWorld,
    body: BodyId,
    ball: ObjectId,
    floor: ObjectId,
    panel: PropertyPanel,
    /// Modifier state seen through `handle_event`, for Shift+Tab.
    keys: InputState,
}

impl CannonDemo {
    pub fn new(viewport: Viewport) -> Self {
        let camera = PerspectiveCamera::new(75.0, viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(0.0, 5.0, 10.0));
        let mut stage = Stage::new(camera, Vec3::ZERO, viewport);

        let mut world = PhysicsWorld::new(GRAVITY);
        world.add_floor(1.0, 0.5);
        let start = Vec3::new(0.0, 3.0, 0.0);
        let body = world.add_ball(BallDesc {
            radius: BALL_RADIUS,
            mass: 1.0,
            position: start,
            linear_damping: 0.7,
            friction: 1.0,
            restitution: 0.5,
        });

        let ball_mesh = stage.scene.add_mesh(sphere(BALL_RADIUS, 32, 32));
        let ball = stage.scene.add_object(
            SceneObject::new("ball", ball_mesh, Material::lit(rgb_from_hex(RED))).at(start),
        );
        let floor_mesh = stage.scene.add_mesh(plane(10.0, 10.0));
        let floor = stage.scene.add_object(
            SceneObject::new("floor", floor_mesh, Material::lit(rgb_from_hex(LIME))).with_transform(
                Transform {
                    rotation: Quat::from_rotation_x(-FRAC_PI_2),
                    ..Transform::default()
                },
            ),
        );
        stage.scene.lights.push(Light::directional(
            WHITE,
            1.0,
            Vec3::new(5.0, 5.0, 5.0).normalize(),
        ));

        let position = |value: f32| Slider::new(-10.0, 10.0, 0.0, value);
        let panel = PropertyPanel::new(vec![
            Folder::new(
                SPHERE_FOLDER,
                vec![
                    Control::number(AXES[0], position(start.x)),
                    Control::number(AXES[1], position(start.y)),
                    Control::number(AXES[2], position(start.z)),
                    Control::color("Color", RED),
                ],
            ),
            Folder::new(FLOOR_FOLDER, vec![Control::color("Color", LIME)]),
        ]);

        Self {
            stage,
            world,
            body,
            ball,
            floor,
            panel,
            keys: InputState::new(),
        }
    }

    pub fn ball_position(&self) -> Vec3 {
        self.world.position(self.body).unwrap_or_default()
    }

    pub fn panel(&self) -> &PropertyPanel {
        &self.panel
    }

    fn adjust_selected(&mut self, direction: i32) {
        let Some((folder, label)) = self.panel.adjust(direction) else {
            return;
        };
        if folder == SPHERE_FOLDER && AXES.contains(&label.as_str()) {
            let mut position = self.ball_position();
            let values: Vec<f32> = AXES
                .iter()
                .map(|axis| self.panel.get_number(SPHERE_FOLDER, axis).unwrap_or_default())
                .collect();
            position.x = values[0];
            position.y = values[1];
            position.z = values[2];
            self.world.set_position(self.body, position);
            log::debug!("ball moved to {position:?} from the panel");
            return;
        }
        let Some(color) = self.panel.get_color(&folder, &label) else {
            return;
        };
        let target = if folder == SPHERE_FOLDER { self.ball } else { self.floor };
        if let Some(object) = self.stage.scene.object_mut(target) {
            object.material.color = color;
        }
    }

    fn sync_ball(&mut self) {
        let position = self.ball_position();
        let rotation = self.world.rotation(self.body).unwrap_or_default();
        if let Some(ball) = self.stage.scene.object_mut(self.ball) {
            ball.transform.position = position;
            ball.transform.rotation = rotation;
        }
        for (axis, value) in AXES.iter().zip(position.to_array()) {
            self.panel.set_number(SPHERE_FOLDER, axis, value);
        }
    }
}

/// Horizontal velocity requested by the held arrow keys, if any.
fn steering(input: &InputState) -> Option<Vec3> {
    let axis = |positive: KeyCode, negative: KeyCode| {
        (input.is_key_down(positive) as i32 - input.is_key_down(negative) as i32) as f32
    };
    let direction = Vec3::new(
        axis(KeyCode::RIGHT, KeyCode::LEFT),
        0.0,
        axis(KeyCode::DOWN, KeyCode::UP),
    ) * ROLL_SPEED;
    (direction.length_squared() > 0.0).then_some(direction)
}

impl Demo for CannonDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Cannon
    }

    fn handle_event(&mut self, event: &InputEvent) {
        self.keys.apply(event);
        match *event {
            InputEvent::KeyDown(KeyCode::Named(NamedKey::Tab)) => {
                if self.keys.is_shift_down() {
                    self.panel.select_previous();
                } else {
                    self.panel.select_next();
                }
            }
            InputEvent::KeyDown(KeyCode::Named(NamedKey::Plus)) => self.adjust_selected(1),
            InputEvent::KeyDown(KeyCode::Named(NamedKey::Minus)) => self.adjust_selected(-1),
            _ => {}
        }
        self.stage.handle_event(event);
    }

    fn update(&mut self, dt: f32, input: &InputState) {
        if let Some(direction) = steering(input) {
            let vertical = self.world.velocity(self.body).unwrap_or_default().y;
            self.world
                .set_velocity(self.body, Vec3::new(direction.x, vertical, direction.z));
        }
        self.world.step(FIXED_STEP, dt, MAX_SUBSTEPS);
        self.sync_ball();
        self.stage.update_camera();
    }

    fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    fn camera(&self) -> &PerspectiveCamera {
        &self.stage.camera
    }

    fn status(&self) -> String {
        let position = self.ball_position();
        format!(
            "ball ({:.2}, {:.2}, {:.2}) | panel {}",
            position.x,
            position.y,
            position.z,
            self.panel.describe_selected()
        )
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
    }
}
