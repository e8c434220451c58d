//! Orbit camera controls.
//!
//! Primary-button drags orbit the camera around `target`, secondary-button
//! drags pan, and the scroll wheel dollies in and out. Deltas are collected
//! from input events and applied to the camera on [`OrbitControls::update`],
//! once per frame.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::input::{InputEvent, MouseButton, Viewport};

const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Rotate,
    Pan,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    gesture: Option<Gesture>,
    last_pointer: Option<Vec2>,
    viewport: Viewport,
    azimuth_delta: f32,
    polar_delta: f32,
    scale: f32,
    pan_delta: Vec2,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            gesture: None,
            last_pointer: None,
            viewport: Viewport::default(),
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            scale: 1.0,
            pan_delta: Vec2::ZERO,
        }
    }

    /// Enables or disables the controls, dropping any gesture in progress.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.gesture = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn handle_event(&mut self, event: &InputEvent, viewport: Viewport) {
        self.viewport = viewport;
        if let InputEvent::PointerMoved(position) = *event {
            let previous = self.last_pointer.replace(position);
            if !self.enabled {
                return;
            }
            if let (Some(gesture), Some(previous)) = (self.gesture, previous) {
                self.drag(gesture, position - previous);
            }
            return;
        }
        if !self.enabled {
            return;
        }
        match *event {
            InputEvent::PointerDown(button) => {
                self.gesture = match button {
                    MouseButton::LEFT if self.enable_rotate => Some(Gesture::Rotate),
                    MouseButton::RIGHT | MouseButton::MIDDLE if self.enable_pan => {
                        Some(Gesture::Pan)
                    }
                    _ => None,
                };
            }
            InputEvent::PointerUp(_) => self.gesture = None,
            InputEvent::Scroll(delta) if self.enable_zoom => {
                let step = 0.95_f32.powf(self.zoom_speed);
                if delta > 0.0 {
                    self.scale /= step;
                } else if delta < 0.0 {
                    self.scale *= step;
                }
            }
            _ => {}
        }
    }

    fn drag(&mut self, gesture: Gesture, delta: Vec2) {
        let height = self.viewport.height.max(1) as f32;
        match gesture {
            Gesture::Rotate => {
                self.azimuth_delta -= 2.0 * PI * delta.x / height * self.rotate_speed;
                self.polar_delta -= 2.0 * PI * delta.y / height * self.rotate_speed;
            }
            Gesture::Pan => {
                self.pan_delta += delta * self.pan_speed;
            }
        }
    }

    /// Applies the accumulated deltas and re-aims the camera at the target.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let mut radius = offset.length().max(f32::EPSILON);
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.azimuth_delta;
        polar = (polar + self.polar_delta).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.scale)
            .clamp(self.min_distance.max(f32::EPSILON), self.max_distance);

        if self.pan_delta != Vec2::ZERO {
            // One pixel of pan moves the target by one pixel's worth of
            // world space at the target distance.
            let height = self.viewport.height.max(1) as f32;
            let world_per_pixel =
                2.0 * radius * (camera.fov_y_degrees.to_radians() / 2.0).tan() / height;
            let right = camera.right();
            let up = camera.up_vector();
            self.target += (-right * self.pan_delta.x + up * self.pan_delta.y) * world_per_pixel;
        }

        let sin_polar = polar.sin();
        let offset = Vec3::new(
            radius * sin_polar * azimuth.sin(),
            radius * polar.cos(),
            radius * sin_polar * azimuth.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        self.azimuth_delta = 0.0;
        self.polar_delta = 0.0;
        self.scale = 1.0;
        self.pan_delta = Vec2::ZERO;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(0.0, 0.0, 5.0))
    }

    #[test]
    fn update_without_input_keeps_camera() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.update(&mut camera);
        assert!((camera.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn horizontal_drag_orbits_at_constant_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let viewport = Viewport::new(800, 600);
        controls.handle_event(&InputEvent::PointerMoved(Vec2::new(100.0, 100.0)), viewport);
        controls.handle_event(&InputEvent::PointerDown(MouseButton::LEFT), viewport);
        controls.handle_event(&InputEvent::PointerMoved(Vec2::new(250.0, 100.0)), viewport);
        controls.update(&mut camera);
        assert!((camera.position.length() - 5.0).abs() < 1e-3);
        assert!(camera.position.x.abs() > 0.1);
        assert!(camera.position.y.abs() < 1e-3);
    }

    #[test]
    fn disabled_controls_ignore_drags() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let viewport = Viewport::new(800, 600);
        controls.handle_event(&InputEvent::PointerDown(MouseButton::LEFT), viewport);
        controls.set_enabled(false);
        controls.handle_event(&InputEvent::PointerMoved(Vec2::new(0.0, 0.0)), viewport);
        controls.handle_event(&InputEvent::PointerMoved(Vec2::new(300.0, 0.0)), viewport);
        controls.update(&mut camera);
        assert!((camera.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
        assert!(!controls.is_active());
    }

    #[test]
    fn scroll_zooms_unless_zoom_is_disabled() {
        let viewport = Viewport::new(800, 600);
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.handle_event(&InputEvent::Scroll(-100.0), viewport);
        controls.update(&mut camera);
        assert!(camera.position.z < 5.0);

        let mut camera = self::camera();
        controls.enable_zoom = false;
        controls.handle_event(&InputEvent::Scroll(-100.0), viewport);
        controls.update(&mut camera);
        assert!((camera.position.z - 5.0).abs() < 1e-4);
    }
}
