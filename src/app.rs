//! Headless driver and the end-of-run summary.

use glam::Vec3;
use serde::Serialize;

use crate::gallery::{DemoKind, Gallery};
use crate::input::InputState;
use crate::playback::Playback;
use crate::scene::{rgb_to_hex, Light, Scene};

/// Fixed simulation step used for headless frames.
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// Feeds the playback script to the gallery, waits for the active demo's
/// assets, then simulates `frames` fixed steps.
pub fn run_headless(gallery: &mut Gallery, playback: &Playback, frames: u32) -> Summary {
    let mut input = InputState::new();
    for event in playback.events(gallery.config().viewport) {
        input.apply(&event);
        if gallery.handle_event(&event) {
            input.release_all();
        }
    }
    gallery.wait_for_assets();
    for _ in 0..frames {
        gallery.update(FRAME_DT, &input);
    }
    Summary::capture(gallery, frames)
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub demo: DemoKind,
    pub frames: u32,
    pub status: String,
    pub objects: Vec<ObjectSummary>,
    pub lights: Vec<Light>,
    pub points: usize,
}

impl Summary {
    pub fn capture(gallery: &Gallery, frames: u32) -> Self {
        let demo = gallery.active();
        let scene = demo.scene();
        Self {
            demo: demo.kind(),
            frames,
            status: demo.status(),
            objects: object_summaries(scene),
            lights: scene.lights.clone(),
            points: scene.points.as_ref().map_or(0, |points| points.positions.len()),
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectSummary> {
        self.objects.iter().find(|object| object.name == name)
    }
}

fn object_summaries(scene: &Scene) -> Vec<ObjectSummary> {
    scene
        .objects()
        .iter()
        .map(|object| ObjectSummary {
            name: object.name.clone(),
            position: object.transform.position,
            rotation: object.transform.euler(),
            color: format!("#{:06x}", rgb_to_hex(object.material.color)),
        })
        .collect()
}

pub fn print_summary(summary: &Summary) {
    println!("Demo: {} ({} frames)", summary.demo, summary.frames);
    println!("Status: {}", summary.status);
    println!("Final object states:");
    for object in &summary.objects {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) color={}",
            object.name,
            object.position.x,
            object.position.y,
            object.position.z,
            object.rotation.x,
            object.rotation.y,
            object.rotation.z,
            object.color
        );
    }
    println!("Lights: {}, points: {}", summary.lights.len(), summary.points);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::GalleryConfig;
    use crate::input::KeyCode;
    use crate::playback::Action;

    #[test]
    fn held_arrow_pushes_the_ball() {
        let mut gallery = Gallery::new(DemoKind::Cannon, GalleryConfig::default());
        let mut playback = Playback::new();
        playback.push(Action::Hold(KeyCode::RIGHT));
        let summary = run_headless(&mut gallery, &playback, 120);
        let ball = summary.object("ball").unwrap();
        assert!(ball.position.x > 1.0, "{:?}", ball.position);
        assert_eq!(ball.color, "#ff0000");
    }

    #[test]
    fn switching_demos_drops_held_keys() {
        let mut gallery = Gallery::new(DemoKind::Cannon, GalleryConfig::default());
        let mut playback = Playback::new();
        playback.push(Action::Hold(KeyCode::RIGHT));
        playback.push(Action::Press(KeyCode::Digit(1)));
        playback.push(Action::Press(KeyCode::Digit(2)));
        let summary = run_headless(&mut gallery, &playback, 60);
        assert_eq!(summary.demo, DemoKind::Cannon);
        assert!(summary.object("ball").unwrap().position.x.abs() < 1e-3);
    }

    #[test]
    fn transfer_toggles_accumulate_per_frame() {
        let mut gallery = Gallery::new(DemoKind::Transfer, GalleryConfig::default());
        let mut playback = Playback::new();
        playback.push(Action::Press(KeyCode::Character('M')));
        let summary = run_headless(&mut gallery, &playback, 10);
        let sphere = summary.object("sphere").unwrap();
        assert!((sphere.position - Vec3::splat(1.0)).length() < 1e-3);
        assert_eq!(sphere.rotation, Vec3::ZERO);
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut gallery = Gallery::new(DemoKind::Lerp, GalleryConfig::default());
        let summary = run_headless(&mut gallery, &Playback::new(), 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["demo"], "lerp");
        assert_eq!(json["points"], 500);
    }
}
