use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Demo, Stage};
use crate::camera::PerspectiveCamera;
use crate::gallery::{DemoKind, GalleryConfig};
use crate::input::{InputEvent, InputState, Viewport};
use crate::scatter::{phase, Scatter, ScatterPhase, ScrollState};
use crate::scene::{PointCloud, Scene};

const PARTICLES: usize = 500;
const SPREAD: f32 = 3.0;
const MAX_DISTANCE: f32 = 10.0;
const POINT_SIZE: f32 = 0.02;
/// Scrollable distance in viewport heights.
pub const SCROLL_PAGES: f32 = 2.0;

/// Particles that scatter and regroup as the virtual page scrolls.
pub struct LerpDemo {
    stage: Stage,
    scatter: Scatter,
    scroll: ScrollState,
}

impl LerpDemo {
    pub fn new(config: &GalleryConfig) -> Self {
        let viewport = config.viewport;
        let camera = PerspectiveCamera::new(75.0, viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(0.0, 0.0, 5.0));
        let mut stage = Stage::new(camera, Vec3::ZERO, viewport);
        stage.controls.enable_zoom = false;

        let scatter = Scatter::new(
            PARTICLES,
            SPREAD,
            MAX_DISTANCE,
            config.scatter_mode,
            StdRng::seed_from_u64(config.seed),
        );
        stage.scene.points = Some(PointCloud {
            positions: scatter.positions().to_vec(),
            size: POINT_SIZE,
            color: Vec3::ONE,
        });

        let mut demo = Self {
            stage,
            scatter,
            scroll: ScrollState::new(viewport.height as f32 * SCROLL_PAGES),
        };
        demo.apply_scroll();
        demo
    }

    pub fn scatter(&self) -> &Scatter {
        &self.scatter
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    fn apply_scroll(&mut self) {
        self.scatter.apply(self.scroll.fraction());
        if let Some(points) = self.stage.scene.points.as_mut() {
            points.positions.clear();
            points.positions.extend_from_slice(self.scatter.positions());
        }
    }

    /// Average distance of the particles from where they started.
    pub fn mean_displacement(&self) -> f32 {
        if self.scatter.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .scatter
            .positions()
            .iter()
            .zip(self.scatter.origins())
            .map(|(position, origin)| position.distance(*origin))
            .sum();
        total / self.scatter.len() as f32
    }
}

impl Demo for LerpDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Lerp
    }

    fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::Scroll(delta) = *event {
            self.scroll.scroll_by(delta);
            self.apply_scroll();
        }
        self.stage.handle_event(event);
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
        let fraction = self.scroll.fraction();
        let direction = match phase(fraction).0 {
            ScatterPhase::Outward => "outward",
            ScatterPhase::Return => "return",
        };
        format!(
            "scroll {:.2}% ({direction}) | mean displacement {:.2}",
            fraction * 100.0,
            self.mean_displacement()
        )
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stage.resize(viewport);
        self.scroll.set_extent(viewport.height as f32 * SCROLL_PAGES);
        self.apply_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatter::ScatterMode;

    fn demo() -> LerpDemo {
        LerpDemo::new(&GalleryConfig::default())
    }

    #[test]
    fn mounts_at_the_origins() {
        let demo = demo();
        assert_eq!(demo.scatter().len(), PARTICLES);
        assert_eq!(demo.mean_displacement(), 0.0);
        let points = demo.scene().points.as_ref().unwrap();
        assert_eq!(points.positions.len(), PARTICLES);
        assert_eq!(points.size, POINT_SIZE);
    }

    #[test]
    fn scrolling_to_the_middle_scatters_and_to_the_end_regroups() {
        let mut demo = demo();
        let extent = demo.scroll().extent();
        demo.handle_event(&InputEvent::Scroll(extent / 2.0));
        assert!(demo.mean_displacement() > 1.0);
        assert!(demo.status().starts_with("scroll 50.00% (return)"));
        let points = demo.scene().points.as_ref().unwrap();
        assert_eq!(points.positions.as_slice(), demo.scatter().positions());

        demo.handle_event(&InputEvent::Scroll(extent));
        assert_eq!(demo.mean_displacement(), 0.0);
    }

    #[test]
    fn wheel_never_zooms_the_camera() {
        let mut demo = demo();
        let before = demo.camera().position;
        demo.handle_event(&InputEvent::Scroll(-500.0));
        demo.update(1.0 / 60.0, &InputState::new());
        assert!((demo.camera().position - before).length() < 1e-4);
    }

    #[test]
    fn same_seed_gives_same_cloud() {
        let config = GalleryConfig {
            seed: 42,
            scatter_mode: ScatterMode::Fixed,
            ..GalleryConfig::default()
        };
        let a = LerpDemo::new(&config);
        let b = LerpDemo::new(&config);
        assert_eq!(a.scatter().origins(), b.scatter().origins());
    }
}
