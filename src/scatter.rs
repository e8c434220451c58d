//! Scroll-driven particle displacement.
//!
//! Scrolling from the top of the virtual page to its middle pushes every
//! particle out towards a displaced target; scrolling on to the bottom brings
//! it back to where it started.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Virtual page scroll position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    offset: f32,
    extent: f32,
}

impl ScrollState {
    pub fn new(extent: f32) -> Self {
        Self {
            offset: 0.0,
            extent: extent.max(0.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.offset = (self.offset + delta).clamp(0.0, self.extent);
    }

    pub fn set_fraction(&mut self, fraction: f32) {
        self.offset = fraction.clamp(0.0, 1.0) * self.extent;
    }

    /// Changes the scrollable extent, keeping the relative position.
    pub fn set_extent(&mut self, extent: f32) {
        let fraction = self.raw_fraction();
        self.extent = extent.max(0.0);
        self.offset = fraction * self.extent;
    }

    fn raw_fraction(&self) -> f32 {
        if self.extent <= 0.0 {
            0.0
        } else {
            self.offset / self.extent
        }
    }

    /// Scrolled fraction in `[0, 1]`, quantized to hundredths of a percent.
    pub fn fraction(&self) -> f32 {
        let percent = (self.raw_fraction() * 100.0 * 100.0).round() / 100.0;
        percent / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScatterPhase {
    Outward,
    Return,
}

/// Splits a scroll fraction into its phase and the progress within it.
pub fn phase(s: f32) -> (ScatterPhase, f32) {
    if s < 0.5 {
        (ScatterPhase::Outward, s / 0.5)
    } else {
        (ScatterPhase::Return, (s - 0.5) / 0.5)
    }
}

/// How far towards its displaced target a particle sits at scroll `s`.
pub fn displacement_weight(s: f32) -> f32 {
    match phase(s) {
        (ScatterPhase::Outward, t) => t,
        (ScatterPhase::Return, t) => 1.0 - t,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScatterMode {
    /// Offsets are rolled once when the effect is created.
    #[default]
    Fixed,
    /// Offsets are rolled again on every update, so particles jitter.
    Reroll,
}

pub struct Scatter {
    origins: Vec<Vec3>,
    offsets: Vec<Vec3>,
    animated: Vec<Vec3>,
    distance: f32,
    mode: ScatterMode,
    rng: StdRng,
}

impl Scatter {
    /// Places `count` particles uniformly in a cube of side `spread` around
    /// the origin and rolls their displacement offsets.
    pub fn new(
        count: usize,
        spread: f32,
        distance: f32,
        mode: ScatterMode,
        mut rng: StdRng,
    ) -> Self {
        let origins: Vec<Vec3> = (0..count)
            .map(|_| {
                Vec3::new(
                    (rng.random::<f32>() - 0.5) * spread,
                    (rng.random::<f32>() - 0.5) * spread,
                    (rng.random::<f32>() - 0.5) * spread,
                )
            })
            .collect();
        let mut scatter = Self {
            animated: origins.clone(),
            offsets: vec![Vec3::ZERO; count],
            origins,
            distance,
            mode,
            rng,
        };
        scatter.roll_offsets();
        scatter
    }

    fn roll_offsets(&mut self) {
        let distance = self.distance;
        let rng = &mut self.rng;
        let mut axis = || {
            let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            rng.random::<f32>() * distance * sign
        };
        for offset in &mut self.offsets {
            *offset = Vec3::new(axis(), axis(), axis());
        }
    }

    /// Recomputes every animated position for scroll fraction `s`.
    pub fn apply(&mut self, s: f32) {
        if self.mode == ScatterMode::Reroll {
            self.roll_offsets();
        }
        let weight = displacement_weight(s);
        for ((animated, origin), offset) in self
            .animated
            .iter_mut()
            .zip(&self.origins)
            .zip(&self.offsets)
        {
            *animated = origin.lerp(*origin + *offset, weight);
        }
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn mode(&self) -> ScatterMode {
        self.mode
    }

    pub fn origins(&self) -> &[Vec3] {
        &self.origins
    }

    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.animated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn scatter(mode: ScatterMode) -> Scatter {
        Scatter::new(500, 3.0, 10.0, mode, StdRng::seed_from_u64(7))
    }

    #[test]
    fn weight_peaks_halfway() {
        assert_eq!(displacement_weight(0.0), 0.0);
        assert_eq!(displacement_weight(0.25), 0.5);
        assert_eq!(displacement_weight(0.5), 1.0);
        assert_eq!(displacement_weight(1.0), 0.0);
        assert_eq!(phase(1.0), (ScatterPhase::Return, 1.0));
        assert_eq!(phase(0.25), (ScatterPhase::Outward, 0.5));
    }

    #[test]
    fn particles_start_and_end_at_their_origins() {
        let mut scatter = scatter(ScatterMode::Fixed);
        scatter.apply(0.0);
        assert_eq!(scatter.positions(), scatter.origins());
        scatter.apply(0.5);
        assert_ne!(scatter.positions(), scatter.origins());
        scatter.apply(1.0);
        assert_eq!(scatter.positions(), scatter.origins());
    }

    #[test]
    fn halfway_positions_sit_on_displaced_targets() {
        let mut scatter = scatter(ScatterMode::Fixed);
        scatter.apply(0.5);
        for ((position, origin), offset) in scatter
            .positions()
            .iter()
            .zip(scatter.origins())
            .zip(scatter.offsets())
        {
            assert!((*position - (*origin + *offset)).length() < 1e-5);
        }
    }

    #[test]
    fn origins_and_offsets_respect_their_bounds() {
        let scatter = scatter(ScatterMode::Fixed);
        assert_eq!(scatter.len(), 500);
        assert!(scatter
            .origins()
            .iter()
            .all(|origin| origin.abs().max_element() <= 1.5));
        assert!(scatter
            .offsets()
            .iter()
            .all(|offset| offset.abs().max_element() <= 10.0));
    }

    #[test]
    fn fixed_mode_is_deterministic_and_reroll_is_not() {
        let mut fixed = scatter(ScatterMode::Fixed);
        fixed.apply(0.3);
        let first = fixed.positions().to_vec();
        fixed.apply(0.3);
        assert_eq!(fixed.positions(), first.as_slice());

        let mut reroll = scatter(ScatterMode::Reroll);
        reroll.apply(0.3);
        let first = reroll.positions().to_vec();
        reroll.apply(0.3);
        assert_ne!(reroll.positions(), first.as_slice());
    }

    #[test]
    fn scroll_state_clamps_and_rounds() {
        let mut scroll = ScrollState::new(1440.0);
        scroll.scroll_by(-50.0);
        assert_eq!(scroll.fraction(), 0.0);
        scroll.scroll_by(1.0);
        assert!((scroll.fraction() - 0.0007).abs() < 1e-6);
        scroll.scroll_by(10_000.0);
        assert_eq!(scroll.fraction(), 1.0);
        scroll.set_fraction(0.5);
        assert_eq!(scroll.fraction(), 0.5);
        scroll.set_extent(720.0);
        assert_eq!(scroll.offset(), 360.0);
        assert_eq!(ScrollState::new(0.0).fraction(), 0.0);
    }
}
