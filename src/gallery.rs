//! The menu: exactly one demo is mounted at a time.

use std::fmt;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::demos::{self, Demo};
use crate::input::{InputEvent, InputState, KeyCode, Viewport};
use crate::scatter::ScatterMode;

pub const DEFAULT_MODEL_PATH: &str = "assets/building/scene.gltf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    Transfer,
    Cannon,
    Lerp,
    Raycaster,
    Loader,
}

impl DemoKind {
    /// Menu order; entry `n` is bound to digit key `n + 1`.
    pub const ALL: [DemoKind; 5] = [
        DemoKind::Transfer,
        DemoKind::Cannon,
        DemoKind::Lerp,
        DemoKind::Raycaster,
        DemoKind::Loader,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Transfer => "transfer",
            DemoKind::Cannon => "cannon",
            DemoKind::Lerp => "lerp",
            DemoKind::Raycaster => "raycaster",
            DemoKind::Loader => "loader",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        let index = usize::from(digit).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn digit(self) -> u8 {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .map_or(0, |index| index as u8 + 1)
    }

    pub fn description(self) -> &'static str {
        match self {
            DemoKind::Transfer => "sphere that rotates and moves on demand",
            DemoKind::Cannon => "physics ball steered with the arrow keys",
            DemoKind::Lerp => "particles that scatter as the page scrolls",
            DemoKind::Raycaster => "drag cubes across the floor",
            DemoKind::Loader => "model viewer with a movable key light",
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    pub seed: u64,
    pub model_path: PathBuf,
    pub scatter_mode: ScatterMode,
    pub viewport: Viewport,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scatter_mode: ScatterMode::Fixed,
            viewport: Viewport::default(),
        }
    }
}

pub struct Gallery {
    config: GalleryConfig,
    active: Box<dyn Demo>,
    mounts: usize,
}

impl Gallery {
    pub fn new(kind: DemoKind, config: GalleryConfig) -> Self {
        info!("mounting {kind}");
        let active = demos::mount(kind, &config);
        Self {
            config,
            active,
            mounts: 1,
        }
    }

    pub fn kind(&self) -> DemoKind {
        self.active.kind()
    }

    pub fn active(&self) -> &dyn Demo {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> &mut dyn Demo {
        self.active.as_mut()
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// Number of demos mounted since the gallery was created.
    pub fn mounts(&self) -> usize {
        self.mounts
    }

    /// Switches to `kind`, unmounting the current demo first. Selecting the
    /// active entry does nothing and returns `false`.
    pub fn select(&mut self, kind: DemoKind) -> bool {
        if kind == self.kind() {
            return false;
        }
        info!("switching {} -> {kind}", self.kind());
        self.active.unmount();
        self.active = demos::mount(kind, &self.config);
        self.mounts += 1;
        true
    }

    /// Routes an event: digit keys drive the menu, resizes reach the active
    /// demo's camera, everything else goes to the demo. Returns `true` when
    /// the active demo changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::KeyDown(KeyCode::Digit(digit)) => match DemoKind::from_digit(digit) {
                Some(kind) => self.select(kind),
                None => {
                    log::warn!("no menu entry bound to {digit}");
                    false
                }
            },
            InputEvent::Resized { width, height } => {
                let viewport = Viewport::new(width.max(1), height.max(1));
                self.config.viewport = viewport;
                self.active.resize(viewport);
                false
            }
            _ => {
                self.active.handle_event(event);
                false
            }
        }
    }

    pub fn update(&mut self, dt: f32, input: &InputState) {
        self.active.update(dt, input);
    }

    pub fn wait_for_assets(&mut self) {
        self.active.wait_for_assets();
    }

    /// Window title listing the menu with the active entry bracketed.
    pub fn title(&self) -> String {
        let menu: Vec<String> = DemoKind::ALL
            .iter()
            .map(|kind| {
                if *kind == self.kind() {
                    format!("[{} {}]", kind.digit(), kind)
                } else {
                    format!("{} {}", kind.digit(), kind)
                }
            })
            .collect();
        format!("{} | {}", menu.join("  "), self.active.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery(kind: DemoKind) -> Gallery {
        Gallery::new(kind, GalleryConfig::default())
    }

    #[test]
    fn names_digits_and_order_agree() {
        for (index, kind) in DemoKind::ALL.into_iter().enumerate() {
            assert_eq!(DemoKind::from_name(kind.name()), Some(kind));
            assert_eq!(DemoKind::from_digit(index as u8 + 1), Some(kind));
            assert_eq!(usize::from(kind.digit()), index + 1);
        }
        assert_eq!(DemoKind::from_name("Cannon"), Some(DemoKind::Cannon));
        assert_eq!(DemoKind::from_name("menu"), None);
        assert_eq!(DemoKind::from_digit(0), None);
        assert_eq!(DemoKind::from_digit(6), None);
    }

    #[test]
    fn select_swaps_exactly_one_demo() {
        let mut gallery = gallery(DemoKind::Transfer);
        assert_eq!(gallery.mounts(), 1);
        assert!(gallery.select(DemoKind::Cannon));
        assert_eq!(gallery.kind(), DemoKind::Cannon);
        assert_eq!(gallery.active().kind(), DemoKind::Cannon);
        assert_eq!(gallery.mounts(), 2);
        assert!(gallery.active().scene().find("sphere").is_none());
        assert!(gallery.active().scene().find("ball").is_some());
    }

    #[test]
    fn reselecting_the_active_demo_keeps_its_state() {
        let mut gallery = gallery(DemoKind::Transfer);
        let mut input = InputState::new();
        let toggle = InputEvent::KeyDown(KeyCode::Character('M'));
        input.apply(&toggle);
        gallery.handle_event(&toggle);
        gallery.update(1.0 / 60.0, &input);
        assert!(!gallery.select(DemoKind::Transfer));
        assert_eq!(gallery.mounts(), 1);
        assert!(gallery.active().status().contains("move on"));
    }

    #[test]
    fn digit_keys_drive_the_menu() {
        let mut gallery = gallery(DemoKind::Transfer);
        assert!(gallery.handle_event(&InputEvent::KeyDown(KeyCode::Digit(4))));
        assert_eq!(gallery.kind(), DemoKind::Raycaster);
        assert!(!gallery.handle_event(&InputEvent::KeyDown(KeyCode::Digit(4))));
        assert!(!gallery.handle_event(&InputEvent::KeyDown(KeyCode::Digit(9))));
        assert_eq!(gallery.kind(), DemoKind::Raycaster);
        assert!(gallery.title().contains("[4 raycaster]"));
    }

    #[test]
    fn resize_reaches_new_demos() {
        let mut gallery = gallery(DemoKind::Transfer);
        gallery.handle_event(&InputEvent::Resized {
            width: 400,
            height: 400,
        });
        gallery.select(DemoKind::Lerp);
        assert_eq!(gallery.config().viewport, Viewport::new(400, 400));
        assert!((gallery.active().camera().aspect - 1.0).abs() < 1e-6);
    }
}
