//! Scripted input for headless runs.

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;

use crate::demos::{LIGHT_X_MAX, LIGHT_X_MIN, LIGHT_X_STEP, SCROLL_PAGES};
use crate::input::{InputEvent, KeyCode, MouseButton, NamedKey, Viewport};

/// Pointer moves emitted between the two ends of a drag.
const DRAG_STEPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Key pressed and never released.
    Hold(KeyCode),
    /// Key pressed and released.
    Press(KeyCode),
    /// Scrolls the page by a fraction of its scrollable extent.
    Scroll(f32),
    /// Left-button drag between two pixel positions.
    Drag { from: Vec2, to: Vec2 },
    /// Moves the light slider to the step nearest `x`.
    LightX(f32),
}

/// Ordered list of actions expanded into input events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playback {
    actions: Vec<Action>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn events(&self, viewport: Viewport) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for action in &self.actions {
            match *action {
                Action::Hold(key) => events.push(InputEvent::KeyDown(key)),
                Action::Press(key) => {
                    events.push(InputEvent::KeyDown(key));
                    events.push(InputEvent::KeyUp(key));
                }
                Action::Scroll(fraction) => {
                    let extent = viewport.height as f32 * SCROLL_PAGES;
                    events.push(InputEvent::Scroll(fraction * extent));
                }
                Action::Drag { from, to } => {
                    events.push(InputEvent::PointerMoved(from));
                    events.push(InputEvent::PointerDown(MouseButton::LEFT));
                    for step in 1..=DRAG_STEPS {
                        let t = step as f32 / DRAG_STEPS as f32;
                        events.push(InputEvent::PointerMoved(from.lerp(to, t)));
                    }
                    events.push(InputEvent::PointerUp(MouseButton::LEFT));
                }
                Action::LightX(x) => {
                    let home = KeyCode::Named(NamedKey::Home);
                    events.push(InputEvent::KeyDown(home));
                    events.push(InputEvent::KeyUp(home));
                    let x = x.clamp(LIGHT_X_MIN, LIGHT_X_MAX);
                    let steps = ((x - LIGHT_X_MIN) / LIGHT_X_STEP).round() as usize;
                    for _ in 0..steps {
                        events.push(InputEvent::KeyDown(KeyCode::RIGHT));
                        events.push(InputEvent::KeyUp(KeyCode::RIGHT));
                    }
                }
            }
        }
        events
    }
}

pub fn parse_key(name: &str) -> Result<KeyCode> {
    KeyCode::from_name(name).ok_or_else(|| anyhow!("unknown key name: {name}"))
}

/// Parses `x0,y0:x1,y1` pixel coordinates.
pub fn parse_drag(value: &str) -> Result<(Vec2, Vec2)> {
    let (from, to) = value
        .split_once(':')
        .ok_or_else(|| anyhow!("expected x0,y0:x1,y1, got {value}"))?;
    Ok((parse_point(from)?, parse_point(to)?))
}

fn parse_point(value: &str) -> Result<Vec2> {
    let Some((x, y)) = value.split_once(',') else {
        bail!("expected x,y, got {value}");
    };
    let x: f32 = x.trim().parse().with_context(|| format!("invalid x in {value}"))?;
    let y: f32 = y.trim().parse().with_context(|| format!("invalid y in {value}"))?;
    Ok(Vec2::new(x, y))
}
