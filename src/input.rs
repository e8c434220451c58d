use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    pub const LEFT: Self = Self::Named(NamedKey::Left);
    pub const RIGHT: Self = Self::Named(NamedKey::Right);
    pub const UP: Self = Self::Named(NamedKey::Up);
    pub const DOWN: Self = Self::Named(NamedKey::Down);

    /// Parses names such as `Right`, `r`, `3` or `F5`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if ch.is_ascii_digit() {
                return Some(Self::Digit(ch as u8 - b'0'));
            }
            return match ch {
                '=' | '+' => Some(Self::Named(NamedKey::Plus)),
                '-' => Some(Self::Named(NamedKey::Minus)),
                _ => None,
            };
        }
        if let Some(function) = name.strip_prefix('F').or_else(|| name.strip_prefix('f')) {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=25).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "Home" => Home,
        "End" => End,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "Plus" | "Equal" => Plus,
        "Minus" => Minus,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-character keys the demos react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
    LeftShift,
    RightShift,
    Plus,
    Minus,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const MIDDLE: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Window events translated into the crate's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Pointer position in physical pixels, origin at the top-left corner.
    PointerMoved(Vec2),
    PointerDown(MouseButton),
    PointerUp(MouseButton),
    /// Scroll distance in pixels, positive scrolls the page down.
    Scroll(f32),
    Resized { width: u32, height: u32 },
}

/// Size of the drawing surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Converts a pixel position to normalized device coordinates.
    pub fn to_ndc(self, position: Vec2) -> Vec2 {
        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;
        Vec2::new(
            (position.x / width) * 2.0 - 1.0,
            -(position.y / height) * 2.0 + 1.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Snapshot of which keys and buttons are held, plus the pointer position.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    pointer: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => {
                self.keys.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.keys.remove(&key);
            }
            InputEvent::PointerMoved(position) => self.pointer = position,
            InputEvent::PointerDown(button) => {
                self.mouse_buttons.insert(button);
            }
            InputEvent::PointerUp(button) => {
                self.mouse_buttons.remove(&button);
            }
            InputEvent::Scroll(_) | InputEvent::Resized { .. } => {}
        }
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    pub fn is_shift_down(&self) -> bool {
        self.is_key_down(KeyCode::Named(NamedKey::LeftShift))
            || self.is_key_down(KeyCode::Named(NamedKey::RightShift))
    }

    pub fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    /// Forgets held keys and buttons, used when the active demo changes.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.mouse_buttons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(KeyCode::from_name("Right"), Some(KeyCode::RIGHT));
        assert_eq!(KeyCode::from_name("ArrowUp"), Some(KeyCode::UP));
        assert_eq!(KeyCode::from_name("r"), Some(KeyCode::Character('R')));
        assert_eq!(KeyCode::from_name("3"), Some(KeyCode::Digit(3)));
        assert_eq!(KeyCode::from_name("F12"), Some(KeyCode::Function(12)));
        assert_eq!(
            KeyCode::from_name("="),
            Some(KeyCode::Named(NamedKey::Plus))
        );
        assert_eq!(KeyCode::from_name("Hyper"), None);
    }

    #[test]
    fn input_state_tracks_keys_and_pointer() {
        let mut state = InputState::new();
        state.apply(&InputEvent::KeyDown(KeyCode::LEFT));
        state.apply(&InputEvent::PointerMoved(Vec2::new(10.0, 20.0)));
        state.apply(&InputEvent::PointerDown(MouseButton::LEFT));
        assert!(state.is_key_down(KeyCode::LEFT));
        assert!(state.is_mouse_button_down(MouseButton::LEFT));
        assert_eq!(state.pointer_position(), Vec2::new(10.0, 20.0));

        state.apply(&InputEvent::KeyUp(KeyCode::LEFT));
        state.apply(&InputEvent::PointerUp(MouseButton::LEFT));
        assert!(!state.is_key_down(KeyCode::LEFT));
        assert!(!state.is_mouse_button_down(MouseButton::LEFT));
    }

    #[test]
    fn viewport_maps_corners_to_ndc() {
        let viewport = Viewport::new(200, 100);
        assert_eq!(viewport.to_ndc(Vec2::ZERO), Vec2::new(-1.0, 1.0));
        assert_eq!(viewport.to_ndc(Vec2::new(200.0, 100.0)), Vec2::new(1.0, -1.0));
        assert_eq!(viewport.to_ndc(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert!((viewport.aspect() - 2.0).abs() < f32::EPSILON);
    }
}
