//! Keyboard-driven stand-ins for the on-screen widgets: a numeric slider and
//! a small property panel of named folders.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::rgb_from_hex;

/// Bounded numeric value that moves in fixed steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    value: f32,
}

impl Slider {
    pub fn new(min: f32, max: f32, step: f32, value: f32) -> Self {
        let mut slider = Self {
            min: min.min(max),
            max: max.max(min),
            step: step.abs(),
            value: min,
        };
        slider.set(value);
        slider
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Clamps `value` to the range and snaps it to the step grid.
    pub fn set(&mut self, value: f32) -> f32 {
        let mut value = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let steps = ((value - self.min) / self.step).round();
            value = (self.min + steps * self.step).clamp(self.min, self.max);
        }
        self.value = value;
        value
    }

    /// Sets the value without snapping, used to mirror live values.
    pub fn mirror(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn nudge(&mut self, steps: i32) -> f32 {
        let step = if self.step > 0.0 {
            self.step
        } else {
            (self.max - self.min) / 100.0
        };
        self.set(self.value + step * steps as f32)
    }

    pub fn to_min(&mut self) -> f32 {
        self.set(self.min)
    }

    pub fn to_max(&mut self) -> f32 {
        self.set(self.max)
    }
}

/// Colors a color control cycles through.
pub const PALETTE: [u32; 8] = [
    0xff0000, 0x00ff00, 0x0000ff, 0xffff00, 0xff00ff, 0x00ffff, 0xffffff, 0x525252,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Control {
    Number { label: String, slider: Slider },
    Color { label: String, value: u32 },
}

impl Control {
    pub fn number(label: &str, slider: Slider) -> Self {
        Self::Number {
            label: label.to_string(),
            slider,
        }
    }

    pub fn color(label: &str, value: u32) -> Self {
        Self::Color {
            label: label.to_string(),
            value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Number { label, .. } | Self::Color { label, .. } => label,
        }
    }

    fn adjust(&mut self, direction: i32) {
        match self {
            Self::Number { slider, .. } => {
                slider.nudge(direction);
            }
            Self::Color { value, .. } => {
                let len = PALETTE.len() as i32;
                let current = PALETTE
                    .iter()
                    .position(|entry| entry == value)
                    .map_or(-1, |index| index as i32);
                let next = if current < 0 && direction < 0 {
                    len - 1
                } else {
                    (current + direction).rem_euclid(len)
                };
                *value = PALETTE[next as usize];
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Number { label, slider } => format!("{label} = {:.2}", slider.value()),
            Self::Color { label, value } => format!("{label} = #{value:06x}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub controls: Vec<Control>,
}

impl Folder {
    pub fn new(name: &str, controls: Vec<Control>) -> Self {
        Self {
            name: name.to_string(),
            controls,
        }
    }
}

/// Flat selection over every control of every folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPanel {
    folders: Vec<Folder>,
    selected: usize,
}

impl PropertyPanel {
    pub fn new(folders: Vec<Folder>) -> Self {
        Self {
            folders,
            selected: 0,
        }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    fn len(&self) -> usize {
        self.folders.iter().map(|folder| folder.controls.len()).sum()
    }

    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut remaining = index;
        for (folder_index, folder) in self.folders.iter().enumerate() {
            if remaining < folder.controls.len() {
                return Some((folder_index, remaining));
            }
            remaining -= folder.controls.len();
        }
        None
    }

    fn control(&self, folder: &str, label: &str) -> Option<&Control> {
        self.folders
            .iter()
            .find(|entry| entry.name == folder)?
            .controls
            .iter()
            .find(|control| control.label() == label)
    }

    fn control_mut(&mut self, folder: &str, label: &str) -> Option<&mut Control> {
        self.folders
            .iter_mut()
            .find(|entry| entry.name == folder)?
            .controls
            .iter_mut()
            .find(|control| control.label() == label)
    }

    pub fn select_next(&mut self) {
        let len = self.len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_previous(&mut self) {
        let len = self.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Folder and label of the selected control.
    pub fn selected(&self) -> Option<(&str, &str)> {
        let (folder, control) = self.locate(self.selected)?;
        let folder = &self.folders[folder];
        Some((folder.name.as_str(), folder.controls[control].label()))
    }

    /// Steps the selected control and returns its folder and label.
    pub fn adjust(&mut self, direction: i32) -> Option<(String, String)> {
        let (folder, control) = self.locate(self.selected)?;
        let folder = &mut self.folders[folder];
        let control = &mut folder.controls[control];
        control.adjust(direction);
        Some((folder.name.clone(), control.label().to_string()))
    }

    pub fn get_number(&self, folder: &str, label: &str) -> Option<f32> {
        match self.control(folder, label)? {
            Control::Number { slider, .. } => Some(slider.value()),
            Control::Color { .. } => None,
        }
    }

    pub fn set_number(&mut self, folder: &str, label: &str, value: f32) {
        if let Some(Control::Number { slider, .. }) = self.control_mut(folder, label) {
            slider.mirror(value);
        }
    }

    /// Linear RGB value of a color control.
    pub fn get_color(&self, folder: &str, label: &str) -> Option<Vec3> {
        match self.control(folder, label)? {
            Control::Color { value, .. } => Some(rgb_from_hex(*value)),
            Control::Number { .. } => None,
        }
    }

    pub fn describe_selected(&self) -> String {
        match self.locate(self.selected) {
            Some((folder, control)) => {
                let folder = &self.folders[folder];
                format!("{}/{}", folder.name, folder.controls[control].describe())
            }
            None => String::from("(empty panel)"),
        }
    }
}
