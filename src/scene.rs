use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::{Aabb, LineSet, MeshData};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Index of a mesh stored in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub usize);

/// Index of an object stored in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

/// Converts a `0xRRGGBB` color to linear RGB.
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

/// Converts a linear RGB color back to `0xRRGGBB`.
pub fn rgb_to_hex(color: Vec3) -> u32 {
    let channel = |value: f32| (linear_to_srgb(value.clamp(0.0, 1.0)) * 255.0).round() as u32;
    (channel(color.x) << 16) | (channel(color.y) << 8) | channel(color.z)
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

pub const WHITE: u32 = 0xffffff;
pub const RED: u32 = 0xff0000;
pub const GREEN: u32 = 0x008000;
pub const LIME: u32 = 0x00ff00;
pub const BLUE: u32 = 0x0000ff;

/// Translation, rotation and scale of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation as XYZ Euler angles in radians.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn set_euler(&mut self, angles: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Surface appearance; unlit materials ignore every light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Vec3,
    pub unlit: bool,
}

impl Material {
    pub fn lit(color: Vec3) -> Self {
        Self {
            color,
            unlit: false,
        }
    }

    pub fn unlit(color: Vec3) -> Self {
        Self { color, unlit: true }
    }
}

/// Renderable instance of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshId,
    pub transform: Transform,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: MeshId, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Transform::default(),
            material,
            cast_shadow: false,
            receive_shadow: false,
            visible: true,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    /// Shines from `position` towards the origin.
    Directional {
        position: Vec3,
        color: Vec3,
        intensity: f32,
        cast_shadow: bool,
    },
}

impl Light {
    pub fn ambient(hex: u32, intensity: f32) -> Self {
        Self::Ambient {
            color: rgb_from_hex(hex),
            intensity,
        }
    }

    pub fn directional(hex: u32, intensity: f32, position: Vec3) -> Self {
        Self::Directional {
            position,
            color: rgb_from_hex(hex),
            intensity,
            cast_shadow: false,
        }
    }
}

/// Camera-facing square sprites drawn additively without depth writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    /// Edge length in world units, so sprites shrink with distance.
    pub size: f32,
    pub color: Vec3,
}

/// Shadow map parameters for the first directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half-width of the orthographic shadow frustum.
    pub extent: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            near: 1.0,
            far: 40.0,
            extent: 5.0,
        }
    }
}

/// Everything a demo wants drawn in one frame.
#[derive(Debug, Clone)]
pub struct Scene {
    id: u64,
    meshes: Vec<MeshData>,
    objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub points: Option<PointCloud>,
    pub lines: Option<LineSet>,
    pub shadows: Option<ShadowSettings>,
    pub background: Vec3,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            meshes: Vec::new(),
            objects: Vec::new(),
            lights: Vec::new(),
            points: None,
            lines: None,
            shadows: None,
            background: Vec3::ZERO,
        }
    }

    /// Process-unique identifier, used to key GPU caches.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.0)
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|object| object.name == name)
            .map(ObjectId)
    }

    /// World-space bounds of every visible object.
    pub fn bounds(&self) -> Aabb {
        self.objects
            .iter()
            .filter(|object| object.visible)
            .filter_map(|object| {
                let mesh = self.meshes.get(object.mesh.0)?;
                Some(mesh.bounds().transformed(object.transform.matrix()))
            })
            .fold(Aabb::EMPTY, |acc, bounds| acc.union(&bounds))
    }

    /// First directional light, which is the one the renderer shades with.
    pub fn key_light(&self) -> Option<&Light> {
        self.lights
            .iter()
            .find(|light| matches!(light, Light::Directional { .. }))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cuboid;

    #[test]
    fn hex_colors_round_trip_through_linear_space() {
        let gray = rgb_from_hex(0x525252);
        assert!(gray.x < 0.1 && gray.x > 0.08);
        assert_eq!(rgb_to_hex(gray), 0x525252);
        assert!((rgb_from_hex(RED) - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn scenes_get_distinct_ids() {
        assert_ne!(Scene::new().id(), Scene::new().id());
    }

    #[test]
    fn find_and_bounds_cover_objects() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(cuboid(Vec3::ONE));
        scene.add_object(SceneObject::new("a", cube, Material::lit(Vec3::ONE)));
        let b = scene.add_object(
            SceneObject::new("b", cube, Material::lit(Vec3::ONE)).at(Vec3::new(4.0, 0.0, 0.0)),
        );
        assert_eq!(scene.find("b"), Some(b));
        assert_eq!(scene.find("c"), None);
        let bounds = scene.bounds();
        assert_eq!(bounds.min, Vec3::splat(-0.5));
        assert_eq!(bounds.max, Vec3::new(4.5, 0.5, 0.5));
    }

    #[test]
    fn euler_angles_survive_a_round_trip() {
        let mut transform = Transform::default();
        transform.set_euler(Vec3::new(0.1, 0.2, 0.3));
        assert!((transform.euler() - Vec3::new(0.1, 0.2, 0.3)).length() < 1e-4);
    }
}
