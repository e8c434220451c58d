//! CPU-side uniform packing shared by every pipeline.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::camera::PerspectiveCamera;
use crate::mesh::Aabb;
use crate::scene::{Light, Scene, SceneObject, ShadowSettings};

/// Constant depth offset applied when comparing against the shadow map.
const SHADOW_BIAS: f32 = 0.0005;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub ambient: [f32; 4],
    /// Unit vector pointing from the scene towards the key light.
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    pub shadow_params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
}

/// Key light reduced to what the shaders consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyLight {
    pub position: Vec3,
    pub radiance: Vec3,
    pub cast_shadow: bool,
}

pub fn key_light(scene: &Scene) -> Option<KeyLight> {
    match scene.key_light()? {
        Light::Directional {
            position,
            color,
            intensity,
            cast_shadow,
        } => Some(KeyLight {
            position: *position,
            radiance: *color * *intensity,
            cast_shadow: *cast_shadow,
        }),
        Light::Ambient { .. } => None,
    }
}

/// Sum of every ambient light's color scaled by its intensity.
pub fn ambient(scene: &Scene) -> Vec3 {
    scene
        .lights
        .iter()
        .filter_map(|light| match light {
            Light::Ambient { color, intensity } => Some(*color * *intensity),
            Light::Directional { .. } => None,
        })
        .sum()
}

/// Shadow settings in effect, or `None` when nothing would cast a shadow.
pub fn active_shadows(scene: &Scene) -> Option<ShadowSettings> {
    let settings = scene.shadows?;
    let light = key_light(scene)?;
    let casters = scene
        .objects()
        .iter()
        .any(|object| object.visible && object.cast_shadow);
    (light.cast_shadow && casters).then_some(settings)
}

/// Orthographic projection looking from the light towards the scene.
///
/// The frustum is centered on `bounds` and widened to cover them, with the
/// eye pulled back just far enough to keep every caster inside the depth
/// range.
pub fn shadow_view_proj(light_position: Vec3, settings: &ShadowSettings, bounds: Aabb) -> Mat4 {
    let (center, radius) = if bounds.is_empty() {
        (Vec3::ZERO, settings.extent)
    } else {
        (bounds.center(), bounds.size().length() * 0.5)
    };
    let direction = light_position.try_normalize().unwrap_or(Vec3::Y);
    let near = settings.near.max(1e-3);
    let distance = (radius + near).min(settings.far * 0.5);
    let eye = center + direction * distance;
    let up = if direction.abs_diff_eq(Vec3::Y, 1e-4) || direction.abs_diff_eq(-Vec3::Y, 1e-4) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let half = settings.extent.max(radius);
    let far = settings.far.min(distance + radius + near).max(near + 1e-3);
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh(-half, half, -half, half, near, far);
    projection * view
}

pub fn globals(scene: &Scene, camera: &PerspectiveCamera) -> GlobalUniform {
    let light = key_light(scene);
    let shadows = active_shadows(scene);
    let light_view_proj = match (light, shadows) {
        (Some(light), Some(settings)) => {
            shadow_view_proj(light.position, &settings, scene.bounds())
        }
        _ => Mat4::IDENTITY,
    };
    let direction = light
        .and_then(|light| light.position.try_normalize())
        .unwrap_or(Vec3::Y);
    let radiance = light.map_or(Vec3::ZERO, |light| light.radiance);
    let shadow_params = match shadows {
        Some(settings) => [1.0, 1.0 / settings.map_size.max(1) as f32, SHADOW_BIAS, 0.0],
        None => [0.0; 4],
    };

    GlobalUniform {
        view_proj: camera.view_proj().to_cols_array_2d(),
        light_view_proj: light_view_proj.to_cols_array_2d(),
        camera_position: camera.position.extend(1.0).into(),
        camera_right: camera.right().extend(0.0).into(),
        camera_up: camera.up_vector().extend(0.0).into(),
        ambient: ambient(scene).extend(1.0).into(),
        light_direction: direction.extend(0.0).into(),
        light_color: radiance.extend(1.0).into(),
        shadow_params,
    }
}

pub fn object_constants(object: &SceneObject) -> ObjectConstants {
    let model = object.transform.matrix();
    let normal = Mat3::from_mat4(model).inverse().transpose();
    ObjectConstants {
        model: model.to_cols_array_2d(),
        normal: mat3_to_3x4(normal),
        color: object.material.color.extend(1.0).into(),
        params: [
            if object.material.unlit { 1.0 } else { 0.0 },
            if object.receive_shadow { 1.0 } else { 0.0 },
            0.0,
            0.0,
        ],
    }
}

/// Constants for an untransformed draw such as the point cloud or grid.
pub fn flat_constants(color: Vec3, point_size: f32) -> ObjectConstants {
    ObjectConstants {
        model: Mat4::IDENTITY.to_cols_array_2d(),
        normal: mat3_to_3x4(Mat3::IDENTITY),
        color: color.extend(1.0).into(),
        params: [1.0, 0.0, point_size, 0.0],
    }
}

pub fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cuboid;
    use crate::scene::{Material, Transform, WHITE};

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(cuboid(Vec3::ONE));
        scene.add_object(SceneObject::new("cube", cube, Material::lit(Vec3::ONE)).with_shadows());
        scene.lights.push(Light::ambient(WHITE, 0.5));
        scene.lights.push(Light::ambient(WHITE, 0.25));
        scene.lights.push(Light::Directional {
            position: Vec3::new(5000.0, 10000.0, 1.0),
            color: Vec3::ONE,
            intensity: 5.0,
            cast_shadow: true,
        });
        scene.shadows = Some(ShadowSettings {
            map_size: 2048,
            near: 1.0,
            far: 10000.0,
            extent: 3.0,
        });
        scene
    }

    #[test]
    fn uniform_layouts_match_the_shaders() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 240);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 144);
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 64);
    }

    #[test]
    fn ambient_lights_accumulate() {
        let scene = lit_scene();
        assert!((ambient(&scene) - Vec3::splat(0.75)).length() < 1e-5);
        let camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::Z * 5.0);
        let globals = globals(&scene, &camera);
        assert_eq!(globals.light_color[0], 5.0);
        assert_eq!(globals.shadow_params[0], 1.0);
        assert!((globals.shadow_params[1] - 1.0 / 2048.0).abs() < 1e-9);
    }

    #[test]
    fn shadows_need_a_caster_and_a_shadowing_light() {
        let mut scene = lit_scene();
        assert!(active_shadows(&scene).is_some());
        if let Some(object) = scene.object_mut(crate::scene::ObjectId(0)) {
            object.cast_shadow = false;
        }
        assert!(active_shadows(&scene).is_none());

        let mut scene = lit_scene();
        scene.shadows = None;
        assert!(active_shadows(&scene).is_none());
    }

    #[test]
    fn shadow_frustum_contains_the_scene() {
        let scene = lit_scene();
        let settings = scene.shadows.unwrap();
        let matrix = shadow_view_proj(Vec3::new(5000.0, 10000.0, 1.0), &settings, scene.bounds());
        for corner in [Vec3::splat(-0.5), Vec3::splat(0.5), Vec3::new(0.5, -0.5, 0.5)] {
            let ndc = matrix.project_point3(corner);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{ndc:?}");
            assert!((0.0..=1.0).contains(&ndc.z), "{ndc:?}");
        }
        // The corner nearest the light is closest in depth.
        let near = matrix.project_point3(Vec3::new(0.5, 0.5, 0.5)).z;
        let far = matrix.project_point3(Vec3::new(-0.5, -0.5, -0.5)).z;
        assert!(near < far);
    }

    #[test]
    fn overhead_light_still_has_a_valid_view() {
        let settings = ShadowSettings::default();
        let matrix = shadow_view_proj(Vec3::Y * 10.0, &settings, Aabb::EMPTY);
        assert!(matrix.is_finite());
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let mut object = SceneObject::new("o", crate::scene::MeshId(0), Material::unlit(Vec3::X));
        object.transform = Transform {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Transform::default()
        };
        let constants = object_constants(&object);
        assert_eq!(constants.normal[0][0], 0.5);
        assert_eq!(constants.params[0], 1.0);
        assert_eq!(constants.params[1], 0.0);
        assert_eq!(constants.color, [1.0, 0.0, 0.0, 1.0]);
    }
}
