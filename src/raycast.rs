use std::cmp::Ordering;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::{ObjectId, Scene};

/// Half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point where the ray crosses `plane`, if it does so in front of the
    /// origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denominator = plane.normal.dot(self.direction);
        if denominator.abs() < f32::EPSILON {
            return (plane.distance_to_point(self.origin).abs() < f32::EPSILON)
                .then_some(self.origin);
        }
        let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Plane in Hessian normal form: `normal · p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -point.dot(normal),
        }
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Intersection between a ray and a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: ObjectId,
    pub distance: f32,
    pub point: Vec3,
}

/// Intersects `ray` with the bounding boxes of `candidates`, nearest first.
///
/// The ray is moved into each object's local space so rotated and scaled
/// objects are tested against their own mesh bounds.
pub fn intersect_objects(ray: &Ray, scene: &Scene, candidates: &[ObjectId]) -> Vec<Hit> {
    let mut hits: Vec<Hit> = candidates
        .iter()
        .filter_map(|&id| {
            let object = scene.object(id)?;
            if !object.visible {
                return None;
            }
            let model = object.transform.matrix();
            let inverse = model.inverse();
            let local_origin = inverse.transform_point3(ray.origin);
            let local_direction = inverse.transform_vector3(ray.direction);
            let local_ray = Ray::new(local_origin, local_direction);
            let bounds = scene.mesh(object.mesh)?.bounds();
            let t = bounds.intersect_ray(&local_ray)?;
            let point = model.transform_point3(local_ray.at(t));
            Some(Hit {
                object: id,
                distance: point.distance(ray.origin),
                point,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cuboid;
    use crate::scene::{Material, SceneObject};

    #[test]
    fn ray_meets_horizontal_plane() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let point = ray.intersect_plane(&plane).unwrap();
        assert!((point - Vec3::new(4.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn ray_parallel_or_pointing_away_misses_plane() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        let parallel = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(parallel.intersect_plane(&plane).is_none());
        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(away.intersect_plane(&plane).is_none());
    }

    #[test]
    fn nearest_object_is_reported_first() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(cuboid(Vec3::ONE));
        let far = scene.add_object(
            SceneObject::new("far", cube, Material::unlit(Vec3::X)).at(Vec3::new(0.0, 0.0, -5.0)),
        );
        let near = scene.add_object(SceneObject::new("near", cube, Material::unlit(Vec3::Y)));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let hits = intersect_objects(&ray, &scene, &[far, near]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, near);
        assert!((hits[0].point.z - 0.5).abs() < 1e-4);
        assert!((hits[0].distance - 9.5).abs() < 1e-4);
        assert_eq!(hits[1].object, far);
    }

    #[test]
    fn scaled_object_uses_world_size() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(cuboid(Vec3::ONE));
        let mut object = SceneObject::new("wide", cube, Material::unlit(Vec3::ONE));
        object.transform.scale = Vec3::new(4.0, 1.0, 1.0);
        let id = scene.add_object(object);
        let ray = Ray::new(Vec3::new(1.5, 0.0, 10.0), Vec3::NEG_Z);
        let hits = intersect_objects(&ray, &scene, &[id]);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].point - Vec3::new(1.5, 0.0, 0.5)).length() < 1e-4);
    }
}
