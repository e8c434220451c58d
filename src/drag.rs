//! Pointer-driven dragging of objects across a horizontal plane.

use glam::Vec3;

use crate::controls::OrbitControls;
use crate::raycast::{intersect_objects, Plane, Ray};
use crate::scene::{ObjectId, Scene};

/// Drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveDrag {
    pub object: ObjectId,
    /// Horizontal plane through the point where the object was grabbed.
    pub plane: Plane,
    /// Object position minus grab point, so the object does not snap to the
    /// cursor.
    pub shift: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct DragState {
    active: Option<ActiveDrag>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts dragging the nearest draggable object hit by `ray`.
    ///
    /// Camera controls are disabled for the duration of the drag.
    pub fn pointer_down(
        &mut self,
        ray: &Ray,
        scene: &Scene,
        draggables: &[ObjectId],
        controls: &mut OrbitControls,
    ) -> bool {
        let Some(hit) = intersect_objects(ray, scene, draggables).into_iter().next() else {
            return false;
        };
        let Some(object) = scene.object(hit.object) else {
            return false;
        };
        controls.set_enabled(false);
        self.active = Some(ActiveDrag {
            object: hit.object,
            plane: Plane::from_normal_and_point(Vec3::Y, hit.point),
            shift: object.transform.position - hit.point,
        });
        log::debug!("drag start on {} at {:?}", object.name, hit.point);
        true
    }

    /// Moves the dragged object to where `ray` meets the drag plane.
    pub fn pointer_move(&self, ray: &Ray, scene: &mut Scene) {
        let Some(drag) = self.active else {
            return;
        };
        let Some(point) = ray.intersect_plane(&drag.plane) else {
            return;
        };
        if let Some(object) = scene.object_mut(drag.object) {
            object.transform.position = point + drag.shift;
        }
    }

    /// Ends any drag and hands the pointer back to the camera controls.
    pub fn pointer_up(&mut self, controls: &mut OrbitControls) {
        self.active = None;
        controls.set_enabled(true);
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged(&self) -> Option<ObjectId> {
        self.active.map(|drag| drag.object)
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cuboid;
    use crate::scene::{Material, SceneObject};

    fn scene() -> (Scene, Vec<ObjectId>) {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(cuboid(Vec3::ONE));
        let ids = vec![
            scene.add_object(
                SceneObject::new("red", cube, Material::unlit(Vec3::X))
                    .at(Vec3::new(-1.0, 0.5, 0.0)),
            ),
            scene.add_object(
                SceneObject::new("blue", cube, Material::unlit(Vec3::Z))
                    .at(Vec3::new(1.0, 0.5, 0.0)),
            ),
        ];
        (scene, ids)
    }

    fn down_ray(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 10.0, z), Vec3::NEG_Y)
    }

    #[test]
    fn grabbing_a_cube_disables_controls_until_release() {
        let (scene, ids) = scene();
        let mut controls = OrbitControls::default();
        let mut drag = DragState::new();

        assert!(drag.pointer_down(&down_ray(1.2, 0.1), &scene, &ids, &mut controls));
        assert!(drag.is_dragging());
        assert_eq!(drag.dragged(), Some(ids[1]));
        assert!(!controls.enabled);

        drag.pointer_up(&mut controls);
        assert!(!drag.is_dragging());
        assert!(controls.enabled);
    }

    #[test]
    fn missing_every_cube_starts_nothing() {
        let (scene, ids) = scene();
        let mut controls = OrbitControls::default();
        let mut drag = DragState::new();
        assert!(!drag.pointer_down(&down_ray(5.0, 5.0), &scene, &ids, &mut controls));
        assert!(controls.enabled);
        assert_eq!(drag.dragged(), None);
    }

    #[test]
    fn dragged_cube_keeps_its_grab_offset() {
        let (mut scene, ids) = scene();
        let mut controls = OrbitControls::default();
        let mut drag = DragState::new();
        drag.pointer_down(&down_ray(-0.8, 0.2), &scene, &ids, &mut controls);

        // Grab point is (-0.8, 1.0, 0.2), so the plane sits at y = 1.
        drag.pointer_move(&down_ray(2.2, -1.8), &mut scene);
        let position = scene.object(ids[0]).unwrap().transform.position;
        assert!((position - Vec3::new(2.0, 0.5, -2.0)).length() < 1e-4);

        // A ray parallel to the plane leaves the cube where it is.
        drag.pointer_move(&Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::X), &mut scene);
        assert_eq!(scene.object(ids[0]).unwrap().transform.position, position);
    }
}
