use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::raycast::Ray;

/// Interleaved vertex consumed by the lit pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(Vertex::position))
    }

    /// Replaces every normal with the area-weighted average of its faces.
    pub fn compute_normals(&mut self) {
        let smooth = self.smooth_normals();
        for (vertex, normal) in self.vertices.iter_mut().zip(smooth) {
            vertex.normal = normal.to_array();
        }
    }

    /// Like [`compute_normals`](Self::compute_normals), but only for vertices
    /// whose normal is zero. Explicit normals are kept.
    pub fn fill_missing_normals(&mut self) {
        if !self.has_missing_normals() {
            return;
        }
        let smooth = self.smooth_normals();
        for (vertex, normal) in self.vertices.iter_mut().zip(smooth) {
            if vertex.normal() == Vec3::ZERO {
                vertex.normal = normal.to_array();
            }
        }
    }

    fn smooth_normals(&self) -> Vec<Vec3> {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let p0 = self.vertices[i0].position();
            let p1 = self.vertices[i1].position();
            let p2 = self.vertices[i2].position();
            let normal = (p1 - p0).cross(p2 - p0);
            if normal.length_squared() > f32::EPSILON * f32::EPSILON {
                accum[i0] += normal;
                accum[i1] += normal;
                accum[i2] += normal;
            }
        }
        accum.into_iter().map(Vec3::normalize_or_zero).collect()
    }

    pub fn has_missing_normals(&self) -> bool {
        self.vertices
            .iter()
            .any(|vertex| vertex.normal() == Vec3::ZERO)
    }
}

/// UV sphere centered on the origin.
///
/// Rings run from the north pole (+Y) to the south pole; each ring starts at
/// -X and winds towards +Z, so a sphere with few segments looks faceted the
/// same way it does in browser scene libraries.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut vertices = Vec::new();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let direction = Vec3::new(
                -(u * 2.0 * PI).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            row.push(vertices.len() as u32);
            vertices.push(Vertex::new(direction * radius, direction.normalize_or_zero()));
        }
        grid.push(row);
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData { vertices, indices }
}

/// Axis-aligned box centered on the origin.
pub fn cuboid(size: Vec3) -> MeshData {
    let vertices = UNIT_CUBE_VERTICES
        .chunks_exact(6)
        .map(|chunk| {
            Vertex::new(
                Vec3::new(chunk[0], chunk[1], chunk[2]) * size,
                Vec3::new(chunk[3], chunk[4], chunk[5]),
            )
        })
        .collect();
    MeshData {
        vertices,
        indices: UNIT_CUBE_INDICES.to_vec(),
    }
}

/// Rectangle in the XY plane facing +Z.
pub fn plane(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let normal = Vec3::Z;
    MeshData {
        vertices: vec![
            Vertex::new(Vec3::new(-hw, hh, 0.0), normal),
            Vertex::new(Vec3::new(hw, hh, 0.0), normal),
            Vertex::new(Vec3::new(-hw, -hh, 0.0), normal),
            Vertex::new(Vec3::new(hw, -hh, 0.0), normal),
        ],
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// Colored line segment endpoint.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Unlit line list, two vertices per segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineSet {
    pub vertices: Vec<LineVertex>,
}

impl LineSet {
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    fn push(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        let color = color.to_array();
        self.vertices.push(LineVertex {
            position: from.to_array(),
            color,
        });
        self.vertices.push(LineVertex {
            position: to.to_array(),
            color,
        });
    }
}

/// Square grid on the XZ plane; the two center lines use `center_color`.
pub fn grid(size: f32, divisions: u32, center_color: Vec3, line_color: Vec3) -> LineSet {
    let divisions = divisions.max(1);
    let step = size / divisions as f32;
    let half = size / 2.0;
    let center = divisions / 2;
    let mut lines = LineSet::default();
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center { center_color } else { line_color };
        lines.push(Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k), color);
        lines.push(Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half), color);
    }
    lines
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |aabb, point| Self {
            min: aabb.min.min(point),
            max: aabb.max.max(point),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, matrix: Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        Aabb::from_points(corners)
    }

    /// Slab test; returns the ray parameter of the entry point, or zero when
    /// the origin is inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

const UNIT_CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

const UNIT_CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];
