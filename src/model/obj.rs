use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;

use crate::mesh::{MeshData, Vertex};

/// Parses Wavefront OBJ text into a single indexed mesh.
///
/// Polygons are fan-triangulated, negative (relative) indices are resolved
/// and smooth normals are generated when the file provides none.
pub fn parse_obj(data: &str) -> Result<MeshData> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut triangles: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts).with_context(|| format!("bad vertex on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts).with_context(|| format!("bad normal on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts, positions.len(), normals.len())
                    .with_context(|| format!("bad face on line {}", line_no + 1))?;
                for i in 1..polygon.len() - 1 {
                    triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("no vertices"));
    }

    let mut mesh = weld(&positions, &normals, &triangles)?;
    mesh.fill_missing_normals();
    Ok(mesh)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("expected three components"))?
            .parse::<f32>()?)
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

/// One-based corner indices; a zero normal index means none was given.
#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    position: i32,
    normal: i32,
}

/// Parses a face, turning negative indices into absolute ones against the
/// `v`/`vn` counts seen so far.
fn parse_face<'a>(
    parts: impl Iterator<Item = &'a str>,
    position_count: usize,
    normal_count: usize,
) -> Result<Vec<FaceIndex>> {
    let mut polygon = Vec::new();
    for part in parts {
        // v, v/vt, v//vn or v/vt/vn; texture coordinates are not used.
        let mut segments = part.split('/');
        let position = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()
            .with_context(|| format!("bad vertex index `{part}`"))?;
        let normal = match segments.nth(1) {
            Some(text) if !text.is_empty() => text
                .parse::<i32>()
                .with_context(|| format!("bad normal index `{part}`"))?,
            _ => 0,
        };
        polygon.push(FaceIndex {
            position: absolute_index(position, position_count)
                .ok_or_else(|| anyhow!("vertex index {position} out of range"))?,
            normal: absolute_index(normal, normal_count)
                .ok_or_else(|| anyhow!("normal index {normal} out of range"))?,
        });
    }
    if polygon.len() < 3 {
        return Err(anyhow!("faces need at least three vertices"));
    }
    Ok(polygon)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    normal: Option<usize>,
}

/// Shares vertices between faces that use the same position/normal pair.
fn weld(positions: &[Vec3], normals: &[Vec3], triangles: &[[FaceIndex; 3]]) -> Result<MeshData> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut mesh = MeshData::default();

    for triangle in triangles {
        for corner in triangle {
            let position = resolve_index(corner.position, positions.len())
                .ok_or_else(|| anyhow!("vertex index {} out of range", corner.position))?;
            let normal = resolve_index(corner.normal, normals.len());
            let key = Key { position, normal };
            let next = mesh.vertices.len() as u32;
            let index = *lookup.entry(key).or_insert_with(|| {
                mesh.vertices.push(Vertex::new(
                    positions[position],
                    normal.map_or(Vec3::ZERO, |i| normals[i]),
                ));
                next
            });
            mesh.indices.push(index);
        }
    }

    Ok(mesh)
}

/// Rewrites a relative (negative) index as a one-based one. Positive and
/// zero indices pass through; they are range-checked once the file is read.
fn absolute_index(index: i32, count: usize) -> Option<i32> {
    if index >= 0 {
        return Some(index);
    }
    let back = index.unsigned_abs() as usize;
    (back <= count).then(|| (count - back + 1) as i32)
}

/// Converts a one-based OBJ index to a zero-based one.
fn resolve_index(index: i32, len: usize) -> Option<usize> {
    let zero_based = usize::try_from(index).ok()?.checked_sub(1)?;
    (zero_based < len).then_some(zero_based)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulates_quads_and_welds_shared_corners() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn generates_normals_when_missing() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        for vertex in &mesh.vertices {
            assert!((vertex.normal() - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn keeps_explicit_normals_and_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf -3//1 -2//1 -1//1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[0].normal(), Vec3::NEG_Z);
    }

    #[test]
    fn relative_indices_refer_to_vertices_defined_so_far() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n\
                   v 5 5 5\nv 6 5 5\nv 5 6 5\nf -3 -2 -1\n";
        let mesh = parse_obj(obj).unwrap();
        let first: Vec<Vec3> = mesh.indices[..3]
            .iter()
            .map(|&i| mesh.vertices[i as usize].position())
            .collect();
        let second: Vec<Vec3> = mesh.indices[3..]
            .iter()
            .map(|&i| mesh.vertices[i as usize].position())
            .collect();
        assert_eq!(first, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(
            second,
            vec![
                Vec3::new(5.0, 5.0, 5.0),
                Vec3::new(6.0, 5.0, 5.0),
                Vec3::new(5.0, 6.0, 5.0)
            ]
        );
    }

    #[test]
    fn explicit_normals_survive_next_to_faces_without_them() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nvn 0 0.6 0.8\n\
                   f 1//1 2//1 3//1\nf 1 4 2\n";
        let mesh = parse_obj(obj).unwrap();
        let explicit = mesh.vertices[mesh.indices[0] as usize].normal();
        assert_eq!(explicit, Vec3::new(0.0, 0.6, 0.8));
        assert!(mesh.vertices.iter().all(|v| v.normal() != Vec3::ZERO));
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_obj("v 0 0 0\nv 1 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(parse_obj("# nothing here\n").is_err());
        assert!(parse_obj("v 0 0 0\nf 1 2 9\n").is_err());
        assert!(parse_obj("v 0 0 0\nv 1 0 0\nf -1 -2 -3\nv 0 1 0\n").is_err());
    }
}
