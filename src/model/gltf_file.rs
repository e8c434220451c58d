use std::path::Path;

use glam::{Mat4, Vec3, Vec4Swizzles};

use super::{Model, ModelError, ModelPart};
use crate::mesh::{MeshData, Vertex};

/// Reads the meshes reachable from the default scene of a glTF/GLB file.
///
/// Buffers are resolved relative to the file; images are never decoded.
pub(super) fn load(path: &Path) -> Result<Model, ModelError> {
    let parse_error = |err: ::gltf::Error| ModelError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::from_slice(&bytes).map_err(parse_error)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let buffers = ::gltf::import_buffers(&document, Some(base), blob).map_err(parse_error)?;

    let mut model = Model::default();
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Ok(model);
    };
    for node in scene.nodes() {
        visit_node(path, &node, Mat4::IDENTITY, &buffers, &mut model)?;
    }
    Ok(model)
}

fn visit_node(
    path: &Path,
    node: &::gltf::Node,
    parent: Mat4,
    buffers: &[::gltf::buffer::Data],
    model: &mut Model,
) -> Result<(), ModelError> {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or_else(|| node.name())
            .unwrap_or("mesh")
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != ::gltf::mesh::Mode::Triangles {
                log::warn!("skipping non-triangle primitive in {name}");
                continue;
            }
            let Some(data) = read_primitive(path, &primitive, buffers)? else {
                continue;
            };
            let color = glam::Vec4::from_array(
                primitive
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor(),
            )
            .xyz();
            model.parts.push(ModelPart {
                name: name.clone(),
                mesh: data,
                transform,
                color,
            });
        }
    }
    for child in node.children() {
        visit_node(path, &child, transform, buffers, model)?;
    }
    Ok(())
}

fn read_primitive(
    path: &Path,
    primitive: &::gltf::Primitive,
    buffers: &[::gltf::buffer::Data],
) -> Result<Option<MeshData>, ModelError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let Some(positions) = reader.read_positions() else {
        return Ok(None);
    };
    let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
    if positions.is_empty() {
        return Ok(None);
    }
    let normals: Option<Vec<Vec3>> = reader
        .read_normals()
        .map(|normals| normals.map(Vec3::from_array).collect());
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    if let Some(&bad) = indices.iter().find(|&&index| index as usize >= positions.len()) {
        return Err(ModelError::Parse {
            path: path.to_path_buf(),
            message: format!("index {bad} exceeds {} vertices", positions.len()),
        });
    }

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = normals
                .as_ref()
                .and_then(|normals| normals.get(i).copied())
                .unwrap_or(Vec3::ZERO);
            Vertex::new(position, normal)
        })
        .collect();
    let mut mesh = MeshData {
        vertices,
        indices: indices[..indices.len() - indices.len() % 3].to_vec(),
    };
    mesh.fill_missing_normals();
    Ok(Some(mesh))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a one-triangle glTF with an external buffer next to it.
    fn write_triangle(dir: &Path, indexed: bool) -> std::path::PathBuf {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut bytes: Vec<u8> = positions.iter().flat_map(|v| v.to_le_bytes()).collect();
        if indexed {
            bytes.extend([0u16, 1, 2, 0].iter().flat_map(|v| v.to_le_bytes()));
        }
        std::fs::write(dir.join("tri.bin"), &bytes).unwrap();

        let (views, accessors, indices) = if indexed {
            (
                r#"[{"buffer":0,"byteLength":36},{"buffer":0,"byteOffset":36,"byteLength":6}]"#,
                r#",{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}"#,
                r#","indices":1"#,
            )
        } else {
            (r#"[{"buffer":0,"byteLength":36}]"#, "", "")
        };
        let json = format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"name": "root", "translation": [0, 0, -5], "children": [1]}},
            {{"mesh": 0, "scale": [2, 2, 2]}}],
  "meshes": [{{"name": "tri", "primitives": [{{"attributes": {{"POSITION": 0}}{indices}, "material": 0}}]}}],
  "materials": [{{"pbrMetallicRoughness": {{"baseColorFactor": [0.5, 0.25, 1.0, 1.0]}}}}],
  "buffers": [{{"uri": "tri.bin", "byteLength": {len}}}],
  "bufferViews": {views},
  "accessors": [{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[2,1,0]}}{accessors}]
}}"#,
            len = bytes.len(),
        );
        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn composes_node_transforms_and_reads_materials() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle(dir.path(), true);
        let model = load(&path).unwrap();
        assert_eq!(model.parts.len(), 1);
        let part = &model.parts[0];
        assert_eq!(part.name, "tri");
        assert_eq!(part.mesh.indices, vec![0, 1, 2]);
        assert_eq!(part.color, Vec3::new(0.5, 0.25, 1.0));
        let far_corner = part.transform.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((far_corner - Vec3::new(4.0, 0.0, -5.0)).length() < 1e-5);
        assert!((part.mesh.vertices[0].normal() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn unindexed_primitives_get_sequential_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle(dir.path(), false);
        let model = load(&path).unwrap();
        assert_eq!(model.parts[0].mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.gltf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(ModelError::Parse { .. })));
    }
}
