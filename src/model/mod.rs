//! Model files: OBJ and glTF parsing plus a background loader.

mod gltf_file;
mod loader;
mod obj;

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::mesh::{Aabb, MeshData};

pub use loader::{LoadState, ModelLoader};
pub use obj::parse_obj;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unsupported model format `{0}` (expected gltf, glb or obj)")]
    UnsupportedFormat(String),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{0} contains no triangles")]
    Empty(PathBuf),
}

/// One mesh of a model together with its world transform and base color.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPart {
    pub name: String,
    pub mesh: MeshData,
    pub transform: Mat4,
    /// Linear RGB base color.
    pub color: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub parts: Vec<ModelPart>,
}

impl Model {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|part| part.mesh.triangle_count()).sum()
    }

    /// Bounds of every part after applying its transform.
    pub fn bounds(&self) -> Aabb {
        self.parts
            .iter()
            .map(|part| part.mesh.bounds().transformed(part.transform))
            .fold(Aabb::EMPTY, |acc, bounds| acc.union(&bounds))
    }

    /// Transform that scales the model so its largest side is `target_size`
    /// and moves its center to the origin.
    pub fn normalizing_transform(&self, target_size: f32) -> Mat4 {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return Mat4::IDENTITY;
        }
        let max_extent = bounds.max_extent();
        let scale = if max_extent > f32::EPSILON {
            target_size / max_extent
        } else {
            1.0
        };
        Mat4::from_translation(-bounds.center() * scale) * Mat4::from_scale(Vec3::splat(scale))
    }
}

/// Loads a model, picking the parser from the file extension.
pub fn load_model(path: &Path) -> Result<Model, ModelError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let model = match extension.as_str() {
        "gltf" | "glb" => gltf_file::load(path)?,
        "obj" => {
            let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mesh = parse_obj(&text).map_err(|err| ModelError::Parse {
                path: path.to_path_buf(),
                message: format!("{err:#}"),
            })?;
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("model")
                .to_string();
            Model {
                parts: vec![ModelPart {
                    name,
                    mesh,
                    transform: Mat4::IDENTITY,
                    color: Vec3::ONE,
                }],
            }
        }
        _ => return Err(ModelError::UnsupportedFormat(extension)),
    };
    if model.triangle_count() == 0 {
        return Err(ModelError::Empty(path.to_path_buf()));
    }
    log::info!(
        "loaded {} ({} parts, {} triangles)",
        path.display(),
        model.parts.len(),
        model.triangle_count()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cuboid;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn normalizing_fits_the_model_into_target_size() {
        let model = Model {
            parts: vec![ModelPart {
                name: "box".into(),
                mesh: cuboid(Vec3::new(10.0, 2.0, 4.0)),
                transform: Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)),
                color: Vec3::ONE,
            }],
        };
        let normalizing = model.normalizing_transform(3.0);
        let bounds = model.parts[0]
            .mesh
            .bounds()
            .transformed(normalizing * model.parts[0].transform);
        assert!(bounds.center().length() < 1e-4);
        assert!((bounds.max_extent() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn empty_model_normalizes_to_identity() {
        assert_eq!(Model::default().normalizing_transform(3.0), Mat4::IDENTITY);
    }

    #[test]
    fn loads_obj_by_extension() {
        let (_dir, path) = write_temp("tri.OBJ", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let model = load_model(&path).unwrap();
        assert_eq!(model.parts.len(), 1);
        assert_eq!(model.parts[0].name, "tri");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn rejects_unknown_missing_and_empty_files() {
        let (_dir, path) = write_temp("scene.fbx", "");
        assert!(matches!(
            load_model(&path),
            Err(ModelError::UnsupportedFormat(ext)) if ext == "fbx"
        ));
        assert!(matches!(
            load_model(Path::new("does/not/exist.obj")),
            Err(ModelError::Io { .. })
        ));
        let (_dir, path) = write_temp("points.obj", "v 0 0 0\n");
        assert!(matches!(load_model(&path), Err(ModelError::Empty(_))));
        let (_dir, path) = write_temp("broken.obj", "v 0 zero 0\n");
        assert!(matches!(load_model(&path), Err(ModelError::Parse { .. })));
    }
}
