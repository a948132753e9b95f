//! Wavefront OBJ format support.
//!
//! Loading goes through `tobj`: polygons are triangulated, and texture,
//! normal and material data are ignored. Vertex numbering follows first use in
//! the face list, so unreferenced vertices are dropped. Vertices repeated
//! across `o`/`g` groups at identical positions are welded back together so a
//! grouped file still loads as one connected surface.
//!
//! Writing can emit one `vt` record per vertex so that a parameterization
//! travels with the mesh.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::parameterize::UVMap;
use crate::error::{ensure_len, MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Errors
///
/// [`MeshError::LoadError`] if the file cannot be read or parsed, or holds
/// no triangles.
///
/// # Example
///
/// ```no_run
/// use coral::io::obj;
/// use coral::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let fail = |message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message,
    };

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|e| fail(e.to_string()))?;

    let (vertices, faces) = merge_models(&models).map_err(fail)?;
    if faces.is_empty() {
        return Err(fail("file contains no triangles".to_string()));
    }

    log::debug!(
        "loaded {}: {} vertices, {} triangles from {} models",
        path.display(),
        vertices.len(),
        faces.len(),
        models.len()
    );
    build_from_triangles(&vertices, &faces)
}

type Soup = (Vec<Point3<f64>>, Vec<[usize; 3]>);

fn position_key(p: &Point3<f64>) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Concatenate `tobj` models into one triangle soup.
///
/// A position already emitted by an earlier model is reused; duplicates within
/// one model stay distinct. Triangles with a repeated corner are skipped.
fn merge_models(models: &[tobj::Model]) -> std::result::Result<Soup, String> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces = Vec::new();
    let mut earlier: HashMap<[u64; 3], usize> = HashMap::new();
    let mut degenerate = 0;

    for model in models {
        let mesh = &model.mesh;
        let local: Vec<usize> = mesh
            .positions
            .chunks_exact(3)
            .map(|c| {
                let p = Point3::new(f64::from(c[0]), f64::from(c[1]), f64::from(c[2]));
                earlier.get(&position_key(&p)).copied().unwrap_or_else(|| {
                    vertices.push(p);
                    vertices.len() - 1
                })
            })
            .collect();
        for &i in &local {
            earlier.entry(position_key(&vertices[i])).or_insert(i);
        }

        for tri in mesh.indices.chunks_exact(3) {
            let mut face = [0; 3];
            for (corner, &index) in face.iter_mut().zip(tri) {
                *corner = *local.get(index as usize).ok_or_else(|| {
                    format!("model '{}': vertex reference {} out of range", model.name, index)
                })?;
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                degenerate += 1;
                continue;
            }
            faces.push(face);
        }
    }

    if degenerate > 0 {
        log::debug!("skipped {} triangles with repeated corners", degenerate);
    }
    Ok((vertices, faces))
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    write_file(mesh, None, path.as_ref())
}

/// Save a mesh together with per-vertex texture coordinates.
///
/// Every face corner references the `vt` record of its vertex.
///
/// # Errors
///
/// [`MeshError::DimensionMismatch`] if `uv` does not have one entry per vertex.
pub fn save_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    uv: &UVMap<I>,
    path: P,
) -> Result<()> {
    ensure_len("UV map", mesh.num_vertices(), uv.len())?;
    write_file(mesh, Some(uv), path.as_ref())
}

fn write_file<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, uv: Option<&UVMap<I>>, path: &Path) -> Result<()> {
    let to_save_error = |e: std::io::Error| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::create(path).map_err(to_save_error)?;
    let mut writer = BufWriter::new(file);
    write(mesh, uv, &mut writer).map_err(to_save_error)?;
    writer.flush().map_err(to_save_error)?;
    log::debug!("saved {}: {} vertices", path.display(), mesh.num_vertices());
    Ok(())
}

fn write<I: MeshIndex, W: Write>(
    mesh: &HalfEdgeMesh<I>,
    uv: Option<&UVMap<I>>,
    writer: &mut W,
) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# OBJ file written by coral")?;
    writeln!(writer, "# {} vertices", vertices.len())?;
    for p in &vertices {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    if let Some(uv) = uv {
        for (_, t) in uv.iter() {
            writeln!(writer, "vt {} {}", t.x, t.y)?;
        }
    }

    writeln!(writer, "# {} faces", faces.len())?;
    for &f in &faces {
        let [a, b, c] = f.map(|i| i + 1);
        if uv.is_some() {
            writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else {
            writeln!(writer, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}
