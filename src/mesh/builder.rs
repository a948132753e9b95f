//! Building half-edge meshes from indexed triangle lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertex positions and triangles.
///
/// Triangles must be consistently wound and edge-manifold. Vertices that no
/// triangle references are kept as isolated vertices.
///
/// # Example
/// ```
/// use coral::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_edges(), 3);
/// assert_eq!(mesh.num_halfedges(), 6);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh {
        vertices: vertices.iter().map(|&p| Vertex::new(p)).collect(),
        halfedges: Vec::with_capacity(faces.len() * 3 + faces.len() / 2),
        faces: Vec::with_capacity(faces.len()),
    };

    // Undirected edge (lo, hi) -> edge id; half-edge 2e leaves the vertex
    // that first introduced the edge.
    let mut edges: HashMap<(usize, usize), EdgeId<I>> = HashMap::new();

    for face in faces {
        let face_id = FaceId::<I>::new(mesh.faces.len());
        let mut corner = [HalfEdgeId::<I>::invalid(); 3];

        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            let key = (a.min(b), a.max(b));
            let edge = *edges.entry(key).or_insert_with(|| {
                let e = EdgeId::new(mesh.halfedges.len() / 2);
                mesh.halfedges.push(HalfEdge::new(VertexId::new(a)));
                mesh.halfedges.push(HalfEdge::new(VertexId::new(b)));
                e
            });

            let first = edge.halfedge();
            let he = if mesh.origin(first).index() == a {
                first
            } else {
                first.twin()
            };
            if mesh.halfedge(he).face.is_valid() {
                return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
            }
            corner[k] = he;
        }

        for k in 0..3 {
            let he = &mut mesh.halfedges[corner[k].index()];
            he.next = corner[(k + 1) % 3];
            he.prev = corner[(k + 2) % 3];
            he.face = face_id;
            mesh.vertices[face[k]].halfedge = corner[k];
        }
        mesh.faces.push(Face {
            halfedge: corner[0],
        });
    }

    link_boundary_loops(&mut mesh)?;
    anchor_boundary_vertices(&mut mesh);

    Ok(mesh)
}

/// Chain face-less half-edges into boundary loops.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::with_capacity(boundary.len());
    for &he in &boundary {
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} lies on more than one boundary fan", origin),
            });
        }
    }

    for &he in &boundary {
        let dest = mesh.dest(he).index();
        if let Some(&next) = outgoing.get(&dest) {
            mesh.halfedges[he.index()].next = next;
            mesh.halfedges[next.index()].prev = he;
        }
    }

    Ok(())
}

/// Make boundary vertices store their outgoing boundary half-edge.
fn anchor_boundary_vertices<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for i in 0..mesh.halfedges.len() {
        let he = HalfEdgeId::<I>::new(i);
        if mesh.is_boundary_halfedge(he) {
            let origin = mesh.origin(he).index();
            mesh.vertices[origin].halfedge = he;
        }
    }
}

/// Convert a mesh back to positions and triangles.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| v.index()))
        .collect();
    (mesh.positions(), faces)
}
