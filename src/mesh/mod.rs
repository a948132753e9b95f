//! Half-edge triangle meshes.
//!
//! [`HalfEdgeMesh`] is the read-mostly topology the geometry kernels work on.
//! It answers the one-ring queries they need (outgoing and incoming
//! half-edges in cyclic order, neighbours, valence, boundary flags, face
//! corners) and lets callers write vertex positions back.
//!
//! Elements are addressed through typed handles ([`VertexId`],
//! [`HalfEdgeId`], [`FaceId`], [`EdgeId`]) generic over the index width.
//!
//! ```
//! use coral::mesh::{build_from_triangles, HalfEdgeMesh, VertexId};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! assert_eq!(mesh.valence(VertexId::new(0)), 2);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
