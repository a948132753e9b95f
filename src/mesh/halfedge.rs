//! Half-edge mesh storage and read queries.
//!
//! Each undirected edge is stored as two half-edges allocated next to each
//! other (`2e`, `2e + 1`), which makes the twin and the edge id of a
//! half-edge pure index arithmetic. A half-edge knows its origin vertex, the
//! next/previous half-edge around its face, and its face. Half-edges on the
//! outside of a boundary have an invalid face and are chained into boundary
//! loops through `next`/`prev`.
//!
//! Every vertex stores one outgoing half-edge; for boundary vertices this is
//! the outgoing boundary half-edge, so one-ring traversals start at the
//! boundary gap.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// Position in space.
    pub position: Point3<f64>,

    /// One outgoing half-edge, invalid for isolated vertices.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create an isolated vertex.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A directed half-edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Start vertex.
    pub origin: VertexId<I>,

    /// Next half-edge around the face (or boundary loop).
    pub next: HalfEdgeId<I>,

    /// Previous half-edge around the face (or boundary loop).
    pub prev: HalfEdgeId<I>,

    /// Adjacent face; invalid on the outside of a boundary.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create an unlinked half-edge leaving `origin`.
    pub fn new(origin: VertexId<I>) -> Self {
        Self {
            origin,
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Whether this half-edge has no adjacent face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A triangle face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of the face.
    pub halfedge: HalfEdgeId<I>,
}

/// A triangle mesh in half-edge form.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
        }
    }

    // ==================== Counts ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edges (always even).
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // ==================== Element access ====================

    /// Get a vertex.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a half-edge.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a face.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    /// Move a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
    }

    /// All positions, indexed by vertex.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    // ==================== Half-edge relations ====================

    /// Opposite half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        he.twin()
    }

    /// Next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedges[he.index()].next
    }

    /// Previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedges[he.index()].prev
    }

    /// Start vertex.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedges[he.index()].origin
    }

    /// End vertex.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(he.twin())
    }

    /// Adjacent face, invalid for boundary half-edges.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedges[he.index()].face
    }

    /// Whether the half-edge has no adjacent face.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedges[he.index()].is_boundary()
    }

    /// Whether either side of an edge lacks a face.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        let he = e.halfedge();
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(he.twin())
    }

    /// Whether a vertex lies on the boundary. Isolated vertices count as boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Whether the mesh has no boundary at all.
    pub fn is_closed(&self) -> bool {
        self.halfedges.iter().all(|he| !he.is_boundary())
    }

    // ==================== Iteration ====================

    /// All vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// All half-edge ids.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All undirected edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.num_edges()).map(EdgeId::new)
    }

    /// All face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing half-edges of a vertex in cyclic order.
    ///
    /// For boundary vertices the walk starts at the outgoing boundary
    /// half-edge.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Incoming half-edges of a vertex, twins of [`Self::vertex_halfedges`]
    /// in the same order.
    pub fn incoming_halfedges(&self, v: VertexId<I>) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.vertex_halfedges(v).map(HalfEdgeId::twin)
    }

    /// One-ring neighbours in cyclic order.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(move |he| self.dest(he))
    }

    /// Faces around a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(move |he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Number of neighbours of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Vertices of a triangle in winding order.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Corner positions of a triangle in winding order.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    /// Centroid of a triangle.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Area of a triangle.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Vector from the start to the end of a half-edge.
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Axis-aligned bounding box, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.inf(&v.position), hi.sup(&v.position))
        }))
    }

    // ==================== Validation ====================

    /// Check connectivity invariants.
    pub fn is_valid(&self) -> bool {
        if self.halfedges.len() % 2 != 0 {
            return false;
        }
        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.origin(v.halfedge).index() != i {
                return false;
            }
        }
        for he in self.halfedge_ids() {
            let next = self.next(he);
            let prev = self.prev(he);
            if !next.is_valid() || !prev.is_valid() {
                return false;
            }
            if self.prev(next) != he || self.next(prev) != he {
                return false;
            }
            if self.origin(next) != self.dest(he) {
                return false;
            }
            if self.face_of(next) != self.face_of(he) {
                return false;
            }
        }
        self.faces.iter().all(|f| f.halfedge.is_valid())
    }
}

/// Iterator over the outgoing half-edges of a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.current;
        // v -> w, twin w -> v, then the half-edge after it leaves v again.
        self.current = self.mesh.next(self.current.twin());
        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{flat_grid, icosahedron};

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_edges(), 0);
        assert!(mesh.bounding_box().is_none());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_icosahedron_queries() {
        let mesh = icosahedron();
        assert_eq!(mesh.num_vertices(), 12);
        assert_eq!(mesh.num_faces(), 20);
        assert_eq!(mesh.num_edges(), 30);
        assert!(mesh.is_closed());
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.valence(v), 5);
            assert!(!mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_incoming_matches_outgoing() {
        let mesh = icosahedron();
        let v = VertexId::new(3);
        for (out, inc) in mesh.vertex_halfedges(v).zip(mesh.incoming_halfedges(v)) {
            assert_eq!(mesh.origin(out), v);
            assert_eq!(mesh.dest(inc), v);
            assert_eq!(mesh.origin(inc), mesh.dest(out));
        }
    }

    #[test]
    fn test_neighbors_are_cyclic() {
        // Consecutive neighbours of an interior vertex share a face with it.
        let mesh = flat_grid(3);
        let v = VertexId::new(5);
        let ring: Vec<_> = mesh.vertex_neighbors(v).collect();
        assert_eq!(ring.len(), 6);
        for j in 0..ring.len() {
            let a = ring[j];
            let b = ring[(j + 1) % ring.len()];
            assert!(mesh.vertex_neighbors(a).any(|n| n == b));
        }
    }

    #[test]
    fn test_boundary_queries() {
        let mesh = flat_grid(2);
        assert!(!mesh.is_closed());
        assert!(mesh.is_boundary_vertex(VertexId::new(0)));
        assert!(!mesh.is_boundary_vertex(VertexId::new(4)));
        // Boundary vertices start their one-ring at the boundary gap.
        let first = mesh.vertex_halfedges(VertexId::new(1)).next().unwrap();
        assert!(mesh.is_boundary_halfedge(first));
        let boundary_edges = mesh.edge_ids().filter(|&e| mesh.is_boundary_edge(e)).count();
        assert_eq!(boundary_edges, 8);
        // An open fan has one face fewer than it has neighbours.
        assert_eq!(mesh.vertex_faces(VertexId::new(4)).count(), 6);
        assert!(mesh.vertex_faces(VertexId::new(1)).count() < mesh.valence(VertexId::new(1)));
    }

    #[test]
    fn test_face_geometry() {
        let mesh = flat_grid(1);
        let total: f64 = mesh.face_ids().map(|f| mesh.face_area(f)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        let c = mesh.face_centroid(FaceId::new(0));
        assert!(c.z.abs() < 1e-12);
        let (lo, hi) = mesh.bounding_box().unwrap();
        assert_eq!(lo, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(hi, Point3::new(1.0, 1.0, 0.0));
    }
}
