//! UV coordinate storage.

use std::marker::PhantomData;

use nalgebra::Point2;

use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// UV coordinates for mesh vertices.
///
/// Indexed by vertex: entry `i` holds the coordinates of vertex `i`. Harmonic
/// parameterization reads the boundary entries as input and overwrites the
/// interior ones.
///
/// # Example
///
/// ```
/// use coral::algo::parameterize::UVMap;
/// use coral::mesh::VertexId;
/// use nalgebra::Point2;
///
/// let mut uv: UVMap = UVMap::zeros(3);
/// uv.set(VertexId::new(1), Point2::new(1.0, 0.5));
/// assert_eq!(uv.get(VertexId::new(1)).y, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UVMap<I: MeshIndex = u32> {
    coords: Vec<Point2<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> UVMap<I> {
    /// Create a UV map from per-vertex coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self {
            coords,
            _marker: PhantomData,
        }
    }

    /// Create a UV map filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self::new(vec![Point2::origin(); n])
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId<I>, uv: Point2<f64>) {
        self.coords[v.index()] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex IDs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (VertexId::new(i), uv))
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        Some(self.coords.iter().fold((first, first), |(min, max), uv| {
            (
                Point2::new(min.x.min(uv.x), min.y.min(uv.y)),
                Point2::new(max.x.max(uv.x), max.y.max(uv.y)),
            )
        }))
    }

    /// Normalize UV coordinates to fit within [0, 1] range.
    ///
    /// Maintains aspect ratio by scaling uniformly based on the larger dimension.
    pub fn normalize(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let scale = (max.x - min.x).max(max.y - min.y);
            if scale > 1e-10 {
                for uv in &mut self.coords {
                    uv.x = (uv.x - min.x) / scale;
                    uv.y = (uv.y - min.y) / scale;
                }
            }
        }
    }

    /// Signed area of face `f` in UV space; positive when the face keeps its
    /// counter-clockwise winding.
    pub fn signed_area(&self, mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> f64 {
        let [a, b, c] = mesh.face_triangle(f).map(|v| self.get(v));
        0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
    }

    /// Number of faces whose UV image is flipped or collapsed.
    pub fn flipped_faces(&self, mesh: &HalfEdgeMesh<I>) -> usize {
        mesh.face_ids()
            .filter(|&f| self.signed_area(mesh, f) <= 0.0)
            .count()
    }
}
