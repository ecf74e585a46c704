//! Indexed triangle mesh assembled from face triangulations.

use std::collections::HashMap;

use rigidcad_math::{BoundingBox, Point3};

/// Indexed triangle mesh with exact-duplicate vertices merged.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangles as indices into `vertices`.
    pub indices: Vec<[u32; 3]>,
    lookup: HashMap<[u64; 3], u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Number of distinct vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn vertex_index(&mut self, p: &Point3) -> u32 {
        let key = point_key(p);
        if let Some(&i) = self.lookup.get(&key) {
            return i;
        }
        let i = self.vertices.len() as u32;
        self.vertices.push(*p);
        self.lookup.insert(key, i);
        i
    }

    /// Append a triangle, reusing identical vertices.
    pub fn add_triangle(&mut self, tri: &[Point3; 3]) {
        let a = self.vertex_index(&tri[0]);
        let b = self.vertex_index(&tri[1]);
        let c = self.vertex_index(&tri[2]);
        self.indices.push([a, b, c]);
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        for tri in other.triangles() {
            self.add_triangle(&tri);
        }
    }

    /// Triangles with their vertex positions resolved.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.indices.iter().map(|&[a, b, c]| {
            [
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            ]
        })
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}

/// Exact hash key of a vertex.
pub(crate) fn point_key(p: &Point3) -> [u64; 3] {
    // + 0.0 folds -0.0 into 0.0 so both hash alike
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}
