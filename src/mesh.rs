use cgmath::Point3;
use smallvec::SmallVec;

use crate::{
    handle::{DefaultIndex, FaceHandle, Handle, VertexHandle},
    io::{MemSink, MemSource},
};


/// The vertices of one face in the order they are stored in the file. Faces
/// with up to four vertices (triangles and quads) don't allocate.
pub type FaceVertices = SmallVec<[VertexHandle; 4]>;

/// A shared-vertex polygon mesh with `f64` vertex positions.
///
/// Each face stores the handles of its vertices; there is no additional
/// connectivity information. This is all that's needed to move a mesh from
/// one file format into another.
///
/// The mesh does not check its input: [`PolyMesh::add_face`] expects
/// existing, pairwise distinct vertices. The readers in [`crate::io`] check
/// this before adding a face. [`PolyMesh::check`] can be used to verify the
/// invariants of a mesh built by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<FaceVertices>,
}

impl PolyMesh {
    /// Returns a mesh without vertices and faces.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> DefaultIndex {
        self.positions.len() as DefaultIndex
    }

    pub fn num_faces(&self) -> DefaultIndex {
        self.faces.len() as DefaultIndex
    }

    /// Adds a vertex with the given position and returns its handle.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexHandle {
        let vh = VertexHandle::from_usize(self.positions.len());
        self.positions.push(position);
        vh
    }

    /// Adds a face with the given vertices (in the order they should be
    /// written to a file).
    ///
    /// Panics (in debug mode) if a handle refers to a vertex that doesn't
    /// exist.
    pub fn add_face(&mut self, vertices: &[VertexHandle]) -> FaceHandle {
        debug_assert!(
            vertices.iter().all(|vh| vh.to_usize() < self.positions.len()),
            "face {:?} references non-existent vertices",
            vertices,
        );

        let fh = FaceHandle::from_usize(self.faces.len());
        self.faces.push(vertices.into());
        fh
    }

    /// Returns the position of the given vertex. Panics if the handle is
    /// invalid.
    pub fn position(&self, vh: VertexHandle) -> Point3<f64> {
        self.positions[vh.to_usize()]
    }

    /// Returns all vertices of the given face. Panics if the handle is
    /// invalid.
    pub fn vertices_of_face(&self, fh: FaceHandle) -> &[VertexHandle] {
        &self.faces[fh.to_usize()]
    }

    pub fn vertex_handles(&self) -> impl Iterator<Item = VertexHandle> {
        (0..self.positions.len()).map(VertexHandle::from_usize)
    }

    pub fn face_handles(&self) -> impl Iterator<Item = FaceHandle> {
        (0..self.faces.len()).map(FaceHandle::from_usize)
    }

    /// Returns `true` if every face is a triangle.
    pub fn is_triangle_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.len() == 3)
    }

    /// Checks the invariants all meshes produced by the readers in this crate
    /// satisfy: every face has at least three pairwise distinct, existing
    /// vertices and all positions are finite.
    ///
    /// Returns a description of the first violation.
    pub fn check(&self) -> Result<(), String> {
        for (i, p) in self.positions.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(format!("vertex {} has a non-finite position {:?}", i, p));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            crate::io::util::check_face(face, self.num_vertices())
                .map_err(|msg| format!("face {}: {}", i, msg))?;
        }

        Ok(())
    }
}

/// Upper bound for preallocation from size hints. Hints come from file
/// headers and a broken header must not make us allocate gigabytes up front.
const MAX_RESERVE: DefaultIndex = 1 << 22;

impl MemSink for PolyMesh {
    fn size_hint(&mut self, num_vertices: DefaultIndex, num_faces: DefaultIndex) {
        self.positions.reserve(num_vertices.min(MAX_RESERVE) as usize);
        self.faces.reserve(num_faces.min(MAX_RESERVE) as usize);
    }

    fn add_vertex(&mut self, position: Point3<f64>) -> VertexHandle {
        PolyMesh::add_vertex(self, position)
    }

    fn add_face(&mut self, vertices: &[VertexHandle]) -> FaceHandle {
        PolyMesh::add_face(self, vertices)
    }
}

impl MemSource for PolyMesh {
    fn num_vertices(&self) -> DefaultIndex {
        PolyMesh::num_vertices(self)
    }

    fn num_faces(&self) -> DefaultIndex {
        PolyMesh::num_faces(self)
    }

    fn vertices(&self) -> Box<dyn Iterator<Item = VertexHandle> + '_> {
        Box::new(self.vertex_handles())
    }

    fn faces(&self) -> Box<dyn Iterator<Item = FaceHandle> + '_> {
        Box::new(self.face_handles())
    }

    fn vertex_position(&self, vh: VertexHandle) -> Point3<f64> {
        self.position(vh)
    }

    fn vertices_of_face(&self, fh: FaceHandle) -> &[VertexHandle] {
        PolyMesh::vertices_of_face(self, fh)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_query() {
        let mut mesh = PolyMesh::empty();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let f = mesh.add_face(&[a, b, c, d]);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.vertices_of_face(f), &[a, b, c, d]);
        assert_eq!(mesh.position(c), Point3::new(1.0, 1.0, 0.0));
        assert!(!mesh.is_triangle_mesh());
        assert_eq!(mesh.vertex_handles().collect::<Vec<_>>(), vec![a, b, c, d]);
        assert_eq!(mesh.check(), Ok(()));
    }

    #[test]
    fn check_finds_violations() {
        let mut mesh = PolyMesh::empty();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_face(&[a, b, a]);
        assert!(mesh.check().is_err());

        let mut mesh = PolyMesh::empty();
        mesh.add_vertex(Point3::new(0.0, std::f64::NAN, 0.0));
        assert!(mesh.check().is_err());
    }
}
