//! Small utility items used in the `io` module.

use fxhash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{
    FaceVertices,
    handle::{DefaultIndex, Handle, VertexHandle},
    io::MemSource,
};


/// Maps vertex handles of a [`MemSource`] to the 0-based index the vertex has
/// in the written file.
///
/// Most sources list their vertices as `V0, V1, V2, ...`; in that case no map
/// is built and the handle index is used directly.
#[derive(Debug)]
pub(crate) struct VertexIndices {
    map: Option<FxHashMap<VertexHandle, DefaultIndex>>,
}

impl VertexIndices {
    pub(crate) fn new(src: &impl MemSource) -> Self {
        let is_identity = src.vertices().enumerate().all(|(i, vh)| vh.to_usize() == i);
        let map = if is_identity {
            None
        } else {
            Some(src.vertices().zip(0..).collect())
        };

        Self { map }
    }

    /// Returns the file index of the given vertex. Panics if the vertex is
    /// not part of the source this map was created from.
    pub(crate) fn get(&self, vh: VertexHandle) -> DefaultIndex {
        match &self.map {
            None => vh.idx(),
            Some(map) => map[&vh],
        }
    }
}


/// Faces up to this length are checked for repeated vertices by comparing
/// all pairs. Longer faces use a hash set.
const SMALL_FACE_LEN: usize = 16;

/// Returns `true` if a vertex appears more than once in the given face.
pub(crate) fn has_repeated_vertex(vertices: &[VertexHandle]) -> bool {
    if vertices.len() <= SMALL_FACE_LEN {
        vertices.iter().enumerate().any(|(i, a)| vertices[i + 1..].contains(a))
    } else {
        let mut seen = FxHashSet::default();
        !vertices.iter().all(|&vh| seen.insert(vh))
    }
}

/// Checks that a face has at least three vertices, that all of them exist in
/// a mesh with `num_vertices` vertices and that no vertex appears twice.
pub(crate) fn check_face(vertices: &[VertexHandle], num_vertices: DefaultIndex) -> Result<(), String> {
    if vertices.len() < 3 {
        return Err(format!(
            "face with {} vertices (at least 3 are required)",
            vertices.len(),
        ));
    }

    if let Some(vh) = vertices.iter().find(|vh| vh.idx() >= num_vertices) {
        return Err(format!(
            "face references vertex {} but there are only {} vertices",
            vh.idx(),
            num_vertices,
        ));
    }

    if has_repeated_vertex(vertices) {
        return Err("face references a vertex more than once".into());
    }

    Ok(())
}

/// Merges consecutive references to the same vertex (including the last and
/// the first one). Returns `None` if what remains is not a polygon the mesh
/// can store: fewer than three vertices or a vertex that still appears twice.
///
/// All readers drop such faces instead of rejecting the whole file.
pub(crate) fn simplify_face(mut face: FaceVertices) -> Option<FaceVertices> {
    face.dedup();
    while face.len() > 1 && face.first() == face.last() {
        face.pop();
    }

    if face.len() < 3 || has_repeated_vertex(&face) {
        None
    } else {
        Some(face)
    }
}

/// Turns 0-based vertex indices as read from a file into a list of vertex
/// handles. Indices out of range are an error; degenerate faces result in
/// `Ok(None)` (see [`simplify_face`]).
pub(crate) fn face_from_indices(
    indices: impl IntoIterator<Item = i64>,
    num_vertices: DefaultIndex,
) -> Result<Option<FaceVertices>, String> {
    let mut out = SmallVec::new();
    for idx in indices {
        if idx < 0 || idx >= i64::from(num_vertices) {
            return Err(format!(
                "face references vertex {} but there are only {} vertices",
                idx,
                num_vertices,
            ));
        }
        out.push(VertexHandle::from_usize(idx as usize));
    }

    Ok(simplify_face(out))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn handles(indices: &[u32]) -> Vec<VertexHandle> {
        indices.iter().map(|&i| VertexHandle::new(i)).collect()
    }

    #[test]
    fn valid_faces() {
        let face = face_from_indices(vec![0, 1, 2, 3], 4).unwrap().unwrap();
        assert_eq!(face.as_slice(), handles(&[0, 1, 2, 3]).as_slice());
    }

    #[test]
    fn out_of_range_indices() {
        assert!(face_from_indices(vec![0, 1, 4], 4).is_err());
        assert!(face_from_indices(vec![0, -1, 2], 4).is_err());

        // Even in faces that would be dropped
        assert!(face_from_indices(vec![0, 7], 4).is_err());
    }

    #[test]
    fn degenerate_faces_are_dropped() {
        assert_eq!(face_from_indices(Vec::<i64>::new(), 4), Ok(None));
        assert_eq!(face_from_indices(vec![0, 1], 4), Ok(None));
        assert_eq!(face_from_indices(vec![0, 1, 0], 4), Ok(None));
        assert_eq!(face_from_indices(vec![2, 2, 2], 4), Ok(None));

        // Pinched: vertex 0 is used twice, not next to each other
        assert_eq!(face_from_indices(vec![0, 1, 2, 0, 3, 1], 4), Ok(None));
    }

    #[test]
    fn consecutive_duplicates_are_merged() {
        let face = face_from_indices(vec![0, 1, 1, 2, 3, 0], 4).unwrap().unwrap();
        assert_eq!(face.as_slice(), handles(&[0, 1, 2, 3]).as_slice());
    }

    #[test]
    fn repeated_vertex_in_long_face() {
        let long = (0..1000).collect::<Vec<_>>();
        assert!(!has_repeated_vertex(&handles(&long)));

        let mut repeated = long.clone();
        repeated[900] = 17;
        assert!(has_repeated_vertex(&handles(&repeated)));
        assert!(has_repeated_vertex(&handles(&[3, 5, 3])));
        assert!(!has_repeated_vertex(&handles(&[3, 5, 4])));
    }

    #[test]
    fn check_face_is_strict() {
        assert!(check_face(&handles(&[0, 1, 2]), 3).is_ok());
        assert!(check_face(&handles(&[0, 1]), 3).is_err());
        assert!(check_face(&handles(&[0, 1, 3]), 3).is_err());
        assert!(check_face(&handles(&[0, 1, 0]), 3).is_err());
    }
}
