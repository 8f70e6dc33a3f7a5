//! Helpers shared by the unit tests of the format modules.

use cgmath::Point3;

use crate::{PolyMesh, VertexHandle};


pub(crate) fn file_failure(actual: &[u8], expected: &[u8], filename: &str) {
    use std::fmt::Write;

    let mut msg = String::new();

    writeln!(msg, "===== Expected data ('{}')", filename).unwrap();
    write_data(&mut msg, expected);
    writeln!(msg).unwrap();

    writeln!(msg, "===== Actual data").unwrap();
    write_data(&mut msg, actual);

    panic!("written data does not match test file: \n{}", msg);

    fn write_data(msg: &mut String, data: &[u8]) {
        match std::str::from_utf8(data) {
            Ok(s) if !data.contains(&0) => writeln!(msg, "{}", s).unwrap(),
            _ => {
                for chunk in data.chunks(32) {
                    for b in chunk {
                        write!(msg, "{:02x} ", b).unwrap();
                    }
                    writeln!(msg).unwrap();
                }
            }
        }
    }
}

/// Compares the given bytes with the content of a file in the `test_files/`
/// directory next to the calling module.
macro_rules! assert_eq_file {
    ($actual:expr, $filename:expr) => {
        let actual = $actual as &[u8];
        let expected = include_bytes!(concat!("test_files/", $filename)) as &[u8];
        if actual != expected {
            crate::test_utils::file_failure(actual, expected, $filename);
        }
    }
}

/// Returns a `Cursor` over a file in the `test_files/` directory next to the
/// calling module.
macro_rules! include_test_file {
    ($filename:expr) => {{
        let bytes = include_bytes!(concat!("test_files/", $filename)) as &[u8];
        std::io::Cursor::new(bytes)
    }}
}


/// Builds a mesh from positions and faces given as 0-based indices.
pub(crate) fn mesh_from(positions: &[[f64; 3]], faces: &[&[u32]]) -> PolyMesh {
    let mut mesh = PolyMesh::empty();
    for &[x, y, z] in positions {
        mesh.add_vertex(Point3::new(x, y, z));
    }
    for face in faces {
        let vertices = face.iter().map(|&i| VertexHandle::new(i)).collect::<Vec<_>>();
        mesh.add_face(&vertices);
    }

    mesh
}

/// A single triangle.
pub(crate) fn triangle() -> PolyMesh {
    mesh_from(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        &[&[0, 1, 2]],
    )
}

/// A unit quad next to a triangle, sharing one edge. The coordinates need
/// all 17 digits to survive a round trip through a text format.
pub(crate) fn quad_and_triangle() -> PolyMesh {
    mesh_from(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 2.0 / 3.0, 1e-7],
        ],
        &[&[0, 1, 2, 3], &[3, 2, 4]],
    )
}

/// The unit cube with 8 vertices and 12 outward facing triangles.
pub(crate) fn cube() -> PolyMesh {
    mesh_from(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        &[
            // bottom
            &[0, 2, 1], &[0, 3, 2],
            // top
            &[4, 5, 6], &[4, 6, 7],
            // front
            &[0, 1, 5], &[0, 5, 4],
            // right
            &[1, 2, 6], &[1, 6, 5],
            // back
            &[2, 3, 7], &[2, 7, 6],
            // left
            &[3, 0, 4], &[3, 4, 7],
        ],
    )
}
