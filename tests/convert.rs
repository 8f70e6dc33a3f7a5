//! Converting the files in `tests/files` between all formats.

use std::{fs, path::{Path, PathBuf}};

use meshconv::{
    PolyMesh,
    convert::{convert, ConvertConfig, Error, Summary},
    io::{self, FileFormat},
};


fn input(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/files").join(name)
}

fn convert_paths(input: &Path, output: &Path) -> Result<Summary, Error> {
    convert(&ConvertConfig::new(input, output)?)
}

/// Asserts that both meshes have the same faces and (within `eps`) the same
/// positions.
fn assert_same_mesh(a: &PolyMesh, b: &PolyMesh, eps: f64) {
    assert_eq!(a.num_vertices(), b.num_vertices());
    assert_eq!(a.num_faces(), b.num_faces());

    for (va, vb) in a.vertex_handles().zip(b.vertex_handles()) {
        let (pa, pb) = (a.position(va), b.position(vb));
        assert!(
            (pa.x - pb.x).abs() <= eps && (pa.y - pb.y).abs() <= eps && (pa.z - pb.z).abs() <= eps,
            "{:?} != {:?}",
            pa,
            pb,
        );
    }
    for (fa, fb) in a.face_handles().zip(b.face_handles()) {
        assert_eq!(a.vertices_of_face(fa), b.vertices_of_face(fb));
    }
}


#[test]
fn cube_obj_to_stl() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cube.stl");

    let summary = convert_paths(&input("cube.obj"), &out).unwrap();
    assert_eq!(summary.source_format, FileFormat::Obj);
    assert_eq!(summary.target_format, FileFormat::Stl);
    assert_eq!(summary.num_vertices, 8);
    assert_eq!(summary.num_faces, 12);

    // Binary STL: 80 byte header, triangle count, 50 bytes per triangle
    let data = fs::read(&out).unwrap();
    assert_eq!(data.len(), 84 + 12 * 50);
    assert_eq!(&data[80..84], &12u32.to_le_bytes());

    let mesh = io::read_file(&out).unwrap();
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.num_faces(), 12);
}

#[test]
fn empty_txt_to_off() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.off");

    let err = convert_paths(&input("empty.txt"), &out).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(!out.exists());
}

#[test]
fn invalid_inputs() {
    let dir = tempfile::tempdir().unwrap();

    for name in &["empty.txt", "broken_index.obj", "missing_z.ply", "does_not_exist.obj"] {
        let out = dir.path().join("out.ply");
        let err = convert_paths(&input(name), &out).unwrap_err();

        assert!(matches!(err, Error::InputLoad { .. }), "{}: {:?}", name, err);
        assert!(!out.exists(), "{} created the output file", name);
    }
}

#[test]
fn round_trip_through_all_formats() {
    let dir = tempfile::tempdir().unwrap();
    let original = io::read_file(input("pyramid.off")).unwrap();

    for &format in &[FileFormat::Obj, FileFormat::Ply] {
        let there = dir.path().join(format!("pyramid.{}", format.extension()));
        let back = dir.path().join(format!("pyramid_from_{}.off", format.extension()));

        convert_paths(&input("pyramid.off"), &there).unwrap();
        convert_paths(&there, &back).unwrap();

        let mesh = io::read_file(&back).unwrap();
        assert_eq!(mesh, original, "round trip through {}", format);
    }

    // STL splits the quad and stores `f32`
    let there = dir.path().join("pyramid.stl");
    let back = dir.path().join("pyramid_from_stl.off");
    convert_paths(&input("pyramid.off"), &there).unwrap();
    let summary = convert_paths(&there, &back).unwrap();
    assert_eq!(summary.num_vertices, 5);
    assert_eq!(summary.num_faces, 6);

    // Vertices are stored per triangle in STL, so their order changes.
    let mesh = io::read_file(&back).unwrap();
    for orig in original.vertex_handles() {
        let q = original.position(orig);
        let found = mesh.vertex_handles().map(|vh| mesh.position(vh)).any(|p| {
            (p.x - q.x).abs() < 1e-6 && (p.y - q.y).abs() < 1e-6 && (p.z - q.z).abs() < 1e-6
        });
        assert!(found, "{:?} got lost", q);
    }
}

#[test]
fn text_formats_use_17_digits() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pyramid.obj");
    convert_paths(&input("pyramid.off"), &out).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("v 0.33333333333333331 0.10000000000000001 1.4142135623730951\n"));

    let original = io::read_file(input("pyramid.off")).unwrap();
    assert_same_mesh(&io::read_file(&out).unwrap(), &original, 0.0);
}

#[test]
fn conversion_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();

    for ext in &["obj", "off", "ply", "stl"] {
        let out = dir.path().join(format!("cube.{}", ext));

        convert_paths(&input("cube.obj"), &out).unwrap();
        let first = fs::read(&out).unwrap();
        convert_paths(&input("cube.obj"), &out).unwrap();
        let second = fs::read(&out).unwrap();

        assert_eq!(first, second, "{} output differs", ext);
    }
}

#[test]
fn unknown_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cube.3ds");

    let err = convert_paths(&input("cube.obj"), &out).unwrap_err();
    assert!(matches!(err, Error::OutputWrite { cause: io::Error::UnknownFormat(_), .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(!out.exists());
}

#[test]
fn output_into_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("no/such/dir/cube.ply");

    let err = convert_paths(&input("cube.obj"), &out).unwrap_err();
    assert!(matches!(err, Error::OutputWrite { cause: io::Error::Io(_), .. }));
}
