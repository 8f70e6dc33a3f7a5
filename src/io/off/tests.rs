use crate::{
    PolyMesh,
    io::{IsFormat, StreamSink, StreamSource},
    test_utils::{mesh_from, quad_and_triangle},
};
use super::*;


fn read(data: &[u8]) -> Result<PolyMesh, crate::io::Error> {
    let mut mesh = PolyMesh::empty();
    Reader::new(data).transfer_to(&mut mesh)?;
    Ok(mesh)
}

#[test]
fn write_quad_and_triangle() -> Result<(), crate::io::Error> {
    let mut out = Vec::new();
    Config::new().into_writer(&mut out).transfer_from(&quad_and_triangle())?;
    assert_eq_file!(&out, "quad_and_triangle.off");

    Ok(())
}

#[test]
fn write_with_comment() -> Result<(), crate::io::Error> {
    let mesh = mesh_from(&[[0.5, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[&[2, 1, 0]]);

    let mut out = Vec::new();
    Config::new().add_comment("hello").into_writer(&mut out).transfer_from(&mesh)?;
    assert_eq!(
        std::str::from_utf8(&out).unwrap(),
        "OFF\n# hello\n3 1 0\n0.5 0 0\n1 0 0\n0 1 0\n3 2 1 0\n",
    );

    Ok(())
}

#[test]
fn read_written_file() -> Result<(), crate::io::Error> {
    let mesh = read(include_test_file!("quad_and_triangle.off").into_inner())?;
    assert_eq!(mesh, quad_and_triangle());

    Ok(())
}

#[test]
fn read_colored() -> Result<(), crate::io::Error> {
    let mesh = read(include_test_file!("colored.off").into_inner())?;
    let expected = mesh_from(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        &[&[0, 1, 2], &[0, 2, 3]],
    );
    assert_eq!(mesh, expected);

    Ok(())
}

#[test]
fn read_counts_on_header_line() -> Result<(), crate::io::Error> {
    let mesh = read(include_test_file!("counts_on_header_line.off").into_inner())?;
    assert_eq!(mesh, crate::test_utils::triangle());

    Ok(())
}

#[test]
fn read_without_edge_count() -> Result<(), crate::io::Error> {
    let mesh = read(b"NOFF\n3 1\n0 0 0 0 0 1\n1 0 0 0 0 1\n0 1 0 0 0 1\n3 0 1 2\n")?;
    assert_eq!(mesh, crate::test_utils::triangle());

    Ok(())
}

#[test]
fn read_invalid() {
    let cases: &[&[u8]] = &[
        b"",
        b"# nothing but comments\n",
        b"OF\n3 1 0\n",
        b"PLY\n3 1 0\n",
        b"4OFF\n1 0 0\n0 0 0 0\n",
        b"nOFF\n3\n1 0 0\n0 0 0\n",
        b"OFF BINARY\n",
        // Missing counts
        b"OFF\n",
        b"OFF\n3\n",
        b"OFF\nthree 1 0\n",
        // Too few vertices or faces
        b"OFF\n3 1 0\n0 0 0\n1 0 0\n",
        b"OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n",
        // Bad vertices
        b"OFF\n3 0 0\n0 0 0\n1 0\n0 1 0\n",
        b"OFF\n3 0 0\n0 0 0\n1 0 inf\n0 1 0\n",
        // Bad faces
        b"OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1\n",
        b"OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 3\n",
        b"OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 -1\n",
    ];

    for &data in cases {
        assert!(
            read(data).is_err(),
            "reading {:?} should fail",
            String::from_utf8_lossy(data),
        );
    }
}

#[test]
fn keyword() {
    for &kw in &["OFF", "COFF", "NOFF", "CNOFF", "STOFF", "STCOFF", "STCNOFF"] {
        assert_eq!(parse_keyword(kw), Some(Keyword { other_dimension: false }), "{}", kw);
    }
    for &kw in &["4OFF", "nOFF", "C4OFF", "4nOFF"] {
        assert_eq!(parse_keyword(kw), Some(Keyword { other_dimension: true }), "{}", kw);
    }
    for &kw in &["off", "OF", "NCOFF", "XOFF", "OFFX", ""] {
        assert_eq!(parse_keyword(kw), None, "{}", kw);
    }
}

#[test]
fn file_start() {
    assert_eq!(is_file_start(b"OFF\n3 1 0\n"), IsFormat::Probably);
    assert_eq!(is_file_start(b"# comment\n\n  COFF 8 12 0\n"), IsFormat::Probably);
    assert_eq!(is_file_start(b"OFF"), IsFormat::Probably);

    assert_eq!(is_file_start(b""), IsFormat::No);
    assert_eq!(is_file_start(b"v 1 2 3\n"), IsFormat::No);
    assert_eq!(is_file_start(b"ply\nformat ascii 1.0\n"), IsFormat::No);
    assert_eq!(is_file_start(b"solid OFF\n"), IsFormat::No);
}
