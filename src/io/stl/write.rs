use std::io::{self, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use cgmath::{InnerSpace, Point3, Vector3};

use crate::io::{
    DEFAULT_PRECISION, Error, MemSource, StreamSink,
    float::write_floats3,
};
use super::{BINARY_TRIANGLE_SIZE, Encoding, RawTriangle};


// ----------------------------------------------------------------------------

/// The solid name used when the user didn't specify one.
const DEFAULT_SOLID_NAME: &str = "mesh";

/// Maximum number of bytes of the solid name stored in the binary header
/// (after the `"meshconv "` signature).
const MAX_HEADER_NAME_LEN: usize = 80 - 9;


// ===========================================================================
// ===== STL Config
// ===========================================================================

/// Used to configure and create a [`Writer`].
///
/// This is used to configure basic settings for the file to be written. You
/// can use the [`Config::into_writer`] method to create a [`Writer`] that can
/// be used as streaming sink.
#[derive(Clone, Debug)]
pub struct Config {
    solid_name: String,
    encoding: Encoding,
    precision: usize,
}

impl Config {
    /// Creates a new builder instance from the given encoding. For
    /// convenience, you can use [`Config::binary()`] or [`Config::ascii()`]
    /// directly.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            solid_name: DEFAULT_SOLID_NAME.into(),
            encoding,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Creates a new builder instance for a binary STL file.
    pub fn binary() -> Self {
        Self::new(Encoding::Binary)
    }

    /// Creates a new builder instance for an ASCII STL file.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    /// Sets the solid name for this file.
    ///
    /// The given name must be an ASCII string without line breaks (otherwise
    /// the function panics). If a binary file is written, only the first 71
    /// bytes of the name are stored in the header.
    pub fn with_solid_name(self, name: impl Into<String>) -> Self {
        let solid_name = name.into();
        assert!(solid_name.is_ascii(), "STL solid name must be ASCII");
        assert!(
            !solid_name.contains('\n') && !solid_name.contains('\r'),
            "STL solid name must not contain line breaks",
        );

        Self { solid_name, .. self }
    }

    /// Sets the number of significant digits written for coordinates. Only
    /// used for ASCII files.
    pub fn with_precision(self, precision: usize) -> Self {
        Self { precision, .. self }
    }

    /// Creates a [`Writer`] with `self` as config.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }
}


// ===========================================================================
// ===== STL Writer
// ===========================================================================

/// A writer able to write binary and ASCII STL files. Implements
/// [`StreamSink`].
///
/// STL can only store triangles: faces with more vertices are split into a
/// fan of triangles around their first vertex. Normals are calculated from
/// the vertex positions.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Creates a new STL writer with the given STL config which will write to
    /// the given `io::Write` instance.
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }

    /// Low level function to write STL files.
    ///
    /// `num_triangles` is only used for binary files and has to match the
    /// number of triangles yielded by the iterator.
    pub fn write_raw(
        self,
        num_triangles: u32,
        triangles: impl IntoIterator<Item = Result<RawTriangle, Error>>,
    ) -> Result<(), Error> {
        if self.config.encoding == Encoding::Ascii {
            self.write_raw_ascii(triangles)
        } else {
            self.write_raw_binary(num_triangles, triangles)
        }
    }

    fn write_raw_binary(
        self,
        num_triangles: u32,
        triangles: impl IntoIterator<Item = Result<RawTriangle, Error>>,
    ) -> Result<(), Error> {
        let config = self.config;
        let mut w = self.writer;

        // First, a 80 bytes header that must not begin with "solid". We try
        // to fit the solid name in it.
        let name_len = config.solid_name.len().min(MAX_HEADER_NAME_LEN);
        let signature = format!("meshconv {}", &config.solid_name[..name_len]);
        let padding = vec![b' '; 80 - signature.len()];
        w.write_all(signature.as_bytes())?;
        w.write_all(&padding)?;

        w.write_u32::<LittleEndian>(num_triangles)?;

        let mut buf = [0; BINARY_TRIANGLE_SIZE as usize];
        for triangle in triangles {
            let triangle = triangle?;

            let values = triangle.normal.iter().chain(triangle.vertices.iter().flat_map(|v| v));
            for (i, &v) in values.enumerate() {
                let single = v as f32;
                if !single.is_finite() {
                    return Err(Error::Unrepresentable(format!(
                        "value {} can't be stored as 32 bit float in a binary STL file",
                        v,
                    )));
                }
                LittleEndian::write_f32(&mut buf[i * 4..i * 4 + 4], single);
            }
            LittleEndian::write_u16(&mut buf[48..50], triangle.attribute_byte_count);

            w.write_all(&buf)?;
        }

        w.flush()?;
        Ok(())
    }

    fn write_raw_ascii(
        self,
        triangles: impl IntoIterator<Item = Result<RawTriangle, Error>>,
    ) -> Result<(), Error> {
        let config = self.config;
        let mut w = self.writer;

        writeln!(w, "solid {}", config.solid_name)?;

        for triangle in triangles {
            let triangle = triangle?;

            write!(w, "  facet normal ")?;
            write_floats3(&mut w, triangle.normal, config.precision)?;
            writeln!(w)?;

            writeln!(w, "    outer loop")?;
            for &vertex_pos in &triangle.vertices {
                write!(w, "      vertex ")?;
                write_floats3(&mut w, vertex_pos, config.precision)?;
                writeln!(w)?;
            }

            writeln!(w, "    endloop")?;
            writeln!(w, "  endfacet")?;
        }

        writeln!(w, "endsolid {}", config.solid_name)?;

        w.flush()?;
        Ok(())
    }
}

impl<W: io::Write> StreamSink for Writer<W> {
    fn transfer_from<S: MemSource>(self, src: &S) -> Result<(), Error> {
        // A face with `n` vertices is split into `n - 2` triangles.
        let num_triangles: u64 = src.faces()
            .map(|fh| (src.vertices_of_face(fh).len() as u64).saturating_sub(2))
            .sum();
        if num_triangles > u64::from(u32::max_value()) {
            return Err(Error::Unrepresentable(format!(
                "the mesh has {} triangles, but STL can store at most {}",
                num_triangles,
                u32::max_value(),
            )));
        }

        // Faces with fewer than three vertices result in no triangles.
        let triangles = src.faces().flat_map(|fh| {
            let vertices = src.vertices_of_face(fh);
            let a = vertices.first().map(|&vh| src.vertex_position(vh));
            let rest = vertices.get(1..).unwrap_or(&[]);
            rest.windows(2).filter_map(move |w| {
                let a = a?;
                let b = src.vertex_position(w[0]);
                let c = src.vertex_position(w[1]);

                Some(Ok(RawTriangle {
                    normal: calc_normal(a, b, c),
                    vertices: [a.into(), b.into(), c.into()],

                    // Usually zero, since most software doesn't understand
                    // anything else.
                    attribute_byte_count: 0,
                }))
            })
        });

        self.write_raw(num_triangles as u32, triangles)
    }
}

/// Calculates the normal of the given triangle (with CCW vertex order). Returns
/// the zero vector for degenerate triangles.
fn calc_normal(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> [f64; 3] {
    let cross: Vector3<f64> = (b - a).cross(c - a);
    let len2 = cross.magnitude2();
    if len2 == 0.0 || !len2.is_finite() {
        return [0.0; 3];
    }

    // Adding `0.0` turns `-0.0` into `0.0`.
    let n = cross / len2.sqrt();
    [n.x + 0.0, n.y + 0.0, n.z + 0.0]
}
