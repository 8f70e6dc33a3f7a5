use std::io::{self, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::{
    handle::DefaultIndex,
    io::{
        DEFAULT_PRECISION, Error, MemSource, StreamSink,
        float::write_floats3,
        util::VertexIndices,
    },
};
use super::{Encoding, ScalarType};


// ----------------------------------------------------------------------------

/// The configuration for a PLY writer. Create an instance with
/// [`Config::new`] (or one of the shortcuts), change settings with the builder
/// methods and finally create a [`Writer`] with [`Config::into_writer`].
#[derive(Clone, Debug)]
pub struct Config {
    encoding: Encoding,
    precision: usize,
    comments: Vec<String>,
}

impl Config {
    /// Creates a new configuration with the given encoding, no comments and
    /// [`DEFAULT_PRECISION`] significant digits for ASCII files.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            precision: DEFAULT_PRECISION,
            comments: vec![],
        }
    }

    /// Creates a new configuration for an ASCII file.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    /// Creates a new configuration for a little endian binary file.
    pub fn binary() -> Self {
        Self::new(Encoding::BinaryLittleEndian)
    }

    /// Sets the number of significant digits written for coordinates. Only
    /// used for ASCII files.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Adds a `comment` line to the header. Panics if the comment contains a
    /// line break.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        assert!(
            !comment.contains('\n') && !comment.contains('\r'),
            "PLY comments must not contain line breaks",
        );

        self.comments.push(comment);
        self
    }

    /// Creates a [`Writer`] with `self` as config.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }
}


// ----------------------------------------------------------------------------

/// A writer for PLY files. Implements [`StreamSink`].
///
/// Vertex positions are written as `double` properties `x`, `y` and `z`, faces
/// as `vertex_indices` list. The list length is stored as `uchar` if possible.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Creates a new writer. You can also use [`Config::into_writer`].
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }
}

impl<W: io::Write> StreamSink for Writer<W> {
    fn transfer_from<S: MemSource>(mut self, src: &S) -> Result<(), Error> {
        let types = IndexTypes::for_mesh(src);
        let w = &mut self.writer;

        // ===== Header ======================================================
        writeln!(w, "ply")?;
        writeln!(w, "format {} 1.0", self.config.encoding.ply_name())?;
        for comment in &self.config.comments {
            writeln!(w, "comment {}", comment)?;
        }

        writeln!(w, "element vertex {}", src.num_vertices())?;
        writeln!(w, "property double x")?;
        writeln!(w, "property double y")?;
        writeln!(w, "property double z")?;

        writeln!(w, "element face {}", src.num_faces())?;
        writeln!(w, "property list {} {} vertex_indices", types.len, types.index)?;
        writeln!(w, "end_header")?;

        // ===== Body ========================================================
        match self.config.encoding {
            Encoding::Ascii => write_ascii_body(w, src, self.config.precision)?,
            Encoding::BinaryBigEndian => write_binary_body::<BigEndian>(w, src, types)?,
            Encoding::BinaryLittleEndian => write_binary_body::<LittleEndian>(w, src, types)?,
        }

        w.flush()?;
        Ok(())
    }
}

/// The types of the face list: `uchar` list length, unless a face has more
/// than 255 vertices, and `int` indices, unless there are more vertices than
/// `i32` can address.
#[derive(Debug, Clone, Copy)]
struct IndexTypes {
    len: ScalarType,
    index: ScalarType,
}

impl IndexTypes {
    fn for_mesh(src: &impl MemSource) -> Self {
        let max_len = src.faces().map(|fh| src.vertices_of_face(fh).len()).max().unwrap_or(0);
        let len = if max_len <= u8::max_value() as usize {
            ScalarType::UChar
        } else {
            ScalarType::UInt
        };

        let index = if src.num_vertices() <= i32::max_value() as DefaultIndex {
            ScalarType::Int
        } else {
            ScalarType::UInt
        };

        Self { len, index }
    }
}

fn write_ascii_body(w: &mut impl Write, src: &impl MemSource, precision: usize) -> Result<(), Error> {
    for vh in src.vertices() {
        let p = src.vertex_position(vh);
        write_floats3(w, [p.x, p.y, p.z], precision)?;
        w.write_all(b"\n")?;
    }

    let indices = VertexIndices::new(src);
    for fh in src.faces() {
        let vertices = src.vertices_of_face(fh);
        write!(w, "{}", vertices.len())?;
        for &vh in vertices {
            write!(w, " {}", indices.get(vh))?;
        }
        w.write_all(b"\n")?;
    }

    Ok(())
}

fn write_binary_body<B: ByteOrder>(
    w: &mut impl Write,
    src: &impl MemSource,
    types: IndexTypes,
) -> Result<(), Error> {
    for vh in src.vertices() {
        let p = src.vertex_position(vh);
        w.write_f64::<B>(p.x)?;
        w.write_f64::<B>(p.y)?;
        w.write_f64::<B>(p.z)?;
    }

    let indices = VertexIndices::new(src);
    for fh in src.faces() {
        let vertices = src.vertices_of_face(fh);

        // The types were chosen so that these casts are lossless.
        match types.len {
            ScalarType::UChar => w.write_u8(vertices.len() as u8)?,
            _ => w.write_u32::<B>(vertices.len() as u32)?,
        }
        for &vh in vertices {
            let idx = indices.get(vh);
            match types.index {
                ScalarType::Int => w.write_i32::<B>(idx as i32)?,
                _ => w.write_u32::<B>(idx)?,
            }
        }
    }

    Ok(())
}
