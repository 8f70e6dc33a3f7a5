use std::io::{self, Write};

use crate::io::{
    DEFAULT_PRECISION, Error, MemSource, StreamSink,
    float::write_floats3,
    util::VertexIndices,
};


// ----------------------------------------------------------------------------

/// The configuration for an OFF writer. Create an instance with
/// [`Config::new`], change settings with the builder methods and finally
/// create a [`Writer`] with [`Config::into_writer`].
#[derive(Clone, Debug)]
pub struct Config {
    precision: usize,
    comments: Vec<String>,
}

impl Config {
    /// Creates a new configuration with default values: no comments and
    /// [`DEFAULT_PRECISION`] significant digits.
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            comments: vec![],
        }
    }

    /// Sets the number of significant digits written for coordinates.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Adds a comment line after the `OFF` keyword. Panics if the comment
    /// contains a line break.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        assert!(
            !comment.contains('\n') && !comment.contains('\r'),
            "OFF comments must not contain line breaks",
        );

        self.comments.push(comment);
        self
    }

    /// Creates a [`Writer`] with `self` as config.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}


// ----------------------------------------------------------------------------

/// A writer for OFF files. Implements [`StreamSink`].
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
        let w = &mut self.writer;
        let precision = self.config.precision;

        w.write_all(b"OFF\n")?;
        for comment in &self.config.comments {
            writeln!(w, "# {}", comment)?;
        }

        // We don't know the number of edges. Zero is what everyone writes in
        // that case and readers ignore the value anyway.
        writeln!(w, "{} {} 0", src.num_vertices(), src.num_faces())?;

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

        w.flush()?;
        Ok(())
    }
}
