//! Reading and writing mesh files.
//!
//! The two high level functions are [`read_file`] and [`write_file`]. The
//! former detects the file format from the extension (or, if that doesn't
//! work, from the start of the file), the latter uses the extension of the
//! target path only.
//!
//! Each supported format has its own module with a `Reader` (implementing
//! [`StreamSource`]) and a `Writer` (implementing [`StreamSink`]). Readers
//! push vertices and faces into a [`MemSink`], writers pull them from a
//! [`MemSource`]. [`PolyMesh`] implements both.
//!
//! All readers treat faces the same way: indices of vertices that don't
//! exist are an error, while degenerate faces (fewer than three distinct
//! vertices) are silently dropped.

use std::{
    convert::TryFrom,
    fmt,
    fs::{self, File},
    io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write},
    path::Path,
};

use cgmath::Point3;
use failure::Fail;

use crate::{
    PolyMesh,
    handle::{DefaultIndex, FaceHandle, VertexHandle},
};


pub mod float;
pub mod obj;
pub mod off;
pub mod parse;
pub mod ply;
pub mod stl;
pub(crate) mod util;



/// Number of significant decimal digits written for floating point values in
/// text encodings, unless configured otherwise. 17 digits are enough to
/// restore every `f64` exactly.
pub const DEFAULT_PRECISION: usize = 17;


// ===========================================================================
// ===== Errors
// ===========================================================================

/// Everything that can go wrong while reading or writing a mesh file.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "parse error: {}", _0)]
    Parse(#[cause] parse::Error),

    #[fail(
        display = "couldn't determine the file format of '{}' (supported formats: \
            OBJ, OFF, PLY and STL)",
        _0
    )]
    UnknownFormat(String),

    #[fail(display = "the file does not contain any vertices")]
    EmptyMesh,

    #[fail(display = "the {} format does not support {} encoding", format, encoding)]
    EncodingNotSupported {
        format: FileFormat,
        encoding: FileEncoding,
    },

    /// The mesh contains data the target format can't store.
    #[fail(display = "{}", _0)]
    Unrepresentable(String),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl From<parse::Error> for Error {
    fn from(src: parse::Error) -> Self {
        Error::Parse(src)
    }
}


// ===========================================================================
// ===== File formats and encodings
// ===========================================================================

/// Represents one of the supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Obj,
    Off,
    Ply,
    Stl,
}

impl FileFormat {
    /// All supported formats, in the order they are tried when guessing the
    /// format from the file start.
    pub const ALL: [FileFormat; 4] = [
        FileFormat::Ply,
        FileFormat::Off,
        FileFormat::Stl,
        FileFormat::Obj,
    ];

    /// Tries to guess the file format from the file extension. The extension
    /// is compared case-insensitively.
    ///
    /// Returns `None` if:
    /// - the path/file has no extension in its name, or
    /// - the extension is no valid UTF8, or
    /// - the file extension is not known.
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        FileFormat::ALL.iter().cloned().find(|f| f.extension() == ext)
    }

    /// Tries to guess the file format from the first few bytes of a file.
    ///
    /// `data` should hold the first 1024 bytes of the file (or the whole file
    /// if it's shorter). A format that is "probably" right is preferred over
    /// one that "maybe" fits. Returns `None` if no format matches.
    pub fn from_file_start(data: &[u8]) -> Option<Self> {
        let answers = FileFormat::ALL.iter().map(|&f| (f, f.is_file_start(data)));
        let mut maybe = None;
        for (format, answer) in answers {
            match answer {
                IsFormat::Probably => return Some(format),
                IsFormat::Maybe if maybe.is_none() => maybe = Some(format),
                _ => {}
            }
        }

        maybe
    }

    /// Checks if the given file start looks like a file in this format.
    pub fn is_file_start(&self, data: &[u8]) -> IsFormat {
        match self {
            FileFormat::Obj => obj::is_file_start(data),
            FileFormat::Off => off::is_file_start(data),
            FileFormat::Ply => ply::is_file_start(data),
            FileFormat::Stl => stl::is_file_start(data),
        }
    }

    /// Determines the format of the given file: from the extension of `path`
    /// if possible, from the first 1024 bytes of `file` otherwise.
    ///
    /// The seek position of `file` has to be at the very start. It is reset
    /// to the start when the file start had to be inspected.
    pub fn guess<R: Read + Seek>(path: impl AsRef<Path>, file: &mut R) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(format) = Self::from_extension(path) {
            return Ok(format);
        }

        let mut start = Vec::new();
        file.by_ref().take(1024).read_to_end(&mut start)?;
        file.seek(SeekFrom::Start(0))?;

        Self::from_file_start(&start)
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))
    }

    /// The canonical file extension (lowercase, without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Obj => "obj",
            FileFormat::Off => "off",
            FileFormat::Ply => "ply",
            FileFormat::Stl => "stl",
        }
    }

    /// The encoding that is written when none is explicitly requested.
    pub fn default_encoding(&self) -> FileEncoding {
        match self {
            FileFormat::Obj | FileFormat::Off => FileEncoding::Ascii,
            FileFormat::Ply | FileFormat::Stl => FileEncoding::BinaryLittleEndian,
        }
    }

    /// Reads a mesh in this format from the given reader.
    ///
    /// Besides syntax errors, this fails if the file describes an invalid
    /// mesh (see [`PolyMesh::check`]) or doesn't contain any vertices.
    pub fn read(self, reader: impl Read) -> Result<PolyMesh, Error> {
        let mut mesh = PolyMesh::empty();
        match self {
            FileFormat::Obj => obj::Reader::new(reader).transfer_to(&mut mesh)?,
            FileFormat::Off => off::Reader::new(reader).transfer_to(&mut mesh)?,
            FileFormat::Ply => ply::Reader::new(reader)?.transfer_to(&mut mesh)?,
            FileFormat::Stl => stl::Reader::new(reader).transfer_to(&mut mesh)?,
        }

        if mesh.num_vertices() == 0 {
            return Err(Error::EmptyMesh);
        }

        Ok(mesh)
    }

    /// Writes the mesh from `src` in this format into the given writer.
    pub fn write(
        self,
        writer: impl Write,
        src: &impl MemSource,
        options: &WriteOptions,
    ) -> Result<(), Error> {
        let encoding = options.encoding.unwrap_or(self.default_encoding());
        let not_supported = |_| Error::EncodingNotSupported { format: self, encoding };

        match self {
            FileFormat::Obj => {
                if encoding != FileEncoding::Ascii {
                    return Err(not_supported(EncodingNotSupported));
                }
                obj::Config::new()
                    .with_precision(options.precision)
                    .into_writer(writer)
                    .transfer_from(src)
            }
            FileFormat::Off => {
                if encoding != FileEncoding::Ascii {
                    return Err(not_supported(EncodingNotSupported));
                }
                off::Config::new()
                    .with_precision(options.precision)
                    .into_writer(writer)
                    .transfer_from(src)
            }
            FileFormat::Ply => {
                let encoding = ply::Encoding::try_from(encoding).map_err(not_supported)?;
                ply::Config::new(encoding)
                    .with_precision(options.precision)
                    .into_writer(writer)
                    .transfer_from(src)
            }
            FileFormat::Stl => {
                let encoding = stl::Encoding::try_from(encoding).map_err(not_supported)?;
                stl::Config::new(encoding)
                    .with_precision(options.precision)
                    .into_writer(writer)
                    .transfer_from(src)
            }
        }
    }

    /// Writes the mesh into a `Vec<u8>` which is returned on success.
    pub fn write_to_memory(
        self,
        src: &impl MemSource,
        options: &WriteOptions,
    ) -> Result<Vec<u8>, Error> {
        let mut w = Cursor::new(Vec::new());
        self.write(&mut w, src, options)?;
        Ok(w.into_inner())
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Obj => "OBJ",
            FileFormat::Off => "OFF",
            FileFormat::Ply => "PLY",
            FileFormat::Stl => "STL",
        })
    }
}

/// Describes the encoding of the main data of a mesh file.
///
/// Not every format has to support all of these encodings (in fact, many
/// formats only support one encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// Everything is stored as an ASCII string.
    Ascii,

    /// Binary encoding where all numeric types are stored in big endian
    /// layout.
    BinaryBigEndian,

    /// Binary encoding where all numeric types are stored in little endian
    /// layout.
    BinaryLittleEndian,
}

impl fmt::Display for FileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FileEncoding::Ascii => "ASCII",
            FileEncoding::BinaryBigEndian => "big endian binary",
            FileEncoding::BinaryLittleEndian => "little endian binary",
        })
    }
}

/// The result of inspecting the start of a file to check if it's a file of a
/// specific format.
///
/// This is returned by the `is_file_start` functions in each file format
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsFormat {
    /// The file is very likely a file of the specified format (e.g. the magic
    /// number is found).
    Probably,

    /// The file could be a file of the specified format, but there is no clear
    /// indicator that it is. Only returned by formats without magic number.
    Maybe,

    /// The file is definitely not valid in the specified format.
    No,
}

/// A simple unit-like error type that is used for `TryFrom<FileEncoding>`
/// impls of format specific `Encoding` types.
#[derive(Debug, Clone, Copy)]
pub struct EncodingNotSupported;

/// Options for [`write_file`] and [`FileFormat::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Number of significant digits for floating point values in text
    /// encodings. *Default*: [`DEFAULT_PRECISION`].
    pub precision: usize,

    /// The encoding to write. `None` means the format's default encoding
    /// (see [`FileFormat::default_encoding`]). *Default*: `None`.
    pub encoding: Option<FileEncoding>,
}

impl WriteOptions {
    pub fn with_precision(self, precision: usize) -> Self {
        Self { precision, .. self }
    }

    pub fn with_encoding(self, encoding: FileEncoding) -> Self {
        Self { encoding: Some(encoding), .. self }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            encoding: None,
        }
    }
}


// ===========================================================================
// ===== High level functions
// ===========================================================================

/// Reads a mesh from the given file. The format is guessed from the file
/// extension or, if that fails, from the start of the file.
pub fn read_file(path: impl AsRef<Path>) -> Result<PolyMesh, Error> {
    read_file_with_format(path).map(|(mesh, _)| mesh)
}

/// Like [`read_file`], but also returns the format the file was read as.
pub fn read_file_with_format(path: impl AsRef<Path>) -> Result<(PolyMesh, FileFormat), Error> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let format = FileFormat::guess(path, &mut file)?;
    let mesh = format.read(file)?;

    Ok((mesh, format))
}

/// Writes the mesh to the given file in the format determined by the file
/// extension. Overwrites the file if it already exists.
///
/// The file is not created if the format can't be determined. If writing
/// fails after the file was created, the partially written file is removed.
pub fn write_file(
    path: impl AsRef<Path>,
    src: &impl MemSource,
    options: &WriteOptions,
) -> Result<FileFormat, Error> {
    let path = path.as_ref();
    let format = FileFormat::from_extension(path)
        .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;

    fn write_buffered(
        file: File,
        format: FileFormat,
        src: &impl MemSource,
        options: &WriteOptions,
    ) -> Result<(), Error> {
        let mut w = BufWriter::new(file);
        format.write(&mut w, src, options)?;
        w.flush()?;
        Ok(())
    }

    let file = File::create(path)?;
    if let Err(e) = write_buffered(file, format, src, options) {
        // The original error is more interesting than a failed removal.
        let _ = fs::remove_file(path);
        return Err(e);
    }

    Ok(format)
}


// ===========================================================================
// ===== {Stream/Mem}-Sinks and Sources
// ===========================================================================

/// Something that can produce mesh data by pushing it into a [`MemSink`]. All
/// readers implement this.
pub trait StreamSource {
    fn transfer_to<S: MemSink>(self, sink: &mut S) -> Result<(), Error>;
}

/// Something that can consume mesh data by pulling it from a [`MemSource`].
/// All writers implement this.
pub trait StreamSink {
    fn transfer_from<S: MemSource>(self, src: &S) -> Result<(), Error>;
}

/// A type that can receive mesh data in memory.
///
/// Vertices have to be added before the faces referencing them. Sources only
/// call `add_face` with handles previously returned by `add_vertex`, with at
/// least three pairwise distinct vertices.
pub trait MemSink {
    /// Informs the sink about the expected number of elements. Sources call
    /// this at most once, before adding anything, and only if the file
    /// contains that information. The numbers might be wrong.
    fn size_hint(&mut self, _num_vertices: DefaultIndex, _num_faces: DefaultIndex) {}

    fn add_vertex(&mut self, position: Point3<f64>) -> VertexHandle;
    fn add_face(&mut self, vertices: &[VertexHandle]) -> FaceHandle;
}

/// A type that can provide mesh data from memory.
pub trait MemSource {
    fn num_vertices(&self) -> DefaultIndex;
    fn num_faces(&self) -> DefaultIndex;

    /// All vertex handles, in the order in which vertices should be written.
    fn vertices(&self) -> Box<dyn Iterator<Item = VertexHandle> + '_>;

    /// All face handles, in the order in which faces should be written.
    fn faces(&self) -> Box<dyn Iterator<Item = FaceHandle> + '_>;

    fn vertex_position(&self, vh: VertexHandle) -> Point3<f64>;
    fn vertices_of_face(&self, fh: FaceHandle) -> &[VertexHandle];
}
