//! Reading and writing STL files.
//!
//! STL stores a list of triangles, each with a normal and the positions of
//! its three vertices. There are two encodings: ASCII (starting with
//! `solid <name>`) and binary (an 80 byte header, the number of triangles
//! and 50 bytes per triangle). Binary files store positions as `f32`.
//!
//! Since vertices are stored per triangle, the reader has to unify vertices
//! with identical positions to create a connected mesh (see
//! [`ReadOptions::unify_vertices`]).

use std::convert::TryFrom;

use byteorder::{ByteOrder, LittleEndian};

use crate::io::{EncodingNotSupported, FileEncoding, IsFormat};


mod read;
mod write;


pub use self::{
    read::{RawResult, ReadOptions, Reader, Sink},
    write::{Config, Writer},
};


/// Size of one triangle in a binary file: normal, three vertices (12 `f32`)
/// and the attribute byte count.
const BINARY_TRIANGLE_SIZE: u64 = 4 * 3 * 4 + 2;

/// Size of the binary header and the triangle count.
const BINARY_HEADER_SIZE: u64 = 80 + 4;


/// The encoding of an STL file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary,
}

impl From<Encoding> for FileEncoding {
    fn from(src: Encoding) -> Self {
        match src {
            Encoding::Ascii => FileEncoding::Ascii,
            Encoding::Binary => FileEncoding::BinaryLittleEndian,
        }
    }
}

impl TryFrom<FileEncoding> for Encoding {
    type Error = EncodingNotSupported;
    fn try_from(src: FileEncoding) -> Result<Self, Self::Error> {
        match src {
            FileEncoding::Ascii => Ok(Encoding::Ascii),
            FileEncoding::BinaryLittleEndian => Ok(Encoding::Binary),
            FileEncoding::BinaryBigEndian => Err(EncodingNotSupported),
        }
    }
}

/// One raw triangle in an STL file.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTriangle {
    /// Face normal as stored in the file. Often zero or garbage, the reader
    /// doesn't use it.
    pub normal: [f64; 3],

    /// The 3D positions of the vertices in CCW order (that is, when looking at
    /// the face "from the outside").
    pub vertices: [[f64; 3]; 3],

    /// Only stored in binary files and usually zero. Sometimes it's abused to
    /// store a 16 bit color.
    pub attribute_byte_count: u16,
}


/// Checks if the file starts with the `solid` keyword (case-insensitive,
/// possibly after whitespace), followed by whitespace or the end of the
/// data.
pub(crate) fn starts_with_solid(data: &[u8]) -> bool {
    let start = data.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(data.len());
    let rest = &data[start..];

    rest.len() >= 5
        && rest[..5].eq_ignore_ascii_case(b"solid")
        && rest.get(5).map(|b| b.is_ascii_whitespace()).unwrap_or(true)
}

/// Returns `true` if the triangle count in the header of a binary file
/// matches the length of `data`.
pub(crate) fn binary_size_matches(data: &[u8]) -> bool {
    if (data.len() as u64) < BINARY_HEADER_SIZE {
        return false;
    }

    let num_triangles = u64::from(LittleEndian::read_u32(&data[80..84]));
    BINARY_HEADER_SIZE + num_triangles * BINARY_TRIANGLE_SIZE == data.len() as u64
}

/// Decides whether the complete file `data` is binary. The size check
/// wins, since binary headers sometimes start with `solid` as well.
pub(crate) fn is_binary(data: &[u8]) -> bool {
    if binary_size_matches(data) {
        return true;
    }

    let start = &data[..data.len().min(1024)];
    !starts_with_solid(data) || start.contains(&0)
}

/// Checks if the given data is probably the start of an STL file.
///
/// Binary STL files don't have a magic number. If the data doesn't look like
/// text and is long enough to hold the binary header, this returns `Maybe`.
pub fn is_file_start(data: &[u8]) -> IsFormat {
    let is_text = !data.contains(&0) && std::str::from_utf8(data).is_ok();

    if starts_with_solid(data) && is_text {
        IsFormat::Probably
    } else if !is_text && data.len() as u64 >= BINARY_HEADER_SIZE {
        IsFormat::Maybe
    } else {
        IsFormat::No
    }
}
