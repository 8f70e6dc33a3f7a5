//! Reading and writing PLY files.
//!
//! PLY (polygon file format) files consist of a text header followed by the
//! body in one of three encodings (ASCII, binary little endian or binary big
//! endian). The header declares a list of *elements* (e.g. `vertex` or
//! `face`), each with a number of instances and a list of typed
//! *properties*. Properties are either scalars or lists of scalars.
//!
//! The reader understands every valid header and uses the `x`, `y` and `z`
//! properties of the `vertex` element and the `vertex_indices` (or
//! `vertex_index`) list property of the `face` element. Everything else is
//! parsed and skipped.

use std::{convert::TryFrom, fmt};

use crate::io::{EncodingNotSupported, FileEncoding, IsFormat};


mod read;
mod write;


pub use self::{
    read::Reader,
    write::{Config, Writer},
};


/// The encoding of a PLY file's body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    BinaryBigEndian,
    BinaryLittleEndian,
}

impl Encoding {
    /// The name used in the `format` line of the header.
    pub fn ply_name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::BinaryBigEndian => "binary_big_endian",
            Encoding::BinaryLittleEndian => "binary_little_endian",
        }
    }

    fn from_ply_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Encoding::Ascii),
            "binary_big_endian" => Some(Encoding::BinaryBigEndian),
            "binary_little_endian" => Some(Encoding::BinaryLittleEndian),
            _ => None,
        }
    }
}

impl From<Encoding> for FileEncoding {
    fn from(src: Encoding) -> Self {
        match src {
            Encoding::Ascii => FileEncoding::Ascii,
            Encoding::BinaryBigEndian => FileEncoding::BinaryBigEndian,
            Encoding::BinaryLittleEndian => FileEncoding::BinaryLittleEndian,
        }
    }
}

impl TryFrom<FileEncoding> for Encoding {
    type Error = EncodingNotSupported;

    // PLY supports all encodings
    fn try_from(src: FileEncoding) -> Result<Self, Self::Error> {
        match src {
            FileEncoding::Ascii => Ok(Encoding::Ascii),
            FileEncoding::BinaryBigEndian => Ok(Encoding::BinaryBigEndian),
            FileEncoding::BinaryLittleEndian => Ok(Encoding::BinaryLittleEndian),
        }
    }
}


// ===========================================================================
// ===== Header
// ===========================================================================

/// The parsed header of a PLY file.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub encoding: Encoding,

    /// The element definitions in the order they appear in the file (and in
    /// the body).
    pub elements: Vec<ElementDef>,

    /// Content of all `comment` lines.
    pub comments: Vec<String>,

    /// Content of all `obj_info` lines.
    pub obj_infos: Vec<String>,
}

impl Header {
    /// Returns the element with the given name.
    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// The definition of an element (e.g. `element vertex 8`) with its property
/// definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,

    /// Number of instances of this element in the body.
    pub count: u64,

    pub property_defs: Vec<PropertyDef>,
}

impl ElementDef {
    /// Returns the property with the given name.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.property_defs.iter().find(|p| p.name == name)
    }
}

/// The definition of a property, e.g. `property float x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
}

/// The type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    Scalar(ScalarType),

    /// A list with a per-instance length. The length is stored in front of
    /// the list items with type `len_type`.
    List {
        len_type: ScalarType,
        scalar_type: ScalarType,
    },
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyType::Scalar(ty) => write!(f, "{}", ty),
            PropertyType::List { len_type, scalar_type } => {
                write!(f, "list {} {}", len_type, scalar_type)
            }
        }
    }
}

/// One of the eight PLY scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    Short,
    Int,
    UChar,
    UShort,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    /// Parses a type name. Both the original names (`uchar`, `float`, ...)
    /// and the names with bit size (`uint8`, `float32`, ...) are accepted.
    pub fn from_ply_name(name: &str) -> Option<Self> {
        let ty = match name {
            "char" | "int8" => ScalarType::Char,
            "short" | "int16" => ScalarType::Short,
            "int" | "int32" => ScalarType::Int,
            "uchar" | "uint8" => ScalarType::UChar,
            "ushort" | "uint16" => ScalarType::UShort,
            "uint" | "uint32" => ScalarType::UInt,
            "float" | "float32" => ScalarType::Float,
            "double" | "float64" => ScalarType::Double,
            _ => return None,
        };

        Some(ty)
    }

    /// Returns the type name used in the header when writing (e.g. `short`
    /// for `i16`).
    pub fn ply_name(&self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::UChar => "uchar",
            ScalarType::UShort => "ushort",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Returns `true` if and only if the type is either `float` or `double`.
    pub fn is_floating_point(&self) -> bool {
        *self == ScalarType::Float || *self == ScalarType::Double
    }

    /// The range of values of integer types. `None` for floating point
    /// types.
    fn int_range(&self) -> Option<(i64, i64)> {
        let range = match self {
            ScalarType::Char => (i8::min_value().into(), i8::max_value().into()),
            ScalarType::Short => (i16::min_value().into(), i16::max_value().into()),
            ScalarType::Int => (i32::min_value().into(), i32::max_value().into()),
            ScalarType::UChar => (0, u8::max_value().into()),
            ScalarType::UShort => (0, u16::max_value().into()),
            ScalarType::UInt => (0, u32::max_value().into()),
            ScalarType::Float | ScalarType::Double => return None,
        };

        Some(range)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.ply_name())
    }
}


/// Checks if the given data is probably the start of a PLY file. PLY files
/// start with the magic line `ply`.
pub fn is_file_start(data: &[u8]) -> IsFormat {
    if data.starts_with(b"ply\n") || data.starts_with(b"ply\r\n") {
        IsFormat::Probably
    } else {
        IsFormat::No
    }
}
