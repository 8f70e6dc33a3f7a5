//! Reading and writing Wavefront OBJ files.
//!
//! OBJ is a line based ASCII format. Only the geometry statements `v`
//! (vertex position) and `f` (face) are used; all other statements (texture
//! coordinates, normals, groups, materials, ...) are ignored while reading.

use crate::io::IsFormat;


mod read;
mod write;


pub use self::{
    read::Reader,
    write::{Config, Writer},
};


/// Statement keywords that may start an OBJ file (apart from comments).
const KEYWORDS: &[&str] = &[
    "v", "vt", "vn", "vp", "f", "l", "p", "o", "g", "s", "mtllib", "usemtl",
];

/// Checks if the given data is probably the start of an OBJ file.
///
/// OBJ files don't have a magic number, so this returns `Maybe` at best: if
/// the data is text and the first statement is a known OBJ keyword.
pub fn is_file_start(data: &[u8]) -> IsFormat {
    // The data might be cut in the middle of a multi-byte character.
    let text = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&data[..e.valid_up_to()]).unwrap_or("")
        }
        Err(_) => return IsFormat::No,
    };

    if text.contains('\0') {
        return IsFormat::No;
    }

    let first_statement = text.lines()
        .map(|line| crate::io::parse::strip_comment(line, '#').trim())
        .find(|line| !line.is_empty())
        .and_then(|line| line.split_whitespace().next());

    match first_statement {
        Some(keyword) if KEYWORDS.contains(&keyword) => IsFormat::Maybe,
        _ => IsFormat::No,
    }
}
