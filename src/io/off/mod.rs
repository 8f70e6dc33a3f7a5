//! Reading and writing Object File Format (OFF) files.
//!
//! An OFF file starts with the keyword `OFF` (optionally prefixed by `ST`,
//! `C` and `N` to announce texture coordinates, colors and normals per
//! vertex), followed by the number of vertices, faces and edges, the vertex
//! positions and finally the faces, each given as vertex count and list of
//! 0-based indices. `#` starts a comment.
//!
//! Only the ASCII variant of three dimensional OFF files is supported. Files
//! with `4OFF`/`nOFF` header or the `BINARY` keyword are rejected.

use crate::io::{IsFormat, parse::strip_comment};


mod read;
mod write;

#[cfg(test)]
mod tests;

pub use self::{
    read::Reader,
    write::{Config, Writer},
};


/// What the header keyword (e.g. `COFF`) tells us about the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Keyword {
    /// `4` or `n` prefix: vertices are not three dimensional.
    pub(crate) other_dimension: bool,
}

/// Parses the header keyword. Returns `None` if `token` is not an OFF
/// keyword at all.
pub(crate) fn parse_keyword(token: &str) -> Option<Keyword> {
    let mut prefix = token.strip_suffix("OFF")?;

    for flag in &["ST", "C", "N"] {
        if let Some(rest) = prefix.strip_prefix(flag) {
            prefix = rest;
        }
    }

    let other_dimension = match prefix {
        "" => false,
        "4" | "n" | "4n" => true,
        _ => return None,
    };

    Some(Keyword { other_dimension })
}

/// Checks if the given data is probably the start of an OFF file, i.e. if the
/// first token after comments and whitespace is an OFF keyword.
pub fn is_file_start(data: &[u8]) -> IsFormat {
    let text = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(e) => match std::str::from_utf8(&data[..e.valid_up_to()]) {
            Ok(s) => s,
            Err(_) => return IsFormat::No,
        },
    };

    let first_token = text.lines()
        .map(|line| strip_comment(line, '#'))
        .flat_map(|line| line.split_whitespace())
        .next();

    match first_token.and_then(parse_keyword) {
        Some(_) => IsFormat::Probably,
        None => IsFormat::No,
    }
}
