use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    str::SplitWhitespace,
};

use cgmath::Point3;

use crate::{
    handle::DefaultIndex,
    io::{
        Error, MemSink, StreamSource,
        parse::{self, LineReader},
        util::face_from_indices,
    },
};
use super::parse_keyword;


/// A reader for OFF files. Implements [`StreamSource`].
///
/// Every vertex and every face has to be on its own line. Anything after the
/// last face is ignored.
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    reader: R,
}

impl Reader<File> {
    /// Creates a new `Reader` from the given file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` from the given `io::Read` instance. If you want
    /// to open a file, rather use [`Reader::open`].
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: io::Read> StreamSource for Reader<R> {
    fn transfer_to<S: MemSink>(self, sink: &mut S) -> Result<(), Error> {
        let mut lines = LineReader::new(BufReader::new(self.reader));
        let (num_vertices, num_faces) = read_header(&mut lines)?;

        sink.size_hint(num_vertices, num_faces);

        for _ in 0..num_vertices {
            lines.expect_content('#')?;
            let pos = lines.pos();
            let mut tokens = content(&lines);

            // Colors, normals and texture coordinates follow the position.
            let x = parse::coord(parse::next_token(&mut tokens, "x coordinate", pos)?, pos)?;
            let y = parse::coord(parse::next_token(&mut tokens, "y coordinate", pos)?, pos)?;
            let z = parse::coord(parse::next_token(&mut tokens, "z coordinate", pos)?, pos)?;

            sink.add_vertex(Point3::new(x, y, z));
        }

        for _ in 0..num_faces {
            lines.expect_content('#')?;
            let pos = lines.pos();
            let mut tokens = content(&lines);

            let len = parse::int::<usize>(
                parse::next_token(&mut tokens, "face vertex count", pos)?,
                pos,
            )?;

            // The face might be followed by a color.
            let indices = tokens.by_ref()
                .take(len)
                .map(|token| parse::int::<i64>(token, pos))
                .collect::<Result<Vec<_>, _>>()?;
            if indices.len() < len {
                return Err(lines.error(format!(
                    "face with {} vertices has only {} vertex indices",
                    len,
                    indices.len(),
                )).into());
            }

            let face = face_from_indices(indices, num_vertices)
                .map_err(|msg| lines.error(msg))?;
            if let Some(face) = face {
                sink.add_face(&face);
            }
        }

        Ok(())
    }
}

/// Reads the keyword and the element counts. Returns the number of vertices
/// and faces; the number of edges is ignored.
fn read_header(lines: &mut LineReader<impl BufRead>) -> Result<(DefaultIndex, DefaultIndex), parse::Error> {
    lines.expect_content('#')?;
    let mut tokens = content(&*lines);

    // `expect_content` guarantees at least one token.
    let keyword = tokens.next().unwrap_or("");
    match parse_keyword(keyword) {
        None => {
            return Err(lines.error(format!("expected 'OFF' header keyword, found '{}'", keyword)));
        }
        Some(k) if k.other_dimension => {
            return Err(lines.error(format!(
                "'{}' files (vertices that are not three dimensional) are not supported",
                keyword,
            )));
        }
        Some(_) => {}
    }

    // The counts can be on the same line as the keyword.
    let mut counts = tokens.peekable();
    if counts.peek() == Some(&"BINARY") {
        return Err(lines.error("binary OFF files are not supported"));
    }
    if counts.peek().is_some() {
        return parse_counts(counts, &*lines);
    }

    lines.expect_content('#')?;
    parse_counts(content(&*lines), &*lines)
}

fn parse_counts<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    lines: &LineReader<impl BufRead>,
) -> Result<(DefaultIndex, DefaultIndex), parse::Error> {
    let pos = lines.pos();
    let num_vertices = parse::int(parse::next_token(&mut tokens, "number of vertices", pos)?, pos)?;
    let num_faces = parse::int(parse::next_token(&mut tokens, "number of faces", pos)?, pos)?;

    // Lots of files in the wild omit the number of edges, but if it's there,
    // it has to be a number.
    if let Some(num_edges) = tokens.next() {
        parse::int::<u64>(num_edges, pos)?;
    }

    Ok((num_vertices, num_faces))
}

/// The tokens of the current line without comment.
fn content<'a>(lines: &'a LineReader<impl BufRead>) -> SplitWhitespace<'a> {
    parse::strip_comment(lines.line(), '#').split_whitespace()
}
