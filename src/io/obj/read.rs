use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use cgmath::Point3;
use smallvec::SmallVec;

use crate::{
    handle::DefaultIndex,
    io::{
        Error, MemSink, StreamSource,
        parse::{self, LineReader, Pos},
        util::face_from_indices,
    },
};


/// A reader for OBJ files. Implements [`StreamSource`].
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
        let mut state = State::default();

        // A statement can be split across several lines with a trailing
        // backslash.
        let mut statement = String::new();
        while lines.advance()? {
            let line = parse::strip_comment(lines.line(), '#').trim_end();
            if line.ends_with('\\') {
                statement.push_str(&line[..line.len() - 1]);
                statement.push(' ');
                continue;
            }

            statement.push_str(line);
            parse_statement(&statement, lines.pos(), sink, &mut state)?;
            statement.clear();
        }

        if !statement.trim().is_empty() {
            parse_statement(&statement, lines.pos(), sink, &mut state)?;
        }

        // Faces may reference vertices defined after them, so they are only
        // checked once all vertices are known.
        for (indices, pos) in state.faces {
            let face = face_from_indices(indices, state.num_vertices)
                .map_err(|msg| parse::Error::Custom(msg, pos))?;
            if let Some(face) = face {
                sink.add_face(&face);
            }
        }

        Ok(())
    }
}

#[derive(Default)]
struct State {
    /// Number of `v` statements seen so far.
    num_vertices: DefaultIndex,

    /// 0-based indices of all faces together with the position of their `f`
    /// statement.
    faces: Vec<(SmallVec<[i64; 4]>, Pos)>,
}

/// Parses one (possibly joined) line.
fn parse_statement(
    statement: &str,
    pos: Pos,
    sink: &mut impl MemSink,
    state: &mut State,
) -> Result<(), parse::Error> {
    let mut tokens = statement.split_whitespace();
    match tokens.next() {
        // `v x y z [w]`, some files add vertex colors after `z`. We only care
        // about the position.
        Some("v") => {
            let x = parse::coord(parse::next_token(&mut tokens, "x coordinate", pos)?, pos)?;
            let y = parse::coord(parse::next_token(&mut tokens, "y coordinate", pos)?, pos)?;
            let z = parse::coord(parse::next_token(&mut tokens, "z coordinate", pos)?, pos)?;

            sink.add_vertex(Point3::new(x, y, z));
            state.num_vertices += 1;
        }

        // `f v1 v2 v3 ...` where each vertex reference can be `v`, `v/vt`,
        // `v//vn` or `v/vt/vn`.
        Some("f") => {
            let num_vertices = state.num_vertices;
            let indices = tokens
                .map(|token| resolve_index(token, num_vertices, pos))
                .collect::<Result<SmallVec<_>, _>>()?;
            state.faces.push((indices, pos));
        }

        _ => {}
    }

    Ok(())
}

/// Turns one vertex reference of an `f` statement into a 0-based vertex
/// index. OBJ indices are 1-based; negative indices count backwards from the
/// last vertex defined so far.
fn resolve_index(token: &str, num_vertices: DefaultIndex, pos: Pos) -> Result<i64, parse::Error> {
    let vertex_part = token.split('/').next().unwrap_or(token);
    let idx = parse::int::<i64>(vertex_part, pos)?;

    match idx {
        0 => Err(parse::Error::Custom("invalid vertex index 0 (OBJ indices start at 1)".into(), pos)),
        i if i > 0 => Ok(i - 1),
        i => Ok(i64::from(num_vertices) + i),
    }
}
