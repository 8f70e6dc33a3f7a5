use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    str::SplitWhitespace,
};

use byteorder::{LittleEndian, ReadBytesExt};
use cgmath::Point3;
use fxhash::FxHashMap;
use smallvec::smallvec;

use crate::{
    handle::VertexHandle,
    io::{
        Error, MemSink, StreamSource,
        parse::{self, BinReader, LineReader, Pos},
        util::simplify_face,
    },
};
use super::{BINARY_HEADER_SIZE, RawTriangle, is_binary};


// ===========================================================================
// ===== Reader
// ===========================================================================

/// A reader able to read ASCII and binary STL files. Implements
/// [`StreamSource`].
///
/// The whole file is loaded into memory first, as the encoding can only be
/// determined reliably with the length of the file.
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    reader: R,
    options: ReadOptions,
}

impl Reader<File> {
    /// Creates a new `Reader` from the given file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` with default options from the given `io::Read`
    /// instance. If you want to open a file, rather use [`Reader::open`].
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            options: ReadOptions::default(),
        }
    }

    pub fn with_options(self, options: ReadOptions) -> Self {
        Self { options, .. self }
    }

    /// Reads the whole file into a [`RawResult`].
    pub fn read_raw(self) -> Result<RawResult, parse::Error> {
        let mut out = RawResult::new();
        self.read_raw_into(&mut out)?;
        Ok(out)
    }

    /// Reads the whole file into the given sink.
    ///
    /// This is a low level building block; [`StreamSource::transfer_to`]
    /// builds a mesh on top of it.
    pub fn read_raw_into(mut self, sink: &mut impl Sink) -> Result<(), parse::Error> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;

        if is_binary(&data) {
            read_binary(&data, sink)
        } else {
            read_ascii(&data, sink)
        }
    }
}

impl<R: io::Read> StreamSource for Reader<R> {
    fn transfer_to<S: MemSink>(self, sink: &mut S) -> Result<(), Error> {
        let mut helper = MeshSink {
            sink,
            unify_vertices: self.options.unify_vertices,
            vertices: FxHashMap::default(),
        };
        self.read_raw_into(&mut helper)?;

        Ok(())
    }
}


// ===========================================================================
// ===== Binary
// ===========================================================================

fn read_binary(data: &[u8], sink: &mut impl Sink) -> Result<(), parse::Error> {
    if (data.len() as u64) < BINARY_HEADER_SIZE {
        return Err(parse::Error::Custom(
            "not an STL file (neither starts with 'solid' nor is long enough for \
                a binary header)".into(),
            Pos::Offset(0),
        ));
    }

    let mut reader = BinReader::new(data, 0);

    // The 80 byte header has no meaning. It's often used to store the solid
    // name or the program that wrote the file.
    let mut header = [0; 80];
    reader.read_exact(&mut header).map_err(|e| reader.map_err(e))?;

    let num_triangles = reader.read_u32::<LittleEndian>().map_err(|e| reader.map_err(e))?;
    sink.num_triangles(num_triangles);

    // If the specified number is too high, we hit EOF early. If it's too
    // small, `assert_eof` complains.
    for _ in 0..num_triangles {
        let start = reader.pos();
        let triangle = read_binary_triangle(&mut reader).map_err(|e| reader.map_err(e))?;

        if !triangle.vertices.iter().flat_map(|v| v).all(|c| c.is_finite()) {
            return Err(parse::Error::Custom("non-finite vertex position".into(), start));
        }

        sink.triangle(triangle);
    }

    reader.assert_eof()
}

fn read_binary_triangle(reader: &mut impl Read) -> Result<RawTriangle, io::Error> {
    let mut vec3 = || -> Result<[f64; 3], io::Error> {
        Ok([
            reader.read_f32::<LittleEndian>()?.into(),
            reader.read_f32::<LittleEndian>()?.into(),
            reader.read_f32::<LittleEndian>()?.into(),
        ])
    };

    let normal = vec3()?;
    let vertices = [vec3()?, vec3()?, vec3()?];
    let attribute_byte_count = reader.read_u16::<LittleEndian>()?;

    Ok(RawTriangle { normal, vertices, attribute_byte_count })
}


// ===========================================================================
// ===== ASCII
// ===========================================================================

/// Parses an ASCII file, which may contain multiple solids:
///
/// ```text
/// solid name
///   facet normal 0 0 1
///     outer loop
///       vertex 0 0 0
///       vertex 1 0 0
///       vertex 0 1 0
///     endloop
///   endfacet
/// endsolid name
/// ```
///
/// Keywords are case-insensitive. Anything after the last `endsolid` that
/// is not another solid is ignored.
fn read_ascii(data: &[u8], sink: &mut impl Sink) -> Result<(), parse::Error> {
    let mut lines = LineReader::new(data);
    let mut num_solids = 0;

    while lines.advance_to_nonempty()? {
        let line = lines.line().trim();
        let (keyword, name) = match line.find(char::is_whitespace) {
            Some(idx) => (&line[..idx], line[idx..].trim()),
            None => (line, ""),
        };

        if !keyword.eq_ignore_ascii_case("solid") {
            if num_solids > 0 {
                break;
            }
            return Err(lines.error(format!("expected 'solid', found '{}'", keyword)));
        }

        sink.solid_name(name.to_string());
        num_solids += 1;

        loop {
            lines.expect_nonempty()?;
            let pos = lines.pos();
            let mut tokens = lines.line().split_whitespace();

            // `expect_nonempty` guarantees at least one token
            let keyword = tokens.next().unwrap_or("");
            if keyword.eq_ignore_ascii_case("endsolid") {
                break;
            }
            if !keyword.eq_ignore_ascii_case("facet") {
                return Err(lines.error(format!("expected 'facet' or 'endsolid', found '{}'", keyword)));
            }

            // Some writers omit the normal completely.
            let normal = match tokens.next() {
                None => [0.0; 3],
                Some(t) if t.eq_ignore_ascii_case("normal") => {
                    let x = parse::float(parse::next_token(&mut tokens, "normal x", pos)?, pos)?;
                    let y = parse::float(parse::next_token(&mut tokens, "normal y", pos)?, pos)?;
                    let z = parse::float(parse::next_token(&mut tokens, "normal z", pos)?, pos)?;
                    [x, y, z]
                }
                Some(other) => {
                    return Err(lines.error(format!("expected 'normal', found '{}'", other)));
                }
            };

            expect_keywords(&mut lines, &["outer", "loop"])?;
            let mut vertices = [[0.0; 3]; 3];
            for vertex in &mut vertices {
                let (pos, mut tokens) = expect_keywords(&mut lines, &["vertex"])?;
                let x = parse::coord(parse::next_token(&mut tokens, "x coordinate", pos)?, pos)?;
                let y = parse::coord(parse::next_token(&mut tokens, "y coordinate", pos)?, pos)?;
                let z = parse::coord(parse::next_token(&mut tokens, "z coordinate", pos)?, pos)?;
                *vertex = [x, y, z];
            }
            expect_keywords(&mut lines, &["endloop"])?;
            expect_keywords(&mut lines, &["endfacet"])?;

            sink.triangle(RawTriangle {
                normal,
                vertices,
                attribute_byte_count: 0,
            });
        }
    }

    if num_solids == 0 {
        return Err(parse::Error::UnexpectedEof(lines.pos()));
    }

    Ok(())
}

/// Advances to the next non-empty line and checks that it starts with the
/// given keywords (case-insensitive). Returns the position of that line and
/// the remaining tokens.
fn expect_keywords<'a>(
    lines: &'a mut LineReader<&[u8]>,
    keywords: &[&str],
) -> Result<(Pos, SplitWhitespace<'a>), parse::Error> {
    lines.expect_nonempty()?;
    let pos = lines.pos();

    let mut tokens = lines.line().split_whitespace();
    for keyword in keywords {
        match tokens.next() {
            Some(t) if t.eq_ignore_ascii_case(keyword) => {}
            _ => {
                return Err(lines.error(format!(
                    "expected '{}', found '{}'",
                    keywords.join(" "),
                    lines.line().trim(),
                )));
            }
        }
    }

    Ok((pos, tokens))
}


// ===========================================================================
// ===== Sinks
// ===========================================================================

/// A sink can accept data from an STL file. This is mainly used for
/// [`Reader::read_raw_into`].
pub trait Sink {
    /// Is called at the start of each solid in an ASCII file. Not called for
    /// binary files.
    fn solid_name(&mut self, _name: String) {}

    /// If the file is binary, this method is called once in the beginning.
    /// The number of triangles as stored in the file is passed into this
    /// method.
    fn num_triangles(&mut self, _num: u32) {}

    /// Is called for each triangle that is read from the file.
    fn triangle(&mut self, triangle: RawTriangle);
}

/// Holds the raw data from an STL file. Obtained by [`Reader::read_raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// The names of all solids in an ASCII file. Empty for binary files.
    pub solid_names: Vec<String>,

    /// All triangles from the file.
    pub triangles: Vec<RawTriangle>,
}

impl RawResult {
    fn new() -> Self {
        Self {
            solid_names: vec![],
            triangles: vec![],
        }
    }
}

impl Sink for RawResult {
    fn solid_name(&mut self, name: String) {
        self.solid_names.push(name);
    }

    fn num_triangles(&mut self, num: u32) {
        // The number comes straight from the file and might be garbage.
        self.triangles.reserve(num.min(1 << 20) as usize);
    }

    fn triangle(&mut self, triangle: RawTriangle) {
        self.triangles.push(triangle);
    }
}

/// Used to configure [`Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Specifies if vertices with the exact same position should be unified
    /// into one. *Default*: `true`.
    ///
    /// An STL file is a simple list of triangles. Each triangle specifies the
    /// position of its three vertices, so vertices of adjacent triangles are
    /// stored multiple times. Unifying vertices turns the triangle soup into
    /// a connected mesh. Triangles that have two vertices at the same
    /// position are dropped in that case.
    ///
    /// If disabled, every triangle gets three new vertices.
    pub unify_vertices: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            unify_vertices: true,
        }
    }
}

/// Adds the triangles from the file to a [`MemSink`].
struct MeshSink<'a, S: MemSink> {
    sink: &'a mut S,
    unify_vertices: bool,

    /// Maps the bit pattern of positions to the vertex already added there.
    vertices: FxHashMap<[u64; 3], VertexHandle>,
}

impl<S: MemSink> MeshSink<'_, S> {
    fn add_vertex(&mut self, [x, y, z]: [f64; 3]) -> VertexHandle {
        if !self.unify_vertices {
            return self.sink.add_vertex(Point3::new(x, y, z));
        }

        // `0.0` and `-0.0` are the same position.
        let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
        let key = [bits(x), bits(y), bits(z)];

        let sink = &mut self.sink;
        *self.vertices.entry(key).or_insert_with(|| sink.add_vertex(Point3::new(x, y, z)))
    }
}

impl<S: MemSink> Sink for MeshSink<'_, S> {
    fn num_triangles(&mut self, num: u32) {
        let num_vertices = if self.unify_vertices {
            // In a well behaved closed triangle mesh, |V| ≈ |F| / 2. If we
            // are only slightly below the actual number, we have to
            // reallocate, so we prepare for a bit more.
            (f64::from(num) * 0.55) as u32
        } else {
            num.saturating_mul(3)
        };

        self.sink.size_hint(num_vertices, num);
        self.vertices.reserve(num_vertices.min(1 << 20) as usize);
    }

    fn triangle(&mut self, triangle: RawTriangle) {
        let [pa, pb, pc] = triangle.vertices;
        let a = self.add_vertex(pa);
        let b = self.add_vertex(pb);
        let c = self.add_vertex(pc);

        // Degenerated after unification
        if let Some(face) = simplify_face(smallvec![a, b, c]) {
            self.sink.add_face(&face);
        }
    }
}
