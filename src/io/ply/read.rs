use std::{
    convert::TryFrom,
    fs::File,
    io::{self, BufRead, BufReader},
    marker::PhantomData,
    path::Path,
};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use cgmath::Point3;

use crate::{
    handle::DefaultIndex,
    io::{
        Error, MemSink, StreamSource,
        parse::{self, BinReader, LineReader, Pos},
        util::face_from_indices,
    },
};
use super::{ElementDef, Encoding, Header, PropertyDef, PropertyType, ScalarType};


/// Names of the face property holding the vertex indices. Both are used in
/// the wild.
const FACE_INDICES_NAMES: [&str; 2] = ["vertex_indices", "vertex_index"];


// ===========================================================================
// ===== Reader
// ===========================================================================

/// A reader for PLY files. Implements [`StreamSource`].
///
/// The header is parsed when the reader is created; the body is read by
/// [`StreamSource::transfer_to`].
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    lines: LineReader<BufReader<R>>,
    header: Header,
    layout: Vec<ElementLayout>,
    num_vertices: DefaultIndex,
    num_faces: DefaultIndex,
}

impl Reader<File> {
    /// Opens the file at the given path and parses its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new reader and parses the header from `reader`.
    ///
    /// Fails if the header is invalid or if it doesn't describe a mesh this
    /// reader can load (e.g. a `face` element without vertex indices).
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut lines = LineReader::new(BufReader::new(reader));
        let header = parse_header(&mut lines)?;
        let (layout, num_vertices, num_faces) = mesh_layout(&header)
            .map_err(|msg| lines.error(msg))?;

        Ok(Self { lines, header, layout, num_vertices, num_faces })
    }

    /// Returns the parsed header of the file.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the encoding of the file's body.
    pub fn encoding(&self) -> Encoding {
        self.header.encoding
    }
}

impl<R: io::Read> StreamSource for Reader<R> {
    fn transfer_to<S: MemSink>(self, sink: &mut S) -> Result<(), Error> {
        sink.size_hint(self.num_vertices, self.num_faces);

        let Self { lines, header, layout, num_vertices, .. } = self;
        match header.encoding {
            Encoding::Ascii => {
                let mut body = AsciiBody { lines, cursor: 0 };
                read_body(&header, &layout, num_vertices, &mut body, sink)?;
            }
            Encoding::BinaryBigEndian => {
                let mut body = BinBody::<_, BigEndian>::new(lines);
                read_body(&header, &layout, num_vertices, &mut body, sink)?;
            }
            Encoding::BinaryLittleEndian => {
                let mut body = BinBody::<_, LittleEndian>::new(lines);
                read_body(&header, &layout, num_vertices, &mut body, sink)?;
            }
        }

        Ok(())
    }
}


// ===========================================================================
// ===== Header
// ===========================================================================

fn parse_header(lines: &mut LineReader<impl BufRead>) -> Result<Header, parse::Error> {
    // PLY files always start with `ply`. This serves as magic number.
    if !lines.advance()? || lines.line().trim_end() != "ply" {
        return Err(parse::Error::Custom(
            "not a valid PLY file (does not start with \"ply\")".into(),
            Pos::Line(1),
        ));
    }

    let mut encoding = None;
    let mut elements: Vec<ElementDef> = Vec::new();
    let mut comments = Vec::new();
    let mut obj_infos = Vec::new();

    loop {
        if !lines.advance()? {
            return Err(parse::Error::UnexpectedEof(lines.pos()));
        }

        let pos = lines.pos();
        let line = lines.line().trim();
        let (keyword, rest) = match line.find(char::is_whitespace) {
            Some(idx) => (&line[..idx], line[idx..].trim_start()),
            None => (line, ""),
        };
        let mut tokens = rest.split_whitespace();

        match keyword {
            "end_header" => break,
            "" => continue,
            "comment" => comments.push(rest.to_string()),
            "obj_info" => obj_infos.push(rest.to_string()),

            // E.g. `format binary_little_endian 1.0`
            "format" => {
                if encoding.is_some() {
                    return Err(lines.error("duplicate 'format' line"));
                }

                let name = parse::next_token(&mut tokens, "encoding", pos)?;
                let e = Encoding::from_ply_name(name).ok_or_else(|| lines.error(format!(
                    "expected \"ascii\", \"binary_little_endian\" or \"binary_big_endian\", \
                        found '{}'",
                    name,
                )))?;

                let version = parse::next_token(&mut tokens, "version", pos)?;
                if version != "1.0" {
                    return Err(lines.error(format!(
                        "unsupported PLY version '{}' (only 1.0 is supported)",
                        version,
                    )));
                }

                encoding = Some(e);
            }

            // E.g. `element vertex 8`
            "element" => {
                let name = parse::next_token(&mut tokens, "element name", pos)?;
                let count = parse::int::<u64>(
                    parse::next_token(&mut tokens, "element count", pos)?,
                    pos,
                )?;

                if elements.iter().any(|e| e.name == name) {
                    return Err(lines.error(format!("element '{}' is defined twice", name)));
                }

                elements.push(ElementDef {
                    name: name.to_string(),
                    count,
                    property_defs: vec![],
                });
            }

            // E.g. `property float x` or `property list uchar int vertex_index`
            "property" => {
                let elem = elements.last_mut().ok_or_else(|| {
                    lines.error("property definition without preceding element definition")
                })?;

                let first = parse::next_token(&mut tokens, "property type", pos)?;
                let ty = if first == "list" {
                    let len_type = scalar_type(parse::next_token(&mut tokens, "list length type", pos)?, pos)?;
                    let scalar_type = scalar_type(parse::next_token(&mut tokens, "list item type", pos)?, pos)?;
                    PropertyType::List { len_type, scalar_type }
                } else {
                    PropertyType::Scalar(scalar_type(first, pos)?)
                };
                let name = parse::next_token(&mut tokens, "property name", pos)?;

                // Floating point numbers don't make sense as list lengths.
                if let PropertyType::List { len_type, .. } = ty {
                    if len_type.is_floating_point() {
                        return Err(lines.error(format!(
                            "only integers can be used to store list lengths (property '{}')",
                            name,
                        )));
                    }
                }

                if elem.property(name).is_some() {
                    return Err(lines.error(format!(
                        "property '{}' of element '{}' is defined twice",
                        name,
                        elem.name,
                    )));
                }

                elem.property_defs.push(PropertyDef { name: name.to_string(), ty });
            }

            other => {
                return Err(lines.error(format!(
                    "expected line starting with \"format\", \"comment\", \"obj_info\", \
                        \"element\", \"property\" or \"end_header\", found '{}'",
                    other,
                )));
            }
        }

        if let Some(extra) = tokens.next() {
            if keyword != "comment" && keyword != "obj_info" {
                return Err(lines.error(format!("unexpected '{}' at the end of the line", extra)));
            }
        }
    }

    let encoding = encoding.ok_or_else(|| lines.error("PLY header without 'format' line"))?;

    Ok(Header { encoding, elements, comments, obj_infos })
}

fn scalar_type(name: &str, pos: Pos) -> Result<ScalarType, parse::Error> {
    ScalarType::from_ply_name(name).ok_or_else(|| parse::Error::Custom(
        format!("'{}' is not a valid PLY scalar type", name),
        pos,
    ))
}


// ===========================================================================
// ===== Mapping elements and properties to mesh data
// ===========================================================================

/// What a property value is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Skip,
    X,
    Y,
    Z,
    FaceIndices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Vertex,
    Face,
    Other,
}

#[derive(Debug, Clone)]
struct ElementLayout {
    kind: ElementKind,

    /// One slot per property.
    slots: Vec<Slot>,
}

/// Figures out which elements and properties contain the mesh. Returns the
/// layout per element as well as the number of vertices and faces.
fn mesh_layout(
    header: &Header,
) -> Result<(Vec<ElementLayout>, DefaultIndex, DefaultIndex), String> {
    let mut num_vertices = None;
    let mut num_faces = 0;
    let mut layout = Vec::with_capacity(header.elements.len());

    for elem in &header.elements {
        let mut slots = vec![Slot::Skip; elem.property_defs.len()];
        let slot_of = |name: &str| elem.property_defs.iter().position(|p| p.name == name);

        let kind = match &*elem.name {
            "vertex" => {
                for &(name, slot) in &[("x", Slot::X), ("y", Slot::Y), ("z", Slot::Z)] {
                    let idx = slot_of(name).ok_or_else(|| {
                        format!("vertex element does not have property '{}'", name)
                    })?;

                    if let PropertyType::List { .. } = elem.property_defs[idx].ty {
                        return Err(format!("vertex property '{}' has to be a scalar", name));
                    }
                    slots[idx] = slot;
                }

                num_vertices = Some(count_to_index(elem.count, "vertices")?);
                ElementKind::Vertex
            }

            "face" => {
                if num_vertices.is_none() {
                    return Err("face element is not preceded by a vertex element".into());
                }

                let idx = FACE_INDICES_NAMES.iter()
                    .filter_map(|name| slot_of(name))
                    .next()
                    .ok_or_else(|| {
                        "face element does not have a 'vertex_indices' property".to_string()
                    })?;

                match elem.property_defs[idx].ty {
                    PropertyType::List { scalar_type, .. } if !scalar_type.is_floating_point() => {}
                    ty => {
                        return Err(format!(
                            "face property '{}' has type '{}', but has to be a list of integers",
                            elem.property_defs[idx].name,
                            ty,
                        ));
                    }
                }
                slots[idx] = Slot::FaceIndices;

                num_faces = count_to_index(elem.count, "faces")?;
                ElementKind::Face
            }

            _ => ElementKind::Other,
        };

        layout.push(ElementLayout { kind, slots });
    }

    Ok((layout, num_vertices.unwrap_or(0), num_faces))
}

fn count_to_index(count: u64, what: &str) -> Result<DefaultIndex, String> {
    DefaultIndex::try_from(count)
        .map_err(|_| format!("too many {} ({}), at most {} are supported", what, count, DefaultIndex::max_value()))
}


// ===========================================================================
// ===== Body
// ===========================================================================

/// A single property value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn to_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }
}

/// Reads property values from the body of a PLY file, independent of the
/// encoding.
trait Body {
    /// Called before the first property of each element instance.
    fn begin(&mut self) -> Result<(), parse::Error>;

    /// Reads a single value of the given type.
    fn scalar(&mut self, ty: ScalarType) -> Result<Scalar, parse::Error>;

    /// Called after the last property of each element instance.
    fn end(&mut self) -> Result<(), parse::Error>;

    /// Creates an error located at the current position.
    fn error(&self, msg: String) -> parse::Error;
}

fn read_body(
    header: &Header,
    layout: &[ElementLayout],
    num_vertices: DefaultIndex,
    body: &mut impl Body,
    sink: &mut impl MemSink,
) -> Result<(), parse::Error> {
    let mut indices = Vec::new();

    for (elem, elem_layout) in header.elements.iter().zip(layout) {
        for _ in 0..elem.count {
            let mut position = [0.0; 3];
            indices.clear();

            body.begin()?;
            for (prop, &slot) in elem.property_defs.iter().zip(&elem_layout.slots) {
                match prop.ty {
                    PropertyType::Scalar(ty) => {
                        let value = body.scalar(ty)?;
                        match slot {
                            Slot::X => position[0] = value.to_f64(),
                            Slot::Y => position[1] = value.to_f64(),
                            Slot::Z => position[2] = value.to_f64(),
                            _ => {}
                        }
                    }
                    PropertyType::List { len_type, scalar_type } => {
                        let len = match body.scalar(len_type)? {
                            Scalar::Int(len) if len >= 0 => len,
                            other => {
                                return Err(body.error(format!("invalid list length {:?}", other)));
                            }
                        };

                        for _ in 0..len {
                            let value = body.scalar(scalar_type)?;
                            if let (Slot::FaceIndices, Scalar::Int(idx)) = (slot, value) {
                                indices.push(idx);
                            }
                        }
                    }
                }
            }
            body.end()?;

            match elem_layout.kind {
                ElementKind::Vertex => {
                    if !position.iter().all(|c| c.is_finite()) {
                        return Err(body.error(format!("non-finite vertex position {:?}", position)));
                    }

                    let [x, y, z] = position;
                    sink.add_vertex(Point3::new(x, y, z));
                }
                ElementKind::Face => {
                    let face = face_from_indices(indices.iter().cloned(), num_vertices)
                        .map_err(|msg| body.error(msg))?;
                    if let Some(face) = face {
                        sink.add_face(&face);
                    }
                }
                ElementKind::Other => {}
            }
        }
    }

    Ok(())
}


/// ASCII body: one element instance per line, values separated by
/// whitespace.
#[derive(Debug)]
struct AsciiBody<R: BufRead> {
    lines: LineReader<R>,

    /// Byte index into the current line up to which values were read.
    cursor: usize,
}

impl<R: BufRead> Body for AsciiBody<R> {
    fn begin(&mut self) -> Result<(), parse::Error> {
        self.lines.expect_nonempty()?;
        self.cursor = 0;
        Ok(())
    }

    fn scalar(&mut self, ty: ScalarType) -> Result<Scalar, parse::Error> {
        let pos = self.lines.pos();
        let rest = &self.lines.line()[self.cursor..];
        let trimmed = rest.trim_start();
        let len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        if len == 0 {
            return Err(parse::Error::Custom("expected more property values in this line".into(), pos));
        }

        let token = &trimmed[..len];
        self.cursor += rest.len() - trimmed.len() + len;

        match ty.int_range() {
            Some((min, max)) => {
                let v = parse::int::<i64>(token, pos)?;
                if v < min || v > max {
                    return Err(parse::Error::Custom(
                        format!("value {} is out of range for type '{}'", v, ty),
                        pos,
                    ));
                }

                Ok(Scalar::Int(v))
            }

            // Values of type `float` are rounded to `f32`, like in binary
            // files.
            None if ty == ScalarType::Float => {
                Ok(Scalar::Float(parse::float(token, pos)? as f32 as f64))
            }
            None => Ok(Scalar::Float(parse::float(token, pos)?)),
        }
    }

    fn end(&mut self) -> Result<(), parse::Error> {
        let rest = self.lines.line()[self.cursor..].trim();
        if !rest.is_empty() {
            return Err(self.lines.error(format!("unexpected additional values '{}'", rest)));
        }

        Ok(())
    }

    fn error(&self, msg: String) -> parse::Error {
        self.lines.error(msg)
    }
}


/// Binary body in byte order `B`: all values densely packed.
#[derive(Debug)]
struct BinBody<R: io::Read, B: ByteOrder> {
    reader: BinReader<R>,
    _order: PhantomData<B>,
}

impl<R: BufRead, B: ByteOrder> BinBody<R, B> {
    /// Continues reading after the header.
    fn new(lines: LineReader<R>) -> Self {
        let offset = lines.offset();
        Self {
            reader: BinReader::new(lines.into_inner(), offset),
            _order: PhantomData,
        }
    }
}

impl<R: io::Read, B: ByteOrder> Body for BinBody<R, B> {
    fn begin(&mut self) -> Result<(), parse::Error> {
        Ok(())
    }

    fn scalar(&mut self, ty: ScalarType) -> Result<Scalar, parse::Error> {
        let r = &mut self.reader;
        let res = match ty {
            ScalarType::Char => r.read_i8().map(|v| Scalar::Int(v.into())),
            ScalarType::Short => r.read_i16::<B>().map(|v| Scalar::Int(v.into())),
            ScalarType::Int => r.read_i32::<B>().map(|v| Scalar::Int(v.into())),
            ScalarType::UChar => r.read_u8().map(|v| Scalar::Int(v.into())),
            ScalarType::UShort => r.read_u16::<B>().map(|v| Scalar::Int(v.into())),
            ScalarType::UInt => r.read_u32::<B>().map(|v| Scalar::Int(v.into())),
            ScalarType::Float => r.read_f32::<B>().map(|v| Scalar::Float(v.into())),
            ScalarType::Double => r.read_f64::<B>().map(Scalar::Float),
        };

        res.map_err(|e| self.reader.map_err(e))
    }

    fn end(&mut self) -> Result<(), parse::Error> {
        Ok(())
    }

    fn error(&self, msg: String) -> parse::Error {
        parse::Error::Custom(msg, self.reader.pos())
    }
}
