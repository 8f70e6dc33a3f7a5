//! Parsing utilities shared by all readers and the parse error type.

use std::{
    fmt,
    io::{self, BufRead, Read},
    str::FromStr,
};

use failure::Fail;


/// The position in a file an error occured at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pos {
    /// A 1-based line number (used for text encodings).
    Line(usize),

    /// A byte offset from the start of the file (used for binary encodings).
    Offset(u64),
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pos::Line(line) => write!(f, "line {}", line),
            Pos::Offset(offset) => write!(f, "byte {}", offset),
        }
    }
}

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "unexpected EOF while parsing (at {})", _0)]
    UnexpectedEof(Pos),

    #[fail(display = "expected EOF, but additional data was found (at {})", _0)]
    UnexpectedAdditionalData(Pos),

    #[fail(display = "unexpected non-text data (at {})", _0)]
    NotText(Pos),

    #[fail(display = "{} (at {})", _0, _1)]
    Custom(String, Pos),
}

impl Error {
    /// Returns the position of the error, if known.
    pub fn pos(&self) -> Option<Pos> {
        match *self {
            Error::Io(_) => None,
            Error::UnexpectedEof(pos)
            | Error::UnexpectedAdditionalData(pos)
            | Error::NotText(pos)
            | Error::Custom(_, pos) => Some(pos),
        }
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}


// ===========================================================================
// ===== Text input
// ===========================================================================

/// Reads a text file line by line and keeps track of the line number for
/// error messages.
#[derive(Debug)]
pub(crate) struct LineReader<R: BufRead> {
    reader: R,
    line: String,
    line_number: usize,

    /// Number of bytes consumed so far, including line terminators.
    offset: u64,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            offset: 0,
        }
    }

    /// Reads the next line. Returns `false` if the end of the input was
    /// reached. The line terminator (`\n` or `\r\n`) is not part of
    /// [`LineReader::line`].
    pub(crate) fn advance(&mut self) -> Result<bool, Error> {
        self.line.clear();
        let pos = Pos::Line(self.line_number + 1);
        let n = self.reader.read_line(&mut self.line).map_err(|e| {
            match e.kind() {
                io::ErrorKind::InvalidData => Error::NotText(pos),
                _ => Error::Io(e),
            }
        })?;

        if n == 0 {
            return Ok(false);
        }

        self.line_number += 1;
        self.offset += n as u64;
        let len = self.line.trim_end_matches(|c| c == '\n' || c == '\r').len();
        self.line.truncate(len);

        Ok(true)
    }

    /// Advances to the next line that contains something other than
    /// whitespace and comments (starting with `comment_char`). Returns `false`
    /// if the end of the input was reached.
    pub(crate) fn advance_to_content(&mut self, comment_char: char) -> Result<bool, Error> {
        while self.advance()? {
            if !strip_comment(&self.line, comment_char).trim().is_empty() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Like [`LineReader::advance_to_content`], but reaching the end of the
    /// input is an error.
    pub(crate) fn expect_content(&mut self, comment_char: char) -> Result<(), Error> {
        if self.advance_to_content(comment_char)? {
            Ok(())
        } else {
            Err(Error::UnexpectedEof(Pos::Line(self.line_number + 1)))
        }
    }

    /// Advances to the next line that contains something other than
    /// whitespace. Returns `false` if the end of the input was reached.
    pub(crate) fn advance_to_nonempty(&mut self) -> Result<bool, Error> {
        while self.advance()? {
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Like [`LineReader::advance_to_nonempty`], but reaching the end of the
    /// input is an error.
    pub(crate) fn expect_nonempty(&mut self) -> Result<(), Error> {
        if self.advance_to_nonempty()? {
            Ok(())
        } else {
            Err(Error::UnexpectedEof(Pos::Line(self.line_number + 1)))
        }
    }

    /// The current line (without line terminator).
    pub(crate) fn line(&self) -> &str {
        &self.line
    }

    pub(crate) fn pos(&self) -> Pos {
        Pos::Line(self.line_number)
    }

    /// The number of bytes consumed from the underlying reader.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Creates a custom error located at the current line.
    pub(crate) fn error(&self, msg: impl Into<String>) -> Error {
        Error::Custom(msg.into(), self.pos())
    }

    /// Returns the underlying reader. Everything after the current line has
    /// not been consumed yet.
    pub(crate) fn into_inner(self) -> R {
        self.reader
    }
}

/// Returns everything in front of the first `comment_char`.
pub(crate) fn strip_comment(line: &str, comment_char: char) -> &str {
    match line.find(comment_char) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parses a floating point number from a text token.
pub(crate) fn float(token: &str, pos: Pos) -> Result<f64, Error> {
    token.parse::<f64>()
        .map_err(|e| Error::Custom(format!("invalid float literal '{}': {}", token, e), pos))
}

/// Parses a floating point number that is used as vertex coordinate. In
/// addition to [`float`], non-finite values are rejected.
pub(crate) fn coord(token: &str, pos: Pos) -> Result<f64, Error> {
    let v = float(token, pos)?;
    if !v.is_finite() {
        return Err(Error::Custom(format!("non-finite vertex coordinate '{}'", token), pos));
    }

    Ok(v)
}

/// Parses an integer from a text token.
pub(crate) fn int<T>(token: &str, pos: Pos) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    token.parse::<T>()
        .map_err(|e| Error::Custom(format!("invalid integer literal '{}': {}", token, e), pos))
}

/// Takes the next token from `tokens` or returns an error mentioning `what`
/// was expected.
pub(crate) fn next_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
    pos: Pos,
) -> Result<&'a str, Error> {
    tokens.next().ok_or_else(|| Error::Custom(format!("expected {}, found end of line", what), pos))
}


// ===========================================================================
// ===== Binary input
// ===========================================================================

/// A reader that counts the consumed bytes to report error positions.
///
/// Use the `byteorder::ReadBytesExt` methods to read values and
/// [`BinReader::map_err`] to turn IO errors into parse errors.
#[derive(Debug)]
pub(crate) struct BinReader<R: Read> {
    inner: R,
    offset: u64,
}

impl<R: Read> BinReader<R> {
    /// `offset` is the number of bytes already consumed before this reader
    /// was created.
    pub(crate) fn new(inner: R, offset: u64) -> Self {
        Self { inner, offset }
    }

    pub(crate) fn pos(&self) -> Pos {
        Pos::Offset(self.offset)
    }

    /// Converts an IO error from reading into the matching parse error.
    pub(crate) fn map_err(&self, e: io::Error) -> Error {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof(self.pos()),
            _ => Error::Io(e),
        }
    }

    /// Returns an error if there is more data left.
    pub(crate) fn assert_eof(&mut self) -> Result<(), Error> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => return Err(Error::UnexpectedAdditionalData(self.pos())),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl<R: Read> Read for BinReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}
