//! Converting a mesh file from one format into another.
//!
//! This is the whole job of the `meshconv` binary: load the mesh from the
//! input file (detecting its format) and store the very same mesh in the
//! format given by the extension of the output path.

use std::path::{Path, PathBuf};

use failure::Fail;

use crate::io::{self, FileFormat, WriteOptions};


/// Number of significant digits used for floating point values in text
/// encodings of the output file.
pub const OUTPUT_PRECISION: usize = 17;

/// Everything that can go wrong in [`convert`].
#[derive(Debug, Fail)]
pub enum Error {
    /// The converter was configured with invalid arguments.
    #[fail(display = "{}", _0)]
    Usage(String),

    /// The input file couldn't be loaded as valid mesh. The output file was
    /// not touched.
    #[fail(display = "failed to load '{}'", path)]
    InputLoad {
        path: String,
        #[cause]
        cause: io::Error,
    },

    /// The mesh couldn't be stored in the output file. A partially written
    /// output file has been removed.
    #[fail(display = "failed to write '{}'", path)]
    OutputWrite {
        path: String,
        #[cause]
        cause: io::Error,
    },
}

impl Error {
    /// The exit code the `meshconv` binary uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InputLoad { .. } => 1,
            Error::Usage(_) => 2,
            Error::OutputWrite { .. } => 3,
        }
    }
}

/// The validated arguments of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ConvertConfig {
    /// Creates a new config. Returns `Error::Usage` if one of the paths is
    /// empty.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Result<Self, Error> {
        let input_path = input_path.into();
        let output_path = output_path.into();

        if input_path.as_os_str().is_empty() {
            return Err(Error::Usage("the input path must not be empty".into()));
        }
        if output_path.as_os_str().is_empty() {
            return Err(Error::Usage("the output path must not be empty".into()));
        }

        Ok(Self { input_path, output_path })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Information about a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub source_format: FileFormat,
    pub target_format: FileFormat,
    pub num_vertices: u32,
    pub num_faces: u32,
}

/// Loads the mesh from the input file and writes it to the output file.
///
/// The input format is detected from the extension or the file content, the
/// output format from the extension only. Floats in text encodings are
/// written with [`OUTPUT_PRECISION`] significant digits; binary encodings use
/// the default of the format.
///
/// The output file is only created once the input has been loaded
/// successfully.
pub fn convert(config: &ConvertConfig) -> Result<Summary, Error> {
    let (mesh, source_format) = io::read_file_with_format(&config.input_path)
        .map_err(|cause| Error::InputLoad {
            path: config.input_path.display().to_string(),
            cause,
        })?;

    let options = WriteOptions::default().with_precision(OUTPUT_PRECISION);
    let target_format = io::write_file(&config.output_path, &mesh, &options)
        .map_err(|cause| Error::OutputWrite {
            path: config.output_path.display().to_string(),
            cause,
        })?;

    Ok(Summary {
        source_format,
        target_format,
        num_vertices: mesh.num_vertices(),
        num_faces: mesh.num_faces(),
    })
}


#[cfg(test)]
mod tests {
    use std::fs;

    use crate::test_utils::cube;
    use super::*;

    #[test]
    fn empty_paths() {
        assert!(matches!(ConvertConfig::new("", "out.obj"), Err(Error::Usage(_))));
        assert!(matches!(ConvertConfig::new("in.obj", ""), Err(Error::Usage(_))));
        assert!(ConvertConfig::new("in.obj", "out.obj").is_ok());
    }

    #[test]
    fn exit_codes() {
        let io_error = || io::Error::EmptyMesh;

        assert_eq!(Error::Usage("x".into()).exit_code(), 2);
        assert_eq!(Error::InputLoad { path: "a".into(), cause: io_error() }.exit_code(), 1);
        assert_eq!(Error::OutputWrite { path: "a".into(), cause: io_error() }.exit_code(), 3);
    }

    #[test]
    fn convert_cube() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cube.off");
        let output = dir.path().join("cube.obj");
        io::write_file(&input, &cube(), &WriteOptions::default()).unwrap();

        let config = ConvertConfig::new(&input, &output).unwrap();
        let summary = convert(&config).unwrap();
        assert_eq!(summary, Summary {
            source_format: FileFormat::Off,
            target_format: FileFormat::Obj,
            num_vertices: 8,
            num_faces: 12,
        });

        assert_eq!(io::read_file(&output).unwrap(), cube());
    }

    #[test]
    fn invalid_input_leaves_output_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.off");
        let output = dir.path().join("out.stl");
        fs::write(&input, "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n").unwrap();
        fs::write(&output, "old content").unwrap();

        let config = ConvertConfig::new(&input, &output).unwrap();
        let err = convert(&config).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fs::read_to_string(&output).unwrap(), "old content");
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.ply");
        let config = ConvertConfig::new(dir.path().join("nope.ply"), &output).unwrap();

        let err = convert(&config).unwrap_err();
        assert!(matches!(err, Error::InputLoad { cause: io::Error::Io(_), .. }));
        assert!(!output.exists());
    }

    #[test]
    fn unknown_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cube.ply");
        let output = dir.path().join("cube.dae");
        io::write_file(&input, &cube(), &WriteOptions::default()).unwrap();

        let config = ConvertConfig::new(&input, &output).unwrap();
        let err = convert(&config).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { cause: io::Error::UnknownFormat(_), .. }));
        assert_eq!(err.exit_code(), 3);
        assert!(!output.exists());
    }
}
