//! Defines `Args` which is used to parse command line arguments.

use std::path::PathBuf;

use structopt::{StructOpt, clap::AppSettings};


/// The usage line printed after usage errors.
pub const USAGE: &str = "meshconv [-v|--verbose] <input> <output>";

/// Converts a polygon mesh from one file format into another. Supported
/// formats: OBJ, OFF, PLY and STL.
#[derive(StructOpt, Debug)]
#[structopt(name = "meshconv", setting = AppSettings::ColorNever)]
pub struct Args {
    /// Print the detected formats, the size of the mesh and timings.
    #[structopt(short, long)]
    pub verbose: bool,

    /// Path to the input mesh file. The format is detected from the extension
    /// or, if that fails, from the file content.
    #[structopt(parse(from_os_str))]
    pub input: PathBuf,

    /// Path to the output mesh file. The format is determined by the
    /// extension (`.obj`, `.off`, `.ply` or `.stl`). An existing file is
    /// overwritten.
    #[structopt(parse(from_os_str))]
    pub output: PathBuf,
}

/// Turns a clap error message into a single line: the part in front of the
/// first empty line, without the `error: ` prefix.
pub fn short_clap_message(message: &str) -> String {
    let summary = message.lines()
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ");

    summary.trim_start_matches("error:").trim().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let args = Args::from_iter_safe(&["meshconv", "a.obj", "b.stl"]).unwrap();
        assert!(!args.verbose);
        assert_eq!(args.input, PathBuf::from("a.obj"));
        assert_eq!(args.output, PathBuf::from("b.stl"));

        let args = Args::from_iter_safe(&["meshconv", "-v", "a.obj", "b.stl"]).unwrap();
        assert!(args.verbose);
        let args = Args::from_iter_safe(&["meshconv", "a.obj", "--verbose", "b.stl"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn wrong_number_of_args() {
        assert!(Args::from_iter_safe(&["meshconv"]).is_err());
        assert!(Args::from_iter_safe(&["meshconv", "a.obj"]).is_err());
        assert!(Args::from_iter_safe(&["meshconv", "a.obj", "b.obj", "c.obj"]).is_err());
    }

    #[test]
    fn short_message() {
        let msg = "error: The following required arguments were not provided:\n    \
            <output>\n\nUSAGE:\n    meshconv <input> <output>\n\n\
            For more information try --help\n";
        assert_eq!(
            short_clap_message(msg),
            "The following required arguments were not provided: <output>",
        );
    }
}
