//! Reading and writing polygon meshes.
//!
//! The crate has three parts:
//!
//! - [`PolyMesh`]: a simple shared-vertex polygon mesh with `f64` vertex
//!   positions,
//! - [`io`]: readers and writers for OBJ, OFF, PLY and STL files, plus file
//!   format detection,
//! - [`convert`]: the "load one file, store it in another format" operation
//!   used by the `meshconv` binary.
//!
//! ```no_run
//! use meshconv::io::{self, WriteOptions};
//!
//! # fn main() -> Result<(), io::Error> {
//! let mesh = io::read_file("bunny.ply")?;
//! io::write_file("bunny.obj", &mesh, &WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod test_utils;

pub mod convert;
pub mod handle;
pub mod io;
mod mesh;

pub use self::{
    handle::{FaceHandle, VertexHandle},
    mesh::{FaceVertices, PolyMesh},
};

/// Re-export of `cgmath`, as vertex positions are `cgmath::Point3<f64>`.
pub use cgmath;
