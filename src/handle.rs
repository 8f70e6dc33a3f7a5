//! Handles to refer to mesh elements.
//!
//! A handle is just a typed index into the element list of one
//! [`PolyMesh`][crate::PolyMesh]. Handles of different element types can't be
//! mixed up, and a handle is never valid for a mesh other than the one that
//! created it.

use std::fmt;

use derive_more::{From, Into};


/// The integer type all handles wrap.
pub type DefaultIndex = u32;

/// Types that are handles to mesh elements.
pub trait Handle: Copy + Eq + fmt::Debug {
    /// Creates a handle from the given index. Panics if `idx` does not fit
    /// into [`DefaultIndex`].
    fn from_usize(idx: usize) -> Self;

    /// Returns the raw index.
    fn idx(&self) -> DefaultIndex;

    /// Returns the raw index as `usize`, mostly for indexing into slices.
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident, $short:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
        pub struct $name(DefaultIndex);

        impl $name {
            /// Creates a handle from the given raw index.
            pub const fn new(idx: DefaultIndex) -> Self {
                $name(idx)
            }
        }

        impl Handle for $name {
            fn from_usize(idx: usize) -> Self {
                assert!(
                    idx <= DefaultIndex::max_value() as usize,
                    "handle index {} does not fit into `DefaultIndex`",
                    idx,
                );
                $name(idx as DefaultIndex)
            }

            fn idx(&self) -> DefaultIndex {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}{}", $short, self.0)
            }
        }
    }
}

make_handle_type!(
    /// Refers to one vertex of a mesh.
    VertexHandle, "V"
);
make_handle_type!(
    /// Refers to one face of a mesh.
    FaceHandle, "F"
);
