//! GUI mesh
//!
//! - `vertex`: the native GUI vertex layout
//! - `dynamic`: the host mesh interface and a CPU implementation
//! - `builder`: the per-frame rebuild from draw lists

pub mod builder;
pub mod dynamic;
pub mod vertex;

pub use builder::MeshBuilder;
pub use dynamic::{CpuMesh, DynamicMesh, IndexFormat, MeshTopology, MeshUpdateFlags, SubMeshDescriptor};
pub use vertex::{DrawIdx, DrawVert, VertexAttributeDescriptor, DRAW_VERT_LAYOUT};

/// Errors raised while rebuilding the GUI mesh
#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    /// Sub-mesh count changed on a mesh that was not cleared first
    #[error("sub-mesh count changed from {from} to {to} without clearing the mesh")]
    ResizeWithoutReset {
        /// Previous count
        from: usize,
        /// Requested count
        to: usize,
    },

    /// Number of descriptors differs from the declared sub-mesh count
    #[error("expected {expected} sub-mesh descriptors, got {actual}")]
    SubMeshCountMismatch {
        /// Declared sub-mesh count
        expected: usize,
        /// Descriptors supplied
        actual: usize,
    },

    /// A sub-mesh reaches past the end of the index buffer
    #[error("sub-mesh {index} ends at index {end}, buffer holds {capacity}")]
    SubMeshOutOfRange {
        /// Offending sub-mesh
        index: usize,
        /// One past its last index
        end: usize,
        /// Index buffer length
        capacity: usize,
    },

    /// A copy would write past the end of a buffer
    #[error("write of {len} elements at {start} overflows buffer of {capacity}")]
    BufferOverflow {
        /// Destination offset
        start: usize,
        /// Elements written
        len: usize,
        /// Buffer length
        capacity: usize,
    },

    /// The mesh cannot store the requested index format
    #[error("unsupported index format {0:?}")]
    UnsupportedIndexFormat(IndexFormat),

    /// Host-specific failure
    #[error("mesh backend error: {0}")]
    Backend(String),
}

/// Result type for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;
