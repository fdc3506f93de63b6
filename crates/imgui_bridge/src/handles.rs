//! Opaque handles to host engine resources
//!
//! The bridge never owns GPU objects directly. It refers to them through
//! these handles, and the host maps them back to real objects when commands
//! are replayed.

/// Handle to a mesh resource stored in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a material resource stored in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Handle to a scene renderer (an object the host can draw with a material)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererHandle(pub u64);

/// Handle to a GPU buffer (index or indirect-argument data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Shader property identifier, as produced by the host's name-to-id lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub i32);

/// Material-local shader keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeywordId(pub u32);
