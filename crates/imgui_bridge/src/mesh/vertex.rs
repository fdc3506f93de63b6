//! Vertex types for GUI rendering

use bytemuck::{Pod, Zeroable};

/// Index type of GUI draw lists
///
/// Sixteen bits is enough because every draw call carries a vertex offset.
pub type DrawIdx = u16;

/// GUI vertex, bit-identical to the library's native layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct DrawVert {
    /// Position in display space
    pub pos: [f32; 2],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Packed RGBA8 color
    pub col: u32,
}

impl DrawVert {
    /// Create a new vertex
    pub const fn new(pos: [f32; 2], uv: [f32; 2], col: u32) -> Self {
        Self { pos, uv, col }
    }
}

/// Semantic slot a vertex attribute is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    /// Vertex position
    Position,
    /// First texture coordinate set
    TexCoord0,
    /// Second texture coordinate set
    TexCoord1,
}

/// Scalar format of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttributeFormat {
    /// 32-bit float
    Float32,
    /// 32-bit unsigned integer
    UInt32,
}

/// One entry of a vertex layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeDescriptor {
    /// Semantic slot
    pub attribute: VertexAttribute,
    /// Scalar format
    pub format: VertexAttributeFormat,
    /// Number of scalars
    pub dimension: u8,
}

/// Layout of `DrawVert` as seen by the host mesh
///
/// Color travels in the second texcoord slot so hosts that reorder a color
/// attribute ahead of uvs keep the native byte layout.
pub const DRAW_VERT_LAYOUT: [VertexAttributeDescriptor; 3] = [
    VertexAttributeDescriptor {
        attribute: VertexAttribute::Position,
        format: VertexAttributeFormat::Float32,
        dimension: 2,
    },
    VertexAttributeDescriptor {
        attribute: VertexAttribute::TexCoord0,
        format: VertexAttributeFormat::Float32,
        dimension: 2,
    },
    VertexAttributeDescriptor {
        attribute: VertexAttribute::TexCoord1,
        format: VertexAttributeFormat::UInt32,
        dimension: 1,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct_size() {
        let bytes: usize = DRAW_VERT_LAYOUT.iter().map(|a| 4 * usize::from(a.dimension)).sum();
        assert_eq!(bytes, std::mem::size_of::<DrawVert>());
        assert_eq!(std::mem::size_of::<DrawVert>(), 20);
    }

    #[test]
    fn test_vertex_bytes_are_raw() {
        let vert = DrawVert::new([1.0, 2.0], [0.5, 0.25], 0xff00_ff00);
        let bytes: &[u8] = bytemuck::bytes_of(&vert);
        assert_eq!(&bytes[16..20], &0xff00_ff00u32.to_ne_bytes());
    }
}
