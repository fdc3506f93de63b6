//! Buffered draw commands
//!
//! A frame's GUI rendering is first recorded as a list of `DrawCommand`s and
//! replayed later, once the render pipeline schedules the GUI pass. Each
//! variant carries exactly the data its operation needs.

pub mod list;

pub use list::{CommandList, CommandWriter};

use crate::execute::graph::GraphTextureHandle;
use crate::foundation::math::{Mat4, Rect, Vec4};
use crate::handles::{BufferHandle, KeywordId, MaterialHandle, MeshHandle, PropertyId, RendererHandle};
use crate::texture::TextureHandle;

/// Texture reference held by a bind command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundTexture {
    /// Engine texture, bindable directly by an immediate command buffer
    Engine(TextureHandle),
    /// Texture imported into a render graph for the current frame
    Graph {
        /// Engine texture that was imported
        source: TextureHandle,
        /// Graph-side handle
        handle: GraphTextureHandle,
    },
}

impl BoundTexture {
    /// Engine texture behind the binding
    pub const fn source(self) -> TextureHandle {
        match self {
            Self::Engine(texture) | Self::Graph { source: texture, .. } => texture,
        }
    }
}

/// One buffered graphics operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Set the viewport rectangle
    SetViewport(Rect),
    /// Set view and projection matrices
    SetViewProjection {
        /// View matrix
        view: Mat4,
        /// Projection matrix
        projection: Mat4,
    },
    /// Open a profiling scope
    BeginSample(String),
    /// Close a profiling scope
    EndSample(String),
    /// Bind a texture to a global shader property
    SetGlobalTexture {
        /// Target property
        property: PropertyId,
        /// Texture to bind
        texture: BoundTexture,
    },
    /// Set a global integer shader property
    SetGlobalInt {
        /// Target property
        property: PropertyId,
        /// Value
        value: i32,
    },
    /// Set a global vector shader property
    SetGlobalVector {
        /// Target property
        property: PropertyId,
        /// Value
        value: Vec4,
    },
    /// Enable scissor testing with the given rectangle (y up)
    EnableScissor(Rect),
    /// Disable scissor testing
    DisableScissor,
    /// Draw one sub-mesh of a mesh
    DrawMesh {
        /// Mesh to draw
        mesh: MeshHandle,
        /// Model matrix
        transform: Mat4,
        /// Material to draw with
        material: MaterialHandle,
        /// Sub-mesh index
        sub_mesh: u32,
    },
    /// Draw a scene renderer with a material override
    DrawRenderer {
        /// Renderer to draw
        renderer: RendererHandle,
        /// Material to draw with
        material: MaterialHandle,
        /// Sub-mesh index
        sub_mesh: u32,
    },
    /// Indexed procedural draw with GPU-side arguments
    DrawProceduralIndirect {
        /// Index buffer
        index_buffer: BufferHandle,
        /// Model matrix
        transform: Mat4,
        /// Material to draw with
        material: MaterialHandle,
        /// Buffer holding the draw arguments
        arguments: BufferHandle,
        /// Byte offset of the arguments
        argument_offset: u32,
    },
    /// Clear the depth attachment
    ClearDepth,
    /// Enable a material keyword
    EnableKeyword {
        /// Material owning the keyword
        material: MaterialHandle,
        /// Keyword to enable
        keyword: KeywordId,
    },
    /// Disable a material keyword
    DisableKeyword {
        /// Material owning the keyword
        material: MaterialHandle,
        /// Keyword to disable
        keyword: KeywordId,
    },
}

impl DrawCommand {
    /// Short name of the variant, used in logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetViewport(_) => "SetViewport",
            Self::SetViewProjection { .. } => "SetViewProjection",
            Self::BeginSample(_) => "BeginSample",
            Self::EndSample(_) => "EndSample",
            Self::SetGlobalTexture { .. } => "SetGlobalTexture",
            Self::SetGlobalInt { .. } => "SetGlobalInt",
            Self::SetGlobalVector { .. } => "SetGlobalVector",
            Self::EnableScissor(_) => "EnableScissor",
            Self::DisableScissor => "DisableScissor",
            Self::DrawMesh { .. } => "DrawMesh",
            Self::DrawRenderer { .. } => "DrawRenderer",
            Self::DrawProceduralIndirect { .. } => "DrawProceduralIndirect",
            Self::ClearDepth => "ClearDepth",
            Self::EnableKeyword { .. } => "EnableKeyword",
            Self::DisableKeyword { .. } => "DisableKeyword",
        }
    }
}
