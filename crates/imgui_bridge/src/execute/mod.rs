//! Command replay
//!
//! A sealed command list is replayed against a `CommandRecorder`, which stands
//! for whatever the host records graphics work into. `replay` is the single
//! dispatch point; the executors only decide where the recorder comes from:
//!
//! - `immediate`: a pooled command buffer, submitted right away
//! - `deferred`: a raster pass inside a `graph::FrameGraph`
//! - `trace`: an in-memory recorder for inspection

pub mod deferred;
pub mod graph;
pub mod immediate;
pub mod trace;

pub use deferred::{CameraTargets, DeferredExecutor};
pub use graph::{FrameGraph, GraphStats, GraphTextureHandle, PassBuilder, RasterContext};
pub use immediate::{ImmediateContext, ImmediateExecutor};
pub use trace::{RecordedCall, TraceRecorder};

use crate::command::{BoundTexture, DrawCommand};
use crate::foundation::math::{Mat4, Rect, Vec4};
use crate::handles::{BufferHandle, KeywordId, MaterialHandle, MeshHandle, PropertyId, RendererHandle};
use crate::texture::TextureHandle;

/// Errors raised while recording commands
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    /// An engine texture reached a render-graph pass without being imported
    #[error("texture {0:?} was not imported into the render graph")]
    UnresolvedTexture(TextureHandle),

    /// A graph handle that this graph never handed out
    #[error("unknown graph texture {0:?}")]
    UnknownGraphTexture(GraphTextureHandle),

    /// A pass sampled a texture it did not declare as read
    #[error("pass '{pass}' reads {texture:?} without declaring it")]
    UndeclaredRead {
        /// Pass name
        pass: String,
        /// Texture read
        texture: GraphTextureHandle,
    },

    /// A pass set global shader state without being allowed to
    #[error("pass '{0}' modifies global state without permission")]
    GlobalStateNotAllowed(String),

    /// A pass was added without a render function
    #[error("pass '{0}' has no render function")]
    MissingRenderFunc(String),

    /// A profiling scope was closed out of order
    #[error("sample '{found}' closed while '{expected}' was open")]
    UnbalancedSample {
        /// Innermost open scope, empty if none
        expected: String,
        /// Scope being closed
        found: String,
    },

    /// Host-specific failure
    #[error("recorder backend error: {0}")]
    Backend(String),
}

/// Result type for recording operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Sink for replayed graphics operations
///
/// One method per `DrawCommand` variant.
pub trait CommandRecorder {
    /// Set the viewport rectangle
    fn set_viewport(&mut self, viewport: Rect) -> RecordResult<()>;

    /// Set view and projection matrices
    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4) -> RecordResult<()>;

    /// Open a profiling scope
    fn begin_sample(&mut self, label: &str) -> RecordResult<()>;

    /// Close a profiling scope
    fn end_sample(&mut self, label: &str) -> RecordResult<()>;

    /// Bind a texture to a global shader property
    fn set_global_texture(&mut self, property: PropertyId, texture: BoundTexture) -> RecordResult<()>;

    /// Set a global integer shader property
    fn set_global_int(&mut self, property: PropertyId, value: i32) -> RecordResult<()>;

    /// Set a global vector shader property
    fn set_global_vector(&mut self, property: PropertyId, value: &Vec4) -> RecordResult<()>;

    /// Enable scissor testing
    fn enable_scissor(&mut self, rect: Rect) -> RecordResult<()>;

    /// Disable scissor testing
    fn disable_scissor(&mut self) -> RecordResult<()>;

    /// Draw one sub-mesh of a mesh
    fn draw_mesh(
        &mut self,
        mesh: MeshHandle,
        transform: &Mat4,
        material: MaterialHandle,
        sub_mesh: u32,
    ) -> RecordResult<()>;

    /// Draw a scene renderer with a material override
    fn draw_renderer(&mut self, renderer: RendererHandle, material: MaterialHandle, sub_mesh: u32) -> RecordResult<()>;

    /// Indexed procedural draw with GPU-side arguments
    fn draw_procedural_indirect(
        &mut self,
        index_buffer: BufferHandle,
        transform: &Mat4,
        material: MaterialHandle,
        arguments: BufferHandle,
        argument_offset: u32,
    ) -> RecordResult<()>;

    /// Clear the depth attachment only
    fn clear_depth(&mut self) -> RecordResult<()>;

    /// Enable a material keyword
    fn enable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()>;

    /// Disable a material keyword
    fn disable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()>;
}

/// Replay `commands` in order, stopping at the first recorder error
pub fn replay<R: CommandRecorder + ?Sized>(commands: &[DrawCommand], recorder: &mut R) -> RecordResult<()> {
    for command in commands {
        match command {
            DrawCommand::SetViewport(rect) => recorder.set_viewport(*rect)?,
            DrawCommand::SetViewProjection { view, projection } => recorder.set_view_projection(view, projection)?,
            DrawCommand::BeginSample(label) => recorder.begin_sample(label)?,
            DrawCommand::EndSample(label) => recorder.end_sample(label)?,
            DrawCommand::SetGlobalTexture { property, texture } => recorder.set_global_texture(*property, *texture)?,
            DrawCommand::SetGlobalInt { property, value } => recorder.set_global_int(*property, *value)?,
            DrawCommand::SetGlobalVector { property, value } => recorder.set_global_vector(*property, value)?,
            DrawCommand::EnableScissor(rect) => recorder.enable_scissor(*rect)?,
            DrawCommand::DisableScissor => recorder.disable_scissor()?,
            DrawCommand::DrawMesh {
                mesh,
                transform,
                material,
                sub_mesh,
            } => recorder.draw_mesh(*mesh, transform, *material, *sub_mesh)?,
            DrawCommand::DrawRenderer {
                renderer,
                material,
                sub_mesh,
            } => recorder.draw_renderer(*renderer, *material, *sub_mesh)?,
            DrawCommand::DrawProceduralIndirect {
                index_buffer,
                transform,
                material,
                arguments,
                argument_offset,
            } => recorder.draw_procedural_indirect(*index_buffer, transform, *material, *arguments, *argument_offset)?,
            DrawCommand::ClearDepth => recorder.clear_depth()?,
            DrawCommand::EnableKeyword { material, keyword } => recorder.enable_keyword(*material, *keyword)?,
            DrawCommand::DisableKeyword { material, keyword } => recorder.disable_keyword(*material, *keyword)?,
        }
    }
    Ok(())
}
