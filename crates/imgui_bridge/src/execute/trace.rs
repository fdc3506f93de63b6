//! In-memory recorder
//!
//! Stores every replayed call together with the scissor state it ran under.
//! Used to compare backends and to inspect a frame without a GPU.

use super::{CommandRecorder, RecordError, RecordResult};
use crate::command::{BoundTexture, DrawCommand};
use crate::foundation::math::{Mat4, Rect, Vec4};
use crate::handles::{BufferHandle, KeywordId, MaterialHandle, MeshHandle, PropertyId, RendererHandle};

/// One call seen by a `TraceRecorder`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The call, as a command
    pub command: DrawCommand,
    /// Scissor rectangle active when the call was recorded
    pub scissor: Option<Rect>,
}

/// Recorder that keeps every call
#[derive(Debug, Default)]
pub struct TraceRecorder {
    calls: Vec<RecordedCall>,
    scissor: Option<Rect>,
    samples: Vec<String>,
}

impl TraceRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Recorded commands, without state
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.calls.iter().map(|c| c.command.clone()).collect()
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Profiling scopes still open
    pub fn open_samples(&self) -> &[String] {
        &self.samples
    }

    /// Forget everything recorded
    pub fn clear(&mut self) {
        self.calls.clear();
        self.scissor = None;
        self.samples.clear();
    }

    fn push(&mut self, command: DrawCommand) -> RecordResult<()> {
        log::trace!("record {:?}", command);
        self.calls.push(RecordedCall {
            command,
            scissor: self.scissor,
        });
        Ok(())
    }
}

impl CommandRecorder for TraceRecorder {
    fn set_viewport(&mut self, viewport: Rect) -> RecordResult<()> {
        self.push(DrawCommand::SetViewport(viewport))
    }

    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4) -> RecordResult<()> {
        self.push(DrawCommand::SetViewProjection {
            view: *view,
            projection: *projection,
        })
    }

    fn begin_sample(&mut self, label: &str) -> RecordResult<()> {
        self.samples.push(label.to_string());
        self.push(DrawCommand::BeginSample(label.to_string()))
    }

    fn end_sample(&mut self, label: &str) -> RecordResult<()> {
        match self.samples.last() {
            Some(open) if open == label => {
                self.samples.pop();
                self.push(DrawCommand::EndSample(label.to_string()))
            }
            open => Err(RecordError::UnbalancedSample {
                expected: open.cloned().unwrap_or_default(),
                found: label.to_string(),
            }),
        }
    }

    fn set_global_texture(&mut self, property: PropertyId, texture: BoundTexture) -> RecordResult<()> {
        self.push(DrawCommand::SetGlobalTexture { property, texture })
    }

    fn set_global_int(&mut self, property: PropertyId, value: i32) -> RecordResult<()> {
        self.push(DrawCommand::SetGlobalInt { property, value })
    }

    fn set_global_vector(&mut self, property: PropertyId, value: &Vec4) -> RecordResult<()> {
        self.push(DrawCommand::SetGlobalVector { property, value: *value })
    }

    fn enable_scissor(&mut self, rect: Rect) -> RecordResult<()> {
        self.scissor = Some(rect);
        self.push(DrawCommand::EnableScissor(rect))
    }

    fn disable_scissor(&mut self) -> RecordResult<()> {
        self.scissor = None;
        self.push(DrawCommand::DisableScissor)
    }

    fn draw_mesh(
        &mut self,
        mesh: MeshHandle,
        transform: &Mat4,
        material: MaterialHandle,
        sub_mesh: u32,
    ) -> RecordResult<()> {
        self.push(DrawCommand::DrawMesh {
            mesh,
            transform: *transform,
            material,
            sub_mesh,
        })
    }

    fn draw_renderer(&mut self, renderer: RendererHandle, material: MaterialHandle, sub_mesh: u32) -> RecordResult<()> {
        self.push(DrawCommand::DrawRenderer {
            renderer,
            material,
            sub_mesh,
        })
    }

    fn draw_procedural_indirect(
        &mut self,
        index_buffer: BufferHandle,
        transform: &Mat4,
        material: MaterialHandle,
        arguments: BufferHandle,
        argument_offset: u32,
    ) -> RecordResult<()> {
        self.push(DrawCommand::DrawProceduralIndirect {
            index_buffer,
            transform: *transform,
            material,
            arguments,
            argument_offset,
        })
    }

    fn clear_depth(&mut self) -> RecordResult<()> {
        self.push(DrawCommand::ClearDepth)
    }

    fn enable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()> {
        self.push(DrawCommand::EnableKeyword { material, keyword })
    }

    fn disable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()> {
        self.push(DrawCommand::DisableKeyword { material, keyword })
    }
}
