//! Per-frame GUI draw output
//!
//! These types mirror what the GUI library hands out after ending a frame.
//! Vertex and index memory is borrowed from the library's frame arena, so a
//! `DrawData` can only live for the frame that produced it.

use std::fmt;
use std::sync::Arc;

use crate::foundation::math::{Vec2, Vec4};
use crate::mesh::{DrawIdx, DrawVert};
use crate::texture::TextureId;

/// Error type returned by user draw callbacks
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

type CallbackFn = dyn Fn(&DrawList<'_>, &DrawCmd) -> Result<(), CallbackError> + Send + Sync;

/// Custom rendering hook carried by a draw call in place of geometry
///
/// Callbacks run synchronously while the frame is translated, never during
/// replay.
#[derive(Clone)]
pub struct UserCallback(Arc<CallbackFn>);

impl UserCallback {
    /// Wrap a closure as a draw callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&DrawList<'_>, &DrawCmd) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Invoke the callback
    pub fn invoke(&self, list: &DrawList<'_>, cmd: &DrawCmd) -> Result<(), CallbackError> {
        (self.0)(list, cmd)
    }
}

impl fmt::Debug for UserCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCallback").finish_non_exhaustive()
    }
}

/// One draw call inside a draw list
#[derive(Debug, Clone)]
pub struct DrawCmd {
    /// Clip rectangle `(min_x, min_y, max_x, max_y)` in display space
    pub clip_rect: Vec4,
    /// Texture sampled by this call
    pub texture_id: TextureId,
    /// Offset added to every index, in vertices
    pub vtx_offset: u32,
    /// First index inside the list's index buffer
    pub idx_offset: u32,
    /// Number of indices (multiple of 3)
    pub elem_count: u32,
    /// Replaces the geometry when set
    pub user_callback: Option<UserCallback>,
}

impl DrawCmd {
    /// Geometry draw call
    pub fn new(clip_rect: Vec4, texture_id: TextureId, idx_offset: u32, elem_count: u32) -> Self {
        Self {
            clip_rect,
            texture_id,
            vtx_offset: 0,
            idx_offset,
            elem_count,
            user_callback: None,
        }
    }

    /// Callback-only draw call
    pub fn callback(clip_rect: Vec4, callback: UserCallback) -> Self {
        Self {
            clip_rect,
            texture_id: TextureId::NULL,
            vtx_offset: 0,
            idx_offset: 0,
            elem_count: 0,
            user_callback: Some(callback),
        }
    }

    /// Set the vertex offset
    pub fn with_vtx_offset(mut self, vtx_offset: u32) -> Self {
        self.vtx_offset = vtx_offset;
        self
    }
}

/// A single draw list: one vertex/index buffer shared by its draw calls
#[derive(Debug, Clone, Copy)]
pub struct DrawList<'a> {
    /// Vertex memory
    pub vtx_buffer: &'a [DrawVert],
    /// Index memory
    pub idx_buffer: &'a [DrawIdx],
    /// Draw calls in submission order
    pub cmd_buffer: &'a [DrawCmd],
}

impl<'a> DrawList<'a> {
    /// Create a draw list view
    pub const fn new(vtx_buffer: &'a [DrawVert], idx_buffer: &'a [DrawIdx], cmd_buffer: &'a [DrawCmd]) -> Self {
        Self { vtx_buffer, idx_buffer, cmd_buffer }
    }
}

/// Everything the GUI library produced for one frame
#[derive(Debug, Clone)]
pub struct DrawData<'a> {
    /// Top-left of the display area in GUI coordinates
    pub display_pos: Vec2,
    /// Size of the display area in GUI coordinates
    pub display_size: Vec2,
    /// Display-to-framebuffer scale (e.g. 2.0 on high-DPI screens)
    pub framebuffer_scale: Vec2,
    /// Draw lists, back to front
    pub cmd_lists: Vec<DrawList<'a>>,
}

impl<'a> DrawData<'a> {
    /// Frame output with unit framebuffer scale at the origin
    pub fn new(display_size: Vec2, cmd_lists: Vec<DrawList<'a>>) -> Self {
        Self {
            display_pos: Vec2::zeros(),
            display_size,
            framebuffer_scale: Vec2::new(1.0, 1.0),
            cmd_lists,
        }
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> Vec2 {
        self.display_size.component_mul(&self.framebuffer_scale)
    }

    /// Vertex count across all lists
    pub fn total_vtx_count(&self) -> usize {
        self.cmd_lists.iter().map(|list| list.vtx_buffer.len()).sum()
    }

    /// Index count across all lists
    pub fn total_idx_count(&self) -> usize {
        self.cmd_lists.iter().map(|list| list.idx_buffer.len()).sum()
    }

    /// Draw call count across all lists
    pub fn total_cmd_count(&self) -> usize {
        self.cmd_lists.iter().map(|list| list.cmd_buffer.len()).sum()
    }

    /// True when there is nothing to render: minimized window or no vertices
    pub fn is_degenerate(&self) -> bool {
        let fb = self.framebuffer_size();
        fb.x <= 0.0 || fb.y <= 0.0 || self.total_vtx_count() == 0
    }
}
