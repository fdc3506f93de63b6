//! Replay inside a render-graph raster pass

use super::graph::{FrameGraph, GraphRecorder, PassBuilder};
use super::{replay, RecordResult};
use crate::command::{BoundTexture, DrawCommand};
use crate::texture::TextureHandle;

/// Camera render targets the GUI pass draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraTargets {
    /// Color target
    pub color: TextureHandle,
    /// Depth target
    pub depth: TextureHandle,
}

/// Adds the GUI raster pass to a frame graph
#[derive(Debug, Clone)]
pub struct DeferredExecutor {
    pass_name: String,
}

impl DeferredExecutor {
    /// Default pass name
    pub const PASS_NAME: &'static str = "ImGui Render Pass";

    /// Create an executor adding a pass called `pass_name`
    pub fn new(pass_name: impl Into<String>) -> Self {
        Self {
            pass_name: pass_name.into(),
        }
    }

    /// Name of the added pass
    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    /// Import every bound texture into the graph and declare it as read
    ///
    /// Rewrites `SetGlobalTexture` commands in place so their textures refer
    /// to graph handles. Already rewritten bindings only get their read
    /// declared again.
    pub fn prepare_for_render_graph(builder: &mut PassBuilder<'_, '_>, commands: &mut [DrawCommand]) {
        for command in commands.iter_mut() {
            if let DrawCommand::SetGlobalTexture { texture, .. } = command {
                let source = texture.source();
                let handle = builder.import_texture(source);
                builder.use_texture(handle);
                *texture = BoundTexture::Graph { source, handle };
            }
        }
    }

    /// Add the GUI pass replaying `commands` to `graph`
    ///
    /// The pass may be culled when there is nothing to draw.
    pub fn record<'a>(
        &self,
        graph: &mut FrameGraph<'a>,
        targets: CameraTargets,
        commands: &'a mut [DrawCommand],
    ) -> RecordResult<()> {
        let is_empty = commands.is_empty();
        graph.add_raster_pass(self.pass_name.as_str(), move |builder| {
            Self::prepare_for_render_graph(builder, commands);

            let color = builder.import_texture(targets.color);
            let depth = builder.import_texture(targets.depth);
            builder.allow_global_state_modification(true);
            builder.set_render_attachment(color, 0);
            builder.set_render_attachment_depth(depth);
            builder.allow_pass_culling(is_empty);

            let commands: &'a [DrawCommand] = commands;
            builder.set_render_func(move |context| replay(commands, &mut GraphRecorder::new(context)));
            Ok(())
        })
    }
}

impl Default for DeferredExecutor {
    fn default() -> Self {
        Self::new(Self::PASS_NAME)
    }
}
