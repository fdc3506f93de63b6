//! Minimal deferred render graph
//!
//! Passes are declared up front (imported textures, reads, attachments,
//! permissions) and run later, in insertion order. Engine textures must be
//! imported to get a `GraphTextureHandle` before a pass may read them, and a
//! pass only sees its declared reads through its `RasterContext`.
//!
//! Nothing consumes pass outputs inside this graph, so every pass that allows
//! culling is culled.

use super::{CommandRecorder, RecordError, RecordResult};
use crate::command::BoundTexture;
use crate::foundation::math::{Mat4, Rect, Vec4};
use crate::handles::{BufferHandle, KeywordId, MaterialHandle, MeshHandle, PropertyId, RendererHandle};
use crate::texture::TextureHandle;

/// Texture as known to one frame graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphTextureHandle(usize);

impl GraphTextureHandle {
    const fn index(self) -> usize {
        self.0
    }
}

type RenderFunc<'a> = Box<dyn FnOnce(&mut RasterContext<'_>) -> RecordResult<()> + 'a>;

struct PassRecord<'a> {
    name: String,
    reads: Vec<GraphTextureHandle>,
    color_attachments: Vec<(GraphTextureHandle, u32)>,
    depth_attachment: Option<GraphTextureHandle>,
    allow_culling: bool,
    allow_global_state: bool,
    render: Option<RenderFunc<'a>>,
}

/// Outcome of `FrameGraph::execute`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    /// Passes whose render function ran
    pub executed: usize,
    /// Passes skipped by culling
    pub culled: usize,
}

/// Frame-local render graph
///
/// `'a` bounds what render functions may borrow.
#[derive(Default)]
pub struct FrameGraph<'a> {
    imports: Vec<TextureHandle>,
    passes: Vec<PassRecord<'a>>,
}

impl<'a> FrameGraph<'a> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            imports: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Import an engine texture, returning the existing handle if already imported
    pub fn import_texture(&mut self, texture: TextureHandle) -> GraphTextureHandle {
        import(&mut self.imports, texture)
    }

    /// Engine texture behind a graph handle
    pub fn resolve(&self, handle: GraphTextureHandle) -> Option<TextureHandle> {
        self.imports.get(handle.index()).copied()
    }

    /// Number of declared passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Names of declared passes, in execution order
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|p| p.name.as_str())
    }

    /// Declare a raster pass
    ///
    /// `setup` declares the pass's resources and must set a render function.
    pub fn add_raster_pass<F>(&mut self, name: impl Into<String>, setup: F) -> RecordResult<()>
    where
        F: FnOnce(&mut PassBuilder<'_, 'a>) -> RecordResult<()>,
    {
        let mut builder = PassBuilder {
            imports: &mut self.imports,
            pass: PassRecord {
                name: name.into(),
                reads: Vec::new(),
                color_attachments: Vec::new(),
                depth_attachment: None,
                allow_culling: false,
                allow_global_state: false,
                render: None,
            },
        };
        setup(&mut builder)?;

        let pass = builder.pass;
        if pass.render.is_none() {
            return Err(RecordError::MissingRenderFunc(pass.name));
        }
        log::trace!(
            "Added pass '{}' ({} reads, {} color attachments)",
            pass.name,
            pass.reads.len(),
            pass.color_attachments.len()
        );
        self.passes.push(pass);
        Ok(())
    }

    /// Run every surviving pass against `recorder`
    pub fn execute(self, recorder: &mut dyn CommandRecorder) -> RecordResult<GraphStats> {
        let mut stats = GraphStats::default();

        for mut pass in self.passes {
            if pass.allow_culling {
                log::trace!("Culled pass '{}'", pass.name);
                stats.culled += 1;
                continue;
            }

            let Some(render) = pass.render.take() else {
                return Err(RecordError::MissingRenderFunc(pass.name));
            };
            let mut context = RasterContext {
                pass_name: &pass.name,
                imports: &self.imports,
                reads: &pass.reads,
                color_attachments: &pass.color_attachments,
                depth_attachment: pass.depth_attachment,
                allow_global_state: pass.allow_global_state,
                recorder: &mut *recorder,
            };
            render(&mut context)?;
            stats.executed += 1;
        }

        Ok(stats)
    }
}

fn import(imports: &mut Vec<TextureHandle>, texture: TextureHandle) -> GraphTextureHandle {
    let index = imports.iter().position(|t| *t == texture).unwrap_or_else(|| {
        imports.push(texture);
        imports.len() - 1
    });
    GraphTextureHandle(index)
}

/// Declares one pass's resources
pub struct PassBuilder<'g, 'a> {
    imports: &'g mut Vec<TextureHandle>,
    pass: PassRecord<'a>,
}

impl<'a> PassBuilder<'_, 'a> {
    /// Name of the pass being declared
    pub fn name(&self) -> &str {
        &self.pass.name
    }

    /// Import an engine texture into the graph
    pub fn import_texture(&mut self, texture: TextureHandle) -> GraphTextureHandle {
        import(self.imports, texture)
    }

    /// Declare that the pass samples `texture`
    pub fn use_texture(&mut self, texture: GraphTextureHandle) {
        if !self.pass.reads.contains(&texture) {
            self.pass.reads.push(texture);
        }
    }

    /// Bind a color attachment at `index`
    pub fn set_render_attachment(&mut self, texture: GraphTextureHandle, index: u32) {
        self.pass.color_attachments.retain(|(_, i)| *i != index);
        self.pass.color_attachments.push((texture, index));
    }

    /// Bind the depth attachment
    pub fn set_render_attachment_depth(&mut self, texture: GraphTextureHandle) {
        self.pass.depth_attachment = Some(texture);
    }

    /// Let the graph skip this pass
    pub fn allow_pass_culling(&mut self, allow: bool) {
        self.pass.allow_culling = allow;
    }

    /// Let the pass set global shader state
    pub fn allow_global_state_modification(&mut self, allow: bool) {
        self.pass.allow_global_state = allow;
    }

    /// Set the function that records the pass
    pub fn set_render_func<F>(&mut self, render: F)
    where
        F: FnOnce(&mut RasterContext<'_>) -> RecordResult<()> + 'a,
    {
        self.pass.render = Some(Box::new(render));
    }
}

/// What a pass's render function records into
pub struct RasterContext<'r> {
    pass_name: &'r str,
    imports: &'r [TextureHandle],
    reads: &'r [GraphTextureHandle],
    color_attachments: &'r [(GraphTextureHandle, u32)],
    depth_attachment: Option<GraphTextureHandle>,
    allow_global_state: bool,
    recorder: &'r mut dyn CommandRecorder,
}

impl RasterContext<'_> {
    /// Name of the running pass
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Engine texture behind a declared read
    pub fn resolve(&self, texture: GraphTextureHandle) -> RecordResult<TextureHandle> {
        let resolved = self
            .imports
            .get(texture.index())
            .copied()
            .ok_or(RecordError::UnknownGraphTexture(texture))?;
        if !self.reads.contains(&texture) {
            return Err(RecordError::UndeclaredRead {
                pass: self.pass_name.to_string(),
                texture,
            });
        }
        Ok(resolved)
    }

    /// Engine texture bound as color attachment `index`
    pub fn color_attachment(&self, index: u32) -> Option<TextureHandle> {
        self.color_attachments
            .iter()
            .find(|(_, i)| *i == index)
            .and_then(|(t, _)| self.imports.get(t.index()).copied())
    }

    /// Engine texture bound as depth attachment
    pub fn depth_attachment(&self) -> Option<TextureHandle> {
        self.depth_attachment.and_then(|t| self.imports.get(t.index()).copied())
    }

    /// Raw recorder of the pass
    pub fn recorder(&mut self) -> &mut dyn CommandRecorder {
        &mut *self.recorder
    }

    fn check_global_state(&self) -> RecordResult<()> {
        if self.allow_global_state {
            Ok(())
        } else {
            Err(RecordError::GlobalStateNotAllowed(self.pass_name.to_string()))
        }
    }
}

/// `CommandRecorder` view of a raster pass
///
/// Resolves graph texture bindings back to engine textures, enforces declared
/// reads and the global-state permission, and rejects engine textures that
/// were never imported.
pub struct GraphRecorder<'c, 'r> {
    context: &'c mut RasterContext<'r>,
}

impl<'c, 'r> GraphRecorder<'c, 'r> {
    /// Wrap a raster context
    pub fn new(context: &'c mut RasterContext<'r>) -> Self {
        Self { context }
    }
}

impl CommandRecorder for GraphRecorder<'_, '_> {
    fn set_viewport(&mut self, viewport: Rect) -> RecordResult<()> {
        self.context.recorder.set_viewport(viewport)
    }

    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4) -> RecordResult<()> {
        self.context.recorder.set_view_projection(view, projection)
    }

    fn begin_sample(&mut self, label: &str) -> RecordResult<()> {
        self.context.recorder.begin_sample(label)
    }

    fn end_sample(&mut self, label: &str) -> RecordResult<()> {
        self.context.recorder.end_sample(label)
    }

    fn set_global_texture(&mut self, property: PropertyId, texture: BoundTexture) -> RecordResult<()> {
        self.context.check_global_state()?;
        let resolved = match texture {
            BoundTexture::Engine(texture) => return Err(RecordError::UnresolvedTexture(texture)),
            BoundTexture::Graph { handle, .. } => self.context.resolve(handle)?,
        };
        self.context.recorder.set_global_texture(property, BoundTexture::Engine(resolved))
    }

    fn set_global_int(&mut self, property: PropertyId, value: i32) -> RecordResult<()> {
        self.context.check_global_state()?;
        self.context.recorder.set_global_int(property, value)
    }

    fn set_global_vector(&mut self, property: PropertyId, value: &Vec4) -> RecordResult<()> {
        self.context.check_global_state()?;
        self.context.recorder.set_global_vector(property, value)
    }

    fn enable_scissor(&mut self, rect: Rect) -> RecordResult<()> {
        self.context.recorder.enable_scissor(rect)
    }

    fn disable_scissor(&mut self) -> RecordResult<()> {
        self.context.recorder.disable_scissor()
    }

    fn draw_mesh(
        &mut self,
        mesh: MeshHandle,
        transform: &Mat4,
        material: MaterialHandle,
        sub_mesh: u32,
    ) -> RecordResult<()> {
        self.context.recorder.draw_mesh(mesh, transform, material, sub_mesh)
    }

    fn draw_renderer(&mut self, renderer: RendererHandle, material: MaterialHandle, sub_mesh: u32) -> RecordResult<()> {
        self.context.recorder.draw_renderer(renderer, material, sub_mesh)
    }

    fn draw_procedural_indirect(
        &mut self,
        index_buffer: BufferHandle,
        transform: &Mat4,
        material: MaterialHandle,
        arguments: BufferHandle,
        argument_offset: u32,
    ) -> RecordResult<()> {
        self.context
            .recorder
            .draw_procedural_indirect(index_buffer, transform, material, arguments, argument_offset)
    }

    fn clear_depth(&mut self) -> RecordResult<()> {
        self.context.recorder.clear_depth()
    }

    fn enable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()> {
        self.context.recorder.enable_keyword(material, keyword)
    }

    fn disable_keyword(&mut self, material: MaterialHandle, keyword: KeywordId) -> RecordResult<()> {
        self.context.recorder.disable_keyword(material, keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::TraceRecorder;

    #[test]
    fn test_import_is_idempotent() {
        let mut graph = FrameGraph::new();
        let a = graph.import_texture(TextureHandle(1));
        let b = graph.import_texture(TextureHandle(2));

        assert_eq!(graph.import_texture(TextureHandle(1)), a);
        assert_ne!(a, b);
        assert_eq!(graph.resolve(b), Some(TextureHandle(2)));
    }

    #[test]
    fn test_every_import_gets_its_own_handle() {
        let mut graph = FrameGraph::new();
        let handles: Vec<_> = (0..1000).map(|i| graph.import_texture(TextureHandle(i))).collect();

        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(graph.resolve(*handle), Some(TextureHandle(i as u64)));
        }
        assert_ne!(handles[0], handles[999]);
    }

    #[test]
    fn test_passes_run_in_insertion_order() {
        let mut graph = FrameGraph::new();
        graph
            .add_raster_pass("first", |builder| {
                builder.set_render_func(|ctx| ctx.recorder().clear_depth());
                Ok(())
            })
            .unwrap();
        graph
            .add_raster_pass("second", |builder| {
                builder.set_render_func(|ctx| ctx.recorder().disable_scissor());
                Ok(())
            })
            .unwrap();
        assert_eq!(graph.pass_names().collect::<Vec<_>>(), vec!["first", "second"]);

        let mut recorder = TraceRecorder::new();
        let stats = graph.execute(&mut recorder).unwrap();

        assert_eq!(stats, GraphStats { executed: 2, culled: 0 });
        assert_eq!(
            recorder.commands(),
            vec![crate::command::DrawCommand::ClearDepth, crate::command::DrawCommand::DisableScissor]
        );
    }

    #[test]
    fn test_cullable_pass_is_skipped() {
        let mut graph = FrameGraph::new();
        graph
            .add_raster_pass("empty", |builder| {
                builder.allow_pass_culling(true);
                builder.set_render_func(|ctx| ctx.recorder().clear_depth());
                Ok(())
            })
            .unwrap();

        let mut recorder = TraceRecorder::new();
        let stats = graph.execute(&mut recorder).unwrap();

        assert_eq!(stats.culled, 1);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_pass_without_render_func_is_rejected() {
        let mut graph = FrameGraph::new();
        let result = graph.add_raster_pass("nothing", |_| Ok(()));

        assert!(matches!(result, Err(RecordError::MissingRenderFunc(name)) if name == "nothing"));
        assert_eq!(graph.pass_count(), 0);
    }

    #[test]
    fn test_graph_recorder_enforces_declarations() {
        let source = TextureHandle(7);
        let mut graph = FrameGraph::new();
        let handle = graph.import_texture(source);
        graph
            .add_raster_pass("undeclared", move |builder| {
                builder.allow_global_state_modification(true);
                builder.set_render_func(move |ctx| {
                    GraphRecorder::new(ctx).set_global_texture(PropertyId(1), BoundTexture::Graph { source, handle })
                });
                Ok(())
            })
            .unwrap();

        let result = graph.execute(&mut TraceRecorder::new());
        assert!(matches!(result, Err(RecordError::UndeclaredRead { .. })));
    }

    #[test]
    fn test_graph_recorder_requires_global_state_permission() {
        let mut graph = FrameGraph::new();
        graph
            .add_raster_pass("locked", |builder| {
                builder.set_render_func(|ctx| GraphRecorder::new(ctx).set_global_int(PropertyId(1), 3));
                Ok(())
            })
            .unwrap();

        let result = graph.execute(&mut TraceRecorder::new());
        assert!(matches!(result, Err(RecordError::GlobalStateNotAllowed(name)) if name == "locked"));
    }

    #[test]
    fn test_graph_recorder_rejects_engine_textures() {
        let mut graph = FrameGraph::new();
        graph
            .add_raster_pass("raw", |builder| {
                builder.allow_global_state_modification(true);
                builder.set_render_func(|ctx| {
                    GraphRecorder::new(ctx).set_global_texture(PropertyId(1), BoundTexture::Engine(TextureHandle(3)))
                });
                Ok(())
            })
            .unwrap();

        let result = graph.execute(&mut TraceRecorder::new());
        assert!(matches!(result, Err(RecordError::UnresolvedTexture(TextureHandle(3)))));
    }

    #[test]
    fn test_attachments_resolve_to_engine_textures() {
        let mut graph = FrameGraph::new();
        graph
            .add_raster_pass("targets", |builder| {
                let color = builder.import_texture(TextureHandle(10));
                let depth = builder.import_texture(TextureHandle(11));
                builder.set_render_attachment(color, 0);
                builder.set_render_attachment_depth(depth);
                builder.set_render_func(|ctx| {
                    assert_eq!(ctx.color_attachment(0), Some(TextureHandle(10)));
                    assert_eq!(ctx.color_attachment(1), None);
                    assert_eq!(ctx.depth_attachment(), Some(TextureHandle(11)));
                    Ok(())
                });
                Ok(())
            })
            .unwrap();

        assert_eq!(graph.execute(&mut TraceRecorder::new()).unwrap().executed, 1);
    }
}
