//! GUI renderers
//!
//! A renderer owns the host resources needed to draw GUI frames and turns
//! each frame's draw data into commands. `MeshRenderer` draws everything from
//! one dynamic mesh, one sub-mesh per draw call.

use std::fmt;

use crate::command::{CommandWriter, DrawCommand};
use crate::config::RendererConfig;
use crate::context::{BackendFlags, BackendIo};
use crate::draw_data::DrawData;
use crate::handles::{KeywordId, MaterialHandle, MeshHandle, PropertyId};
use crate::mesh::{CpuMesh, DynamicMesh, MeshBuilder, MeshError};
use crate::texture::TextureRegistry;
use crate::translate::{CommandTranslator, TranslateError, TranslatorResources};

/// Errors raised by renderers
#[derive(thiserror::Error, Debug)]
pub enum RendererError {
    /// Mesh rebuild failed
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// Translation failed
    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    /// The host device failed to create a resource
    #[error("device error: {0}")]
    Device(String),

    /// A frame was rendered before `initialize` or after `shutdown`
    #[error("renderer is not initialized")]
    NotInitialized,
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Turns GUI draw data into draw commands
pub trait Renderer {
    /// Acquire resources and publish backend information to `io`
    fn initialize(&mut self, io: &mut BackendIo) -> RendererResult<()>;

    /// Release resources and retract what `initialize` published
    fn shutdown(&mut self, io: &mut BackendIo);

    /// Translate one frame into `writer`
    fn render_draw_lists(
        &mut self,
        writer: &mut CommandWriter<'_>,
        textures: &TextureRegistry,
        draw_data: &DrawData<'_>,
    ) -> RendererResult<()>;
}

/// Host graphics device the renderer creates its resources on
pub trait GraphicsDevice {
    /// Mesh type created by the device
    type Mesh: DynamicMesh;

    /// Create an empty mesh
    fn create_mesh(&mut self, name: &str) -> RendererResult<Self::Mesh>;

    /// Release a mesh
    fn destroy_mesh(&mut self, mesh: Self::Mesh);

    /// Create the GUI material
    fn create_material(&mut self) -> RendererResult<MaterialHandle>;

    /// Release a material
    fn destroy_material(&mut self, material: MaterialHandle);

    /// Id of a named shader property
    fn property_to_id(&mut self, name: &str) -> PropertyId;

    /// Token of a named keyword on `material`
    fn keyword(&mut self, material: MaterialHandle, name: &str) -> KeywordId;
}

struct MeshResources<M> {
    mesh: M,
    translator: CommandTranslator,
}

/// Renderer drawing every draw call as a sub-mesh of one dynamic mesh
pub struct MeshRenderer<D: GraphicsDevice> {
    device: D,
    config: RendererConfig,
    builder: MeshBuilder,
    resources: Option<MeshResources<D::Mesh>>,
}

impl<D: GraphicsDevice> MeshRenderer<D> {
    /// Create an uninitialized renderer
    pub fn new(device: D, config: RendererConfig) -> Self {
        Self {
            device,
            config,
            builder: MeshBuilder::new(),
            resources: None,
        }
    }

    /// Whether `initialize` succeeded and `shutdown` was not called since
    pub const fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// The host device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The GUI mesh, once initialized
    pub fn mesh(&self) -> Option<&D::Mesh> {
        self.resources.as_ref().map(|r| &r.mesh)
    }

    /// Renderer settings
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

impl<D: GraphicsDevice> fmt::Debug for MeshRenderer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("config", &self.config)
            .field("sub_mesh_count", &self.builder.sub_mesh_count())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<D: GraphicsDevice> Renderer for MeshRenderer<D> {
    fn initialize(&mut self, io: &mut BackendIo) -> RendererResult<()> {
        if self.resources.is_some() {
            return Ok(());
        }

        let material = self.device.create_material()?;
        let mut mesh = match self.device.create_mesh(&self.config.mesh_name) {
            Ok(mesh) => mesh,
            Err(err) => {
                self.device.destroy_material(material);
                return Err(err);
            }
        };
        mesh.mark_dynamic();

        let resources = TranslatorResources {
            mesh: mesh.handle(),
            material,
            texture_property: self.device.property_to_id(&self.config.texture_property),
            clip_rect_keyword: self.device.keyword(material, &self.config.clip_rect_keyword),
        };
        self.resources = Some(MeshResources {
            mesh,
            translator: CommandTranslator::new(resources),
        });
        // A fresh mesh has a single sub-mesh.
        self.builder = MeshBuilder::new();

        io.backend_renderer_name = Some(self.config.backend_name.clone());
        io.backend_flags |= BackendFlags::RENDERER_HAS_VTX_OFFSET;

        log::info!("Initialized '{}' renderer", self.config.backend_name);
        Ok(())
    }

    fn shutdown(&mut self, io: &mut BackendIo) {
        io.backend_renderer_name = None;
        io.backend_flags.remove(BackendFlags::RENDERER_HAS_VTX_OFFSET);

        if let Some(MeshResources { mesh, translator }) = self.resources.take() {
            self.device.destroy_mesh(mesh);
            self.device.destroy_material(translator.resources().material);
            log::info!("Shut down '{}' renderer", self.config.backend_name);
        }
    }

    fn render_draw_lists(
        &mut self,
        writer: &mut CommandWriter<'_>,
        textures: &TextureRegistry,
        draw_data: &DrawData<'_>,
    ) -> RendererResult<()> {
        let resources = self.resources.as_mut().ok_or(RendererError::NotInitialized)?;

        if draw_data.is_degenerate() {
            log::trace!("Skipping degenerate frame");
            return Ok(());
        }

        self.builder.update(&mut resources.mesh, draw_data)?;

        if let Some(label) = &self.config.profiling_label {
            writer.push(DrawCommand::BeginSample(label.clone()));
        }
        resources.translator.translate(draw_data, textures, writer)?;
        if let Some(label) = &self.config.profiling_label {
            writer.push(DrawCommand::EndSample(label.clone()));
        }
        Ok(())
    }
}

/// Device creating `CpuMesh`es, for running without a GPU
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u64,
    properties: Vec<String>,
    keywords: Vec<String>,
    live_meshes: Vec<MeshHandle>,
    live_materials: Vec<MaterialHandle>,
}

impl HeadlessDevice {
    /// Create a device with no resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes created and not yet destroyed
    pub fn live_meshes(&self) -> usize {
        self.live_meshes.len()
    }

    /// Materials created and not yet destroyed
    pub fn live_materials(&self) -> usize {
        self.live_materials.len()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

// False when `handle` was not live.
fn release<H: PartialEq>(live: &mut Vec<H>, handle: H) -> bool {
    let before = live.len();
    live.retain(|h| *h != handle);
    live.len() != before
}

fn intern(names: &mut Vec<String>, name: &str) -> usize {
    names.iter().position(|n| n == name).unwrap_or_else(|| {
        names.push(name.to_string());
        names.len() - 1
    })
}

impl GraphicsDevice for HeadlessDevice {
    type Mesh = CpuMesh;

    fn create_mesh(&mut self, name: &str) -> RendererResult<CpuMesh> {
        let handle = MeshHandle(self.next());
        self.live_meshes.push(handle);
        Ok(CpuMesh::new(handle, name))
    }

    fn destroy_mesh(&mut self, mesh: CpuMesh) {
        let handle = mesh.handle();
        if !release(&mut self.live_meshes, handle) {
            log::warn!("Destroying unknown mesh {:?}", handle);
        }
    }

    fn create_material(&mut self) -> RendererResult<MaterialHandle> {
        let handle = MaterialHandle(self.next());
        self.live_materials.push(handle);
        Ok(handle)
    }

    fn destroy_material(&mut self, material: MaterialHandle) {
        if !release(&mut self.live_materials, material) {
            log::warn!("Destroying unknown material {:?}", material);
        }
    }

    fn property_to_id(&mut self, name: &str) -> PropertyId {
        PropertyId(i32::try_from(intern(&mut self.properties, name)).unwrap_or(i32::MAX))
    }

    fn keyword(&mut self, _material: MaterialHandle, name: &str) -> KeywordId {
        KeywordId(u32::try_from(intern(&mut self.keywords, name)).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandList;
    use crate::draw_data::{DrawCmd, DrawList};
    use crate::foundation::math::{Vec2, Vec4};
    use crate::mesh::{DrawIdx, DrawVert};
    use crate::texture::TextureHandle;

    fn renderer(config: RendererConfig) -> (MeshRenderer<HeadlessDevice>, BackendIo) {
        let mut renderer = MeshRenderer::new(HeadlessDevice::new(), config);
        let mut io = BackendIo::default();
        renderer.initialize(&mut io).unwrap();
        (renderer, io)
    }

    #[test]
    fn test_initialize_publishes_backend() {
        let (renderer, io) = renderer(RendererConfig::default());

        assert_eq!(io.backend_renderer_name.as_deref(), Some("Mesh"));
        assert!(io.backend_flags.contains(BackendFlags::RENDERER_HAS_VTX_OFFSET));
        assert!(renderer.is_initialized());
        assert!(renderer.mesh().unwrap().is_dynamic());
        assert_eq!(renderer.mesh().unwrap().name(), "DearImGui Mesh");
    }

    #[test]
    fn test_shutdown_releases_resources() {
        let (mut renderer, mut io) = renderer(RendererConfig::default());
        io.backend_flags |= BackendFlags::HAS_GAMEPAD;

        renderer.shutdown(&mut io);

        assert_eq!(io.backend_renderer_name, None);
        assert_eq!(io.backend_flags, BackendFlags::HAS_GAMEPAD);
        assert_eq!(renderer.device().live_meshes(), 0);
        assert_eq!(renderer.device().live_materials(), 0);
        assert!(!renderer.is_initialized());
    }

    #[test]
    fn test_headless_device_ignores_double_destroy() {
        let mut device = HeadlessDevice::new();
        let material = device.create_material().unwrap();
        let kept = device.create_material().unwrap();
        let mesh = device.create_mesh("gui").unwrap();
        let stale = CpuMesh::new(mesh.handle(), "gui");

        device.destroy_material(material);
        device.destroy_material(material);
        device.destroy_mesh(mesh);
        device.destroy_mesh(stale);

        assert_eq!(device.live_materials(), 1);
        assert_eq!(device.live_meshes(), 0);
        device.destroy_material(kept);
        assert_eq!(device.live_materials(), 0);
    }

    #[test]
    fn test_frame_is_wrapped_in_profiling_scope() {
        let (mut renderer, _io) = renderer(RendererConfig::default());
        let mut textures = TextureRegistry::new();
        let font = textures.register(TextureHandle(1));
        let verts = vec![DrawVert::default(); 3];
        let idx: Vec<DrawIdx> = vec![0, 1, 2];
        let cmds = vec![DrawCmd::new(Vec4::new(0.0, 0.0, 64.0, 64.0), font, 0, 3)];
        let data = DrawData::new(Vec2::new(64.0, 64.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let mut list = CommandList::new();
        let mut writer = list.record();
        renderer.render_draw_lists(&mut writer, &textures, &data).unwrap();
        writer.finish();

        let commands = list.sealed().unwrap();
        let label = "DearImGui.ExecuteDrawCommands".to_string();
        assert_eq!(commands.first(), Some(&DrawCommand::BeginSample(label.clone())));
        assert_eq!(commands.last(), Some(&DrawCommand::EndSample(label)));
        assert_eq!(renderer.mesh().unwrap().sub_meshes().len(), 1);
        assert_eq!(renderer.mesh().unwrap().upload_count(), 1);
    }

    #[test]
    fn test_degenerate_frame_skips_mesh_and_commands() {
        let (mut renderer, _io) = renderer(RendererConfig::default());
        let textures = TextureRegistry::new();
        let data = DrawData::new(Vec2::new(0.0, 600.0), Vec::new());

        let mut list = CommandList::new();
        let mut writer = list.record();
        renderer.render_draw_lists(&mut writer, &textures, &data).unwrap();
        writer.finish();

        assert!(list.is_empty());
        assert_eq!(renderer.mesh().unwrap().upload_count(), 0);
    }

    #[test]
    fn test_render_before_initialize_fails() {
        let mut renderer = MeshRenderer::new(HeadlessDevice::new(), RendererConfig::default());
        let data = DrawData::new(Vec2::new(1.0, 1.0), Vec::new());
        let mut list = CommandList::new();
        let mut writer = list.record();

        let result = renderer.render_draw_lists(&mut writer, &TextureRegistry::new(), &data);
        assert!(matches!(result, Err(RendererError::NotInitialized)));
    }

    #[test]
    fn test_unlabelled_config_emits_no_samples() {
        let config = RendererConfig {
            profiling_label: None,
            ..RendererConfig::default()
        };
        let (mut renderer, _io) = renderer(config);
        let mut textures = TextureRegistry::new();
        let font = textures.register(TextureHandle(1));
        let verts = vec![DrawVert::default(); 3];
        let idx: Vec<DrawIdx> = vec![0, 1, 2];
        let cmds = vec![DrawCmd::new(Vec4::new(0.0, 0.0, 8.0, 8.0), font, 0, 3)];
        let data = DrawData::new(Vec2::new(8.0, 8.0), vec![DrawList::new(&verts, &idx, &cmds)]);

        let mut list = CommandList::new();
        let mut writer = list.record();
        renderer.render_draw_lists(&mut writer, &textures, &data).unwrap();
        writer.finish();

        let commands = list.sealed().unwrap();
        assert!(!commands.iter().any(|c| matches!(c, DrawCommand::BeginSample(_))));
        assert_eq!(commands[0].name(), "SetViewport");
    }
}
