//! GUI frame demo
//!
//! Drives the bridge through a few frames without a GPU: a headless GUI
//! library, `CpuMesh` as the dynamic mesh, and `TraceRecorder` standing in for
//! the host command buffer. Each frame is replayed both immediately and
//! through the frame graph, and the two recordings are compared.
//!
//! Usage: `gui_frame_demo [config.toml|config.ron]`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use imgui_bridge::foundation::logging;
use imgui_bridge::prelude::*;
use imgui_bridge::context::ContextError;
use imgui_bridge::execute::RecordResult;
use imgui_bridge::shim;

/// Errors specific to the demo
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("immediate and deferred replay disagree on frame {frame}")]
    Mismatch { frame: usize },
}

/// GUI library that only hands out context numbers
#[derive(Default)]
struct HeadlessGui {
    next: AtomicU64,
}

impl GuiLibrary for HeadlessGui {
    fn name(&self) -> &str {
        "headless-gui"
    }

    fn create_context(&self) -> Result<NativeContext, ContextError> {
        Ok(NativeContext(self.next.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn destroy_context(&self, context: NativeContext) {
        log::debug!("headless-gui released {:?}", context);
    }

    fn set_current_context(&self, context: Option<NativeContext>) {
        log::debug!("headless-gui current context {:?}", context);
    }
}

/// Command buffer pool handing out trace recorders
#[derive(Default)]
struct TracePool {
    submitted: Vec<Vec<DrawCommand>>,
}

impl ImmediateContext for TracePool {
    type Buffer = TraceRecorder;

    fn acquire_command_buffer(&mut self, name: &str) -> TraceRecorder {
        log::trace!("acquire command buffer '{}'", name);
        TraceRecorder::new()
    }

    fn execute_command_buffer(&mut self, buffer: &mut TraceRecorder) -> RecordResult<()> {
        self.submitted.push(buffer.commands());
        Ok(())
    }

    fn release_command_buffer(&mut self, _buffer: TraceRecorder) {}
}

/// Geometry of one synthetic window: `panels` quads over a shared buffer
struct WindowGeometry {
    vertices: Vec<DrawVert>,
    indices: Vec<DrawIdx>,
    commands: Vec<DrawCmd>,
}

fn window(origin: (f32, f32), panels: u16, font: TextureId, image: TextureId) -> WindowGeometry {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut commands = Vec::new();

    for panel in 0..panels {
        let x = origin.0 + f32::from(panel) * 40.0;
        let y = origin.1;
        let base = panel * 4;
        vertices.extend([
            DrawVert::new([x, y], [0.0, 0.0], 0xffff_ffff),
            DrawVert::new([x + 32.0, y], [1.0, 0.0], 0xffff_ffff),
            DrawVert::new([x + 32.0, y + 32.0], [1.0, 1.0], 0xffff_ffff),
            DrawVert::new([x, y + 32.0], [0.0, 1.0], 0xffff_ffff),
        ]);
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);

        let texture = if panel % 2 == 0 { font } else { image };
        commands.push(DrawCmd::new(
            Vec4::new(x, y, x + 32.0, y + 32.0),
            texture,
            u32::from(panel) * 6,
            6,
        ));
    }

    WindowGeometry {
        vertices,
        indices,
        commands,
    }
}

fn run_frame(
    frame: usize,
    context: &mut FrameContext,
    renderer: &mut MeshRenderer<HeadlessDevice>,
    windows: &[WindowGeometry],
) -> Result<(), DemoError> {
    let lists = windows
        .iter()
        .map(|w| DrawList::new(&w.vertices, &w.indices, &w.commands))
        .collect();
    let draw_data = DrawData::new(Vec2::new(1280.0, 720.0), lists);

    let count = context.render_frame(renderer, &draw_data)?;
    log::info!(
        "Frame {}: {} draw calls, {} commands, mesh has {} sub-meshes",
        frame,
        draw_data.total_cmd_count(),
        count,
        renderer.mesh().map_or(0, |m| m.sub_meshes().len())
    );

    let feature = RenderFeature::default();
    let Some(pass) = feature.add_render_passes(Some(context), CameraType::Game) else {
        log::info!("Frame {}: nothing to draw", frame);
        return Ok(());
    };

    let mut pool = TracePool::default();
    pass.execute_immediate(&ImmediateExecutor::default(), &mut pool)
        .map_err(BridgeError::from)?;

    let targets = CameraTargets {
        color: TextureHandle(9000),
        depth: TextureHandle(9001),
    };
    let mut graph = FrameGraph::new();
    pass.record_deferred(&DeferredExecutor::default(), &mut graph, targets)
        .map_err(BridgeError::from)?;
    let mut recorder = TraceRecorder::new();
    graph.execute(&mut recorder).map_err(BridgeError::from)?;

    if pool.submitted.first() != Some(&recorder.commands()) {
        return Err(DemoError::Mismatch { frame });
    }
    log::info!("Frame {}: immediate and deferred replay match ({} calls)", frame, recorder.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            BridgeConfig::load_from_file(&path)?
        }
        None => BridgeConfig::default(),
    };

    let gui: Arc<dyn GuiLibrary> = Arc::new(HeadlessGui::default());
    let context = Arc::new(Mutex::new(FrameContext::new(gui, &[], config.initial_command_capacity)?));
    shim::set_current_context(Some(Arc::clone(&context)), None)?;
    // Layout code holds the context lock, so it registers through the context.
    shim::on_layout(|frame| {
        let preview = frame.textures.register(TextureHandle(3));
        log::trace!("Layout registered preview texture as {:?}", preview);
    });

    let font = shim::get_texture_id(TextureHandle(1)).ok_or("no current context")?;
    let image = shim::get_texture_id(TextureHandle(2)).ok_or("no current context")?;

    let mut renderer = MeshRenderer::new(HeadlessDevice::new(), config.renderer.clone());
    {
        let mut context = context.lock().map_err(|_| "context lock poisoned")?;
        renderer.initialize(&mut context.io)?;
        shim::do_initialize(&mut context);
    }

    // Sub-mesh count changes between frames, forcing a mesh reset.
    let frames = [
        vec![window((10.0, 10.0), 5, font, image)],
        vec![window((10.0, 10.0), 2, font, image), window((200.0, 300.0), 1, font, image)],
        vec![window((2000.0, 10.0), 2, font, image)],
        Vec::new(),
    ];
    for (frame, windows) in frames.iter().enumerate() {
        let mut context = context.lock().map_err(|_| "context lock poisoned")?;
        shim::do_layout(&mut context);
        run_frame(frame, &mut context, &mut renderer, windows)?;
    }

    {
        let mut context = context.lock().map_err(|_| "context lock poisoned")?;
        shim::do_deinitialize(&mut context);
        renderer.shutdown(&mut context.io);
    }
    shim::reset_static();
    log::info!("Done");
    Ok(())
}
