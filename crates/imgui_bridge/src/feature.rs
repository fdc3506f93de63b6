//! Render pipeline hook
//!
//! Decides each frame whether the GUI pass runs for a camera and hands the
//! sealed command list to an executor.

use serde::{Deserialize, Serialize};

use crate::command::DrawCommand;
use crate::context::FrameContext;
use crate::execute::{CameraTargets, DeferredExecutor, FrameGraph, ImmediateContext, ImmediateExecutor, RecordResult};

/// Pipeline stages a pass can be injected at, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PassEvent {
    /// Before anything is rendered
    BeforeRendering,
    /// Before shadow maps
    BeforeRenderingShadows,
    /// After shadow maps
    AfterRenderingShadows,
    /// Before depth/normal pre-passes
    BeforeRenderingPrePasses,
    /// After depth/normal pre-passes
    AfterRenderingPrePasses,
    /// Before opaque geometry
    BeforeRenderingOpaques,
    /// After opaque geometry
    AfterRenderingOpaques,
    /// Before the skybox
    BeforeRenderingSkybox,
    /// After the skybox
    AfterRenderingSkybox,
    /// Before transparent geometry
    BeforeRenderingTransparents,
    /// After transparent geometry
    AfterRenderingTransparents,
    /// Before post-processing
    BeforeRenderingPostProcessing,
    /// After post-processing
    #[default]
    AfterRenderingPostProcessing,
    /// After everything else
    AfterRendering,
}

/// Kind of camera being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraType {
    /// Game view camera
    Game,
    /// Editor scene view camera
    SceneView,
    /// Asset preview camera
    Preview,
    /// Reflection probe camera
    Reflection,
    /// Stereo VR camera
    Vr,
}

/// Render feature settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Also draw the GUI into editor scene views
    pub draw_in_scene_view: bool,
    /// Stage the GUI pass is injected at
    pub pass_event: PassEvent,
}

/// Injects the GUI pass into the render pipeline
#[derive(Debug, Clone, Default)]
pub struct RenderFeature {
    settings: FeatureSettings,
}

impl RenderFeature {
    /// Create a feature with the given settings
    pub const fn new(settings: FeatureSettings) -> Self {
        Self { settings }
    }

    /// Current settings
    pub const fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    /// Whether the GUI is drawn for `camera`
    pub const fn accepts(&self, camera: CameraType) -> bool {
        match camera {
            CameraType::Game => true,
            CameraType::SceneView => self.settings.draw_in_scene_view,
            CameraType::Preview | CameraType::Reflection | CameraType::Vr => false,
        }
    }

    /// Queue the GUI pass for `camera` if there is anything to draw
    pub fn add_render_passes<'c>(
        &self,
        context: Option<&'c mut FrameContext>,
        camera: CameraType,
    ) -> Option<QueuedPass<'c>> {
        if !self.accepts(camera) {
            return None;
        }
        let commands = context?.commands.sealed_mut()?;
        if commands.is_empty() {
            return None;
        }

        log::trace!(
            "Queued GUI pass at {:?} with {} commands",
            self.settings.pass_event,
            commands.len()
        );
        Some(QueuedPass {
            event: self.settings.pass_event,
            commands,
        })
    }
}

/// A GUI pass waiting for its pipeline stage
#[derive(Debug)]
pub struct QueuedPass<'c> {
    event: PassEvent,
    commands: &'c mut [DrawCommand],
}

impl<'c> QueuedPass<'c> {
    /// Stage the pass runs at
    pub const fn event(&self) -> PassEvent {
        self.event
    }

    /// Commands the pass replays
    pub fn commands(&self) -> &[DrawCommand] {
        &*self.commands
    }

    /// Replay into a pooled command buffer right away
    pub fn execute_immediate<C: ImmediateContext + ?Sized>(
        &self,
        executor: &ImmediateExecutor,
        context: &mut C,
    ) -> RecordResult<()> {
        executor.execute(context, &*self.commands)
    }

    /// Add the pass to a frame graph
    pub fn record_deferred(
        self,
        executor: &DeferredExecutor,
        graph: &mut FrameGraph<'c>,
        targets: CameraTargets,
    ) -> RecordResult<()> {
        executor.record(graph, targets, self.commands)
    }
}
