//! # imgui_bridge
//!
//! Runs an immediate-mode GUI inside a host engine's render pipeline.
//!
//! Every frame the GUI library hands out draw lists. The bridge copies their
//! vertex and index memory into one dynamic mesh (one sub-mesh per draw call),
//! translates the draw calls into a buffered list of draw commands, and
//! replays that list once the pipeline schedules the GUI pass, either into an
//! immediate command buffer or inside a render-graph raster pass.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgui_bridge::prelude::*;
//!
//! fn frame(
//!     context: &mut FrameContext,
//!     renderer: &mut MeshRenderer<HeadlessDevice>,
//!     draw_data: &DrawData<'_>,
//! ) -> Result<(), BridgeError> {
//!     context.render_frame(renderer, draw_data)?;
//!
//!     let mut recorder = TraceRecorder::new();
//!     if let Some(commands) = context.commands.sealed() {
//!         replay(commands, &mut recorder)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod activator;
pub mod command;
pub mod config;
pub mod context;
pub mod draw_data;
pub mod error;
pub mod execute;
pub mod feature;
pub mod foundation;
pub mod handles;
pub mod mesh;
pub mod renderer;
pub mod shim;
pub mod texture;
pub mod translate;

pub use error::{BridgeError, BridgeResult};

/// Common imports for bridge users
pub mod prelude {
    pub use crate::{
        activator::{ActivationButtons, ActivationState, HoldActivator, InputType, RenderType},
        command::{BoundTexture, CommandList, CommandWriter, DrawCommand},
        config::{BridgeConfig, Config, ConfigError, RendererConfig},
        context::{BackendFlags, BackendIo, ExtensionLibrary, FrameContext, GuiLibrary, NativeContext},
        draw_data::{DrawCmd, DrawData, DrawList, UserCallback},
        execute::{
            replay, CameraTargets, CommandRecorder, DeferredExecutor, FrameGraph, ImmediateContext,
            ImmediateExecutor, RecordError, TraceRecorder,
        },
        feature::{CameraType, FeatureSettings, PassEvent, RenderFeature},
        foundation::math::{Mat4, Rect, Vec2, Vec4},
        handles::{KeywordId, MaterialHandle, MeshHandle, PropertyId},
        mesh::{CpuMesh, DrawIdx, DrawVert, DynamicMesh, MeshBuilder},
        renderer::{GraphicsDevice, HeadlessDevice, MeshRenderer, Renderer},
        texture::{TextureHandle, TextureId, TextureRegistry},
        translate::CommandTranslator,
        BridgeError, BridgeResult,
    };
}
