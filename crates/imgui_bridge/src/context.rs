//! Frame context
//!
//! Owns the GUI library's native context, the companion contexts of extension
//! libraries, the texture registry, the backend IO record and the frame's
//! command list. Native contexts are released when their owner drops, on
//! every path including a failed construction.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::command::CommandList;
use crate::draw_data::DrawData;
use crate::error::BridgeError;
use crate::renderer::Renderer;
use crate::texture::TextureRegistry;

/// Opaque native context handle owned by a GUI or extension library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeContext(pub u64);

/// Errors raised by context management
#[derive(thiserror::Error, Debug)]
pub enum ContextError {
    /// A library failed to create its context
    #[error("{library} failed to create a context: {reason}")]
    CreationFailed {
        /// Library name
        library: String,
        /// Failure reported by the library
        reason: String,
    },

    /// An operation needed a current context and none was set
    #[error("no current frame context")]
    NoCurrentContext,

    /// A shared context's lock was poisoned by a panic
    #[error("frame context lock poisoned")]
    Poisoned,

    /// A shared context is already locked, possibly by the calling thread
    #[error("frame context is locked")]
    Busy,
}

/// The immediate-mode GUI library
pub trait GuiLibrary: Send + Sync {
    /// Library name, used in logs and errors
    fn name(&self) -> &str;

    /// Allocate a native context
    fn create_context(&self) -> Result<NativeContext, ContextError>;

    /// Release a native context
    fn destroy_context(&self, context: NativeContext);

    /// Switch the library's current context
    fn set_current_context(&self, context: Option<NativeContext>);
}

/// A companion library keeping its own context next to the GUI one
pub trait ExtensionLibrary: Send + Sync {
    /// Library name, used in logs and errors
    fn name(&self) -> &str;

    /// Allocate a native context
    fn create_context(&self) -> Result<NativeContext, ContextError>;

    /// Release a native context
    fn destroy_context(&self, context: NativeContext);

    /// Switch the library's current context
    fn set_current_context(&self, context: Option<NativeContext>);

    /// Point the library at the GUI context it draws into
    fn bind_gui_context(&self, gui: Option<NativeContext>);
}

/// GUI library context, destroyed on drop
pub struct OwnedContext {
    library: Arc<dyn GuiLibrary>,
    handle: NativeContext,
}

impl OwnedContext {
    /// Create a context through `library`
    pub fn create(library: Arc<dyn GuiLibrary>) -> Result<Self, ContextError> {
        let handle = library.create_context()?;
        log::debug!("Created {} context {:?}", library.name(), handle);
        Ok(Self { library, handle })
    }

    /// Native handle
    pub const fn handle(&self) -> NativeContext {
        self.handle
    }

    /// Owning library
    pub fn library(&self) -> &dyn GuiLibrary {
        self.library.as_ref()
    }
}

impl Drop for OwnedContext {
    fn drop(&mut self) {
        log::debug!("Destroying {} context {:?}", self.library.name(), self.handle);
        self.library.destroy_context(self.handle);
    }
}

impl fmt::Debug for OwnedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedContext")
            .field("library", &self.library.name())
            .field("handle", &self.handle)
            .finish()
    }
}

/// Extension library context, destroyed on drop
pub struct OwnedExtensionContext {
    library: Arc<dyn ExtensionLibrary>,
    handle: NativeContext,
}

impl OwnedExtensionContext {
    /// Create a context through `library`
    pub fn create(library: Arc<dyn ExtensionLibrary>) -> Result<Self, ContextError> {
        let handle = library.create_context()?;
        log::debug!("Created {} context {:?}", library.name(), handle);
        Ok(Self { library, handle })
    }

    /// Native handle
    pub const fn handle(&self) -> NativeContext {
        self.handle
    }

    /// Owning library
    pub fn library(&self) -> &dyn ExtensionLibrary {
        self.library.as_ref()
    }
}

impl Drop for OwnedExtensionContext {
    fn drop(&mut self) {
        log::debug!("Destroying {} context {:?}", self.library.name(), self.handle);
        self.library.destroy_context(self.handle);
    }
}

impl fmt::Debug for OwnedExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedExtensionContext")
            .field("library", &self.library.name())
            .field("handle", &self.handle)
            .finish()
    }
}

bitflags! {
    /// Capabilities the backends advertise to the GUI library
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BackendFlags: u32 {
        /// A gamepad is connected
        const HAS_GAMEPAD = 1 << 0;
        /// Platform honors mouse cursor shape requests
        const HAS_MOUSE_CURSORS = 1 << 1;
        /// Platform honors mouse reposition requests
        const HAS_SET_MOUSE_POS = 1 << 2;
        /// Renderer supports per-call vertex offsets, lifting the 64k vertex limit
        const RENDERER_HAS_VTX_OFFSET = 1 << 3;
    }
}

/// Backend fields of the GUI IO record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendIo {
    /// Name of the active renderer backend
    pub backend_renderer_name: Option<String>,
    /// Advertised capabilities
    pub backend_flags: BackendFlags,
}

/// Per-context GUI state
#[derive(Debug)]
pub struct FrameContext {
    // Companions drop before the GUI context they were bound to.
    companions: Vec<OwnedExtensionContext>,
    native: OwnedContext,
    /// Texture ids handed to GUI code
    pub textures: TextureRegistry,
    /// Backend IO record
    pub io: BackendIo,
    /// Commands of the last translated frame
    pub commands: CommandList,
}

impl FrameContext {
    /// Create the GUI context and one companion context per extension
    pub fn new(
        gui: Arc<dyn GuiLibrary>,
        extensions: &[Arc<dyn ExtensionLibrary>],
        command_capacity: usize,
    ) -> Result<Self, ContextError> {
        let native = OwnedContext::create(gui)?;
        let companions = extensions
            .iter()
            .map(|library| OwnedExtensionContext::create(Arc::clone(library)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            companions,
            native,
            textures: TextureRegistry::new(),
            io: BackendIo::default(),
            commands: CommandList::with_capacity(command_capacity),
        })
    }

    /// GUI context handle
    pub const fn native(&self) -> NativeContext {
        self.native.handle()
    }

    /// Companion contexts, in creation order
    pub fn companions(&self) -> &[OwnedExtensionContext] {
        &self.companions
    }

    /// Make this context current in every library
    pub fn make_current(&self) {
        let gui = Some(self.native.handle());
        self.native.library().set_current_context(gui);
        for companion in &self.companions {
            companion.library().set_current_context(Some(companion.handle()));
            companion.library().bind_gui_context(gui);
        }
    }

    /// Clear the current context in every library
    pub fn release_current(&self) {
        self.native.library().set_current_context(None);
        for companion in &self.companions {
            companion.library().bind_gui_context(None);
            companion.library().set_current_context(None);
        }
    }

    /// Build and translate one frame into the command list
    ///
    /// On failure the command list is left sealed and empty, so the previous
    /// frame's commands are never replayed a second time.
    pub fn render_frame<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        draw_data: &DrawData<'_>,
    ) -> Result<usize, BridgeError> {
        let mut writer = self.commands.record();
        renderer.render_draw_lists(&mut writer, &self.textures, draw_data)?;
        Ok(writer.finish())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Library fake recording every call
    #[derive(Debug, Default)]
    pub(crate) struct FakeLibrary {
        next: AtomicU64,
        /// Creation fails once this many contexts exist
        pub(crate) fail_after: Option<u64>,
        pub(crate) live: Mutex<Vec<NativeContext>>,
        pub(crate) current: Mutex<Option<NativeContext>>,
        pub(crate) bound_gui: Mutex<Option<NativeContext>>,
    }

    impl FakeLibrary {
        fn create(&self) -> Result<NativeContext, ContextError> {
            let created = self.next.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| created >= limit) {
                return Err(ContextError::CreationFailed {
                    library: "fake".to_string(),
                    reason: "out of contexts".to_string(),
                });
            }
            let handle = NativeContext(created + 1);
            self.live.lock().unwrap().push(handle);
            Ok(handle)
        }

        fn destroy(&self, context: NativeContext) {
            self.live.lock().unwrap().retain(|c| *c != context);
        }

        pub(crate) fn live_count(&self) -> usize {
            self.live.lock().unwrap().len()
        }
    }

    impl GuiLibrary for FakeLibrary {
        fn name(&self) -> &str {
            "fake-gui"
        }

        fn create_context(&self) -> Result<NativeContext, ContextError> {
            self.create()
        }

        fn destroy_context(&self, context: NativeContext) {
            self.destroy(context);
        }

        fn set_current_context(&self, context: Option<NativeContext>) {
            *self.current.lock().unwrap() = context;
        }
    }

    impl ExtensionLibrary for FakeLibrary {
        fn name(&self) -> &str {
            "fake-extension"
        }

        fn create_context(&self) -> Result<NativeContext, ContextError> {
            self.create()
        }

        fn destroy_context(&self, context: NativeContext) {
            self.destroy(context);
        }

        fn set_current_context(&self, context: Option<NativeContext>) {
            *self.current.lock().unwrap() = context;
        }

        fn bind_gui_context(&self, gui: Option<NativeContext>) {
            *self.bound_gui.lock().unwrap() = gui;
        }
    }

    #[test]
    fn test_drop_destroys_all_contexts() {
        let gui = Arc::new(FakeLibrary::default());
        let plot = Arc::new(FakeLibrary::default());
        let context = FrameContext::new(gui.clone(), &[plot.clone() as Arc<dyn ExtensionLibrary>], 32).unwrap();

        assert_eq!(gui.live_count(), 1);
        assert_eq!(plot.live_count(), 1);
        assert_eq!(context.companions().len(), 1);

        drop(context);
        assert_eq!(gui.live_count(), 0);
        assert_eq!(plot.live_count(), 0);
    }

    #[test]
    fn test_failed_companion_releases_created_contexts() {
        let gui = Arc::new(FakeLibrary::default());
        let nodes = Arc::new(FakeLibrary::default());
        let broken = Arc::new(FakeLibrary {
            fail_after: Some(0),
            ..FakeLibrary::default()
        });
        let extensions = vec![nodes.clone() as Arc<dyn ExtensionLibrary>, broken as Arc<dyn ExtensionLibrary>];

        let result = FrameContext::new(gui.clone(), &extensions, 32);

        assert!(matches!(result, Err(ContextError::CreationFailed { .. })));
        assert_eq!(gui.live_count(), 0);
        assert_eq!(nodes.live_count(), 0);
    }

    #[test]
    fn test_make_current_binds_companions() {
        let gui = Arc::new(FakeLibrary::default());
        let plot = Arc::new(FakeLibrary::default());
        let context = FrameContext::new(gui.clone(), &[plot.clone() as Arc<dyn ExtensionLibrary>], 0).unwrap();

        context.make_current();
        assert_eq!(*gui.current.lock().unwrap(), Some(context.native()));
        assert_eq!(*plot.bound_gui.lock().unwrap(), Some(context.native()));
        assert_eq!(*plot.current.lock().unwrap(), Some(context.companions()[0].handle()));

        context.release_current();
        assert_eq!(*gui.current.lock().unwrap(), None);
        assert_eq!(*plot.bound_gui.lock().unwrap(), None);
    }

    #[test]
    fn test_new_context_has_empty_sealed_commands() {
        let context = FrameContext::new(Arc::new(FakeLibrary::default()), &[], 32).unwrap();

        assert!(context.commands.is_sealed());
        assert!(context.commands.is_empty());
        assert!(context.textures.is_empty());
        assert_eq!(context.io, BackendIo::default());
    }

    #[test]
    fn test_failed_frame_leaves_commands_sealed_and_empty() {
        use crate::config::RendererConfig;
        use crate::draw_data::{DrawCmd, DrawList, UserCallback};
        use crate::foundation::math::{Vec2, Vec4};
        use crate::mesh::{DrawIdx, DrawVert};
        use crate::renderer::{HeadlessDevice, MeshRenderer};
        use crate::texture::TextureHandle;

        let mut context = FrameContext::new(Arc::new(FakeLibrary::default()), &[], 32).unwrap();
        let mut renderer = MeshRenderer::new(HeadlessDevice::new(), RendererConfig::default());
        renderer.initialize(&mut context.io).unwrap();
        let font = context.textures.register(TextureHandle(1));

        let verts = vec![DrawVert::default(); 3];
        let idx: Vec<DrawIdx> = vec![0, 1, 2];
        let clip = Vec4::new(0.0, 0.0, 64.0, 64.0);
        let good = vec![DrawCmd::new(clip, font, 0, 3)];
        let data = DrawData::new(Vec2::new(64.0, 64.0), vec![DrawList::new(&verts, &idx, &good)]);

        let recorded = context.render_frame(&mut renderer, &data).unwrap();
        assert!(recorded > 0);
        assert_eq!(context.commands.sealed().map(<[_]>::len), Some(recorded));

        let failing = vec![
            DrawCmd::new(clip, font, 0, 3),
            DrawCmd::callback(clip, UserCallback::new(|_, _| Err("callback failed".into()))),
        ];
        let data = DrawData::new(Vec2::new(64.0, 64.0), vec![DrawList::new(&verts, &idx, &failing)]);

        let result = context.render_frame(&mut renderer, &data);

        assert!(matches!(result, Err(BridgeError::Renderer(_))));
        assert!(context.commands.is_sealed());
        assert!(context.commands.is_empty());
    }
}
