//! Process-wide integration slot
//!
//! Host glue that cannot thread a context through its call sites (widget code
//! asking for texture ids, lifecycle events) goes through this slot. The core
//! pipeline never reads it; everything below `FrameContext` takes its context
//! explicitly.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::context::{ContextError, FrameContext};
use crate::texture::{SpriteHandle, SpriteInfo, TextureHandle, TextureId};

/// Frame context shared between the host and the slot
pub type SharedContext = Arc<Mutex<FrameContext>>;

/// Host device glue living next to the current context (for example a VR rig)
pub trait DeviceAdapter: Send + Sync {
    /// Adapter name, used in logs
    fn name(&self) -> &str;
}

/// Lifecycle callback
///
/// Receives the context being driven, already locked by the caller, so
/// callbacks register textures through `context.textures` rather than
/// `get_texture_id`.
pub type LifecycleCallback = Arc<dyn Fn(&mut FrameContext) + Send + Sync>;

/// Token returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Default)]
struct Slot {
    context: Option<SharedContext>,
    device: Option<Arc<dyn DeviceAdapter>>,
    next_subscription: u64,
    layout: Vec<(Subscription, LifecycleCallback)>,
    initialize: Vec<(Subscription, LifecycleCallback)>,
    deinitialize: Vec<(Subscription, LifecycleCallback)>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("has_context", &self.context.is_some())
            .field("device", &self.device.as_ref().map(|d| d.name().to_string()))
            .field("layout", &self.layout.len())
            .field("initialize", &self.initialize.len())
            .field("deinitialize", &self.deinitialize.len())
            .finish()
    }
}

static SLOT: Mutex<Option<Slot>> = Mutex::new(None);

fn with_slot<T>(f: impl FnOnce(&mut Slot) -> T) -> T {
    let mut guard: MutexGuard<'_, Option<Slot>> = SLOT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(guard.get_or_insert_with(Slot::default))
}

// A context poisoned by a panic elsewhere still owns its native handles, so
// switching recovers it instead of skipping the library calls.
fn lock_for_switch(context: &SharedContext) -> Result<MutexGuard<'_, FrameContext>, ContextError> {
    match context.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::Poisoned(poisoned)) => {
            log::warn!("Switching a poisoned GUI context");
            Ok(poisoned.into_inner())
        }
        Err(TryLockError::WouldBlock) => Err(ContextError::Busy),
    }
}

/// Replace the current context and device adapter
///
/// The previous context is released from the GUI libraries before the new
/// one is made current. Fails with `ContextError::Busy`, leaving everything
/// unchanged, when either context is locked. Expected only at
/// enable/disable boundaries, never mid-frame.
pub fn set_current_context(
    context: Option<SharedContext>,
    device: Option<Arc<dyn DeviceAdapter>>,
) -> Result<(), ContextError> {
    let previous = current_context().filter(|previous| !context.as_ref().is_some_and(|c| Arc::ptr_eq(previous, c)));

    {
        let previous = previous.as_ref().map(lock_for_switch).transpose()?;
        let next = context.as_ref().map(lock_for_switch).transpose()?;

        if let Some(previous) = &previous {
            previous.release_current();
        }
        match &next {
            Some(next) => {
                next.make_current();
                log::debug!("Current GUI context is now {:?}", next.native());
            }
            None => log::debug!("Cleared current GUI context"),
        }
    }

    with_slot(|slot| {
        slot.context = context;
        slot.device = device;
    });
    Ok(())
}

/// The current context, if any
pub fn current_context() -> Option<SharedContext> {
    with_slot(|slot| slot.context.clone())
}

/// The current device adapter, if any
pub fn current_device() -> Option<Arc<dyn DeviceAdapter>> {
    with_slot(|slot| slot.device.clone())
}

/// Run `f` with the current context locked
///
/// Never waits: fails with `ContextError::Busy` when the context is already
/// locked, which includes calls made from inside a lifecycle callback.
pub fn with_current<T>(f: impl FnOnce(&mut FrameContext) -> T) -> Result<T, ContextError> {
    let context = current_context().ok_or(ContextError::NoCurrentContext)?;
    let mut guard = match context.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::WouldBlock) => return Err(ContextError::Busy),
        Err(TryLockError::Poisoned(_)) => return Err(ContextError::Poisoned),
    };
    Ok(f(&mut guard))
}

/// Id for drawing `texture`, registering it with the current context
///
/// `None` when there is no current context or it is locked.
pub fn get_texture_id(texture: TextureHandle) -> Option<TextureId> {
    with_current(|context| context.textures.register(texture)).ok()
}

/// Sprite record registered with the current context
pub fn get_sprite_info(sprite: SpriteHandle) -> Option<SpriteInfo> {
    with_current(|context| context.textures.sprite_info(sprite)).ok().flatten()
}

fn subscribe(select: fn(&mut Slot) -> &mut Vec<(Subscription, LifecycleCallback)>, callback: LifecycleCallback) -> Subscription {
    with_slot(|slot| {
        slot.next_subscription += 1;
        let id = Subscription(slot.next_subscription);
        select(slot).push((id, callback));
        id
    })
}

/// Run `callback` during every layout phase
pub fn on_layout(callback: impl Fn(&mut FrameContext) + Send + Sync + 'static) -> Subscription {
    subscribe(|slot| &mut slot.layout, Arc::new(callback))
}

/// Run `callback` whenever a context is initialized
pub fn on_initialize(callback: impl Fn(&mut FrameContext) + Send + Sync + 'static) -> Subscription {
    subscribe(|slot| &mut slot.initialize, Arc::new(callback))
}

/// Run `callback` whenever a context is torn down
pub fn on_deinitialize(callback: impl Fn(&mut FrameContext) + Send + Sync + 'static) -> Subscription {
    subscribe(|slot| &mut slot.deinitialize, Arc::new(callback))
}

/// Remove a subscription from every event
pub fn unsubscribe(subscription: Subscription) {
    with_slot(|slot| {
        for list in [&mut slot.layout, &mut slot.initialize, &mut slot.deinitialize] {
            list.retain(|(id, _)| *id != subscription);
        }
    });
}

// Callbacks run without the slot lock held so they may subscribe or query.
fn dispatch(select: fn(&mut Slot) -> &mut Vec<(Subscription, LifecycleCallback)>, context: &mut FrameContext) {
    let callbacks: Vec<LifecycleCallback> = with_slot(|slot| select(slot).iter().map(|(_, cb)| Arc::clone(cb)).collect());
    for callback in callbacks {
        callback(&mut *context);
    }
}

/// Fire the layout event
pub fn do_layout(context: &mut FrameContext) {
    dispatch(|slot| &mut slot.layout, context);
}

/// Fire the initialize event
pub fn do_initialize(context: &mut FrameContext) {
    dispatch(|slot| &mut slot.initialize, context);
}

/// Fire the deinitialize event
pub fn do_deinitialize(context: &mut FrameContext) {
    dispatch(|slot| &mut slot.deinitialize, context);
}

/// Drop the current context, the device adapter and every subscription
///
/// Run when the host reloads its domain, so no state leaks between runs.
pub fn reset_static() {
    let previous = with_slot(std::mem::take);
    log::debug!("Reset integration slot: {:?}", previous);
}
