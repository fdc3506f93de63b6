//! Hold-to-toggle activation
//!
//! Toggles the GUI once an activation button has been held for a while. The
//! button that triggered decides which renderer and input backend are used.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Extra delay before a held button toggles again
const REPEAT_DELAY: Duration = Duration::from_secs(1);

/// Renderer used while the GUI is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderType {
    /// Screen-space mesh renderer
    #[default]
    Mesh,
    /// World-space mesh renderer for VR
    VrMesh,
}

/// Input backend used while the GUI is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputType {
    /// Keyboard, mouse and gamepad
    #[default]
    InputSystem,
    /// Tracked VR controllers
    VrInput,
}

/// Whether the GUI is on, and with which backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationState {
    /// GUI is enabled
    pub enabled: bool,
    /// Renderer selected when it was last enabled
    pub render_type: RenderType,
    /// Input backend selected when it was last enabled
    pub input_type: InputType,
}

/// Activation buttons sampled this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationButtons {
    /// VR controller button is pressed
    pub vr: bool,
    /// Editor shortcut is in progress
    pub editor: bool,
}

/// Toggles activation after a button is held for `hold_duration`
#[derive(Debug, Clone)]
pub struct HoldActivator {
    hold_duration: Duration,
    allow_editor_button: bool,
    deadline: Duration,
    state: ActivationState,
}

impl HoldActivator {
    /// Create a disabled activator
    pub const fn new(hold_duration: Duration, allow_editor_button: bool) -> Self {
        Self {
            hold_duration,
            allow_editor_button,
            deadline: hold_duration,
            state: ActivationState {
                enabled: false,
                render_type: RenderType::Mesh,
                input_type: InputType::InputSystem,
            },
        }
    }

    /// Current state
    pub const fn state(&self) -> ActivationState {
        self.state
    }

    /// Feed this frame's buttons at time `now`
    ///
    /// Returns the new state when it toggled. A button still held after a
    /// toggle toggles again once `hold_duration` plus one second has passed.
    pub fn update(&mut self, now: Duration, buttons: ActivationButtons) -> Option<ActivationState> {
        let pressed = buttons.vr || (self.allow_editor_button && buttons.editor);
        if !pressed {
            self.deadline = now + self.hold_duration;
            return None;
        }
        if now <= self.deadline {
            return None;
        }

        if !self.state.enabled {
            (self.state.render_type, self.state.input_type) = if buttons.vr {
                (RenderType::VrMesh, InputType::VrInput)
            } else {
                (RenderType::Mesh, InputType::InputSystem)
            };
        }
        self.state.enabled = !self.state.enabled;
        self.deadline = now + self.hold_duration + REPEAT_DELAY;

        log::debug!(
            "GUI {} ({:?}, {:?})",
            if self.state.enabled { "enabled" } else { "disabled" },
            self.state.render_type,
            self.state.input_type
        );
        Some(self.state)
    }
}
