//! Frame command list
//!
//! The list is either being recorded or sealed. Readers only ever see a
//! sealed list, so replay can never observe a half-translated frame.

use super::DrawCommand;

/// Ordered draw commands of the current frame
#[derive(Debug)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
    sealed: bool,
    frame: u64,
}

impl CommandList {
    /// Create an empty, sealed list
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty, sealed list with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
            sealed: true,
            frame: 0,
        }
    }

    /// Start recording a new frame, discarding the previous one
    pub fn record(&mut self) -> CommandWriter<'_> {
        self.commands.clear();
        self.sealed = false;
        self.frame += 1;
        CommandWriter {
            list: self,
            finished: false,
        }
    }

    /// Commands of the last completed frame
    ///
    /// `None` while a frame is being recorded.
    pub fn sealed(&self) -> Option<&[DrawCommand]> {
        self.sealed.then_some(self.commands.as_slice())
    }

    /// Mutable access to a completed frame, for pre-replay rewrites
    pub fn sealed_mut(&mut self) -> Option<&mut [DrawCommand]> {
        if self.sealed {
            Some(self.commands.as_mut_slice())
        } else {
            None
        }
    }

    /// Whether the list is readable
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of commands in the list
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list holds no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of frames recorded so far
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Drop all commands
    pub fn clear(&mut self) {
        self.commands.clear();
        self.sealed = true;
    }
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new()
    }
}

/// Write access to a list for the duration of one frame's translation
///
/// `finish` seals the recorded frame. Dropping the writer without finishing
/// (an error path) seals an empty list instead, so a partial frame is never
/// replayed.
#[derive(Debug)]
pub struct CommandWriter<'a> {
    list: &'a mut CommandList,
    finished: bool,
}

impl CommandWriter<'_> {
    /// Append a command
    pub fn push(&mut self, command: DrawCommand) {
        self.list.commands.push(command);
    }

    /// Commands recorded so far
    pub fn recorded(&self) -> &[DrawCommand] {
        &self.list.commands
    }

    /// Number of commands recorded so far
    pub fn len(&self) -> usize {
        self.list.commands.len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.list.commands.is_empty()
    }

    /// Seal the frame, making it available for replay
    pub fn finish(mut self) -> usize {
        self.finished = true;
        self.list.commands.len()
    }
}

impl Extend<DrawCommand> for CommandWriter<'_> {
    fn extend<I: IntoIterator<Item = DrawCommand>>(&mut self, iter: I) {
        self.list.commands.extend(iter);
    }
}

impl Drop for CommandWriter<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!(
                "Frame {} abandoned after {} commands; discarding it",
                self.list.frame,
                self.list.commands.len()
            );
            self.list.commands.clear();
        }
        self.list.sealed = true;
    }
}
