//! Immediate replay into a pooled command buffer

use super::{replay, CommandRecorder, RecordResult};
use crate::command::DrawCommand;

/// Host render context that hands out command buffers
pub trait ImmediateContext {
    /// Command buffer type
    type Buffer: CommandRecorder;

    /// Take a command buffer from the pool
    fn acquire_command_buffer(&mut self, name: &str) -> Self::Buffer;

    /// Submit a recorded buffer
    fn execute_command_buffer(&mut self, buffer: &mut Self::Buffer) -> RecordResult<()>;

    /// Return a buffer to the pool
    fn release_command_buffer(&mut self, buffer: Self::Buffer);
}

/// Replays a frame's commands into a fresh command buffer and submits it
#[derive(Debug, Clone)]
pub struct ImmediateExecutor {
    buffer_name: String,
}

impl ImmediateExecutor {
    /// Create an executor naming its command buffers `buffer_name`
    pub fn new(buffer_name: impl Into<String>) -> Self {
        Self {
            buffer_name: buffer_name.into(),
        }
    }

    /// Name given to acquired command buffers
    pub fn buffer_name(&self) -> &str {
        &self.buffer_name
    }

    /// Record and submit `commands`
    ///
    /// The buffer goes back to the pool whether or not recording succeeded;
    /// a failed recording is not submitted.
    pub fn execute<C: ImmediateContext + ?Sized>(&self, context: &mut C, commands: &[DrawCommand]) -> RecordResult<()> {
        let mut buffer = context.acquire_command_buffer(&self.buffer_name);
        let result = replay(commands, &mut buffer).and_then(|()| context.execute_command_buffer(&mut buffer));
        context.release_command_buffer(buffer);

        if let Err(err) = &result {
            log::warn!("Command buffer '{}' failed: {}", self.buffer_name, err);
        }
        result
    }
}

impl Default for ImmediateExecutor {
    fn default() -> Self {
        Self::new(super::deferred::DeferredExecutor::PASS_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::{RecordError, TraceRecorder};

    #[derive(Default)]
    struct PoolContext {
        submitted: Vec<Vec<DrawCommand>>,
        acquired: Vec<String>,
        released: usize,
    }

    impl ImmediateContext for PoolContext {
        type Buffer = TraceRecorder;

        fn acquire_command_buffer(&mut self, name: &str) -> TraceRecorder {
            self.acquired.push(name.to_string());
            TraceRecorder::new()
        }

        fn execute_command_buffer(&mut self, buffer: &mut TraceRecorder) -> RecordResult<()> {
            self.submitted.push(buffer.commands());
            Ok(())
        }

        fn release_command_buffer(&mut self, _buffer: TraceRecorder) {
            self.released += 1;
        }
    }

    #[test]
    fn test_execute_submits_and_releases() {
        let mut context = PoolContext::default();
        let commands = vec![DrawCommand::ClearDepth, DrawCommand::DisableScissor];

        ImmediateExecutor::default().execute(&mut context, &commands).unwrap();

        assert_eq!(context.acquired, vec!["ImGui Render Pass".to_string()]);
        assert_eq!(context.submitted, vec![commands]);
        assert_eq!(context.released, 1);
    }

    #[test]
    fn test_failed_recording_is_released_not_submitted() {
        let mut context = PoolContext::default();
        let commands = vec![DrawCommand::EndSample("unopened".to_string())];

        let result = ImmediateExecutor::new("gui").execute(&mut context, &commands);

        assert!(matches!(result, Err(RecordError::UnbalancedSample { .. })));
        assert!(context.submitted.is_empty());
        assert_eq!(context.released, 1);
    }
}
