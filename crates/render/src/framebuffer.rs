use cubestack_common::FramebufferId;

use crate::{GraphicsBackend, RenderError};

/// Push/pop stack of render targets.
///
/// Pushing binds the new target; popping rebinds whatever was below it, or
/// the default framebuffer once the stack is empty.
#[derive(Debug, Default)]
pub struct FramebufferStack {
    stack: Vec<FramebufferId>,
}

impl FramebufferStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<B>(&mut self, backend: &mut B, target: FramebufferId)
    where
        B: GraphicsBackend + ?Sized,
    {
        self.stack.push(target);
        backend.bind_framebuffer(Some(target));
    }

    pub fn pop<B>(&mut self, backend: &mut B) -> Result<FramebufferId, RenderError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let popped = self.stack.pop().ok_or(RenderError::FramebufferUnderflow)?;
        backend.bind_framebuffer(self.current());
        Ok(popped)
    }

    /// Target currently bound through this stack, `None` for the default.
    pub fn current(&self) -> Option<FramebufferId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
