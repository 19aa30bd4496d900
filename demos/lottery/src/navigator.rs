//! Terminal presentation context: a screen stack plus one modal slot

use std::sync::Arc;

use oneway::PresentationContext;
use parking_lot::Mutex;

use crate::flow::Screen;

#[derive(Debug, Default)]
struct Stack {
    screens: Vec<Screen>,
    modal: Option<Screen>,
}

/// Shared handle to the terminal's navigation state
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    inner: Arc<Mutex<Stack>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The screen at the top of the stack
    pub fn top(&self) -> Option<Screen> {
        self.inner.lock().screens.last().cloned()
    }

    pub fn modal(&self) -> Option<Screen> {
        self.inner.lock().modal.clone()
    }

    pub fn depth(&self) -> usize {
        self.inner.lock().screens.len()
    }

    /// Close the modal, returning it
    pub fn dismiss(&self) -> Option<Screen> {
        self.inner.lock().modal.take()
    }
}

impl PresentationContext for Navigator {
    type Content = Screen;
    /// Depth of the stack after the push
    type Navigation = usize;

    fn present(&self, content: Screen) {
        let mut stack = self.inner.lock();
        if stack.modal.is_some() {
            tracing::debug!("Replacing modal that was still open");
        }
        stack.modal = Some(content);
    }

    fn push_or_present(&self, content: Screen) -> usize {
        let mut stack = self.inner.lock();
        stack.screens.push(content);
        stack.screens.len()
    }
}
