//! Output sinks for hook messages.

use crate::traits::OutputSink;
use std::cell::RefCell;

/// Collects messages so the caller decides where they go.
#[derive(Debug, Default)]
pub struct BufferSink {
    messages: RefCell<Vec<String>>,
}

impl BufferSink {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected messages, leaving the buffer empty.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }

    /// Whether anything has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Everything emitted so far, joined with newlines.
    #[must_use]
    pub fn joined(&self) -> String {
        self.messages.borrow().join("\n")
    }
}

impl OutputSink for BufferSink {
    fn emit(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
