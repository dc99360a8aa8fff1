//! Log and output sinks used by the dispatcher.

use std::{cell::RefCell, io, rc::Rc};

/// Destination for one-line error log entries.
pub trait LogSink {
    fn log(&self, line: &str);
}

/// Emits log entries as `tracing` error events under the `diagkit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, line: &str) {
        tracing::error!(target: "diagkit", "{}", line);
    }
}

/// Collects log entries in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Cloneable in-memory writer; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
