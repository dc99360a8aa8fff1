//! Error and exception pipeline.
//!
//! [`Diagnostics`] holds the handler slots and output settings for one host.
//! Work runs through [`Diagnostics::run`], which routes runtime errors into
//! the classifier, hands uncaught exceptions to the dispatcher, and reports
//! fatal terminations exactly once.
//!
//! A `Diagnostics` value is single-threaded (`!Send`). Hosts running several
//! units of work concurrently give each its own instance.
use std::{
    cell::RefCell,
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    dump::Dumper,
    runtime::{Exception, Value},
};

pub mod classifier;
pub mod config;
pub mod error;
pub mod guard;
pub mod handler;
pub mod page;
pub mod sink;

pub use classifier::{Classification, ErrorClassifier, RawError};
pub use config::DiagnosticsConfig;
pub use error::{DiagError, DiagResult};
pub use guard::{Interrupt, Scope};
pub use page::{DebugPage, ErrorRecord, PageRenderer, StaticPage};
pub use sink::{LogSink, MemorySink, SharedBuffer, TracingSink};

/// Runtime error handler: classifies a raw error.
pub type ErrorHandler = Rc<dyn Fn(&RawError) -> Classification>;

/// Exception handler: takes over dispatching entirely.
pub type ExceptionHandler = Rc<dyn Fn(&Exception, &Diagnostics)>;

/// Handler registry and output settings for one host.
pub struct Diagnostics {
    config: DiagnosticsConfig,
    dumper: Dumper,
    classifier: Rc<ErrorClassifier>,
    error_handler: Option<ErrorHandler>,
    exception_handler: Option<ExceptionHandler>,
    debug_page: Rc<dyn PageRenderer>,
    log: Box<dyn LogSink>,
    output: RefCell<Box<dyn Write>>,
    active_handler: RefCell<Option<ErrorHandler>>,
    last_error: RefCell<Option<RawError>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        let config = DiagnosticsConfig::default();
        Self {
            dumper: config.dumper(),
            config,
            classifier: Rc::new(ErrorClassifier::default()),
            error_handler: None,
            exception_handler: None,
            debug_page: Rc::new(DebugPage),
            log: Box::new(TracingSink),
            output: RefCell::new(Box::new(io::stdout())),
            active_handler: RefCell::new(None),
            last_error: RefCell::new(None),
        }
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticsConfig) -> DiagResult<Self> {
        Ok(Self {
            dumper: config.dumper(),
            classifier: Rc::new(config.classifier()?),
            config,
            ..Self::default()
        })
    }

    pub fn with_log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log = Box::new(sink);
        self
    }

    pub fn with_output(self, output: impl Write + 'static) -> Self {
        *self.output.borrow_mut() = Box::new(output);
        self
    }

    pub fn with_debug_page(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.debug_page = Rc::new(renderer);
        self
    }

    /// Replaces the runtime error handler; `None` restores the classifier.
    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.error_handler = handler;
    }

    /// Replaces the exception handler; `None` restores the default dispatcher.
    pub fn set_exception_handler(&mut self, handler: Option<ExceptionHandler>) {
        self.exception_handler = handler;
    }

    pub fn set_error_page(&mut self, path: impl Into<PathBuf>) {
        self.config.error_page = Some(path.into());
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    pub fn set_terminal(&mut self, terminal: bool) {
        self.config.terminal = terminal;
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    pub fn is_terminal(&self) -> bool {
        self.config.terminal
    }

    pub fn error_page(&self) -> Option<&Path> {
        self.config.error_page.as_deref()
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    pub fn dumper(&self) -> &Dumper {
        &self.dumper
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Handler installed by [`Diagnostics::run`]: the registered one, or the
    /// configured classifier.
    pub fn error_handler(&self) -> ErrorHandler {
        match &self.error_handler {
            Some(handler) => handler.clone(),
            None => {
                let classifier = self.classifier.clone();
                Rc::new(move |error: &RawError| classifier.classify(error))
            }
        }
    }

    /// Most recent runtime error reported during guarded work.
    pub fn last_error(&self) -> Option<RawError> {
        self.last_error.borrow().clone()
    }

    /// Dispatches an exception to the registered handler or the default one.
    pub fn exception(&self, exception: Exception) {
        match &self.exception_handler {
            Some(handler) => handler(&exception, self),
            None => handler::handle(self, &exception),
        }
    }

    /// Writes a dump of `value` to the output, in debug mode only.
    pub fn dump(&self, value: &Value) {
        if !self.is_debug() {
            return;
        }
        let mut item = self.dumper.dump(value);
        item.push('\n');
        self.write_output(&item);
    }

    /// Dumps `value` and hands it back, for inline use.
    pub fn d(&self, value: Value) -> Value {
        self.dump(&value);
        value
    }

    pub(crate) fn log(&self, line: &str) {
        self.log.log(line);
    }

    pub(crate) fn debug_page(&self) -> &dyn PageRenderer {
        self.debug_page.as_ref()
    }

    pub(crate) fn write_output(&self, text: &str) {
        let mut output = self.output.borrow_mut();
        if let Err(err) = output.write_all(text.as_bytes()).and_then(|()| output.flush()) {
            tracing::warn!(target: "diagkit", error = %err, "failed to write diagnostics output");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::runtime::Severity;

    #[test]
    fn test_dump_only_in_debug_mode() {
        let out = SharedBuffer::new();
        let mut diagnostics = Diagnostics::new().with_output(out.clone());
        diagnostics.dump(&Value::Int(1));
        assert_eq!(out.contents(), "");
        diagnostics.set_debug(true);
        let value = diagnostics.d(Value::Int(2));
        assert!(matches!(value, Value::Int(2)));
        assert_eq!(out.contents(), "int(2)\n");
    }

    #[test]
    fn test_error_handler_slot_resets_to_classifier() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.set_error_handler(Some(Rc::new(|_: &RawError| Classification::Ignorable)));
        let raw = RawError::new(Severity::Warning, "oops", "a", 1);
        assert!((diagnostics.error_handler())(&raw).is_ignorable());
        diagnostics.set_error_handler(None);
        assert!(!(diagnostics.error_handler())(&raw).is_ignorable());
    }

    #[test]
    fn test_custom_exception_handler_replaces_default() {
        let out = SharedBuffer::new();
        let log = MemorySink::new();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut diagnostics = Diagnostics::new()
            .with_output(out.clone())
            .with_log_sink(log.clone());
        diagnostics.set_exception_handler(Some(Rc::new(move |_: &Exception, _: &Diagnostics| {
            seen.set(seen.get() + 1)
        })));
        diagnostics.exception(Exception::new("LogicException", "x"));
        assert_eq!(calls.get(), 1);
        assert!(log.lines().is_empty());
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_with_config_rejects_bad_patterns() {
        let config = DiagnosticsConfig {
            ignore_patterns: vec!["[".to_string()],
            ..DiagnosticsConfig::default()
        };
        assert!(matches!(
            Diagnostics::with_config(config),
            Err(DiagError::Pattern(_))
        ));
    }
}
