use std::{fmt, panic::Location, rc::Rc};

use serde::Serialize;

use crate::runtime::severity::Severity;

pub const RUNTIME_ERROR_TYPE: &str = "RuntimeErrorException";
pub const ARGUMENT_TYPE_VIOLATION_TYPE: &str = "ArgumentTypeViolation";

/// One call-stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    /// Enclosing type of a method call.
    pub class: Option<String>,
    /// Call operator between type and function, `->` or `::`.
    pub call_type: Option<String>,
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn function(function: impl Into<String>) -> Self {
        Self {
            class: None,
            call_type: None,
            function: function.into(),
            file: None,
            line: None,
        }
    }

    pub fn method(
        class: impl Into<String>,
        call_type: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            class: Some(class.into()),
            call_type: Some(call_type.into()),
            ..Self::function(function)
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Callable part of the frame, e.g. `Foo->bar()`.
    pub fn callable(&self) -> String {
        let mut out = String::new();
        if let Some(class) = &self.class {
            out.push_str(class);
            out.push_str(self.call_type.as_deref().unwrap_or(""));
        }
        out.push_str(&self.function);
        out.push_str("()");
        out
    }
}

impl fmt::Display for StackFrame {
    /// `Type->function() [file:line]`; the bracketed segment is omitted when
    /// the frame has no file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.callable())?;
        if let Some(file) = &self.file {
            write!(f, " [{}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Classification carried by an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionKind {
    /// Exception raised directly by application code.
    Generic,
    /// Classified runtime error.
    RuntimeError { severity: Severity },
    /// Type-contract breach at a call boundary. The raw error is kept as the
    /// `previous` exception.
    ArgumentTypeViolation { expected: String, actual: String },
}

/// Exception value flowing through the error pipeline.
#[derive(Debug, Clone)]
pub struct Exception {
    type_name: String,
    kind: ExceptionKind,
    message: String,
    code: i64,
    file: String,
    line: u32,
    trace: Vec<StackFrame>,
    previous: Option<Rc<Exception>>,
}

impl Exception {
    /// Creates a generic exception located at the caller.
    #[track_caller]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let caller = Location::caller();
        Self {
            type_name: type_name.into(),
            kind: ExceptionKind::Generic,
            message: message.into(),
            code: 0,
            file: caller.file().to_string(),
            line: caller.line(),
            trace: Vec::new(),
            previous: None,
        }
    }

    /// Creates a runtime error exception located where the error occurred.
    pub fn runtime_error(
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            type_name: RUNTIME_ERROR_TYPE.to_string(),
            kind: ExceptionKind::RuntimeError { severity },
            message: message.into(),
            code: 0,
            file: file.into(),
            line,
            trace: Vec::new(),
            previous: None,
        }
    }

    /// Creates an argument type violation wrapping the raw error.
    ///
    /// The violation itself sits at the raw error's location; its
    /// [`reported_location`](Exception::reported_location) is the call site
    /// recorded on `cause`.
    pub fn argument_type_violation(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        code: i64,
        file: impl Into<String>,
        line: u32,
        cause: Exception,
    ) -> Self {
        Self {
            type_name: ARGUMENT_TYPE_VIOLATION_TYPE.to_string(),
            kind: ExceptionKind::ArgumentTypeViolation {
                expected: expected.into(),
                actual: actual.into(),
            },
            message: message.into(),
            code,
            file: file.into(),
            line,
            trace: Vec::new(),
            previous: Some(Rc::new(cause)),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_trace(mut self, trace: Vec<StackFrame>) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_previous(mut self, previous: Exception) -> Self {
        self.previous = Some(Rc::new(previous));
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> &ExceptionKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn trace(&self) -> &[StackFrame] {
        &self.trace
    }

    pub fn previous(&self) -> Option<&Rc<Exception>> {
        self.previous.as_ref()
    }

    /// Severity of a classified runtime error.
    pub fn severity(&self) -> Option<Severity> {
        match self.kind {
            ExceptionKind::RuntimeError { severity } => Some(severity),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity().is_some_and(Severity::is_fatal)
    }

    /// Location to report for this exception.
    ///
    /// Argument type violations point at the call site carried by the
    /// wrapped runtime error rather than at the function that rejected the
    /// argument.
    pub fn reported_location(&self) -> (&str, u32) {
        if let ExceptionKind::ArgumentTypeViolation { .. } = self.kind {
            if let Some(cause) = self.previous.as_deref() {
                if cause.severity().is_some() {
                    return (cause.file(), cause.line());
                }
            }
        }
        (&self.file, self.line)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.previous
            .as_deref()
            .map(|previous| previous as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_frame_display() {
        let frame = StackFrame::method("Foo", "->", "bar").at("/src/foo.php", 12);
        assert_eq!(frame.to_string(), "Foo->bar() [/src/foo.php:12]");
        assert_eq!(StackFrame::function("main").to_string(), "main()");
        assert_eq!(
            StackFrame::method("Cache", "::", "get").in_file("cache.php").to_string(),
            "Cache::get() [cache.php]"
        );
    }

    #[test]
    fn test_new_records_caller_location() {
        let line = line!() + 1;
        let e = Exception::new("LogicException", "boom");
        assert_eq!(e.file(), file!());
        assert_eq!(e.line(), line);
        assert_eq!(e.kind(), &ExceptionKind::Generic);
        assert_eq!(e.to_string(), "LogicException: boom");
    }

    #[test]
    fn test_reported_location_uses_wrapped_error() {
        let cause = Exception::runtime_error(Severity::RecoverableError, "raw", "/x.php", 10);
        let e = Exception::argument_type_violation(
            "Argument 1 to Foo::bar() should be an instance of Baz, NULL given",
            "Baz",
            "NULL",
            Severity::RecoverableError.code(),
            "/foo.php",
            3,
            cause,
        );
        assert_eq!(e.reported_location(), ("/x.php", 10));
        assert_eq!((e.file(), e.line()), ("/foo.php", 3));
        assert!(e.source().is_some());
    }

    #[test]
    fn test_fatal_follows_severity() {
        assert!(Exception::runtime_error(Severity::Error, "oom", "a", 1).is_fatal());
        assert!(!Exception::runtime_error(Severity::Notice, "n", "a", 1).is_fatal());
        assert!(!Exception::new("X", "y").is_fatal());
    }
}
