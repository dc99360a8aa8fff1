//! Classification of raw runtime errors into exceptions.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    diagnostics::error::DiagResult,
    runtime::{Exception, Severity},
};

/// Raw runtime error as reported by the host, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawError {
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl RawError {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity.is_fatal()
    }
}

/// Outcome of classifying a [`RawError`].
#[derive(Debug)]
pub enum Classification {
    /// Known noise; the error is dropped.
    Ignorable,
    ArgumentTypeViolation(Exception),
    RuntimeError(Exception),
}

impl Classification {
    pub fn into_exception(self) -> Option<Exception> {
        match self {
            Classification::Ignorable => None,
            Classification::ArgumentTypeViolation(e) | Classification::RuntimeError(e) => Some(e),
        }
    }

    pub fn is_ignorable(&self) -> bool {
        matches!(self, Classification::Ignorable)
    }
}

static ARGUMENT_PATTERN: OnceLock<Regex> = OnceLock::new();

/// `Argument N passed to Type::method() must be an instance of Expected,
/// Actual given, called in File on line N`.
fn argument_pattern() -> &'static Regex {
    ARGUMENT_PATTERN.get_or_init(|| {
        Regex::new(
            r"^Argument (\d+) passed to ([\w\\]+)::(\w+)\(\) must be an instance of ([\w\\]+), ([\w\\]+) given, called in ([\w\s./_-]+) on line (\d+)",
        )
        .expect("argument pattern must compile")
    })
}

/// Maps raw runtime errors to exceptions.
///
/// Pure: classifying never raises, it returns what should be raised.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    ignore: Vec<Regex>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            ignore: vec![Regex::new("filemtime").expect("literal pattern must compile")],
        }
    }
}

impl ErrorClassifier {
    /// Builds a classifier dropping messages that match any of `patterns`.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> DiagResult<Self> {
        let ignore = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ignore })
    }

    pub fn classify(&self, error: &RawError) -> Classification {
        if self.ignore.iter().any(|re| re.is_match(&error.message)) {
            return Classification::Ignorable;
        }

        if let Some(caps) = argument_pattern().captures(&error.message) {
            let call_line = caps[7].parse().unwrap_or(error.line);
            let cause = Exception::runtime_error(
                error.severity,
                error.message.clone(),
                &caps[6],
                call_line,
            );
            let message = format!(
                "Argument {} to {}::{}() should be an instance of {}, {} given",
                &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
            );
            return Classification::ArgumentTypeViolation(Exception::argument_type_violation(
                message,
                &caps[4],
                &caps[5],
                error.severity.code(),
                error.file.clone(),
                error.line,
                cause,
            ));
        }

        Classification::RuntimeError(Exception::runtime_error(
            error.severity,
            error.message.clone(),
            error.file.clone(),
            error.line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ExceptionKind;

    const TYPE_HINT: &str = "Argument 1 passed to Foo::bar() must be an instance of Baz, NULL given, called in /x.php on line 10";

    #[test]
    fn test_ignores_noise() {
        let classifier = ErrorClassifier::default();
        let raw = RawError::new(
            Severity::Warning,
            "filemtime(): stat failed for /tmp/cache/abc.php",
            "/vendor/twig/Environment.php",
            301,
        );
        assert!(classifier.classify(&raw).is_ignorable());
    }

    #[test]
    fn test_argument_violation_points_at_call_site() {
        let raw = RawError::new(Severity::RecoverableError, TYPE_HINT, "/app/Foo.php", 22);
        let e = ErrorClassifier::default()
            .classify(&raw)
            .into_exception()
            .expect("exception");
        assert_eq!(e.type_name(), "ArgumentTypeViolation");
        assert_eq!(
            e.message(),
            "Argument 1 to Foo::bar() should be an instance of Baz, NULL given"
        );
        assert_eq!(
            e.kind(),
            &ExceptionKind::ArgumentTypeViolation {
                expected: "Baz".into(),
                actual: "NULL".into()
            }
        );
        assert_eq!(e.code(), 4096);
        assert_eq!(e.reported_location(), ("/x.php", 10));
        let cause = e.previous().expect("wrapped raw error");
        assert_eq!(cause.message(), TYPE_HINT);
        assert_eq!(cause.severity(), Some(Severity::RecoverableError));
    }

    #[test]
    fn test_namespaced_types() {
        let raw = RawError::new(
            Severity::RecoverableError,
            "Argument 2 passed to App\\Repo::save() must be an instance of App\\Model, string given, called in /srv/app/src/Controller.php on line 88 and defined",
            "/srv/app/src/Repo.php",
            14,
        );
        match ErrorClassifier::default().classify(&raw) {
            Classification::ArgumentTypeViolation(e) => {
                assert_eq!(
                    e.message(),
                    "Argument 2 to App\\Repo::save() should be an instance of App\\Model, string given"
                );
                assert_eq!(e.reported_location(), ("/srv/app/src/Controller.php", 88));
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_everything_else_is_runtime_error() {
        let raw = RawError::new(Severity::Notice, "Undefined index: id", "/app/a.php", 5);
        match ErrorClassifier::default().classify(&raw) {
            Classification::RuntimeError(e) => {
                assert_eq!(e.type_name(), "RuntimeErrorException");
                assert_eq!(e.severity(), Some(Severity::Notice));
                assert_eq!((e.file(), e.line()), ("/app/a.php", 5));
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_custom_patterns() {
        let classifier = ErrorClassifier::new(&["^Deprecated:"]).expect("valid pattern");
        let raw = RawError::new(Severity::Deprecated, "Deprecated: each()", "a", 1);
        assert!(classifier.classify(&raw).is_ignorable());
        let raw = RawError::new(Severity::Warning, "filemtime(): stat failed", "a", 1);
        assert!(!classifier.classify(&raw).is_ignorable());
        assert!(ErrorClassifier::new(&["("]).is_err());
    }
}
