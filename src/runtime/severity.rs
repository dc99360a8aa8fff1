//! Runtime error severities and their fixed classification table.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Severity of a raw runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Unrecoverable run-time error; execution stops.
    Error,
    Warning,
    /// Source could not be parsed; execution stops.
    Parse,
    Notice,
    CoreError,
    CoreWarning,
    CompileError,
    CompileWarning,
    /// Fatal error raised explicitly by user code.
    UserError,
    UserWarning,
    UserNotice,
    Strict,
    /// Dangerous but catchable error; not treated as fatal.
    RecoverableError,
    Deprecated,
    UserDeprecated,
}

/// Row of the severity table.
#[derive(Debug, Clone, Copy)]
pub struct SeverityInfo {
    pub severity: Severity,
    /// Bit code of the severity.
    pub code: i64,
    /// Upper-case label used in dumps.
    pub label: &'static str,
    /// Human-readable name used on error pages.
    pub display_name: &'static str,
    pub fatal: bool,
}

const fn row(
    severity: Severity,
    code: i64,
    label: &'static str,
    display_name: &'static str,
    fatal: bool,
) -> SeverityInfo {
    SeverityInfo {
        severity,
        code,
        label,
        display_name,
        fatal,
    }
}

pub static SEVERITY_TABLE: [SeverityInfo; 15] = [
    row(Severity::Error, 1, "ERROR", "Error", true),
    row(Severity::Warning, 2, "WARNING", "Warning", false),
    row(Severity::Parse, 4, "PARSE", "Parse Error", true),
    row(Severity::Notice, 8, "NOTICE", "Notice", false),
    row(Severity::CoreError, 16, "CORE_ERROR", "Core Error", true),
    row(Severity::CoreWarning, 32, "CORE_WARNING", "Core Warning", false),
    row(Severity::CompileError, 64, "COMPILE_ERROR", "Compile Error", true),
    row(Severity::CompileWarning, 128, "COMPILE_WARNING", "Compile Warning", false),
    row(Severity::UserError, 256, "USER_ERROR", "User Error", true),
    row(Severity::UserWarning, 512, "USER_WARNING", "User Warning", false),
    row(Severity::UserNotice, 1024, "USER_NOTICE", "User Notice", false),
    row(Severity::Strict, 2048, "STRICT", "Strict Standards", false),
    row(Severity::RecoverableError, 4096, "RECOVERABLE_ERROR", "Recoverable Error", false),
    row(Severity::Deprecated, 8192, "DEPRECATED", "Deprecated", false),
    row(Severity::UserDeprecated, 16384, "USER_DEPRECATED", "User Deprecated", false),
];

impl Severity {
    pub fn info(self) -> &'static SeverityInfo {
        // Table rows are declared in variant order.
        &SEVERITY_TABLE[self as usize]
    }

    pub fn code(self) -> i64 {
        self.info().code
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    pub fn is_fatal(self) -> bool {
        self.info().fatal
    }

    pub fn from_code(code: i64) -> Option<Severity> {
        SEVERITY_TABLE
            .iter()
            .find(|row| row.code == code)
            .map(|row| row.severity)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts labels (`WARNING`, `user_error`), `E_`-prefixed labels, or
    /// numeric bit codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i64>() {
            return Severity::from_code(code).ok_or_else(|| format!("unknown severity code {}", code));
        }
        let upper = s.trim().to_ascii_uppercase();
        let label = upper.strip_prefix("E_").unwrap_or(&upper);
        SEVERITY_TABLE
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.severity)
            .ok_or_else(|| format!("unknown severity `{}`", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_variant_order() {
        for (index, row) in SEVERITY_TABLE.iter().enumerate() {
            assert_eq!(row.severity as usize, index);
        }
    }

    #[test]
    fn test_fatal_set() {
        let fatal: Vec<Severity> = SEVERITY_TABLE
            .iter()
            .filter(|row| row.fatal)
            .map(|row| row.severity)
            .collect();
        assert_eq!(
            fatal,
            vec![
                Severity::Error,
                Severity::Parse,
                Severity::CoreError,
                Severity::CompileError,
                Severity::UserError,
            ]
        );
        assert!(!Severity::RecoverableError.is_fatal());
    }

    #[test]
    fn test_parse() {
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("E_USER_DEPRECATED".parse::<Severity>(), Ok(Severity::UserDeprecated));
        assert_eq!("256".parse::<Severity>(), Ok(Severity::UserError));
        assert!("3".parse::<Severity>().is_err());
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_codes_round_trip() {
        assert_eq!(Severity::from_code(Severity::Notice.code()), Some(Severity::Notice));
        assert_eq!(Severity::Deprecated.to_string(), "DEPRECATED");
        assert_eq!(Severity::Parse.display_name(), "Parse Error");
    }
}
