//! Diagnostics configuration.
//!
//! Loaded from defaults, an optional JSON file, and `DIAGKIT_*` environment
//! variables, in that order.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::{
        classifier::ErrorClassifier,
        error::{DiagError, DiagResult},
    },
    dump::{Dumper, Encoding, EncodingPolicy},
};

pub const ENV_DEBUG: &str = "DIAGKIT_DEBUG";
pub const ENV_TERMINAL: &str = "DIAGKIT_TERMINAL";
pub const ENV_ERROR_PAGE: &str = "DIAGKIT_ERROR_PAGE";
pub const ENV_MAX_DEPTH: &str = "DIAGKIT_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Show diagnostic detail (debug pages, `dump`).
    pub debug: bool,
    /// Running in a terminal rather than serving a web response.
    pub terminal: bool,
    /// Static page shown by production web apps.
    pub error_page: Option<PathBuf>,
    /// Nesting limit for dumps; `None` renders everything.
    pub max_depth: Option<usize>,
    /// Candidate encodings for dumped strings, in preference order.
    pub encodings: Vec<Encoding>,
    /// Regexes for runtime error messages that are dropped silently.
    pub ignore_patterns: Vec<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            terminal: false,
            error_page: None,
            max_depth: None,
            encodings: EncodingPolicy::default().candidates().to_vec(),
            ignore_patterns: vec!["filemtime".to_string()],
        }
    }
}

impl DiagnosticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> DiagResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| DiagError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> DiagResult<Self> {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Applies `DIAGKIT_*` variables resolved through `lookup`.
    pub fn overlay<F>(mut self, lookup: F) -> DiagResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DEBUG) {
            self.debug = parse_flag(ENV_DEBUG, &value)?;
        }
        if let Some(value) = lookup(ENV_TERMINAL) {
            self.terminal = parse_flag(ENV_TERMINAL, &value)?;
        }
        if let Some(value) = lookup(ENV_ERROR_PAGE) {
            self.error_page = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            self.max_depth = if value.is_empty() {
                None
            } else {
                Some(value.parse().map_err(|_| {
                    DiagError::Config(format!("{} must be a number, got `{}`", ENV_MAX_DEPTH, value))
                })?)
            };
        }
        Ok(self)
    }

    pub fn dumper(&self) -> Dumper {
        Dumper::new()
            .with_max_depth(self.max_depth)
            .with_encodings(EncodingPolicy::new(self.encodings.clone()))
    }

    pub fn classifier(&self) -> DiagResult<ErrorClassifier> {
        ErrorClassifier::new(&self.ignore_patterns)
    }
}

fn parse_flag(key: &str, value: &str) -> DiagResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DiagError::Config(format!(
            "{} must be a boolean, got `{}`",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DiagnosticsConfig::default();
        assert!(!config.debug);
        assert!(!config.terminal);
        assert_eq!(config.encodings.len(), 4);
        assert_eq!(config.encodings[0], Encoding::Utf8);
        assert_eq!(config.ignore_patterns, vec!["filemtime"]);
    }

    #[test]
    fn test_overlay_env() {
        let config = DiagnosticsConfig::default()
            .overlay(lookup(&[
                (ENV_DEBUG, "yes"),
                (ENV_TERMINAL, "0"),
                (ENV_ERROR_PAGE, "/srv/500.html"),
                (ENV_MAX_DEPTH, "3"),
            ]))
            .expect("valid overlay");
        assert!(config.debug);
        assert!(!config.terminal);
        assert_eq!(config.error_page, Some(PathBuf::from("/srv/500.html")));
        assert_eq!(config.max_depth, Some(3));
    }

    #[test]
    fn test_overlay_rejects_bad_values() {
        let err = DiagnosticsConfig::default()
            .overlay(lookup(&[(ENV_DEBUG, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DEBUG));
        assert!(
            DiagnosticsConfig::default()
                .overlay(lookup(&[(ENV_MAX_DEPTH, "deep")]))
                .is_err()
        );
    }

    #[test]
    fn test_json_keeps_defaults_for_missing_keys() {
        let config: DiagnosticsConfig =
            serde_json::from_str(r#"{"debug": true, "encodings": ["ISO-8859-1"]}"#)
                .expect("valid config");
        assert!(config.debug);
        assert_eq!(config.encodings, vec![Encoding::Iso88591]);
        assert_eq!(config.ignore_patterns, vec!["filemtime"]);
    }

    #[test]
    fn test_from_file_reports_path() {
        let err = DiagnosticsConfig::from_file(Path::new("/nonexistent/diagkit.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/diagkit.json"));
        assert!(matches!(
            err,
            DiagError::File { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
