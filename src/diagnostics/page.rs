//! Error pages for web contexts.
//!
//! The dispatcher hands renderers a normalized [`ErrorRecord`]; renderers
//! own presentation.

use std::{
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    diagnostics::error::{DiagError, DiagResult},
    dump::DEFAULT_CHAIN_LIMIT,
    runtime::{Exception, StackFrame},
};

/// Presentation-neutral view of an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Severity display name for runtime errors, type name otherwise.
    pub name: String,
    pub code: i64,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub trace: Vec<StackFrame>,
    pub previous: Option<Box<ErrorRecord>>,
}

impl ErrorRecord {
    pub fn from_exception(exception: &Exception) -> Self {
        Self::build(exception, DEFAULT_CHAIN_LIMIT)
    }

    fn build(exception: &Exception, remaining: usize) -> Self {
        let name = match exception.severity() {
            Some(severity) => severity.display_name().to_string(),
            None => exception.type_name().to_string(),
        };
        let (file, line) = exception.reported_location();
        let previous = match exception.previous() {
            Some(previous) if remaining > 1 => {
                Some(Box::new(Self::build(previous, remaining - 1)))
            }
            _ => None,
        };
        Self {
            name,
            code: exception.code(),
            message: exception.message().to_string(),
            file: file.to_string(),
            line,
            trace: exception.trace().to_vec(),
            previous,
        }
    }

    /// Short stable reference for correlating a page with its log entry.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.file.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.line.to_be_bytes());
        hasher.update([0u8]);
        hasher.update(self.message.as_bytes());
        let digest = hasher.finalize();
        digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn to_json(&self) -> DiagResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub trait PageRenderer {
    fn render(&self, record: &ErrorRecord) -> String;
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const DEBUG_STYLE: &str = "\
html * { margin: 0; padding: 0; }
body { font-family: Helvetica, sans-serif; color: #333333; }
#header { background: #cd1818; color: #ffffff; padding: 25px 20px 20px 20px; }
#header p { font-size: 20px; }
h1 { margin-bottom: 10px; }
h2 { margin-bottom: 10px; color: #328adc; font-size: 18px; }
#file, #trace, #previous { padding: 10px 20px 0 20px; margin-bottom: 20px; }
.panel { background: #f1f5fb; padding: 10px; border-radius: 7px; }
li { margin: 0 0 10px 25px; }
code { font-size: 14px; border: 1px solid #cccccc; padding: 5px; border-radius: 5px; }
";

/// Full diagnostic page for debug web contexts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugPage;

impl PageRenderer for DebugPage {
    fn render(&self, record: &ErrorRecord) -> String {
        let name = escape_html(&record.name);
        let mut page = String::new();
        let _ = write!(
            page,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n",
            name, DEBUG_STYLE
        );

        let code = if record.code != 0 {
            format!(" (Code {})", record.code)
        } else {
            String::new()
        };
        let _ = writeln!(
            page,
            "<div id=\"header\">\n<h1>{}</h1>\n<p>{}{}</p>\n</div>",
            name,
            escape_html(&record.message),
            code
        );
        let _ = writeln!(
            page,
            "<div id=\"file\">\n<h2>Source File:</h2>\n<div class=\"panel\"><p><strong>File:</strong> <code>{}</code> <strong>Line:</strong> <code>{}</code></p></div>\n</div>",
            escape_html(&record.file),
            record.line
        );

        if !record.trace.is_empty() {
            page.push_str("<div id=\"trace\">\n<h2>Trace:</h2>\n<ol>\n");
            for frame in &record.trace {
                page.push_str("<li class=\"panel\">");
                if let Some(file) = &frame.file {
                    let _ = write!(page, "<p><strong>File:</strong> <code>{}</code>", escape_html(file));
                    if let Some(line) = frame.line {
                        let _ = write!(page, " <strong>Line:</strong> <code>{}</code>", line);
                    }
                    page.push_str("</p>");
                }
                let _ = writeln!(
                    page,
                    "<p><strong>Function:</strong> <code>{}</code></p></li>",
                    escape_html(&frame.callable())
                );
            }
            page.push_str("</ol>\n</div>\n");
        }

        if let Some(previous) = &record.previous {
            let _ = writeln!(
                page,
                "<div id=\"previous\">\n<h2>Previous:</h2>\n<div class=\"panel\"><p><code>{}: {}</code> <code>{}:{}</code></p></div>\n</div>",
                escape_html(&previous.name),
                escape_html(&previous.message),
                escape_html(&previous.file),
                previous.line
            );
        }

        page.push_str("</body>\n</html>\n");
        page
    }
}

/// Production page: the configured static file, or a generic page that
/// reveals nothing but a reference fingerprint.
#[derive(Debug, Default, Clone)]
pub struct StaticPage {
    path: Option<PathBuf>,
}

impl StaticPage {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn read(path: &Path) -> DiagResult<String> {
        fs::read_to_string(path).map_err(|source| DiagError::File {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn generic(record: &ErrorRecord) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Internal Server Error</title>\n</head>\n<body>\n<h1>Internal Server Error</h1>\n<p>Something went wrong. Reference: {}</p>\n</body>\n</html>\n",
            record.fingerprint()
        )
    }
}

impl PageRenderer for StaticPage {
    fn render(&self, record: &ErrorRecord) -> String {
        let Some(path) = &self.path else {
            return Self::generic(record);
        };
        match Self::read(path) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(target: "diagkit", error = %err, "error page unavailable, using generic page");
                Self::generic(record)
            }
        }
    }
}
