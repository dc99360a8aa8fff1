//! Default exception dispatcher.

use crate::{
    diagnostics::{
        Diagnostics,
        page::{ErrorRecord, PageRenderer, StaticPage},
    },
    runtime::Exception,
};

/// Output channel picked for an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Full text dump to the terminal.
    Terminal,
    /// HTML page with full trace.
    DebugPage,
    /// Static page without diagnostic detail.
    ErrorPage,
}

pub fn channel(diagnostics: &Diagnostics) -> Channel {
    if diagnostics.is_terminal() {
        Channel::Terminal
    } else if diagnostics.is_debug() {
        Channel::DebugPage
    } else {
        Channel::ErrorPage
    }
}

/// `Type: message [file:line]`, using the reported location.
pub fn log_line(exception: &Exception) -> String {
    let (file, line) = exception.reported_location();
    format!(
        "{}: {} [{}:{}]",
        exception.type_name(),
        exception.message(),
        file,
        line
    )
}

/// Logs the exception unless it is fatal, then renders it on the channel
/// selected by the terminal and debug settings.
///
/// Fatal errors were logged by [`Diagnostics::report_error`] or the panic
/// path of [`Diagnostics::run`] when they happened, so they are not logged a
/// second time.
pub fn handle(diagnostics: &Diagnostics, exception: &Exception) {
    let record = ErrorRecord::from_exception(exception);
    let span = tracing::error_span!(target: "diagkit", "exception", reference = %record.fingerprint());
    let _entered = span.enter();

    if !exception.is_fatal() {
        diagnostics.log(&log_line(exception));
    }

    let channel = channel(diagnostics);
    tracing::debug!(target: "diagkit", ?channel, "rendering exception");

    let rendered = match channel {
        Channel::Terminal => {
            let mut item = diagnostics.dumper().dump_exception(exception);
            item.push('\n');
            item
        }
        Channel::DebugPage => diagnostics.debug_page().render(&record),
        Channel::ErrorPage => {
            StaticPage::new(diagnostics.error_page().map(|p| p.to_path_buf())).render(&record)
        }
    };
    diagnostics.write_output(&rendered);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostics::{MemorySink, SharedBuffer},
        runtime::Severity,
    };

    fn setup(terminal: bool, debug: bool) -> (Diagnostics, MemorySink, SharedBuffer) {
        let log = MemorySink::new();
        let out = SharedBuffer::new();
        let mut diagnostics = Diagnostics::new()
            .with_log_sink(log.clone())
            .with_output(out.clone());
        diagnostics.set_terminal(terminal);
        diagnostics.set_debug(debug);
        (diagnostics, log, out)
    }

    #[test]
    fn test_log_line_format() {
        let e = Exception::runtime_error(Severity::Warning, "Division by zero", "/app/a.php", 3);
        assert_eq!(
            log_line(&e),
            "RuntimeErrorException: Division by zero [/app/a.php:3]"
        );
    }

    #[test]
    fn test_channel_selection() {
        assert_eq!(channel(&setup(true, false).0), Channel::Terminal);
        assert_eq!(channel(&setup(true, true).0), Channel::Terminal);
        assert_eq!(channel(&setup(false, true).0), Channel::DebugPage);
        assert_eq!(channel(&setup(false, false).0), Channel::ErrorPage);
    }

    #[test]
    fn test_terminal_dump() {
        let (diagnostics, log, out) = setup(true, false);
        let e = Exception::new("LogicException", "broken").at("/app/a.php", 9);
        handle(&diagnostics, &e);
        assert_eq!(log.lines(), vec!["LogicException: broken [/app/a.php:9]"]);
        assert!(out.contents().starts_with("LogicException {\n\tMessage  : string(6) \"broken\"\n"));
        assert!(out.contents().ends_with("}\n"));
    }

    #[test]
    fn test_fatal_is_not_logged_twice() {
        let (diagnostics, log, out) = setup(true, false);
        let e = Exception::runtime_error(Severity::Error, "Allowed memory size exhausted", "/a.php", 1);
        handle(&diagnostics, &e);
        assert!(log.lines().is_empty());
        assert!(out.contents().contains("Severity : string(5) \"ERROR\""));
    }

    #[test]
    fn test_production_page_hides_detail() {
        let (diagnostics, _log, out) = setup(false, false);
        let e = Exception::new("PDOException", "password=hunter2 rejected");
        handle(&diagnostics, &e);
        assert!(out.contents().contains("Internal Server Error"));
        assert!(!out.contents().contains("hunter2"));
    }

    #[test]
    fn test_debug_page_shows_detail() {
        let (diagnostics, _log, out) = setup(false, true);
        let e = Exception::new("PDOException", "connection refused");
        handle(&diagnostics, &e);
        assert!(out.contents().contains("<h1>PDOException</h1>"));
        assert!(out.contents().contains("connection refused"));
    }
}
