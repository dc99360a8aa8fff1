//! Execution boundary for one unit of work.
//!
//! [`Diagnostics::run`] installs the error handler for the duration of the
//! work, turns runtime errors into exceptions, dispatches anything the work
//! did not handle, and restores the previous handler on every exit path.
//!
//! Fatal errors bypass the handler: the work is halted and the error stays
//! recorded as the last error. A shutdown observer dropped at the very end of
//! `run` inspects that record and dispatches a synthesized exception for it.
//! Panics inside the work are treated the same way, located where they were
//! raised as long as the hook installed by the first `run` is still in the
//! chain. Aborts, stack overflows and allocation failures terminate the
//! process before any observer can run and are not reported.
//!
//! Every fatal error is written to the log sink once, when it is reported.
//! The dispatcher skips logging fatal exceptions for that reason.
use std::{
    any::Any,
    cell::RefCell,
    fmt,
    panic::{self, AssertUnwindSafe, Location},
    sync::Once,
};

use crate::{
    diagnostics::{Diagnostics, ErrorHandler, classifier::RawError},
    runtime::{Exception, Severity},
};

/// Why guarded work stopped early.
#[derive(Debug)]
pub enum Interrupt {
    /// An exception the work did not handle.
    Thrown(Exception),
    /// A fatal error stopped the work; it is reported by the shutdown
    /// observer, not by the caller.
    Halted,
}

impl From<Exception> for Interrupt {
    fn from(exception: Exception) -> Self {
        Interrupt::Thrown(exception)
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Thrown(e) => write!(f, "{}", e),
            Interrupt::Halted => write!(f, "halted by fatal error"),
        }
    }
}

/// Handle given to guarded work for reporting runtime errors.
pub struct Scope<'d> {
    diagnostics: &'d Diagnostics,
}

impl<'d> Scope<'d> {
    pub fn diagnostics(&self) -> &'d Diagnostics {
        self.diagnostics
    }

    /// Reports a runtime error raised at `file:line`.
    ///
    /// Returns `Ok` when the error is ignorable, `Thrown` with the
    /// classified exception otherwise, and `Halted` for fatal severities.
    pub fn error(
        &self,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Result<(), Interrupt> {
        self.diagnostics
            .report_error(RawError::new(severity, message, file, line))
    }

    /// Reports a runtime error located at the caller.
    #[track_caller]
    pub fn trigger(&self, severity: Severity, message: impl Into<String>) -> Result<(), Interrupt> {
        let caller = Location::caller();
        self.error(severity, message, caller.file(), caller.line())
    }
}

/// Installs a handler as the active one and puts the previous one back on
/// drop.
struct HandlerSwap<'d> {
    diagnostics: &'d Diagnostics,
    previous: Option<ErrorHandler>,
}

impl<'d> HandlerSwap<'d> {
    fn install(diagnostics: &'d Diagnostics, handler: ErrorHandler) -> Self {
        let previous = diagnostics.active_handler.replace(Some(handler));
        tracing::debug!(target: "diagkit", nested = previous.is_some(), "error handler installed");
        Self {
            diagnostics,
            previous,
        }
    }
}

impl Drop for HandlerSwap<'_> {
    fn drop(&mut self) {
        *self.diagnostics.active_handler.borrow_mut() = self.previous.take();
        tracing::debug!(target: "diagkit", "error handler restored");
    }
}

/// Checks for an unreported fatal error when dropped.
struct ShutdownObserver<'d> {
    diagnostics: &'d Diagnostics,
}

impl Drop for ShutdownObserver<'_> {
    fn drop(&mut self) {
        self.diagnostics.check_fatal();
    }
}

thread_local! {
    static PANIC_LOCATION: RefCell<Option<(String, u32)>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chains a hook in front of the current one that remembers where the last
/// panic on this thread was raised.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let _ = PANIC_LOCATION.try_with(|slot| {
                    *slot.borrow_mut() = Some((location.file().to_string(), location.line()));
                });
            }
            previous(info);
        }));
    });
}

fn take_panic_location() -> (String, u32) {
    PANIC_LOCATION
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
        .unwrap_or_else(|| ("<unknown>".to_string(), 0))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

impl Diagnostics {
    /// Runs one unit of work inside the error boundary.
    ///
    /// Returns the work's value, or `None` when it was interrupted. Nothing
    /// escapes: exceptions go to the dispatcher, fatal errors and panics go
    /// to the shutdown observer.
    pub fn run<T, F>(&self, work: F) -> Option<T>
    where
        F: FnOnce(&Scope<'_>) -> Result<T, Interrupt>,
    {
        let observer = ShutdownObserver { diagnostics: self };
        install_panic_hook();
        let _ = PANIC_LOCATION.try_with(|slot| slot.borrow_mut().take());

        let outcome = {
            let _swap = HandlerSwap::install(self, self.error_handler());
            let scope = Scope { diagnostics: self };
            panic::catch_unwind(AssertUnwindSafe(|| work(&scope)))
        };

        let result = match outcome {
            Ok(Ok(value)) => Some(value),
            Ok(Err(Interrupt::Thrown(exception))) => {
                self.exception(exception);
                None
            }
            Ok(Err(Interrupt::Halted)) => None,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let (file, line) = take_panic_location();
                tracing::warn!(target: "diagkit", %message, %file, line, "guarded work panicked");
                let error = RawError::new(Severity::Error, message, file, line);
                self.log_fatal(&error);
                self.record_error(error);
                None
            }
        };

        drop(observer);
        result
    }

    /// Routes a runtime error through the active handler.
    ///
    /// With no handler installed (outside [`Diagnostics::run`]) non-fatal
    /// errors are only logged, and fatal errors are dispatched on the spot
    /// since no shutdown observer is waiting for them.
    pub fn report_error(&self, error: RawError) -> Result<(), Interrupt> {
        let handler = self.active_handler.borrow().clone();

        if error.is_fatal() {
            self.log_fatal(&error);
            if handler.is_some() {
                self.record_error(error);
            } else {
                self.dispatch_fatal(error);
            }
            return Err(Interrupt::Halted);
        }

        self.record_error(error.clone());

        let Some(handler) = handler else {
            tracing::warn!(
                target: "diagkit",
                severity = %error.severity,
                file = %error.file,
                line = error.line,
                "{}",
                error.message
            );
            return Ok(());
        };

        match handler(&error).into_exception() {
            Some(exception) => Err(Interrupt::Thrown(exception)),
            None => Ok(()),
        }
    }

    /// A pending fatal error is never overwritten by a later report.
    fn record_error(&self, error: RawError) {
        let mut last = self.last_error.borrow_mut();
        if last.as_ref().is_some_and(RawError::is_fatal) {
            return;
        }
        *last = Some(error);
    }

    /// Dispatches the last recorded error if it is fatal, then clears it.
    ///
    /// Returns whether an exception was dispatched. Hosts with their own
    /// shutdown path may call this directly.
    pub fn check_fatal(&self) -> bool {
        let pending = self.last_error.borrow_mut().take_if(|error| error.is_fatal());
        let Some(error) = pending else {
            return false;
        };
        self.dispatch_fatal(error);
        true
    }

    /// `LABEL: message [file:line]`
    fn log_fatal(&self, error: &RawError) {
        self.log(&format!(
            "{}: {} [{}:{}]",
            error.severity.label(),
            error.message,
            error.file,
            error.line
        ));
    }

    fn dispatch_fatal(&self, error: RawError) {
        tracing::debug!(target: "diagkit", severity = %error.severity, "reporting fatal error");
        self.exception(Exception::runtime_error(
            error.severity,
            error.message,
            error.file,
            error.line,
        ));
    }
}
