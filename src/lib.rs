pub mod diagnostics;
pub mod dump;
pub mod runtime;

pub use diagnostics::{Diagnostics, DiagnosticsConfig, Interrupt, Scope};
pub use dump::{Dumper, dump};
pub use runtime::{Exception, Severity, Value};
