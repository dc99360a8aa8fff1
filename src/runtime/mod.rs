//! Runtime value model inspected by the dumper and the error pipeline.
//!
//! # Identity and cycles
//! Scalars, strings and arrays are plain values. Structured objects and
//! exceptions are shared through `Rc` and are compared by reference identity,
//! never by value. Objects built from [`object::Record`] hold their fields in
//! a `RefCell`, so a record may end up containing itself, directly or through
//! other records. Anything that walks a value graph must therefore track the
//! identities it is currently inside of; see [`crate::dump::RenderContext`].
//!
//! Exceptions are immutable once built, so a `previous` chain is acyclic by
//! construction.
pub mod exception;
pub mod object;
pub mod resource;
pub mod severity;
pub mod value;

pub use exception::{Exception, ExceptionKind, StackFrame};
pub use object::{Inspectable, Record};
pub use resource::Resource;
pub use severity::Severity;
pub use value::{Key, Value};
