//! Text dumper for runtime values.
//!
//! The output format is line oriented and stable:
//!
//! ```text
//! array(2) {
//! 	[0] => int(1)
//! 	[name] => string(3) "ada"
//! }
//! ```
//!
//! Nested blocks indent with one tab per level and close at the parent's
//! indentation. Structured objects that are already being rendered further
//! up are replaced by `**SELF**` (the immediately enclosing object) or
//! `**RECURSION**` (any other ancestor).
use std::{fmt::Write, rc::Rc};

use crate::runtime::{Exception, Inspectable, Resource, Value};

pub mod encoding;
mod exception;
pub mod helpers;

pub use encoding::{Encoding, EncodingPolicy};
pub use helpers::{describe, format_backtrace};

pub const SELF_MARKER: &str = "**SELF**";
pub const RECURSION_MARKER: &str = "**RECURSION**";
pub const TRUNCATED_MARKER: &str = "**TRUNCATED**";

/// Longest `previous` chain followed before rendering [`TRUNCATED_MARKER`].
pub const DEFAULT_CHAIN_LIMIT: usize = 64;

/// Per-call render state: nesting depth, the identities of the objects
/// currently being rendered, and the exception chain length.
///
/// A context belongs to a single top-level [`Dumper::dump`] call.
#[derive(Debug, Default)]
pub struct RenderContext {
    depth: usize,
    stack: Vec<*const ()>,
    chain: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn recursion_marker(&self, id: *const ()) -> Option<&'static str> {
        match self.stack.last() {
            Some(top) if *top == id => Some(SELF_MARKER),
            _ if self.stack.contains(&id) => Some(RECURSION_MARKER),
            _ => None,
        }
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

/// Renders values into the dump text format.
#[derive(Debug, Clone)]
pub struct Dumper {
    encodings: EncodingPolicy,
    max_depth: Option<usize>,
    chain_limit: usize,
}

impl Default for Dumper {
    fn default() -> Self {
        Self {
            encodings: EncodingPolicy::default(),
            max_depth: None,
            chain_limit: DEFAULT_CHAIN_LIMIT,
        }
    }
}

/// Dumps `value` with default settings.
pub fn dump(value: &Value) -> String {
    Dumper::default().dump(value)
}

impl Dumper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapses blocks nested deeper than `max_depth` levels to
    /// `array(n) {...}` / `Type {...}`.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_encodings(mut self, encodings: EncodingPolicy) -> Self {
        self.encodings = encodings;
        self
    }

    pub fn with_chain_limit(mut self, chain_limit: usize) -> Self {
        self.chain_limit = chain_limit;
        self
    }

    pub fn dump(&self, value: &Value) -> String {
        let mut ctx = RenderContext::new();
        self.render(value, &mut ctx)
    }

    /// Renders a single exception with its metadata block.
    pub fn dump_exception(&self, exception: &Exception) -> String {
        let mut ctx = RenderContext::new();
        self.render_exception_value(exception, &mut ctx)
    }

    pub fn render(&self, value: &Value, ctx: &mut RenderContext) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(v) => format!("bool({})", v),
            Value::Int(v) => format!("int({})", v),
            Value::Float(v) => format!("float({})", v),
            Value::Str(bytes) => self.render_string(bytes),
            Value::Seq(items) => self.render_array(
                items.len(),
                items.iter().enumerate().map(|(i, v)| (i.to_string(), v)),
                ctx,
            ),
            Value::Map(entries) => self.render_array(
                entries.len(),
                entries.iter().map(|(k, v)| (k.to_string(), v)),
                ctx,
            ),
            Value::Object(obj) => self.render_object(obj, ctx),
            Value::Exception(e) => self.render_exception_value(e, ctx),
            Value::Resource(resource) => self.render_resource(resource, ctx),
        }
    }

    fn collapsed(&self, ctx: &RenderContext) -> bool {
        self.max_depth.is_some_and(|max| ctx.depth >= max)
    }

    fn render_string(&self, bytes: &[u8]) -> String {
        let suffix = match self.encodings.suffix(bytes) {
            Some(enc) => format!("; {}", enc.name()),
            None => String::new(),
        };
        format!(
            "string({}{}) \"{}\"",
            bytes.len(),
            suffix,
            self.encodings.decode(bytes)
        )
    }

    fn render_array<'a>(
        &self,
        count: usize,
        entries: impl Iterator<Item = (String, &'a Value)>,
        ctx: &mut RenderContext,
    ) -> String {
        if self.collapsed(ctx) {
            return format!("array({}) {{...}}", count);
        }

        ctx.depth += 1;

        let mut item = format!("array({}) {{\n", count);
        for (key, value) in entries {
            let rendered = self.render(value, ctx);
            let _ = writeln!(item, "{}[{}] => {}", indent(ctx.depth), key, rendered);
        }
        item.push_str(&indent(ctx.depth - 1));
        item.push('}');

        ctx.depth -= 1;

        item
    }

    fn render_object(&self, obj: &Rc<dyn Inspectable>, ctx: &mut RenderContext) -> String {
        let id = Rc::as_ptr(obj) as *const ();
        if let Some(marker) = ctx.recursion_marker(id) {
            return marker.to_string();
        }
        if let Some(custom) = obj.dump(ctx.depth + 1) {
            return custom;
        }
        if self.collapsed(ctx) {
            return format!("{} {{...}}", obj.type_name());
        }

        ctx.stack.push(id);
        ctx.depth += 1;

        let mut item = format!("{} {{\n", obj.type_name());
        for (name, value) in obj.fields() {
            let rendered = self.render(&value, ctx);
            let _ = writeln!(item, "{}{}: {}", indent(ctx.depth), name, rendered);
        }
        item.push_str(&indent(ctx.depth - 1));
        item.push('}');

        ctx.depth -= 1;
        ctx.stack.pop();

        item
    }

    fn render_exception_value(&self, exception: &Exception, ctx: &mut RenderContext) -> String {
        let id = std::ptr::from_ref(exception).cast::<()>();
        if let Some(marker) = ctx.recursion_marker(id) {
            return marker.to_string();
        }
        if ctx.chain >= self.chain_limit {
            return TRUNCATED_MARKER.to_string();
        }

        ctx.stack.push(id);
        ctx.chain += 1;

        let item = self.render_exception(exception, ctx);

        ctx.chain -= 1;
        ctx.stack.pop();

        item
    }

    fn render_resource(&self, resource: &Resource, ctx: &mut RenderContext) -> String {
        let mut item = format!("resource({}; {})", resource.identity(), resource.kind());
        if let Some(meta) = resource.metadata().filter(|meta| !meta.is_empty()) {
            item.push_str(&self.render_meta(meta, ctx));
        }
        item
    }

    /// Renders a ` {` ... `}` block of labelled values with aligned labels.
    pub(crate) fn render_meta<K: AsRef<str>>(
        &self,
        meta: &[(K, Value)],
        ctx: &mut RenderContext,
    ) -> String {
        if self.collapsed(ctx) {
            return " {...}".to_string();
        }

        ctx.depth += 1;

        let width = meta
            .iter()
            .map(|(key, _)| key.as_ref().chars().count())
            .max()
            .unwrap_or(0)
            + 1;

        let mut item = String::from(" {\n");
        for (key, value) in meta {
            let rendered = self.render(value, ctx);
            let _ = writeln!(
                item,
                "{}{:<width$}: {}",
                indent(ctx.depth),
                humanize(key.as_ref()),
                rendered,
                width = width
            );
        }
        item.push_str(&indent(ctx.depth - 1));
        item.push('}');

        ctx.depth -= 1;

        item
    }
}

/// `wrapper_type` -> `Wrapper Type`.
fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        word_start = ch.is_whitespace();
    }
    out
}
