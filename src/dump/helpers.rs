//! Short descriptions and trace listings for debug and error messages.

use std::fmt::Write;

use crate::runtime::{StackFrame, Value};

/// One-line description of a value: scalars with their contents, aggregates
/// with their size, objects and resources with their type.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => format!("bool({})", v),
        Value::Int(v) => format!("int({})", v),
        Value::Float(v) => format!("float({})", v),
        Value::Str(bytes) => format!(
            "string({}) \"{}\"",
            bytes.len(),
            String::from_utf8_lossy(bytes)
        ),
        Value::Seq(_) | Value::Map(_) => format!("array({})", value.len().unwrap_or(0)),
        Value::Object(obj) => format!("\\{}", obj.type_name()),
        Value::Exception(e) => format!("\\{}", e.type_name()),
        Value::Resource(resource) => format!("resource({})", resource.kind()),
    }
}

/// Numbered multi-line listing of a stack trace.
///
/// ```text
/// #0  Foo->bar()
///     /src/foo.php (Line: 12)
///
/// ```
pub fn format_backtrace(frames: &[StackFrame]) -> String {
    let mut out = String::new();
    for (i, frame) in frames.iter().enumerate() {
        let _ = writeln!(out, "#{:<2} {}", i, frame.callable());
        if let Some(file) = &frame.file {
            match frame.line {
                Some(line) => {
                    let _ = writeln!(out, "    {} (Line: {})", file, line);
                }
                None => {
                    let _ = writeln!(out, "    {}", file);
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::runtime::{Exception, Record, Resource};

    #[test]
    fn test_describe_scalars() {
        assert_eq!(describe(&Value::Null), "null");
        assert_eq!(describe(&Value::Bool(false)), "bool(false)");
        assert_eq!(describe(&Value::Int(-4)), "int(-4)");
        assert_eq!(describe(&Value::Float(1.5)), "float(1.5)");
        assert_eq!(describe(&Value::string("abc")), "string(3) \"abc\"");
    }

    #[test]
    fn test_describe_compound() {
        let arr = Value::seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(describe(&arr), "array(3)");
        let obj = Value::Object(Rc::new(Record::new("App\\User")));
        assert_eq!(describe(&obj), "\\App\\User");
        let e = Value::exception(Exception::new("LogicException", "x"));
        assert_eq!(describe(&e), "\\LogicException");
        assert_eq!(describe(&Resource::new("stream").into()), "resource(stream)");
    }

    #[test]
    fn test_format_backtrace() {
        let frames = vec![
            StackFrame::method("Foo", "->", "bar").at("/src/foo.php", 12),
            StackFrame::function("main"),
        ];
        assert_eq!(
            format_backtrace(&frames),
            "#0  Foo->bar()\n    /src/foo.php (Line: 12)\n\n#1  main()\n\n"
        );
    }
}
