use crate::runtime::{Exception, Value};

use super::{Dumper, RenderContext};

impl Dumper {
    /// Renders `Type {` followed by the exception's metadata block.
    ///
    /// Field order is fixed: severity (classified runtime errors only),
    /// message, code, file, line, trace, previous.
    pub(super) fn render_exception(&self, exception: &Exception, ctx: &mut RenderContext) -> String {
        let (file, line) = exception.reported_location();

        let mut meta: Vec<(&str, Value)> = Vec::with_capacity(7);
        if let Some(severity) = exception.severity() {
            meta.push(("severity", Value::string(severity.label())));
        }
        meta.push(("message", Value::string(exception.message())));
        meta.push(("code", Value::Int(exception.code())));
        meta.push(("file", Value::string(file)));
        meta.push(("line", Value::Int(i64::from(line))));
        meta.push((
            "trace",
            Value::seq(
                exception
                    .trace()
                    .iter()
                    .map(|frame| Value::string(&frame.to_string()))
                    .collect(),
            ),
        ));
        meta.push((
            "previous",
            match exception.previous() {
                Some(previous) => Value::Exception(previous.clone()),
                None => Value::Null,
            },
        ));

        let mut item = exception.type_name().to_string();
        item.push_str(&self.render_meta(&meta, ctx));
        item
    }
}
