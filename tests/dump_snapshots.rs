use diagkit::{
    diagnostics::{ErrorClassifier, RawError},
    dump::{Dumper, dump},
    runtime::{Exception, Record, Severity, StackFrame, Value},
};

fn assert_dump_snapshot(name: &str, rendered: String) {
    insta::with_settings!({
        snapshot_path => "snapshots/dump",
        prepend_module_to_snapshot => false,
        omit_expression => true,
    }, {
        insta::assert_snapshot!(name, rendered);
    });
}

#[test]
fn snapshot_object_graph_with_back_edges() {
    let (parent, parent_value) = Record::new("Node").with("name", "root").into_value();
    let (child, child_value) = Record::new("Node")
        .with("name", "leaf")
        .with("parent", parent_value.clone())
        .into_value();
    child.set("self", child_value.clone());
    parent.set("children", Value::seq(vec![child_value]));

    assert_dump_snapshot("object_graph", dump(&parent_value));
}

#[test]
fn snapshot_argument_violation() {
    let raw = RawError::new(
        Severity::RecoverableError,
        "Argument 1 passed to Foo::bar() must be an instance of Baz, NULL given, called in /x.php on line 10",
        "/src/Foo.php",
        3,
    );
    let exception = ErrorClassifier::default()
        .classify(&raw)
        .into_exception()
        .expect("argument violations are not ignorable");

    assert_dump_snapshot("argument_violation", Dumper::new().dump_exception(&exception));
}

#[test]
fn snapshot_exception_nested_in_map() {
    let previous = Exception::runtime_error(Severity::Warning, "fopen(/tmp/x): failed", "/app/Io.php", 12);
    let outer = Exception::new("RuntimeException", "outer")
        .at("/app/Service.php", 40)
        .with_code(5)
        .with_trace(vec![
            StackFrame::method("App\\Service", "->", "handle").at("/app/index.php", 7),
            StackFrame::function("main"),
        ])
        .with_previous(previous);
    let value = Value::map(vec![
        ("request", Value::string("GET /")),
        ("error", Value::exception(outer)),
    ]);

    assert_dump_snapshot("exception_in_map", dump(&value));
}

#[test]
fn snapshot_max_depth_collapses_blocks() {
    let (_, user) = Record::new("User")
        .with("name", "ada")
        .with("roles", vec![Value::from("admin")])
        .into_value();
    let value = Value::map(vec![
        (
            "config",
            Value::map(vec![("db", Value::map(vec![("host", Value::string("localhost"))]))]),
        ),
        ("user", user),
        ("tags", Value::seq(vec![Value::string("x")])),
    ]);

    let rendered = Dumper::new().with_max_depth(Some(2)).dump(&value);
    assert_dump_snapshot("max_depth", rendered);
}
