use std::{env, fs, path::PathBuf, process};

use diagkit::{
    diagnostics::{Classification, DiagError, DiagResult, Diagnostics, DiagnosticsConfig, RawError},
    runtime::{Exception, Record, Severity, StackFrame, Value},
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().collect();
    let debug = args.iter().any(|arg| arg == "--debug");
    let fatal = args.iter().any(|arg| arg == "--fatal");
    if debug {
        args.retain(|arg| arg != "--debug");
    }
    if fatal {
        args.retain(|arg| arg != "--fatal");
    }
    let max_depth = match extract_value(&mut args, "--max-depth") {
        Ok(value) => value,
        Err(message) => fail(&message),
    };
    let config_path = match extract_value(&mut args, "--config") {
        Ok(value) => value.map(PathBuf::from),
        Err(message) => fail(&message),
    };

    if args.len() < 2 {
        print_help();
        return;
    }

    let config = match load_config(config_path, debug, max_depth.as_deref()) {
        Ok(config) => config,
        Err(err) => fail(&format!("Error: {}", err)),
    };

    match args[1].as_str() {
        "-h" | "--help" | "help" => print_help(),
        "dump" => {
            if args.len() < 3 {
                fail("Usage: diagkit dump <file.json>");
            }
            if let Err(err) = dump_file(config, &args[2]) {
                fail(&format!("Error: {}", err));
            }
        }
        "classify" => {
            if args.len() < 6 {
                fail("Usage: diagkit classify <severity> <message> <file> <line>");
            }
            if let Err(err) = classify(config, &args[2], &args[3], &args[4], &args[5]) {
                fail(&format!("Error: {}", err));
            }
        }
        "demo" => {
            if let Err(err) = demo(config, fatal) {
                fail(&format!("Error: {}", err));
            }
        }
        other => {
            eprintln!("Error: unknown command `{}`", other);
            print_help();
            process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "\
diagkit CLI

Usage:
  diagkit dump <file.json>
  diagkit classify <severity> <message> <file> <line>
  diagkit demo [--fatal]

Flags:
  --debug            Enable debug mode
  --max-depth <n>    Collapse dump output nested deeper than n levels
  --config <file>    Load settings from a JSON config file
  --help, -h         Show this help

Environment:
  DIAGKIT_DEBUG, DIAGKIT_ERROR_PAGE, DIAGKIT_MAX_DEPTH override the config file.
  RUST_LOG sets the log filter (default: warn).
"
    );
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn extract_value(args: &mut Vec<String>, flag: &str) -> Result<Option<String>, String> {
    let mut found = None;
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            if i + 1 >= args.len() {
                return Err(format!("Usage: diagkit <command> {} <value>", flag));
            }
            found = Some(args.remove(i + 1));
            args.remove(i);
            continue;
        }
        i += 1;
    }
    Ok(found)
}

fn load_config(
    path: Option<PathBuf>,
    debug: bool,
    max_depth: Option<&str>,
) -> DiagResult<DiagnosticsConfig> {
    let base = match path {
        Some(path) => DiagnosticsConfig::from_file(&path)?,
        None => DiagnosticsConfig::default(),
    };
    let mut config = base.overlay(|key| env::var(key).ok())?;
    config.terminal = true;
    if debug {
        config.debug = true;
    }
    if let Some(value) = max_depth {
        config.max_depth = Some(value.parse().map_err(|_| {
            DiagError::Config(format!("--max-depth expects a non-negative integer, got `{}`", value))
        })?);
    }
    Ok(config)
}

fn dump_file(config: DiagnosticsConfig, path: &str) -> DiagResult<()> {
    let text = fs::read_to_string(path).map_err(|source| DiagError::File {
        path: PathBuf::from(path),
        source,
    })?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    println!("{}", config.dumper().dump(&Value::from(&json)));
    Ok(())
}

fn classify(
    config: DiagnosticsConfig,
    severity: &str,
    message: &str,
    file: &str,
    line: &str,
) -> DiagResult<()> {
    let severity: Severity = severity.parse().map_err(DiagError::Config)?;
    let line: u32 = line
        .parse()
        .map_err(|_| DiagError::Config(format!("line must be a number, got `{}`", line)))?;
    let classifier = config.classifier()?;
    let raw = RawError::new(severity, message, file, line);

    match classifier.classify(&raw) {
        Classification::Ignorable => println!("ignorable"),
        Classification::ArgumentTypeViolation(exception) => {
            println!("argument type violation");
            println!("{}", config.dumper().dump_exception(&exception));
        }
        Classification::RuntimeError(exception) => {
            let fatal = if exception.is_fatal() { " (fatal)" } else { "" };
            println!("runtime error{}", fatal);
            println!("{}", config.dumper().dump_exception(&exception));
        }
    }
    Ok(())
}

fn demo(config: DiagnosticsConfig, fatal: bool) -> DiagResult<()> {
    let diagnostics = Diagnostics::with_config(config)?;

    let (account, value) = Record::new("Account")
        .with("id", 42i64)
        .with("owner", "ada")
        .with("tags", vec![Value::from("admin"), Value::from("beta")])
        .into_value();
    account.set("self", value.clone());
    diagnostics.dump(&value);

    diagnostics.run(|scope| {
        if fatal {
            scope.error(Severity::Error, "Allowed memory size exhausted", "demo.php", 12)?;
        }
        scope.error(Severity::Notice, "filemtime(): stat failed for cache.tmp", "demo.php", 3)?;
        let e = Exception::new("DomainException", "invoice total is negative")
            .with_code(17)
            .with_trace(vec![
                StackFrame::method("Billing", "->", "total").at("demo.php", 20),
                StackFrame::function("main"),
            ]);
        Err::<(), _>(e.into())
    });
    Ok(())
}
