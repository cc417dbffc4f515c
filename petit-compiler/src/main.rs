use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use petit_compiler::ast::Program;
use petit_compiler::driver::{self, CompileOptions};
use petit_compiler::Target;

fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = init_logging(&matches) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("petitc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles a petit JSON AST to AArch64 (macOS) or x86_64 (Linux) assembly")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Input AST as JSON")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output assembly file (stdout when omitted)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .value_name("TARGET")
                .env("PETITC_TARGET")
                .help("Target (aarch64-macos, x86_64-linux, host)")
                .default_value("host")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("no-runtime")
                .long("no-runtime")
                .help("Do not append the runtime print routines")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .help("Check that every emitted label is unique and every branch target exists")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-ast")
                .long("dump-ast")
                .help("Print the decoded AST and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("FILTER")
                .env("PETITC_LOG")
                .help("Explicit tracing filter, e.g. debug or petit_compiler=trace")
                .value_parser(value_parser!(String)),
        )
}

fn init_logging(matches: &ArgMatches) -> Result<()> {
    let level = match matches.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = match matches.get_one::<String>("log-level") {
        Some(filter) => EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter `{}`", filter))?,
        None => EnvFilter::new(level.as_str()),
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<PathBuf>("input")
        .context("missing --input")?;
    let output = matches.get_one::<PathBuf>("output");
    let target_name = matches
        .get_one::<String>("target")
        .map(String::as_str)
        .unwrap_or("host");

    let target: Target = target_name.parse()?;
    let options = CompileOptions::new(target)
        .with_runtime(!matches.get_flag("no-runtime"))
        .with_verify(matches.get_flag("verify"));
    debug!(?options, "resolved options");

    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    if matches.get_flag("dump-ast") {
        let program = Program::from_json(&source)
            .with_context(|| format!("failed to decode {}", input.display()))?;
        println!("{}", program.to_json_pretty()?);
        return Ok(());
    }

    let asm = driver::compile_source(&source, &options)
        .with_context(|| format!("failed to compile {}", input.display()))?;

    match output {
        Some(path) => fs::write(path, &asm)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(asm.as_bytes())
            .context("failed to write assembly to stdout")?,
    }
    Ok(())
}
