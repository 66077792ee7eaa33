//! basalt: verify an annotated IR program against its specifications.
//!
//! Usage:
//!   basalt <program.json> [--solver z3|cvc5|yices] [--timeout-ms N]
//!          [--show-paths] [--show-vcs] [--emit-json]
//!
//! The input is a JSON-serialized program (functions, blocks, annotations,
//! predicates). Exit code 0 means every specification holds, 1 means at
//! least one fails, 2 means the solver was undecided somewhere, 3 means the
//! run itself failed (bad input, missing solver, malformed IR).

use std::process::ExitCode;
use std::str::FromStr;

use basalt_driver::{ApplyOptions, Verdict, apply, output};
use basalt_solver::{CliSolver, SolverConfig, SolverKind};
use basalt_verify::Program;

const USAGE: &str = "Usage: basalt <program.json> [--solver z3|cvc5|yices] [--timeout-ms N] \
                     [--show-paths] [--show-vcs] [--emit-json]";

struct Cli {
    input: String,
    solver: SolverKind,
    timeout_ms: u64,
    options: ApplyOptions,
    emit_json: bool,
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    // Env vars provide defaults; flags override.
    let mut solver = match std::env::var("BASALT_SOLVER") {
        Ok(name) => SolverKind::from_str(&name)?,
        Err(_) => SolverKind::Z3,
    };
    let mut timeout_ms = std::env::var("BASALT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let mut input = None;
    let mut options = ApplyOptions::default();
    let mut emit_json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--solver" => {
                let value = iter.next().ok_or("--solver requires a value")?;
                solver = SolverKind::from_str(value)?;
            }
            "--timeout-ms" => {
                let value = iter.next().ok_or("--timeout-ms requires a value")?;
                timeout_ms = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid timeout: {value}"))?;
            }
            "--show-paths" => options.show_paths = true,
            "--show-vcs" => options.show_vcs = true,
            "--emit-json" => emit_json = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => {
                return Err(format!("unknown flag: {other}\n{USAGE}"));
            }
            other => {
                if input.replace(other.to_string()).is_some() {
                    return Err(format!("more than one input file\n{USAGE}"));
                }
            }
        }
    }

    Ok(Cli {
        input: input.ok_or_else(|| format!("no input file\n{USAGE}"))?,
        solver,
        timeout_ms,
        options,
        emit_json,
    })
}

fn run(cli: &Cli) -> Result<Verdict, String> {
    let text = std::fs::read_to_string(&cli.input)
        .map_err(|e| format!("cannot read {}: {e}", cli.input))?;
    let program: Program =
        serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {e}", cli.input))?;

    let config = SolverConfig::auto_detect_for(cli.solver)
        .map_err(|e| e.to_string())?
        .with_timeout(cli.timeout_ms);
    let solver = CliSolver::new(config);

    if !cli.emit_json {
        output::print_header(&cli.input);
    }

    let outcome = apply(&program, &solver, &cli.options).map_err(|e| e.to_string())?;

    if cli.emit_json {
        let json = outcome.to_json().map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        output::print_verification_results(&outcome.functions);
        println!("{}", outcome.verdict);
    }
    Ok(outcome.verdict)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("basalt=info".parse().expect("static directive parses")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(3);
        }
    };

    match run(&cli) {
        Ok(Verdict::Ok) => ExitCode::SUCCESS,
        Ok(Verdict::Fail) => ExitCode::from(1),
        Ok(Verdict::Unknown) => ExitCode::from(2),
        Err(msg) => {
            eprintln!("basalt: {msg}");
            ExitCode::from(3)
        }
    }
}
