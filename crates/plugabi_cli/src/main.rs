//! Diagnostic host entry point.
//!
//! # Responsibility
//! - Drive the linked reference module through the full host lifecycle:
//!   version check, init, process per input, diagnostics, cleanup.
//! - Offer one-shot JSON requests and store path resolution for smoke checks.
//!
//! Usage:
//! - `plugabi [input...]` (defaults to `21`)
//! - `plugabi --request '{"module":"double","input":21}'`
//! - `plugabi --resolve <name>`

use log::warn;
use plugabi_core::{
    handle_request, init_logging_from_config, render_outcome, HostConfig, LoadedModule,
    ModuleRegistry, ModuleStore,
};
use std::process::ExitCode;

const DEFAULT_INPUT: i32 = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Drive(Vec<i32>),
    Request(String),
    Resolve(String),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::Drive(vec![DEFAULT_INPUT])),
        [flag, body] if flag == "--request" => Ok(Command::Request(body.clone())),
        [flag, name] if flag == "--resolve" => Ok(Command::Resolve(name.clone())),
        [flag, ..] if flag.starts_with("--") => Err(format!("unsupported arguments: {args:?}")),
        inputs => inputs
            .iter()
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| format!("input must be an i32, got `{raw}`"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Command::Drive),
    }
}

fn drive(config: &HostConfig, inputs: &[i32]) -> Result<(), String> {
    let mut module = LoadedModule::attach(
        "plugabi_module",
        plugabi_module::symbol_table(),
        &config.policy,
    )
    .map_err(|err| format!("failed to attach module: {err}"))?;
    println!("module ABI version: {}", module.version());

    module
        .init()
        .map_err(|err| format!("failed to initialize module: {err}"))?;
    println!("module initialized");

    let outcome = inputs.iter().try_for_each(|input| {
        let output = module
            .process(*input)
            .map_err(|err| format!("failed to process {input}: {err}"))?;
        println!("process({input}) = {output}");
        Ok::<(), String>(())
    });

    match module.call_count() {
        Ok(Some(count)) => println!("total process() calls: {count}"),
        Ok(None) => {}
        Err(err) => warn!("event=cli_call_count module=cli status=error reason={err}"),
    }

    match module.cleanup() {
        Ok(()) => println!("module cleaned up"),
        Err(err) => println!("warning: cleanup failed: {err}"),
    }
    module.close();
    outcome
}

/// Prints the JSON body; an error body still fails the command.
fn request(config: &HostConfig, body: &str) -> Result<(), String> {
    let registry = ModuleRegistry::with_reference_module();
    let outcome = handle_request(&registry, &config.policy, body);
    println!("{}", render_outcome(&outcome));
    outcome
        .map(|_| ())
        .map_err(|err| format!("request failed ({}): {err}", err.kind().as_str()))
}

fn run(args: &[String]) -> Result<(), String> {
    let config = HostConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config)?;

    match parse_args(args)? {
        Command::Drive(inputs) => drive(&config, &inputs),
        Command::Request(body) => request(&config, &body),
        Command::Resolve(name) => {
            let store = config.store();
            let path = store.resolve(&name).map_err(|err| err.to_string())?;
            println!("{} store: {}", store.kind().as_str(), path.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{drive, parse_args, request, run, Command, DEFAULT_INPUT};
    use plugabi_core::{AbiVersion, CompatibilityPolicy, HostConfig};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn defaults_to_single_input() {
        assert_eq!(
            parse_args(&[]).expect("parse"),
            Command::Drive(vec![DEFAULT_INPUT])
        );
    }

    #[test]
    fn parses_inputs_and_flags() {
        assert_eq!(
            parse_args(&args(&["5", "10"])).expect("parse"),
            Command::Drive(vec![5, 10])
        );
        assert_eq!(
            parse_args(&args(&["--resolve", "hello"])).expect("parse"),
            Command::Resolve("hello".to_string())
        );
        assert!(matches!(
            parse_args(&args(&["--request", "{}"])),
            Ok(Command::Request(_))
        ));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&args(&["five"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn drive_refuses_incompatible_host_policy() {
        let config = HostConfig {
            policy: CompatibilityPolicy::new(2, AbiVersion::new(2, 0, 0)),
            ..HostConfig::default()
        };
        let err = drive(&config, &[1]).expect_err("major mismatch");
        assert!(err.contains("failed to attach module"));
    }

    #[test]
    fn request_succeeds_for_valid_body() {
        let config = HostConfig::default();
        assert_eq!(request(&config, r#"{"module":"double","input":21}"#), Ok(()));
    }

    #[test]
    fn failed_requests_fail_the_command() {
        let config = HostConfig::default();
        for body in [
            r#"{"module":"double","input":-5}"#,
            r#"{"module":"nope","input":1}"#,
            r#"{"module":"../x","input":1}"#,
            "{not json",
        ] {
            assert!(request(&config, body).is_err(), "{body}");
        }

        let err = run(&args(&["--request", r#"{"module":"double","input":-5}"#]))
            .expect_err("module error code must fail the run");
        assert!(err.contains("run_failed"), "{err}");
    }
}
