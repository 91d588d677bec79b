use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::mkbc::command::Command;
use crate::mkbc::config::Toolchain;
use crate::mkbc::errors::{ExecutionError, TranslateError};
use crate::mkbc::options::{BuildSource, ExecuteOptions, TranslateOptions};
use crate::mkbc::registry::Registry;
use crate::mkbc::rules::RuleSet;
use crate::mkbc::script::{ExecutionReport, ProcessRunner, Script, ShellRunner};
use crate::mkbc::trace::{capture_make_trace, initial_directory, parse_trace};

/// Translate commands in order, accepting each one into a fresh registry
/// before the next is rewritten
///
/// Any error aborts the whole run; no partial script is returned.
pub fn translate_commands(cmds : Vec<Command>, toolchain : &Toolchain, rules : &RuleSet) -> Result<Script, TranslateError> {
    let mut registry = Registry::new(toolchain);
    for cmd in cmds {
        let translated = rules.translate(&cmd, toolchain, &registry)?;
        registry.accept(translated);
    }
    info!("Translated {} commands", registry.len());
    Ok(Script::new(registry.into_commands()))
}

/// Translate the text of a recorded trace
pub fn translate_trace(text : &str, initial_dir : &Path, toolchain : &Toolchain) -> Result<Script, TranslateError> {
    let cmds = parse_trace(text, initial_dir)?;
    translate_commands(cmds, toolchain, &RuleSet::standard())
}

/// Run the build described by `makefile` (for the given targets, or its
/// default target if none) under tracing and translate what it did
pub fn translate_build(makefile : Option<&Path>, targets : &[String], toolchain : &Toolchain) -> anyhow::Result<Script> {
    let text = capture_make_trace(makefile, targets)?;
    let dir = initial_directory(makefile)?;
    Ok(translate_trace(&text, &dir, toolchain)?)
}

fn load_script(source : &BuildSource, toolchain : &Toolchain) -> anyhow::Result<Script> {
    match &source.trace_file {
        Some(trace_file) => {
            let text = std::fs::read_to_string(trace_file)?;
            let dir = std::env::current_dir()?;
            Ok(translate_trace(&text, &dir, toolchain)?)
        }
        None => { translate_build(source.makefile.as_deref(), &source.targets, toolchain) }
    }
}

pub fn translate_entrypoint(translate_opts : &TranslateOptions) -> anyhow::Result<()> {
    let toolchain = Toolchain::from(&translate_opts.toolchain);
    let script = load_script(&translate_opts.source, &toolchain)?;

    let mut out : Box<dyn Write> = match &translate_opts.output {
        Some(path) => { Box::new(BufWriter::new(File::create(path)?)) }
        None => { Box::new(std::io::stdout()) }
    };
    if translate_opts.json {
        script.write_json(&mut out)?;
    } else {
        writeln!(out, "{}", script)?;
    }
    out.flush()?;
    Ok(())
}

/// Run a translated script and return the exit status for the process: 0, or
/// the exit code of the first command that failed
///
/// Only failures to start a command are errors.
pub fn execute_script(script : &Script, runner : &dyn ProcessRunner, keep_going : bool) -> Result<i32, ExecutionError> {
    match script.execute(runner, keep_going) {
        Ok(report) => {
            print_summary(&report);
            Ok(report.exit_code())
        }
        Err(ExecutionError::ExecutionFailure { command, cwd, exit_code }) => {
            error!("Execution failed for '{}' in {:?} (exit code {}); stopping", command, cwd, exit_code);
            Ok(exit_code)
        }
        Err(e) => { Err(e) }
    }
}

fn print_summary(report : &ExecutionReport) {
    println!("Bitcode Build Summary");
    println!(" {} commands executed", report.executed);
    println!(" {} commands without effect skipped", report.skipped);
    println!(" {} commands failed", report.failures.len());
}

pub fn execute_entrypoint(execute_opts : &ExecuteOptions) -> anyhow::Result<i32> {
    let toolchain = Toolchain::from(&execute_opts.toolchain);
    let script = load_script(&execute_opts.source, &toolchain)?;
    Ok(execute_script(&script, &ShellRunner::default(), execute_opts.keep_going)?)
}
