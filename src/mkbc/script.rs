use log::{error, info};
use std::fmt;
use std::io::Write;
use std::process;

use crate::mkbc::command::Command;
use crate::mkbc::errors::ExecutionError;

/// The capability used to run translated commands
pub trait ProcessRunner {
    /// Run the command to completion and return its exit code
    fn run(&self, cmd : &Command) -> Result<i32, ExecutionError>;
}

/// Runs each command with `sh -c` in its working directory
#[derive(Debug,Clone)]
pub struct ShellRunner {
    shell : String
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner { shell : "/bin/sh".to_owned() }
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, cmd : &Command) -> Result<i32, ExecutionError> {
        let status = process::Command::new(&self.shell)
            .arg("-c")
            .arg(cmd.text())
            .current_dir(cmd.working_directory())
            .status()
            .map_err(|e| ExecutionError::SpawnFailed(cmd.text().to_owned(), e))?;
        // Killed by a signal: report it as a generic failure
        Ok(status.code().unwrap_or(-1))
    }
}

/// The translated build: the rewritten commands in trace order
#[derive(Debug,Clone,Default,PartialEq,Eq)]
pub struct Script {
    commands : Vec<Command>
}

/// What happened while executing a script with `keep_going`
#[derive(Debug,Default)]
pub struct ExecutionReport {
    pub executed : usize,
    pub skipped : usize,
    /// Commands that exited non-zero, with their exit codes, in order
    pub failures : Vec<(Command, i32)>
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0 on success, otherwise the exit code of the first failure
    pub fn exit_code(&self) -> i32 {
        self.failures.first().map_or(0, |(_, ec)| *ec)
    }
}

impl Script {
    pub fn new(commands : Vec<Command>) -> Script {
        Script { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run the commands in order, skipping those without effect
    ///
    /// A non-zero exit stops execution with [`ExecutionError::ExecutionFailure`]
    /// unless `keep_going` is set, in which case the failure is recorded in the
    /// report and execution continues.
    pub fn execute(&self, runner : &dyn ProcessRunner, keep_going : bool) -> Result<ExecutionReport, ExecutionError> {
        let mut report = ExecutionReport::default();
        for cmd in &self.commands {
            if !cmd.has_effect() {
                report.skipped += 1;
                continue;
            }
            info!("Running '{}' in {:?}", cmd, cmd.working_directory());
            let exit_code = runner.run(cmd)?;
            report.executed += 1;
            if exit_code != 0 {
                if keep_going {
                    error!("Execution failed for '{}' (exit code {})", cmd, exit_code);
                    report.failures.push((cmd.clone(), exit_code));
                } else {
                    return Err(ExecutionError::ExecutionFailure { command : cmd.text().to_owned(),
                                                                  cwd : cmd.working_directory().to_path_buf(),
                                                                  exit_code });
                }
            }
        }
        Ok(report)
    }

    /// Write one JSON object per command
    pub fn write_json<W : Write>(&self, mut out : W) -> anyhow::Result<()> {
        for cmd in &self.commands {
            serde_json::to_writer(&mut out, cmd)?;
            out.write_all("\n".as_bytes())?;
        }
        Ok(())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lines = self.commands.iter().map(|c| c.text()).collect::<Vec<_>>();
        write!(f, "{}", lines.join("\n"))
    }
}
