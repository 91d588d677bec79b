use std::ffi::OsString;
use std::path::PathBuf;

/// Failures that abort a translation run before any output is produced
#[derive(thiserror::Error,Debug)]
pub enum TranslateError {
    #[error("Unparseable trace at line {line}: {reason} ('{text}')")]
    TraceUnparseable { line : usize, text : String, reason : String },
    #[error("Link script '{script:?}' contains a command no rule can translate: '{command}'")]
    UnresolvedIndirection { script : PathBuf, command : String },
    #[error("Unable to read link script '{0:?}'")]
    LinkScriptUnreadable(PathBuf, #[source] std::io::Error)
}

#[derive(thiserror::Error,Debug)]
pub enum ExecutionError {
    #[error("Execution failed for '{command}' in {cwd:?} (exit code {exit_code})")]
    ExecutionFailure { command : String, cwd : PathBuf, exit_code : i32 },
    #[error("Unable to start '{0}'")]
    SpawnFailed(String, #[source] std::io::Error)
}

#[derive(thiserror::Error,Debug)]
pub enum CaptureError {
    #[error("Build tool not found: {0:?}")]
    ToolNotFound(OsString),
    #[error("Unable to start build tool {0:?}")]
    SpawnFailed(PathBuf, #[source] std::io::Error),
    #[error("Traced build failed with exit code {0}")]
    BuildFailed(i32)
}
