use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug,Parser)]
#[command(version, about)]
#[command(after_long_help="Logging is controlled with various -v options or via the RUST_LOG/RUST_LOG_STYLE\nas described in https://docs.rs/env_logger documentation.")]
pub struct Options {
    #[command(subcommand)]
    pub subcommand : MbCommand
}

#[derive(Debug,Subcommand)]
pub enum MbCommand {
    /// Record the shell-level trace of a make build
    #[command(display_order=2)]
    Trace(TraceOptions),
    /// Translate a traced build into a bitcode-producing script
    #[command(display_order=0)]
    Translate(TranslateOptions),
    /// Translate a traced build and run the resulting commands
    #[command(display_order=1)]
    Execute(ExecuteOptions)
}

/// Where the native build trace comes from
#[derive(Clone,Debug,Args)]
pub struct BuildSource {
    /// Read a previously recorded trace instead of running make
    #[arg(long="trace", conflicts_with="makefile")]
    pub trace_file : Option<PathBuf>,
    /// The makefile describing the build (default: `Makefile` in the current directory)
    #[arg(short='f', long="makefile", value_hint=clap::ValueHint::FilePath)]
    pub makefile : Option<PathBuf>,
    /// The targets to build (default: the makefile's default target)
    pub targets : Vec<String>
}

#[derive(Clone,Debug,Args)]
pub struct ToolchainOptions {
    /// Name of the clang binary to use to generate bitcode (default: `clang`)
    #[arg(long="clang")]
    pub clang_path : Option<PathBuf>,
    /// The path to the llvm-link tool (default: `llvm-link`)
    #[arg(long="llvm-link", value_hint=clap::ValueHint::FilePath)]
    pub llvm_link_path : Option<PathBuf>,
    /// The path to the llvm-ar tool (default: `llvm-ar`)
    #[arg(long="llvm-ar", value_hint=clap::ValueHint::FilePath)]
    pub llvm_ar_path : Option<PathBuf>,
    /// Include directory to add to every compile (default: `/usr/include/mpi`)
    #[arg(long="extra-include")]
    pub extra_include : Option<PathBuf>,
    /// Do not add any extra include directory to compiles
    #[arg(long="no-extra-include", conflicts_with="extra_include")]
    pub no_extra_include : bool
}

#[derive(Debug,Parser)]
pub struct TraceOptions {
    /// The file to save the build trace to
    #[arg(short, long)]
    pub output : PathBuf,
    /// The makefile describing the build (default: `Makefile` in the current directory)
    #[arg(short='f', long="makefile", value_hint=clap::ValueHint::FilePath)]
    pub makefile : Option<PathBuf>,
    /// The targets to build (default: the makefile's default target)
    pub targets : Vec<String>,
    /// Generate verbose output.  Twice for additional verbosity.
    #[arg(short, long, action=clap::ArgAction::Count)]
    pub verbose : u8
}

#[derive(Debug,Parser)]
pub struct TranslateOptions {
    #[command(flatten)]
    pub source : BuildSource,
    #[command(flatten)]
    pub toolchain : ToolchainOptions,
    /// Write the script here instead of to stdout
    #[arg(short, long)]
    pub output : Option<PathBuf>,
    /// Emit one JSON object per command instead of a shell script
    #[arg(long)]
    pub json : bool,
    /// Generate verbose output.  Twice for additional verbosity.
    #[arg(short, long, action=clap::ArgAction::Count)]
    pub verbose : u8
}

#[derive(Debug,Parser)]
pub struct ExecuteOptions {
    #[command(flatten)]
    pub source : BuildSource,
    #[command(flatten)]
    pub toolchain : ToolchainOptions,
    /// Keep executing the remaining commands after one fails
    #[arg(short='k', long="keep-going")]
    pub keep_going : bool,
    /// Generate verbose output.  Twice for additional verbosity.
    #[arg(short, long, action=clap::ArgAction::Count)]
    pub verbose : u8
}

impl Options {
    pub fn verbosity(&self) -> u8 {
        match &self.subcommand {
            MbCommand::Trace(o) => { o.verbose }
            MbCommand::Translate(o) => { o.verbose }
            MbCommand::Execute(o) => { o.verbose }
        }
    }
}

/// Map the number of `-v` flags to a default log level (RUST_LOG still wins)
pub fn log_level(verbosity : u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_execute() {
        let opts = Options::try_parse_from(
            ["make-bitcode", "execute", "-k", "--llvm-link", "/opt/llvm-link",
             "-f", "build/Makefile", "all", "install"]).unwrap();
        match opts.subcommand {
            MbCommand::Execute(ref e) => {
                assert!(e.keep_going);
                assert_eq!(e.source.targets, vec!["all", "install"]);
                assert_eq!(e.source.makefile, Some(PathBuf::from("build/Makefile")));
                assert_eq!(e.toolchain.llvm_link_path, Some(PathBuf::from("/opt/llvm-link")));
            }
            _ => { panic!("expected execute subcommand") }
        }
    }

    #[test]
    fn test_trace_conflicts_with_makefile() {
        let res = Options::try_parse_from(
            ["make-bitcode", "translate", "--trace", "t.log", "-f", "Makefile"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Warn);
        assert_eq!(log_level(3), log::LevelFilter::Debug);
    }
}
