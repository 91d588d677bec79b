pub mod mkbc;

use crate::mkbc::options::{Options,MbCommand};
use crate::mkbc::trace::trace_entrypoint;
use crate::mkbc::translate::{execute_entrypoint, translate_entrypoint};

pub use crate::mkbc::translate::{execute_script, translate_build, translate_commands, translate_trace};

pub fn run_mkbc(opt : Options) -> anyhow::Result<i32> {
    match opt.subcommand {
        MbCommand::Trace(trace_opts) => { trace_entrypoint(&trace_opts)?; Ok(0) }
        MbCommand::Translate(translate_opts) => { translate_entrypoint(&translate_opts)?; Ok(0) }
        MbCommand::Execute(execute_opts) => { execute_entrypoint(&execute_opts) }
    }
}
