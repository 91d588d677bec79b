use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path,PathBuf};

use crate::mkbc::command::Command;
use crate::mkbc::errors::TranslateError;
use crate::mkbc::rules::{Context, Rule, RuleKind};

/// CMake links through `cmake -E cmake_link_script link.txt`; the real link
/// command is the first line of that file.  It is translated by whichever
/// other rule recognizes it.
pub struct LinkScriptRule;

impl LinkScriptRule {
    fn script_path(cmd : &Command) -> Option<PathBuf> {
        let inv = cmd.invocation();
        if inv.program_name() != "cmake" {
            return None;
        }
        let tokens = inv.tokens();
        match tokens.as_slice() {
            [e, script_cmd, script, ..] if e == "-E" && script_cmd == "cmake_link_script" => {
                Some(cmd.resolve_path(script))
            }
            _ => { None }
        }
    }
}

impl Rule for LinkScriptRule {
    fn kind(&self) -> RuleKind {
        RuleKind::LinkScript
    }

    fn matches(&self, cmd : &Command) -> bool {
        LinkScriptRule::script_path(cmd).is_some()
    }

    fn rewrite(&self, cmd : &Command, ctx : &Context) -> Result<Command, TranslateError> {
        // matches() guarantees the script path is present
        let script = match LinkScriptRule::script_path(cmd) {
            Some(p) => { p }
            None => { return Ok(cmd.clone()) }
        };
        let link_line = read_first_line(&script)?;
        let nested = Command::new(link_line, cmd.working_directory());
        debug!("Link script {:?} runs '{}'", script, nested);

        match ctx.rules.dispatch(&nested, ctx, Some(RuleKind::LinkScript))? {
            Some((_, rewritten)) => { Ok(rewritten) }
            None => {
                Err(TranslateError::UnresolvedIndirection { script, command : nested.text().to_owned() })
            }
        }
    }
}

fn read_first_line(script : &Path) -> Result<String, TranslateError> {
    let f = File::open(script).map_err(|e| TranslateError::LinkScriptUnreadable(script.to_path_buf(), e))?;
    let mut line = String::new();
    BufReader::new(f).read_line(&mut line)
        .map_err(|e| TranslateError::LinkScriptUnreadable(script.to_path_buf(), e))?;
    Ok(line.trim_end().to_owned())
}
