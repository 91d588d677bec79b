use log::{debug, info, trace};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path,PathBuf};
use std::process;

use crate::mkbc::command::Command;
use crate::mkbc::errors::{CaptureError, TranslateError};
use crate::mkbc::options::TraceOptions;

lazy_static::lazy_static! {
    static ref DIRECTORY_DIRECTIVE_RE : regex::Regex =
        regex::Regex::new(r"^\S*make(\[\d+\])?: (Entering|Leaving) directory\b(.*)$").unwrap();
    static ref QUOTED_DIR_RE : regex::Regex =
        regex::Regex::new(r#"^\s*(?:'([^']*)'|`([^']*)'|"([^"]*)")\s*$"#).unwrap();
    static ref MAKE_DIAGNOSTIC_RE : regex::Regex =
        regex::Regex::new(r"^\S*make(\[\d+\])?: ").unwrap();
    static ref XTRACE_RE : regex::Regex =
        regex::Regex::new(r"^\++(\s|$)").unwrap();
    static ref BUILD_TOOL_RE : regex::Regex =
        regex::Regex::new(r"^(g|gnu)?make$").unwrap();
}

/// Turn the text of a traced make run into the ordered sequence of commands it
/// executed
///
/// The trace is the merged output of `make -w SHELL='/bin/sh -x'`: make
/// reports the directories it enters and leaves, and the shell echoes each
/// command it runs with a `+` prefix.  Every other line is output from the
/// build itself and is ignored.
///
/// A `+ cd` moves later commands until the make level it ran in starts and
/// finishes a sub-make; the parent then continues in its own directory.
/// Recursive make invocations are dropped, since the commands they run appear
/// in the trace themselves.
pub fn parse_trace(text : &str, initial_dir : &Path) -> Result<Vec<Command>, TranslateError> {
    // Open make levels: (directory the level runs in, directory its name is relative to)
    let mut levels : Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut cwd = initial_dir.to_path_buf();
    let mut cmds = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let unparseable = |reason : &str| TranslateError::TraceUnparseable {
            line : lineno,
            text : line.to_owned(),
            reason : reason.to_owned()
        };

        if let Some(caps) = DIRECTORY_DIRECTIVE_RE.captures(line) {
            let dir = quoted_directory(&caps[3]).ok_or_else(|| unparseable("directory directive without a quoted directory"))?;
            if &caps[2] == "Entering" {
                let entered = cwd.join(&dir);
                trace!("Entering {:?}", entered);
                levels.push((entered.clone(), std::mem::replace(&mut cwd, entered)));
            } else {
                let (entered, base) = levels.pop().ok_or_else(|| unparseable("leaving a directory that was not entered"))?;
                if entered != base.join(&dir) {
                    return Err(unparseable("leaving a directory other than the one entered"));
                }
                cwd = levels.last().map_or_else(|| initial_dir.to_path_buf(), |(d, _)| d.clone());
                trace!("Leaving {:?}, back in {:?}", entered, cwd);
            }
            continue;
        }

        if MAKE_DIAGNOSTIC_RE.is_match(line) {
            trace!("Ignoring make diagnostic: {}", line);
            continue;
        }

        if let Some(m) = XTRACE_RE.find(line) {
            let cmd_text = line[m.end()..].trim();
            if cmd_text.is_empty() {
                return Err(unparseable("shell trace marker without a command"));
            }
            let mut words = cmd_text.split_whitespace();
            let program = words.next().unwrap_or_default();
            if program == "cd" {
                let target = words.next().ok_or_else(|| unparseable("cd without a directory"))?;
                cwd = cwd.join(unquote(target));
                trace!("cd to {:?}", cwd);
                continue;
            }
            if is_build_tool(program) {
                trace!("Ignoring recursive make: {}", cmd_text);
                continue;
            }
            cmds.push(Command::new(cmd_text, cwd.clone()));
            continue;
        }

        trace!("Ignoring build output: {}", line);
    }

    debug!("Parsed {} commands from trace", cmds.len());
    Ok(cmds)
}

fn quoted_directory(rest : &str) -> Option<String> {
    let caps = QUOTED_DIR_RE.captures(rest)?;
    caps.get(1).or(caps.get(2)).or(caps.get(3)).map(|m| m.as_str().to_owned())
}

fn is_build_tool(program : &str) -> bool {
    let name = Path::new(program).file_name().and_then(|n| n.to_str()).unwrap_or(program);
    BUILD_TOOL_RE.is_match(name)
}

fn unquote(s : &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

/// Run make on the given build description with shell tracing enabled and
/// return everything it printed, in order
///
/// Make runs in the directory returned by [`initial_directory`].  If `targets`
/// is empty, make builds its default target.  Standard output and error share
/// a single pipe so directory messages (stdout) stay interleaved with shell
/// traces (stderr).
pub fn capture_make_trace(makefile : Option<&Path>, targets : &[String]) -> anyhow::Result<String> {
    let make_path = which::which("make").map_err(|_| CaptureError::ToolNotFound(OsString::from("make")))?;
    let build_dir = initial_directory(makefile)?;
    let mut cmd = process::Command::new(&make_path);
    cmd.current_dir(&build_dir);
    cmd.arg("-w");
    cmd.arg("SHELL=/bin/sh -x");
    if let Some(mf) = makefile {
        cmd.arg("-f");
        cmd.arg(std::env::current_dir()?.join(mf));
    }
    cmd.args(targets);

    let (mut reader, writer) = os_pipe::pipe()?;
    let writer_clone = writer.try_clone()?;
    cmd.stdout(writer);
    cmd.stderr(writer_clone);

    info!("Capturing trace: {:?}", cmd);
    let mut child = cmd.spawn().map_err(|e| CaptureError::SpawnFailed(make_path.clone(), e))?;
    // The Command still holds the write ends of the pipe; drop it so that the
    // read below sees EOF when make exits
    drop(cmd);

    let mut output = Vec::new();
    reader.read_to_end(&mut output)?;
    let status = child.wait()?;
    if !status.success() {
        return Err(anyhow::Error::new(CaptureError::BuildFailed(status.code().unwrap_or(-1))));
    }
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// The directory commands in a trace start in: the makefile's directory, or
/// the current directory
pub fn initial_directory(makefile : Option<&Path>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let dir = makefile
        .and_then(|m| m.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| cwd.join(p))
        .unwrap_or(cwd);
    Ok(dir)
}

pub fn trace_entrypoint(trace_opts : &TraceOptions) -> anyhow::Result<()> {
    let text = capture_make_trace(trace_opts.makefile.as_deref(), &trace_opts.targets)?;
    std::fs::write(&trace_opts.output, text)?;
    Ok(())
}
