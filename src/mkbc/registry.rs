use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path,PathBuf};

use crate::mkbc::command::{Command, Invocation};
use crate::mkbc::config::Toolchain;
use crate::mkbc::rules::archive::library_name;
use crate::mkbc::toolchain::{is_archiver_create_flags, is_quick_create_flags};

/// Run-scoped store of what earlier build steps produced
///
/// The registry is only ever written through [`Registry::accept`], which is
/// called exactly once per command appended to the translated sequence.  Rules
/// rewriting command `i` hold a shared borrow of it, so they only observe
/// commands `0..i-1`.
#[derive(Debug)]
pub struct Registry {
    toolchain : Toolchain,
    commands : Vec<Command>,
    library_artifacts : HashMap<String, PathBuf>,
    library_dependencies : HashMap<String, Vec<String>>
}

/// What accepting a command contributed to the registry
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Registration {
    pub library : String,
    pub artifact : PathBuf,
    pub dependencies : Vec<String>
}

impl Registry {
    pub fn new(toolchain : &Toolchain) -> Registry {
        Registry { toolchain : toolchain.clone(),
                   commands : Vec::new(),
                   library_artifacts : HashMap::new(),
                   library_dependencies : HashMap::new()
        }
    }

    /// Append a finalized command and record any library it creates
    pub fn accept(&mut self, cmd : Command) -> Option<Registration> {
        let reg = self.scan(&cmd);
        if let Some(r) = &reg {
            info!("Created lib {} at {:?}", r.library, r.artifact);
            self.library_artifacts.insert(r.library.clone(), r.artifact.clone());
            if !r.dependencies.is_empty() {
                let key = file_name(&r.artifact.to_string_lossy());
                self.library_dependencies.entry(key).or_default().extend(r.dependencies.iter().cloned());
            }
        }
        self.commands.push(cmd);
        reg
    }

    /// Look up the bitcode artifact produced for a library (`libfoo`, `foo`,
    /// `libfoo.a` and `dir/libfoo.a.bc` all name the same library)
    pub fn resolve(&self, name : &str) -> Option<&Path> {
        self.library_artifacts.get(&canonical_library_name(name)).map(|p| p.as_path())
    }

    /// Look up the bitcode artifact for an archive named by path
    ///
    /// Unlike [`Registry::resolve`], no `lib` prefix is assumed: `dir/foo.a` is
    /// only ever the library `foo`.
    pub fn resolve_archive(&self, archive : &str) -> Option<&Path> {
        self.library_artifacts.get(&archive_stem(archive)).map(|p| p.as_path())
    }

    /// The bitcode inputs recorded for an artifact, keyed by its basename
    pub fn dependencies_of(&self, artifact_base_name : &str) -> Option<&[String]> {
        self.library_dependencies.get(artifact_base_name).map(|v| v.as_slice())
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

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Look for archive-creation or bitcode-link shapes in the (rewritten) text
    fn scan(&self, cmd : &Command) -> Option<Registration> {
        let inv = cmd.invocation();
        let (target, artifact_name) = self.created_archive(&inv)?;
        let library = canonical_library_name(target);
        let artifact = cmd.resolve_path(&artifact_name);
        let own_name = file_name(&artifact_name);
        let dependencies = inv.tokens().into_iter()
            .filter(|t| t.ends_with(".bc"))
            .filter(|t| *t != own_name && *t != artifact_name)
            .collect::<Vec<_>>();
        debug!("Dependencies of {}: {:?}", own_name, dependencies);
        Some(Registration { library, artifact, dependencies })
    }

    /// Returns the archive token and the bitcode artifact it corresponds to
    fn created_archive<'a>(&self, inv : &'a Invocation) -> Option<(&'a str, String)> {
        let prog = inv.program_name();
        let first = inv.args.first().map(|a| a.as_str());
        let second = inv.args.get(1).map(|a| a.as_str());
        if prog == "ar" || same_tool(&inv.program, &self.toolchain.llvm_ar) || prog == "llvm-ar" {
            let flags_ok = if prog == "ar" && !inv.program.contains('/') {
                first.map_or(false, is_archiver_create_flags)
            } else {
                first.map_or(false, is_quick_create_flags)
            };
            let target = second.filter(|t| is_library_archive(t))?;
            if flags_ok {
                return Some((target, format!("{}.bc", target)));
            }
            return None;
        }
        if same_tool(&inv.program, &self.toolchain.llvm_link) || prog == "llvm-link" {
            let target = inv.output()?;
            if !file_name(target).starts_with("lib") {
                return None;
            }
            if target.ends_with(".a.bc") {
                return Some((target, target.to_owned()));
            }
            if target.ends_with(".a") {
                return Some((target, format!("{}.bc", target)));
            }
        }
        None
    }
}

fn same_tool(program : &str, configured : &str) -> bool {
    program == configured || file_name(program) == file_name(configured)
}

fn is_library_archive(token : &str) -> bool {
    file_name(token).starts_with("lib") && token.ends_with(".a")
}

fn file_name(p : &str) -> String {
    Path::new(p).file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| p.to_owned())
}

/// Canonicalize a library reference: take the basename, strip the bitcode and
/// archive suffixes, and make sure it carries the `lib` prefix
pub fn canonical_library_name(name : &str) -> String {
    let base = file_name(name);
    let base = base.strip_suffix(".bc").unwrap_or(&base);
    let logical = library_name(base).unwrap_or_else(|| base.strip_prefix("lib").unwrap_or(base).to_owned());
    format!("lib{}", logical)
}

/// The basename of an archive path without its bitcode and archive suffixes
fn archive_stem(archive : &str) -> String {
    let base = file_name(archive);
    let base = base.strip_suffix(".bc").unwrap_or(&base);
    base.strip_suffix(".a").unwrap_or(base).to_owned()
}
