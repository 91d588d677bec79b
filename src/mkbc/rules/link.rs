use log::debug;
use std::collections::HashSet;
use std::path::Path;

use crate::mkbc::command::{object_to_bitcode, Arg, Command, Invocation};
use crate::mkbc::errors::TranslateError;
use crate::mkbc::identity::{compare_files, FileIdentity};
use crate::mkbc::registry::Registry;
use crate::mkbc::rules::{Context, Rule, RuleKind};
use crate::mkbc::toolchain::{is_compile_command_name, is_optimizer_flag, is_source_file};

/// Appended to the output name of linked executables (but not shared objects)
/// so the bitcode module is distinguishable from a library
pub const EXECUTABLE_MARKER : &str = ".exe";

/// Link steps driven through the compiler (`cc main.o -L. -lfoo -o app`)
/// become `llvm-link` invocations over the bitcode produced earlier in the
/// build
///
/// Shared objects (and executables exporting their symbols) are bundled with
/// `llvm-ar` instead so that later links can consume them.
pub struct LinkRule;

impl Rule for LinkRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Link
    }

    fn matches(&self, cmd : &Command) -> bool {
        let inv = cmd.invocation();
        is_compile_command_name(&inv.program)
            && !inv.has_arg("-c")
            && !inv.writes_to_null_device()
            && !inv.args.iter().any(|a| is_source_file(a.as_str()))
    }

    fn rewrite(&self, cmd : &Command, ctx : &Context) -> Result<Command, TranslateError> {
        let inv = cmd.invocation();
        let bundle = is_shared_or_export_dynamic(&inv);

        let mut tokens : Vec<String> = inv.tokens().into_iter()
            .filter(|t| !is_optimizer_flag(t))
            .collect();

        let mut target = None;
        if let Some(pos) = tokens.iter().position(|t| t == "-o") {
            if let Some(out) = tokens.get_mut(pos + 1) {
                if !out.contains(".so") {
                    out.push_str(EXECUTABLE_MARKER);
                }
                out.push_str(".bc");
                target = Some(out.clone());
            }
        }

        let tokens = tokens.into_iter()
            .map(|t| resolve_library(ctx.registry, t))
            .map(|t| object_to_bitcode(&t))
            .filter(|t| t == "-o" || !Arg::classify(t.as_str()).is_flag())
            .collect::<Vec<_>>();

        let tokens = dedup_tokens(tokens);
        let mut tokens = prune_redundant(tokens, target.as_deref(), ctx.registry, cmd.working_directory());

        let out = if bundle {
            tokens.retain(|t| t != "-o");
            let mut args = vec![Arg::Operand("qc".to_owned())];
            if let Some(tgt) = &target {
                tokens.retain(|t| t != tgt);
                args.push(Arg::Operand(tgt.clone()));
            }
            args.extend(tokens.into_iter().map(Arg::classify));
            Invocation::new(ctx.toolchain.llvm_ar.as_str(), args)
        } else {
            Invocation::new(ctx.toolchain.llvm_link.as_str(), tokens.into_iter().map(Arg::classify).collect())
        };
        Ok(cmd.with_text(out.render()))
    }
}

fn is_shared_or_export_dynamic(inv : &Invocation) -> bool {
    inv.args.iter().any(|a| a.is_flag() && (a.as_str().contains("shared") || a.as_str().contains("-rdynamic")))
}

/// Replace `-lfoo` and `libfoo.a` with the bitcode artifact built for that
/// library earlier in this run; untranslated (system) libraries are returned
/// unchanged
fn resolve_library(registry : &Registry, token : String) -> String {
    let found = match token.strip_prefix("-l") {
        Some(name) if !name.is_empty() => { registry.resolve(name) }
        _ if token.ends_with(".a") => { registry.resolve_archive(&token) }
        _ => { return token; }
    };
    match found {
        Some(artifact) => { artifact.to_string_lossy().into_owned() }
        None => {
            debug!("No bitcode produced for library reference '{}'", token);
            token
        }
    }
}

/// Remove repeated tokens, keeping the first occurrence of each
pub fn dedup_tokens(tokens : Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// Drop inputs that a later bitcode input already provides
///
/// An earlier input is redundant with a later bitcode input if it is recorded
/// as one of the later input's dependencies, or if the two files have
/// identical contents.  Inputs whose files cannot be compared are kept.  The
/// `-o` flag and the link target are never candidates.
pub fn prune_redundant(tokens : Vec<String>, target : Option<&str>, registry : &Registry, cwd : &Path) -> Vec<String> {
    let is_input = |t : &str| t != "-o" && Some(t) != target;
    let mut removed = vec![false; tokens.len()];

    for (j, later) in tokens.iter().enumerate() {
        if !later.ends_with(".bc") || !is_input(later.as_str()) {
            continue;
        }
        let deps = recorded_dependencies(registry, later);
        for i in 0..j {
            let earlier = &tokens[i];
            if removed[i] || !is_input(earlier.as_str()) {
                continue;
            }
            if is_redundant(earlier, later, deps, cwd) {
                debug!("Dropping '{}': provided by '{}'", earlier, later);
                removed[i] = true;
            }
        }
    }

    tokens.into_iter()
        .zip(removed)
        .filter_map(|(t, gone)| if gone { None } else { Some(t) })
        .collect()
}

/// Dependencies are keyed by artifact basename; the token may or may not carry
/// the bitcode suffix the key was recorded with
fn recorded_dependencies<'a>(registry : &'a Registry, token : &str) -> &'a [String] {
    let base = Path::new(token).file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    registry.dependencies_of(&base)
        .or_else(|| base.strip_suffix(".bc").and_then(|b| registry.dependencies_of(b)))
        .unwrap_or(&[])
}

fn is_redundant(earlier : &str, later : &str, deps : &[String], cwd : &Path) -> bool {
    let earlier_path = cwd.join(earlier);
    if deps.iter().any(|d| d == earlier || cwd.join(d) == earlier_path) {
        return true;
    }
    let identical = |other : &str| compare_files(&earlier_path, &cwd.join(other)) == FileIdentity::Equal;
    identical(later) || deps.iter().any(|d| identical(d.as_str()))
}
