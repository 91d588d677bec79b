use std::path::Path;

use crate::mkbc::command::{object_to_bitcode, Arg, Command, Invocation};
use crate::mkbc::errors::TranslateError;
use crate::mkbc::rules::{Context, Rule, RuleKind};
use crate::mkbc::toolchain::is_archiver_create_flags;

/// `ar cr libfoo.a a.o b.o` becomes `llvm-link -o libfoo.a.bc a.bc b.bc`: the
/// bitcode equivalent of an archive is a single merged module
pub struct ArchiveRule;

impl Rule for ArchiveRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Archive
    }

    fn matches(&self, cmd : &Command) -> bool {
        let inv = cmd.invocation();
        inv.program_name() == "ar"
            && inv.args.first().map_or(false, |a| is_archiver_create_flags(a.as_str()))
            && inv.args.get(1).map_or(false, |a| a.as_str().ends_with(".a"))
    }

    fn rewrite(&self, cmd : &Command, ctx : &Context) -> Result<Command, TranslateError> {
        let inv = cmd.invocation();
        let mut args = Vec::with_capacity(inv.args.len());
        args.push(Arg::Flag("-o".to_owned()));
        let mut rest = inv.args.iter().skip(1);
        if let Some(archive) = rest.next() {
            args.push(Arg::Operand(format!("{}.bc", archive.as_str())));
        }
        args.extend(rest.map(|a| Arg::classify(object_to_bitcode(a.as_str()))));
        let linked = Invocation::new(ctx.toolchain.llvm_link.as_str(), args);
        Ok(cmd.with_text(linked.render()))
    }
}

/// The logical library name of an archive: `dir/libfoo.a` is `foo`
pub fn library_name(archive : &str) -> Option<String> {
    let base = Path::new(archive).file_name()?.to_str()?;
    let stem = base.strip_suffix(".a")?;
    Some(stem.strip_prefix("lib").unwrap_or(stem).to_owned())
}
