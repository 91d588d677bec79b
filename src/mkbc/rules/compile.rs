use crate::mkbc::command::{object_to_bitcode, Arg, Command, Invocation};
use crate::mkbc::errors::TranslateError;
use crate::mkbc::rules::{Context, Rule, RuleKind};
use crate::mkbc::toolchain::{is_compile_command_name, is_optimizer_flag};

/// Single translation unit compiles (`cc -c foo.c -o foo.o`) become clang
/// invocations that emit unoptimized bitcode with debug information
pub struct CompileRule;

impl Rule for CompileRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Compile
    }

    fn matches(&self, cmd : &Command) -> bool {
        let inv = cmd.invocation();
        is_compile_command_name(&inv.program)
            && inv.has_arg("-c")
            && !inv.writes_to_null_device()
    }

    fn rewrite(&self, cmd : &Command, ctx : &Context) -> Result<Command, TranslateError> {
        let inv = cmd.invocation();

        // Optimization is disabled so the bitcode stays close to the source
        let mut kept : Vec<Arg> = inv.args.into_iter()
            .filter(|a| !is_optimizer_flag(a.as_str()))
            .collect();

        // Rename the declared output file; other .o mentions (e.g. dependency
        // targets) are left alone
        if let Some(pos) = kept.iter().position(|a| a.as_str() == "-o") {
            if let Some(out) = kept.get_mut(pos + 1) {
                *out = Arg::classify(object_to_bitcode(out.as_str()));
            }
        }

        let mut args = vec![Arg::Flag("-emit-llvm".to_owned())];
        if !kept.iter().any(|a| a.as_str() == "-g") {
            args.push(Arg::Flag("-g".to_owned()));
        }
        args.push(Arg::Flag("-O0".to_owned()));
        if let Some(inc) = &ctx.toolchain.extra_include {
            args.push(Arg::Flag(format!("-I{}", inc)));
        }
        args.extend(kept);

        let clang = Invocation::new(ctx.toolchain.clang.as_str(), args);
        Ok(cmd.with_text(clang.render()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkbc::config::Toolchain;
    use crate::mkbc::registry::Registry;
    use crate::mkbc::rules::RuleSet;

    #[test]
    fn test_compile_matching() {
        let r = CompileRule;
        assert!(r.matches(&Command::new("/usr/bin/mpicc -O2 -c foo.c -o foo.o", "/b")));
        assert!(r.matches(&Command::new("gcc -c foo.c", "/b")));
        assert!(!r.matches(&Command::new("gcc -c conftest.c -o /dev/null", "/b")));
        assert!(!r.matches(&Command::new("gcc foo.o -o prog", "/b")));
        assert!(!r.matches(&Command::new("ld -c foo.o", "/b")));
    }

    #[test]
    fn test_compile_rewrite() -> anyhow::Result<()> {
        let tc = Toolchain::default();
        let reg = Registry::new(&tc);
        let rules = RuleSet::standard();
        let ctx = Context { toolchain : &tc, registry : &reg, rules : &rules };

        let out = CompileRule.rewrite(&Command::new("/usr/bin/mpicc -O2 -Wall -c foo.c -o obj/foo.o", "/b"), &ctx)?;
        assert_eq!(out.text(), "clang -emit-llvm -g -O0 -I/usr/include/mpi -Wall -c foo.c -o obj/foo.bc");

        // -g is not duplicated, and no include is injected when disabled
        let tc2 = Toolchain { extra_include : None, ..Toolchain::default() };
        let ctx2 = Context { toolchain : &tc2, registry : &reg, rules : &rules };
        let out = CompileRule.rewrite(&Command::new("cc -g -Os -c foo.c -o foo.o", "/b"), &ctx2)?;
        assert_eq!(out.text(), "clang -emit-llvm -O0 -g -c foo.c -o foo.bc");
        Ok(())
    }
}
