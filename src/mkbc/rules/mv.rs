use crate::mkbc::command::{object_to_bitcode, Arg, Command, Invocation};
use crate::mkbc::errors::TranslateError;
use crate::mkbc::rules::{Context, Rule, RuleKind};

/// Moves of object files move the corresponding bitcode instead
pub struct MoveRule;

impl Rule for MoveRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Move
    }

    fn matches(&self, cmd : &Command) -> bool {
        cmd.invocation().program_name() == "mv"
    }

    fn rewrite(&self, cmd : &Command, _ctx : &Context) -> Result<Command, TranslateError> {
        let inv = cmd.invocation();
        if inv.args.is_empty() {
            // Nothing to move: the command has no effect
            return Ok(cmd.with_text(""));
        }
        let args = inv.args.iter().map(|a| Arg::classify(object_to_bitcode(a.as_str()))).collect();
        Ok(cmd.with_text(Invocation::new(inv.program.as_str(), args).render()))
    }
}
