//! Rules recognize one shape of native build step and rewrite it into the
//! equivalent bitcode-producing step.
//!
//! Rules are tried in the fixed order given by [`RuleSet::standard`]; the first
//! rule that matches a command rewrites it, and a command that no rule matches
//! is passed through unchanged.

use log::debug;
use std::fmt;

use crate::mkbc::command::Command;
use crate::mkbc::config::Toolchain;
use crate::mkbc::errors::TranslateError;
use crate::mkbc::registry::Registry;

pub mod archive;
pub mod compile;
pub mod link;
pub mod link_script;
pub mod mv;

pub use archive::ArchiveRule;
pub use compile::CompileRule;
pub use link::LinkRule;
pub use link_script::LinkScriptRule;
pub use mv::MoveRule;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum RuleKind {
    Archive,
    LinkScript,
    Compile,
    Link,
    Move
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RuleKind::Archive => { "archive" }
            RuleKind::LinkScript => { "link-script" }
            RuleKind::Compile => { "compile" }
            RuleKind::Link => { "link" }
            RuleKind::Move => { "move" }
        };
        write!(f, "{}", s)
    }
}

/// Everything a rewrite may consult: the toolchain, a read-only view of the
/// registry as of the previous command, and the rule set (for rules that
/// dispatch nested commands)
pub struct Context<'a> {
    pub toolchain : &'a Toolchain,
    pub registry : &'a Registry,
    pub rules : &'a RuleSet
}

pub trait Rule {
    fn kind(&self) -> RuleKind;

    fn matches(&self, cmd : &Command) -> bool;

    /// Rewrite a command for which [`Rule::matches`] returned true
    fn rewrite(&self, cmd : &Command, ctx : &Context) -> Result<Command, TranslateError>;
}

/// An ordered list of rules
pub struct RuleSet {
    rules : Vec<Box<dyn Rule>>
}

impl RuleSet {
    /// The rules in the order they are tried
    pub fn standard() -> RuleSet {
        RuleSet::new(vec![Box::new(ArchiveRule),
                          Box::new(LinkScriptRule),
                          Box::new(CompileRule),
                          Box::new(LinkRule),
                          Box::new(MoveRule)])
    }

    pub fn new(rules : Vec<Box<dyn Rule>>) -> RuleSet {
        RuleSet { rules }
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    /// Offer the command to each rule (skipping `excluded`) and rewrite it with
    /// the first one that matches
    ///
    /// Returns `None` if no rule matches.
    pub fn dispatch(&self,
                    cmd : &Command,
                    ctx : &Context,
                    excluded : Option<RuleKind>) -> Result<Option<(RuleKind, Command)>, TranslateError> {
        for rule in self.rules.iter().filter(|r| Some(r.kind()) != excluded) {
            if rule.matches(cmd) {
                let rewritten = rule.rewrite(cmd, ctx)?;
                debug!("{} rule: '{}' => '{}'", rule.kind(), cmd, rewritten);
                return Ok(Some((rule.kind(), rewritten)));
            }
        }
        Ok(None)
    }

    /// Dispatch with identity passthrough for unmatched commands
    pub fn translate(&self, cmd : &Command, toolchain : &Toolchain, registry : &Registry) -> Result<Command, TranslateError> {
        let ctx = Context { toolchain, registry, rules : self };
        match self.dispatch(cmd, &ctx, None)? {
            Some((_, rewritten)) => { Ok(rewritten) }
            None => { Ok(cmd.clone()) }
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        assert_eq!(RuleSet::standard().kinds(),
                   vec![RuleKind::Archive,
                        RuleKind::LinkScript,
                        RuleKind::Compile,
                        RuleKind::Link,
                        RuleKind::Move]);
    }

    #[test]
    fn test_unmatched_is_identity() -> anyhow::Result<()> {
        let tc = Toolchain::default();
        let reg = Registry::new(&tc);
        let rules = RuleSet::standard();
        for text in ["echo building", "rm -f foo.o", "ranlib libfoo.a", "mkdir -p out"].iter() {
            let c = Command::new(*text, "/b");
            let t = rules.translate(&c, &tc, &reg)?;
            assert_eq!(t, c);
            assert!(t.has_effect());
        }
        Ok(())
    }

    struct Always(RuleKind, &'static str);

    impl Rule for Always {
        fn kind(&self) -> RuleKind { self.0 }
        fn matches(&self, _cmd : &Command) -> bool { true }
        fn rewrite(&self, cmd : &Command, _ctx : &Context) -> Result<Command, TranslateError> {
            Ok(cmd.with_text(self.1))
        }
    }

    #[test]
    fn test_first_match_wins_and_exclusion() -> anyhow::Result<()> {
        let tc = Toolchain::default();
        let reg = Registry::new(&tc);
        let rules = RuleSet::new(vec![Box::new(Always(RuleKind::Move, "first")),
                                      Box::new(Always(RuleKind::Link, "second"))]);
        let ctx = Context { toolchain : &tc, registry : &reg, rules : &rules };
        let c = Command::new("anything", "/b");
        let (k, r) = rules.dispatch(&c, &ctx, None)?.unwrap();
        assert_eq!((k, r.text()), (RuleKind::Move, "first"));
        let (k, r) = rules.dispatch(&c, &ctx, Some(RuleKind::Move))?.unwrap();
        assert_eq!((k, r.text()), (RuleKind::Link, "second"));
        Ok(())
    }
}
