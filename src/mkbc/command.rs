use std::fmt;
use std::path::{Path,PathBuf};
use serde::{Serialize,Deserialize};

/// A single shell invocation issued by the build, along with the directory it
/// ran in
///
/// A command with empty text has no effect; it is kept in the translated
/// sequence (so that positions line up with the trace) but never executed.
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct Command {
    text : String,
    working_directory : PathBuf,
    has_effect : bool
}

impl Command {
    pub fn new<S, P>(text : S, working_directory : P) -> Command
    where String: From<S>, PathBuf: From<P>
    {
        let text = String::from(text).trim().to_owned();
        let has_effect = !text.is_empty();
        Command { text, working_directory : PathBuf::from(working_directory), has_effect }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn has_effect(&self) -> bool {
        self.has_effect
    }

    /// Produce the rewritten version of this command, recomputing the effect
    /// flag from the new text
    pub fn with_text<S>(&self, text : S) -> Command
    where String: From<S>
    {
        Command::new(text, self.working_directory.clone())
    }

    /// Resolve a (possibly relative) path mentioned by this command against its
    /// working directory
    pub fn resolve_path<P : AsRef<Path>>(&self, partial : P) -> PathBuf {
        // PathBuf::join replaces the base if the argument is absolute
        self.working_directory.join(partial)
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::parse(&self.text)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// One whitespace-separated word of an invocation
#[derive(Debug,Clone,PartialEq,Eq,Hash)]
pub enum Arg {
    Flag(String),
    Operand(String)
}

impl Arg {
    pub fn classify<S>(token : S) -> Arg
    where String: From<S>
    {
        let s = String::from(token);
        if is_flag_token(&s) { Arg::Flag(s) } else { Arg::Operand(s) }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arg::Flag(s) => { s }
            Arg::Operand(s) => { s }
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Arg::Flag(_))
    }
}

/// Flags may show up quoted in traced shell text
fn is_flag_token(s : &str) -> bool {
    s.starts_with('-') || s.starts_with("'-") || s.starts_with("\"-")
}

/// The structured form of a command: the program and its arguments, each
/// classified as a flag or an operand
///
/// Rules rewrite this value rather than the raw text.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Invocation {
    pub program : String,
    pub args : Vec<Arg>
}

impl Invocation {
    pub fn parse(text : &str) -> Invocation {
        let mut words = text.split_whitespace();
        let program = words.next().unwrap_or("").to_owned();
        let args = words.map(Arg::classify).collect();
        Invocation { program, args }
    }

    pub fn new<S>(program : S, args : Vec<Arg>) -> Invocation
    where String: From<S>
    {
        Invocation { program : String::from(program), args }
    }

    /// The final path component of the program (e.g. `ar` for `/usr/bin/ar`)
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.args.iter().map(|a| a.as_str().to_owned()).collect()
    }

    pub fn has_arg(&self, arg : &str) -> bool {
        self.args.iter().any(|a| a.as_str() == arg)
    }

    /// The operand following the first `-o`, if any
    pub fn output(&self) -> Option<&str> {
        let pos = self.args.iter().position(|a| a.as_str() == "-o")?;
        self.args.get(pos + 1).map(|a| a.as_str())
    }

    /// True if the command sends its output to the null device
    pub fn writes_to_null_device(&self) -> bool {
        self.output() == Some("/dev/null")
    }

    pub fn render(&self) -> String {
        let mut out = self.program.clone();
        for a in &self.args {
            if a.as_str().is_empty() {
                continue;
            }
            out.push(' ');
            out.push_str(a.as_str());
        }
        out
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Replace a trailing `.o` with `.bc`; other tokens are returned unchanged
pub fn object_to_bitcode(token : &str) -> String {
    match token.strip_suffix(".o") {
        Some(stem) => { format!("{}.bc", stem) }
        None => { token.to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_follows_text() {
        let c = Command::new("mv a.o b.o", "/build");
        assert!(c.has_effect());
        let empty = c.with_text("");
        assert!(!empty.has_effect());
        assert_eq!(empty.working_directory(), Path::new("/build"));
    }

    #[test]
    fn test_invocation_classification() {
        let inv = Invocation::parse("/usr/bin/mpicc -O2 -c foo.c -o foo.o '-DX=1'");
        assert_eq!(inv.program_name(), "mpicc");
        assert_eq!(inv.args[0], Arg::Flag("-O2".into()));
        assert_eq!(inv.args[2], Arg::Operand("foo.c".into()));
        assert!(inv.args[5].is_flag());
        assert_eq!(inv.output(), Some("foo.o"));
        assert!(!inv.writes_to_null_device());
        assert_eq!(inv.render(), "/usr/bin/mpicc -O2 -c foo.c -o foo.o '-DX=1'");
    }

    #[test]
    fn test_object_to_bitcode() {
        assert_eq!(object_to_bitcode("dir/a.o"), "dir/a.bc");
        assert_eq!(object_to_bitcode("a.obj"), "a.obj");
        assert_eq!(object_to_bitcode("notes.txt"), "notes.txt");
    }
}
