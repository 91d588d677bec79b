//! Recognition of native toolchain programs and arguments in traced commands

use std::path::Path;

/// Regular expressions for the programs that are recognized as C/C++ compiler
/// drivers (including the MPI wrappers) whose compile and link steps we
/// retarget onto the bitcode toolchain
static COMPILE_COMMANDS: &'static [&str] =
    &[r"gcc$",
      r"g\+\+$",
      r"cc$",
      r"c\+\+$",
      r"clang$",
      r"clang\+\+$",
      r"clang-\d+(\.\d+)?$",
      r"clang\+\+-\d+(\.\d+)?$",
      r"gcc-\d+(\.\d+)?$",
      r"g\+\+-\d+(\.\d+)?$",
      r"^mpicc$",
      r"^mpicxx$",
      r"^mpic\+\+$",
      r"^mpiCC$"
    ];

lazy_static::lazy_static! {
    static ref COMPILE_COMMAND_RE : regex::RegexSet = regex::RegexSet::new(COMPILE_COMMANDS).unwrap();
}

/// Return true if the given program (bare name or path) matches one of our
/// regular expressions for known compiler drivers
pub fn is_compile_command_name(program : &str) -> bool {
    let name = Path::new(program).file_name().and_then(|n| n.to_str()).unwrap_or(program);
    COMPILE_COMMAND_RE.is_match(name)
}

lazy_static::lazy_static! {
    static ref OPTIMIZER_FLAG_RE : regex::Regex = regex::Regex::new(r"^-O([0-3sgz]|fast)?$").unwrap();
}

/// Returns true for optimization-level flags; these are removed because the
/// bitcode is meant for analysis rather than code generation
pub fn is_optimizer_flag(arg : &str) -> bool {
    OPTIMIZER_FLAG_RE.is_match(arg)
}

static SOURCE_SUFFIXES : &'static [&str] =
    &[r"\.c$",
      r"\.cc$",
      r"\.cp$",
      r"\.cpp$",
      r"\.cxx$",
      r"\.c\+\+$",
      r"\.C$",
      r"\.i$",
      r"\.ii$"
    ];

lazy_static::lazy_static! {
    static ref SOURCE_SUFFIX_RE : regex::RegexSet = regex::RegexSet::new(SOURCE_SUFFIXES).unwrap();
}

/// Return true if the argument names a C/C++ translation unit
pub fn is_source_file(arg : &str) -> bool {
    !arg.starts_with('-') && SOURCE_SUFFIX_RE.is_match(arg)
}

lazy_static::lazy_static! {
    static ref ARCHIVER_FLAGS_RE : regex::Regex = regex::Regex::new(r"^-?[cruqsT]+$").unwrap();
    static ref BITCODE_ARCHIVER_FLAGS_RE : regex::Regex = regex::Regex::new(r"^-?[qc]+$").unwrap();
}

/// Flag clusters `ar` accepts for creating or updating an archive (e.g. `cruqs`, `-rc`)
pub fn is_archiver_create_flags(arg : &str) -> bool {
    ARCHIVER_FLAGS_RE.is_match(arg)
}

/// The narrower quick-append/create form used by `llvm-ar qc`
pub fn is_quick_create_flags(arg : &str) -> bool {
    BITCODE_ARCHIVER_FLAGS_RE.is_match(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_compile_cmd() {
        assert!(is_compile_command_name("gcc"));
        assert!(is_compile_command_name("arm-musl-gcc"));
        assert!(is_compile_command_name("/usr/bin/mpicc"));
        assert!(is_compile_command_name("clang-14"));
        assert!(!is_compile_command_name("gcc-musl-arm"));
        assert!(!is_compile_command_name("mpicc-wrapper"));
        assert!(!is_compile_command_name("ar"));
    }

    #[test]
    fn test_optimizer_flags() {
        assert!(is_optimizer_flag("-O"));
        assert!(is_optimizer_flag("-O2"));
        assert!(is_optimizer_flag("-Ofast"));
        assert!(is_optimizer_flag("-Os"));
        assert!(!is_optimizer_flag("-O4"));
        assert!(!is_optimizer_flag("-o"));
        assert!(!is_optimizer_flag("-Ofoo"));
    }

    #[test]
    fn test_source_files() {
        assert!(is_source_file("src/main.c"));
        assert!(is_source_file("x.cpp"));
        assert!(!is_source_file("main.o"));
        assert!(!is_source_file("libc.a"));
        assert!(!is_source_file("-Wl,foo.c"));
    }

    #[test]
    fn test_archiver_flags() {
        assert!(is_archiver_create_flags("cruqs"));
        assert!(is_archiver_create_flags("-rc"));
        assert!(!is_archiver_create_flags("t"));
        assert!(is_quick_create_flags("qc"));
        assert!(!is_quick_create_flags("cr"));
    }
}
