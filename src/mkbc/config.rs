use serde::{Serialize,Deserialize};

use crate::mkbc::options::ToolchainOptions;

pub const DEFAULT_CLANG : &str = "clang";
pub const DEFAULT_LLVM_LINK : &str = "llvm-link";
pub const DEFAULT_LLVM_AR : &str = "llvm-ar";
/// The MPI compiler wrappers add this include path implicitly; clang needs it
/// spelled out
pub const DEFAULT_EXTRA_INCLUDE : &str = "/usr/include/mpi";

/// The bitcode toolchain that translated commands are retargeted onto
///
/// This is constructed once per run and handed to everything that needs to
/// name a tool.
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct Toolchain {
    /// The bitcode compiler (default: `clang`)
    pub clang : String,
    /// The bitcode linker (default: `llvm-link`)
    pub llvm_link : String,
    /// The bitcode archiver (default: `llvm-ar`)
    pub llvm_ar : String,
    /// Include directory injected into every compile (default: `/usr/include/mpi`)
    pub extra_include : Option<String>
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain { clang : DEFAULT_CLANG.to_owned(),
                    llvm_link : DEFAULT_LLVM_LINK.to_owned(),
                    llvm_ar : DEFAULT_LLVM_AR.to_owned(),
                    extra_include : Some(DEFAULT_EXTRA_INCLUDE.to_owned())
        }
    }
}

impl From<&ToolchainOptions> for Toolchain {
    fn from(opts : &ToolchainOptions) -> Self {
        let path_str = |p : &std::path::PathBuf| p.to_string_lossy().into_owned();
        let defaults = Toolchain::default();
        Toolchain {
            clang : opts.clang_path.as_ref().map(path_str).unwrap_or(defaults.clang),
            llvm_link : opts.llvm_link_path.as_ref().map(path_str).unwrap_or(defaults.llvm_link),
            llvm_ar : opts.llvm_ar_path.as_ref().map(path_str).unwrap_or(defaults.llvm_ar),
            extra_include :
                if opts.no_extra_include {
                    None
                } else {
                    opts.extra_include.as_ref().map(path_str).or(defaults.extra_include)
                }
        }
    }
}
