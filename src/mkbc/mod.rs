pub mod command;
pub mod config;
pub mod errors;
pub mod identity;
pub mod options;
pub mod registry;
pub mod rules;
pub mod script;
pub mod toolchain;
pub mod trace;
pub mod translate;
