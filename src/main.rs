use clap::Parser;

use mkbc::mkbc::options::{log_level, Options};

fn main() -> anyhow::Result<()> {
    let opt = Options::parse();
    env_logger::Builder::new()
        .filter_level(log_level(opt.verbosity()))
        .parse_default_env()
        .init();
    let ec = mkbc::run_mkbc(opt)?;
    std::process::exit(ec);
}
