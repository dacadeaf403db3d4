use anyhow::Result;
use clap::Parser;

use stress_sampler::config::Args;
use stress_sampler::{logging, orchestrator};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_config())?;

    let config = args.run_config()?;
    orchestrator::run(&config)?;
    Ok(())
}
