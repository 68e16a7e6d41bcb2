use anyhow::Result;
use clap::Parser;
use sir_cli::{logging, run, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level)?;

    let outputs = run(&args)?;
    println!("{}", serde_json::to_string_pretty(&outputs.summary)?);
    Ok(())
}
