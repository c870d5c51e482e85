#[cfg(feature = "cli")]
mod cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let args = cli::Cli::parse();
    cli::init_tracing(args.verbose);
    cli::run(args)
}

#[cfg(not(feature = "cli"))]
fn main() -> anyhow::Result<()> {
    eprintln!(
        "Built without the `cli` feature; nothing to run. \
Enable it with `--features cli`, or use the `imgtag` library directly."
    );
    Ok(())
}
