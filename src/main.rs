use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use license_scout::cli::Args;
use license_scout::logging::{self, Verbosity};
use license_scout::output::OutputFormatter;
use license_scout::{pipeline, ScanConfig};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    let config = ScanConfig::from(&args);
    let report = pipeline::run(&config)
        .with_context(|| format!("Scan of {} failed", config.root.display()))?;
    let output = OutputFormatter::format(&report, config.format)?;

    match &config.output_file {
        Some(path) => {
            OutputFormatter::write_to(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), format = config.format.as_str(), "report written");
        }
        None => println!("{output}"),
    }
    Ok(())
}
