//! cloudscan CLI
//!
//! Cross-region cloud resource inventory with cost estimation.

use clap::Parser;

mod args;
mod render;
mod run;

use args::{Cli, OutputFormat};
use cs_cli_common::{format_cost, format_number, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logging goes to stderr so stdout stays clean for the report
    init_logging(args.log_level)?;

    let format = args.format;
    let output = args.output.clone();

    let result = run::execute(args).await?;

    let rendered = match format {
        OutputFormat::Markdown => render::render_markdown(&result),
        OutputFormat::Json => render::render_json(&result)?,
    };

    match &output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    // Run summary to stderr
    eprintln!();
    eprintln!("Scan completed:");
    eprintln!(
        "  Resources found:  {}",
        format_number(result.summary.total_resources as u64)
    );
    eprintln!(
        "  Monthly cost:     {}",
        format_cost(result.summary.total_monthly_cost)
    );
    eprintln!("  Failed tasks:     {}", result.errors.len());
    eprintln!(
        "  Duration:         {:.2}s",
        result.elapsed().num_milliseconds() as f64 / 1000.0
    );

    for error in &result.errors {
        eprintln!(
            "  Failed: {} in {} ({} after {} attempts)",
            error.service, error.region, error.kind, error.attempts
        );
    }

    Ok(())
}
