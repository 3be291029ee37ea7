use std::process::ExitCode;

use clap::Parser;
use nbp_rates::{Cli, Error, HttpSource, NumberLocale, Report, compute, format_summary};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nbp_rates=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &Cli) -> Result<String, Error> {
    let query = args.query()?;
    let config = args.source_config(jiff::Zoned::now().year());
    let summary = compute(&HttpSource::new(), &config, &NumberLocale::FRENCH, &query)?;

    if args.json {
        Ok(serde_json::to_string_pretty(&Report::new(&query, &summary))
            .expect("report is always serializable"))
    } else {
        Ok(format_summary(&summary, &NumberLocale::ENGLISH))
    }
}
