extern crate pretty_env_logger;
#[macro_use] extern crate log;

use catalog::{cycle_label, ManifestLoader, ManifestSource};
use clap::Parser;

/// Print what a forecast manifest declares.
#[derive(Parser, Debug)]
#[command(name = "catalog")]
struct Args {
    /// Manifest URL, file path, or `embedded`
    #[arg(default_value = "manifest.json")]
    source: String,

    /// Source to try when the primary one fails
    #[arg(long)]
    fallback: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let args = Args::parse();

    let mut loader = ManifestLoader::new(ManifestSource::parse(&args.source));
    if let Some(fallback) = &args.fallback {
        loader = loader.with_fallback(ManifestSource::parse(fallback));
    }

    info!("Loading manifest from {}", loader.primary());
    let manifest = loader.load().await?;

    println!("Base URL: {}", manifest.base_url());

    println!("Cycles ({}):", manifest.cycles().len());
    let default_cycle = manifest.default_cycle();
    for cycle in manifest.cycles() {
        let marker = if Some(cycle.as_str()) == default_cycle { " (default)" } else { "" };
        println!("  {:<16} {}{}", cycle, cycle_label(cycle), marker);
    }

    println!("Variables ({}):", manifest.variables().len());
    for (key, label) in manifest.variables().iter() {
        let regions: Vec<_> = manifest.allowed_regions(key).into_iter().collect();
        let regions = if regions.is_empty() {
            "no regions".to_string()
        } else {
            regions.join(", ")
        };
        println!("  {:<20} {:<40} [{}]", key, label, regions);
    }

    println!("Regions ({}):", manifest.regions().len());
    for (key, label) in manifest.regions().iter() {
        println!("  {:<20} {}", key, label);
    }

    let hours: Vec<String> = manifest.hours().iter().map(|h| h.to_string()).collect();
    println!("Forecast hours ({}): {}", hours.len(), hours.join(", "));

    Ok(())
}
