use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use apollo_sdk::openapi::{filter_external_api, size_report};
use apollo_sdk::shared::config::PRODUCTION_BASE_URL;
use apollo_sdk::shared::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "apollo-filter-spec")]
#[command(about = "Reduce an OpenAPI document to its external endpoints")]
struct Args {
    /// Full OpenAPI document
    #[arg(long, default_value = "specs/openapi.json")]
    input: PathBuf,

    /// Where to write the external-only document
    #[arg(long, default_value = "specs/external-openapi.json")]
    output: PathBuf,

    /// Server URL advertised by the filtered document
    #[arg(long, env = "APOLLO_SERVER_URL", default_value = PRODUCTION_BASE_URL)]
    server_url: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _ = logging::init_cli_logging("apollo_filter_spec");

    println!("🔍 Filtering external API endpoints...\n");

    let data = fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let openapi: serde_json::Value =
        serde_json::from_str(&data).with_context(|| format!("parse {}", args.input.display()))?;

    let filtered = filter_external_api(&openapi, &args.server_url);

    println!("✅ Found {} external API endpoints:", filtered.endpoints.len());
    for endpoint in &filtered.endpoints {
        println!("   - {}", endpoint);
    }
    println!(
        "\n✅ Collected {} schemas used by external endpoints",
        filtered.schemas.len()
    );

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let pretty = serde_json::to_string_pretty(&filtered.document)?;
    fs::write(&args.output, pretty).with_context(|| format!("write {}", args.output.display()))?;

    println!("\n✅ External API spec written to: {}", args.output.display());
    println!("   - {} endpoints", filtered.endpoints.len());
    println!("   - {} schemas", filtered.schemas.len());

    let report = size_report(&openapi, &filtered.document)?;
    println!("\n📊 Size comparison:");
    println!("   - Original: {:.2} KB", report.original_bytes as f64 / 1024.0);
    println!("   - External: {:.2} KB", report.filtered_bytes as f64 / 1024.0);
    println!("   - Reduction: {:.1}%\n", report.reduction_percent());

    Ok(())
}
