use std::process::ExitCode;

use anyhow::{Context, Result};
use apollo_sdk::client::{ApolloClient, ApolloError, ExternalTaskMessage};
use apollo_sdk::messages::{fetch_task_messages, FetchPath};
use apollo_sdk::shared::config::{ClientConfig, STAGING_BASE_URL};
use apollo_sdk::shared::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "apollo-test-tasks")]
#[command(about = "Fetch and print the messages of an external task")]
struct Args {
    /// API key sent as x-network-api-key
    #[arg(long, env = "API_KEY", default_value = "API_KEY_01K92N5BD5M7239VRK7YTK4Y6N")]
    api_key: String,

    /// Task whose messages are fetched
    #[arg(long, env = "TASK_ID", default_value = "6909e075db7f4eff00486c73")]
    task_id: String,

    /// Service root URL
    #[arg(long, env = "BASE_URL", default_value = STAGING_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "APOLLO_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _ = logging::init_cli_logging("apollo_test_tasks");

    println!("🧪 Testing Get Messages Endpoint\n");
    println!("Base URL: {}", args.base_url);
    println!("Task ID: {}\n", args.task_id);

    match run(&args).await {
        Ok(()) => {
            println!("\n✅ Test completed successfully!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = ClientConfig::new(&args.base_url)?
        .with_timeout(std::time::Duration::from_secs(args.timeout_secs));
    let client = ApolloClient::new(config)?;

    println!("📡 Fetching messages for task...\n");
    let fetched = fetch_task_messages(&client, &args.api_key, &args.task_id)
        .await
        .with_context(|| format!("failed to fetch messages for task '{}'", args.task_id))?;

    if fetched.path == FetchPath::Repaired {
        println!("⚠️  Validation error detected (value type mismatch)");
        println!("   Replayed the request and converted value fields to strings\n");
        println!("✅ Success! Response received (with value field conversion):\n");
    } else {
        println!("✅ Success! Response received:\n");
    }

    print_messages(&fetched.messages)?;

    if fetched.path == FetchPath::Repaired {
        println!("\nNote: Value fields were converted to strings to work around");
        println!("      a generator limitation with anyOf types in the OpenAPI spec.");
    }
    Ok(())
}

fn print_messages(messages: &[ExternalTaskMessage]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(messages)?);

    println!("\n📊 Summary:");
    println!("   - Messages returned: {}", messages.len());

    if let Some(first) = messages.first() {
        println!("\n📝 Sample message:");
        println!("{}", serde_json::to_string_pretty(first)?);
    }
    Ok(())
}

fn report_failure(err: &anyhow::Error) {
    eprintln!("❌ Error occurred:\n");
    if let Some(api_err) = err.downcast_ref::<ApolloError>() {
        if let Some(status) = api_err.status_code() {
            eprintln!("   Status Code: {}", status.as_u16());
        }
        if let Some(body) = api_err.body() {
            eprintln!("   Body: {}", body);
        }
    }
    eprintln!("\n   Error: {}", err);
    eprintln!("\nFull error details:");
    eprintln!("{:?}", err);
}
