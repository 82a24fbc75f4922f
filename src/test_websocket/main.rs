use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use apollo_sdk::session::{CloseOutcome, SessionEvent, SessionSocket, SessionSummary, UserMessage};
use apollo_sdk::shared::config::STAGING_SESSION_URL;
use apollo_sdk::shared::logging;
use clap::Parser;
use tracing::error;

#[derive(Parser)]
#[command(name = "apollo-test-websocket")]
#[command(about = "Send one message over the external session socket and print the replies")]
struct Args {
    /// API key sent as x-network-api-key
    #[arg(long, env = "API_KEY", default_value = "API_KEY_01K92N5BD5M7239VRK7YTK4Y6N")]
    api_key: String,

    #[arg(long, env = "TASK_ID", default_value = "6909127a8b91758e2d2f4ff9")]
    task_id: String,

    #[arg(
        long,
        env = "MESSAGE_TEXT",
        default_value = "I am looking for a built-in microwave with at least 20 liters capacity"
    )]
    message_text: String,

    /// External session websocket URL
    #[arg(long, env = "WS_URL", default_value = STAGING_SESSION_URL)]
    ws_url: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _ = logging::init_cli_logging("apollo_test_websocket");

    println!("🧪 Testing WebSocket Connection\n");
    println!("Task ID: {}", args.task_id);
    println!("Message: {}\n", args.message_text);

    let outcome = tokio::time::timeout(Duration::from_secs(args.timeout_secs), run(&args)).await;
    let summary = match outcome {
        Ok(Ok(summary)) => summary,
        Ok(Err(err)) => {
            error!(?err, "session failed");
            eprintln!("❌ Error occurred:\n");
            eprintln!("   Message: {}", err);
            eprintln!("\nFull error: {:?}", err);
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!("\n⏰ Test timeout after {} seconds", args.timeout_secs);
            return ExitCode::FAILURE;
        }
    };

    report_close(&summary)
}

async fn run(args: &Args) -> Result<SessionSummary> {
    println!("🔌 Connecting to WebSocket...\n");
    let mut socket = SessionSocket::connect(&args.ws_url, &args.api_key)
        .await
        .with_context(|| format!("failed to connect to {}", args.ws_url))?;
    println!("✅ WebSocket opened successfully!\n");

    let message = UserMessage {
        task_id: args.task_id.clone(),
        text: args.message_text.clone(),
    };
    socket
        .send_user_message(&message)
        .await
        .context("failed to send user message")?;
    println!("✅ Message sent:\n");
    println!("{}", serde_json::to_string_pretty(&message)?);
    println!("\n⏳ Waiting for responses...\n");

    let mut streamed_len = 0usize;
    let summary = socket
        .run(|n, event| print_event(n, event, &mut streamed_len))
        .await
        .context("session socket failed")?;
    Ok(summary)
}

fn print_event(n: usize, event: &SessionEvent, streamed_len: &mut usize) {
    println!("\n📨 Message #{} received:", n);
    match event {
        SessionEvent::Streaming(update) => {
            println!("   Type: Streaming Update");
            println!(
                "   Event: {}",
                update.channel.event_name.as_deref().unwrap_or("-")
            );
            if let Some(chunk) = update.text_chunk() {
                *streamed_len += chunk.chars().count();
                println!("   Text chunk: \"{}\"", chunk);
                println!("   Accumulated text length: {} characters", streamed_len);
            }
            if let Some(context) = update.context() {
                println!("   Context: {}", context);
            }
        }
        SessionEvent::Final(message) => {
            println!("   Type: Final Message");
            println!("   ID: {}", message.id.as_deref().unwrap_or("-"));
            println!("   Sender: {}", message.sender);
            println!("   Receiver: {}", message.receiver);
            println!("   Complete text: \"{}\"", message.text);

            if !message.cards.is_empty() {
                println!("\n   📦 Product Cards ({}):", message.cards.len());
                for (i, card) in message.cards.iter().enumerate() {
                    println!("\n   Card {}:", i + 1);
                    println!("      Title: {}", field_text(card.get("title")));
                    println!("      Description: {}", field_text(card.get("description")));
                    if let Some(params) = card.get("parameters").and_then(|p| p.as_array()) {
                        println!("      Parameters: {}", params.len());
                        for param in params {
                            println!(
                                "         - {}: {}",
                                field_text(param.get("name")),
                                field_text(param.get("value"))
                            );
                        }
                    }
                }
            }

            if !message.followup_suggestions.is_empty() {
                println!(
                    "\n   💡 Follow-up Suggestions ({}):",
                    message.followup_suggestions.len()
                );
                for (i, suggestion) in message.followup_suggestions.iter().enumerate() {
                    println!("      {}. {}", i + 1, suggestion);
                }
            }
            println!("\n✅ Conversation complete! Closing connection...");
        }
        SessionEvent::Error { error, raw } => {
            println!("   Type: Error Message");
            println!("   Error: {}", field_text(Some(error)));
            println!(
                "   Details: {}",
                serde_json::to_string_pretty(raw).unwrap_or_default()
            );
        }
        SessionEvent::Unknown(raw) => {
            println!("   Type: Unknown");
            println!(
                "   Data: {}",
                serde_json::to_string_pretty(raw).unwrap_or_default()
            );
        }
    }
}

fn field_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

fn report_close(summary: &SessionSummary) -> ExitCode {
    println!("\n🔌 WebSocket closed");
    match summary.close_code {
        Some(code) => println!("   Code: {}", code),
        None => println!("   Code: none"),
    }
    println!(
        "   Reason: {}",
        summary.close_reason.as_deref().unwrap_or("No reason provided")
    );

    println!("\n📊 Summary:");
    println!("   - Total messages received: {}", summary.message_count());
    println!(
        "   - Streaming text length: {} characters",
        summary.streaming_text.chars().count()
    );

    let outcome = summary.outcome();
    match outcome {
        CloseOutcome::Normal => println!("\n✅ Connection closed normally"),
        CloseOutcome::PolicyViolation => {
            println!("\n⚠️  Connection closed due to authentication or policy violation")
        }
        CloseOutcome::ServerError => {
            println!("\n❌ Connection closed due to internal server error")
        }
        CloseOutcome::Other(code) => match code {
            Some(code) => println!("\n⚠️  Connection closed with code {}", code),
            None => println!("\n⚠️  Connection closed without a close frame"),
        },
    }

    if outcome.is_success() {
        println!("\n✅ Test completed successfully!");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
