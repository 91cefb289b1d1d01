//! Function calling round trip with the cached `get_weather` tool.
//!
//! Prerequisites:
//! - Set `DEEPSEEK_API_KEY`
//!
//! Run:
//!   DEEPSEEK_API_KEY=your_key cargo run --example weather_tool

use async_trait::async_trait;
use deepseek_kit::tools::{ToolRegistry, WeatherProvider, WeatherReport, WeatherTool};
use deepseek_kit::{ChatRequest, DeepSeekClient, Message};

/// Canned conditions; a real provider would call a weather API.
struct TableProvider;

#[async_trait]
impl WeatherProvider for TableProvider {
    async fn current(&self, location: &str) -> deepseek_kit::Result<WeatherReport> {
        let (temperature, condition) = match location.to_lowercase().as_str() {
            "oslo" => (4.0, "light snow"),
            "lisbon" => (19.0, "sunny"),
            _ => (15.0, "partly cloudy"),
        };
        Ok(WeatherReport {
            location: location.to_string(),
            temperature,
            condition: condition.to_string(),
            humidity: Some(60),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    if std::env::var("DEEPSEEK_API_KEY").is_err() {
        eprintln!("Error: DEEPSEEK_API_KEY environment variable is not set.");
        eprintln!("Run with: DEEPSEEK_API_KEY=your_key cargo run --example weather_tool");
        std::process::exit(1);
    }

    let client = DeepSeekClient::new()?;
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(TableProvider))?;

    let mut messages = vec![
        Message::system("You are a concise travel assistant."),
        Message::user("Should I pack a coat for Oslo or for Lisbon this week?"),
    ];

    let first = client
        .chat(ChatRequest::new(messages.clone()).tools(registry.definitions()))
        .await?;
    println!("--- Tool calls ---\n{:#?}", first.tool_calls);

    messages.push(first.to_message());
    messages.extend(registry.dispatch_all(&first.tool_calls).await);

    let answer = client
        .chat(ChatRequest::new(messages).tools(registry.definitions()))
        .await?;
    println!("\n--- Answer ---\n{}", answer.content);
    Ok(())
}
