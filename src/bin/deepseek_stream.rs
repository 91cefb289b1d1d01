//! deepseek-stream: 流式输出一个提示词的回答，可在指定边界处停止
//!
//! Usage:
//!   deepseek-stream [OPTIONS] <PROMPT>...
//!
//! Streams the answer to stdout as it arrives. With `--stop`, a cancellation
//! at that boundary is requested once `--after` fragments have been read.

use anyhow::{anyhow, bail, Context};
use deepseek_kit::export::{export, ExportFormat};
use deepseek_kit::stream::{CancelBoundary, ConsumerConfig, SessionState, StreamConsumer};
use deepseek_kit::{ChatRequest, Conversation, DeepSeekClient, Message};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct Args {
    prompt: String,
    system: Option<String>,
    model: Option<String>,
    stop: Option<CancelBoundary>,
    after: usize,
    export: Option<ExportFormat>,
    out: Option<String>,
}

fn print_usage() {
    println!(
        r#"deepseek-stream: stream a DeepSeek completion with boundary-aware stop

USAGE:
    deepseek-stream [OPTIONS] <PROMPT>...

OPTIONS:
    --model <name>          Model (default: $DEEPSEEK_MODEL or deepseek-chat)
    --system <text>         System prompt
    --stop <boundary>       Stop at: now, word, sentence, graceful, paragraph
    --after <n>             Request the stop after n fragments (default 0)
    --export <format>       Print the conversation as json, markdown, text or html
    --out <path>            Write the export to a file instead of stdout
    -h, --help              Show this help message

ENVIRONMENT:
    DEEPSEEK_API_KEY        API key
    DEEPSEEK_BASE_URL       API base URL
    RUST_LOG                Log filter (default: warn)"#
    );
}

fn parse_args(raw: &[String]) -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        prompt: String::new(),
        system: None,
        model: None,
        stop: None,
        after: 0,
        export: None,
        out: None,
    };
    let mut words = Vec::new();
    let mut it = raw.iter();
    while let Some(arg) = it.next() {
        let mut value = |name: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| anyhow!("{name} needs a value"))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--model" => args.model = Some(value("--model")?),
            "--system" => args.system = Some(value("--system")?),
            "--stop" => args.stop = Some(value("--stop")?.parse()?),
            "--after" => {
                args.after = value("--after")?
                    .parse()
                    .context("--after expects a number")?
            }
            "--export" => args.export = Some(value("--export")?.parse()?),
            "--out" => args.out = Some(value("--out")?),
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => words.push(other.to_string()),
        }
    }
    if words.is_empty() {
        bail!("missing prompt");
    }
    args.prompt = words.join(" ");
    Ok(Some(args))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&raw)? else {
        print_usage();
        return Ok(());
    };

    let mut builder = DeepSeekClient::builder();
    if let Some(model) = &args.model {
        builder = builder.model(model.clone());
    }
    let client = builder.build().context("building client")?;

    let mut messages = Vec::new();
    if let Some(system) = &args.system {
        messages.push(Message::system(system.clone()));
    }
    messages.push(Message::user(args.prompt.clone()));
    let request = ChatRequest::new(messages.clone());

    let consumer = StreamConsumer::new(ConsumerConfig::default());
    let control = consumer.control();
    let printed = Arc::new(AtomicUsize::new(0));
    let stop_sent = Arc::new(AtomicBool::new(false));
    let (stop, after) = (args.stop, args.after);

    let consumer = consumer.on_update(move |snap| {
        let from = printed.swap(snap.buffer.len(), Ordering::SeqCst);
        if let Some(delta) = snap.buffer.get(from..) {
            if !delta.is_empty() {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(delta.as_bytes());
                let _ = out.flush();
            }
        }
        if let Some(boundary) = stop {
            if snap.chunk_count >= after && !stop_sent.swap(true, Ordering::SeqCst) {
                control.cancel(boundary, format!("--stop {boundary} after {after} fragments"));
            }
        }
    });

    let handle = client.start_session_with(request, consumer).await?;
    let session = handle.wait().await?;
    println!();

    match session.state() {
        SessionState::Cancelled => eprintln!(
            "[cancelled after {} fragments: {}]",
            session.chunk_count(),
            session.cancel_reason().unwrap_or_default()
        ),
        SessionState::Complete => {
            if let Some(usage) = session.usage() {
                eprintln!("[complete: {} tokens]", usage.total_tokens);
            }
        }
        _ => {}
    }

    let mut reply = Message::assistant(session.buffer().to_string());
    if !session.reasoning().is_empty() {
        reply.reasoning_content = Some(session.reasoning().to_string());
    }
    let failed = session.state() == SessionState::Failed;
    let result = session.into_result();

    if let Some(format) = args.export {
        let conversation = Conversation::new(args.prompt.chars().take(60).collect::<String>())
            .with_messages(messages.into_iter().chain([reply]).collect());
        let rendered = export(&conversation, format)?;
        match &args.out {
            Some(path) => {
                tokio::fs::write(path, rendered)
                    .await
                    .with_context(|| format!("writing {path}"))?;
                eprintln!("[exported to {path}]");
            }
            None => println!("{rendered}"),
        }
    }

    if failed {
        result.map_err(|e| anyhow!(e))?;
    }
    Ok(())
}
