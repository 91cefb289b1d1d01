//! Interruptible streaming without a network connection.
//!
//! A simulated token source feeds a `StreamConsumer` running on its own task
//! while the main task pauses it, resumes it and finally asks it to stop at
//! the end of the current sentence.
//!
//! Run:
//!   cargo run --example cancellable_stream

use deepseek_kit::stream::{CancelBoundary, ConsumerConfig, StreamConsumer};
use deepseek_kit::types::StreamFragment;
use futures::stream;
use std::time::Duration;

const TEXT: &str = "Ownership is Rust's most distinctive feature. Each value has a single owner. \
When the owner goes out of scope, the value is dropped. Borrowing lets code use a value \
without taking ownership. The borrow checker enforces these rules at compile time.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("deepseek_kit=debug")
        .init();

    // One word per fragment, 40ms apart.
    let words: Vec<String> = TEXT.split_inclusive(' ').map(str::to_string).collect();
    let source = stream::unfold(words.into_iter(), |mut words| async move {
        let word = words.next()?;
        tokio::time::sleep(Duration::from_millis(40)).await;
        Some((Ok(StreamFragment::text(word)), words))
    });

    let consumer = StreamConsumer::new(
        ConsumerConfig::new().with_pause_poll_interval(Duration::from_millis(20)),
    );
    let control = consumer.control();
    let mut updates = consumer.subscribe();
    let task = tokio::spawn(consumer.consume(source));

    tokio::time::sleep(Duration::from_millis(300)).await;
    control.pause();
    println!("⏸  paused");
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("   buffer while paused: {:?}", updates.borrow_and_update().buffer);
    control.resume();
    println!("▶  resumed");

    tokio::time::sleep(Duration::from_millis(250)).await;
    control.cancel(CancelBoundary::AfterSentence, "reader has seen enough");
    println!("⏹  cancel requested at sentence boundary");

    let session = task.await?;
    println!("\n--- {} after {} fragments ---", session.state(), session.chunk_count());
    println!("{}", session.buffer());
    if let Some(reason) = session.cancel_reason() {
        println!("(reason: {reason})");
    }
    Ok(())
}
