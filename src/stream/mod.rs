//! 可中断流式消费模块：累积流式片段，支持暂停、恢复与按边界取消。
//!
//! # Interruptible Stream Consumer
//!
//! Consumes an ordered sequence of [`StreamFragment`](crate::types::StreamFragment)s,
//! accumulating their text into a [`StreamSession`], and lets the caller pause,
//! resume or cancel the stream at a chosen [`CancelBoundary`] so the partial
//! output stays readable.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`StreamConsumer`] | State machine driving a session to a terminal state |
//! | [`StreamControl`] | Cloneable pause/resume/cancel handle |
//! | [`CancelBoundary`] | Where a cancellation may cut the output |
//! | [`StreamSession`] | Accumulated buffer, counters and final state |
//! | [`SessionSnapshot`] | Read-only projection published to observers |
//!
//! ## Example
//!
//! ```rust
//! use deepseek_kit::stream::{CancelBoundary, ConsumerConfig, SessionState, StreamConsumer};
//! use deepseek_kit::types::StreamFragment;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let consumer = StreamConsumer::new(ConsumerConfig::default());
//! let control = consumer.control();
//! control.cancel(CancelBoundary::AfterSentence, "enough");
//!
//! let fragments = ["Hello", " world.", " More."]
//!     .into_iter()
//!     .map(|t| Ok(StreamFragment::text(t)));
//! let session = consumer.consume(futures::stream::iter(fragments)).await;
//!
//! assert_eq!(session.state(), SessionState::Cancelled);
//! assert_eq!(session.buffer(), "Hello world.");
//! # }
//! ```

pub mod boundary;
pub mod consumer;
pub mod control;
pub mod error;
pub mod session;

pub use boundary::{BoundaryDecision, CancelBoundary};
pub use consumer::{ConsumerConfig, StreamConsumer};
pub use control::{CancellationRequest, StreamControl};
pub use error::StreamError;
pub use session::{SessionSnapshot, SessionState, StreamSession};
