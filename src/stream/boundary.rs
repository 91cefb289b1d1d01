//! Cancellation boundary rules.
//!
//! A boundary decides, for the next incoming fragment, whether a pending
//! cancellation may take effect and how much of that fragment is still kept.

use super::error::StreamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];
const GRACEFUL_TERMINATORS: &[char] = &['.', '\n'];

/// Where a requested cancellation is allowed to cut the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelBoundary {
    /// Stop before appending anything else.
    Immediate,
    /// Stop at the next whitespace.
    AfterWord,
    /// Stop once the text ends with `.`, `!` or `?`.
    AfterSentence,
    /// Stop at the next blank line.
    AfterParagraph,
    /// Stop once the text ends with `.` or a newline.
    Graceful,
}

/// Outcome of evaluating a boundary against one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryDecision {
    /// Not satisfied; append the whole fragment and keep reading.
    Continue,
    /// Satisfied; append the first `keep` bytes of the fragment, then stop.
    Stop { keep: usize },
}

impl CancelBoundary {
    pub const ALL: [CancelBoundary; 5] = [
        CancelBoundary::Immediate,
        CancelBoundary::AfterWord,
        CancelBoundary::AfterSentence,
        CancelBoundary::AfterParagraph,
        CancelBoundary::Graceful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CancelBoundary::Immediate => "immediate",
            CancelBoundary::AfterWord => "after_word",
            CancelBoundary::AfterSentence => "after_sentence",
            CancelBoundary::AfterParagraph => "after_paragraph",
            CancelBoundary::Graceful => "graceful",
        }
    }

    /// Evaluate the rule against the text accumulated so far and the incoming fragment.
    ///
    /// Rules that look at how the text *ends* cannot decide anything when both
    /// `buffer` and `fragment` are empty and return
    /// [`StreamError::InvalidBoundaryState`].
    pub fn evaluate(&self, buffer: &str, fragment: &str) -> Result<BoundaryDecision, StreamError> {
        let decision = match self {
            CancelBoundary::Immediate => BoundaryDecision::Stop { keep: 0 },
            CancelBoundary::AfterWord => match fragment.find(char::is_whitespace) {
                Some(idx) => BoundaryDecision::Stop { keep: idx },
                None => BoundaryDecision::Continue,
            },
            CancelBoundary::AfterParagraph => {
                if buffer.ends_with('\n') && fragment.starts_with('\n') {
                    // The blank line straddles two fragments.
                    BoundaryDecision::Stop { keep: 0 }
                } else if let Some(idx) = fragment.find("\n\n") {
                    BoundaryDecision::Stop { keep: idx }
                } else {
                    BoundaryDecision::Continue
                }
            }
            CancelBoundary::AfterSentence => {
                self.text_ending(buffer, fragment, SENTENCE_TERMINATORS)?
            }
            CancelBoundary::Graceful => self.text_ending(buffer, fragment, GRACEFUL_TERMINATORS)?,
        };
        Ok(decision)
    }

    /// Byte length of the longest prefix of `buffer` that satisfies the rule.
    ///
    /// Used when the source ends while a cancellation is still waiting for its
    /// boundary: the text is cut back to the last place the rule would have
    /// stopped, or to nothing if it never could have.
    pub fn last_cut(&self, buffer: &str) -> usize {
        match self {
            CancelBoundary::Immediate => buffer.len(),
            CancelBoundary::AfterWord => buffer
                .char_indices()
                .filter(|(_, c)| c.is_whitespace())
                .last()
                .map_or(0, |(idx, _)| idx),
            CancelBoundary::AfterParagraph => buffer.rfind("\n\n").unwrap_or(0),
            CancelBoundary::AfterSentence => last_terminator_end(buffer, SENTENCE_TERMINATORS),
            CancelBoundary::Graceful => last_terminator_end(buffer, GRACEFUL_TERMINATORS),
        }
    }

    /// Bytes to drop from the end of `buffer` when a stop on `fragment` leaves
    /// part of the break in it. Only a paragraph break split across two
    /// fragments does that: the buffer already holds its first `\n`.
    pub fn retract(&self, buffer: &str, fragment: &str) -> usize {
        match self {
            CancelBoundary::AfterParagraph
                if buffer.ends_with('\n') && fragment.starts_with('\n') =>
            {
                1
            }
            _ => 0,
        }
    }

    fn text_ending(
        &self,
        buffer: &str,
        fragment: &str,
        terminators: &[char],
    ) -> Result<BoundaryDecision, StreamError> {
        if buffer.is_empty() && fragment.is_empty() {
            return Err(StreamError::InvalidBoundaryState { boundary: *self });
        }
        if let Some((idx, ch)) = fragment.char_indices().find(|(_, c)| terminators.contains(c)) {
            return Ok(BoundaryDecision::Stop {
                keep: idx + ch.len_utf8(),
            });
        }
        if fragment.is_empty() && buffer.ends_with(terminators) {
            return Ok(BoundaryDecision::Stop { keep: 0 });
        }
        Ok(BoundaryDecision::Continue)
    }
}

fn last_terminator_end(buffer: &str, terminators: &[char]) -> usize {
    buffer
        .char_indices()
        .filter(|(_, c)| terminators.contains(c))
        .last()
        .map_or(0, |(idx, c)| idx + c.len_utf8())
}

impl fmt::Display for CancelBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CancelBoundary {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "immediate" | "now" => Ok(CancelBoundary::Immediate),
            "after_word" | "word" => Ok(CancelBoundary::AfterWord),
            "after_sentence" | "sentence" => Ok(CancelBoundary::AfterSentence),
            "after_paragraph" | "paragraph" => Ok(CancelBoundary::AfterParagraph),
            "graceful" => Ok(CancelBoundary::Graceful),
            _ => Err(crate::Error::validation_with_context(
                format!("unknown cancel boundary '{}'", s),
                crate::ErrorContext::new()
                    .with_details("expected immediate, word, sentence, paragraph or graceful")
                    .with_source("cancel_boundary"),
            )),
        }
    }
}
