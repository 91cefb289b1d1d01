//! Streaming decoder (Bytes -> JSON Value)

use crate::pipeline::Decoder;
use crate::{BoxStream, PipeResult};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use serde_json::Value;

/// Server-sent events decoder:
/// - splits by delimiter (default "\n\n", CRLF-normalized)
/// - strips the `data:` prefix
/// - ignores comment lines (`: keep-alive`) and non-JSON frames
/// - stops on `done_signal` (default "[DONE]")
pub struct SseDecoder {
    delimiter: String,
    done_signal: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            delimiter: "\n\n".to_string(),
            done_signal: "[DONE]".to_string(),
        }
    }

    pub fn with_done_signal(mut self, signal: impl Into<String>) -> Self {
        self.done_signal = signal.into();
        self
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of one SSE frame; `None` for comments, blanks and non-data lines.
fn frame_payload(frame: &str) -> Option<String> {
    let mut data = Vec::new();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim_start());
        }
    }
    if data.is_empty() {
        return None;
    }
    Some(data.join("\n"))
}

/// Split the next complete frame off the front of `buf`.
///
/// Works on raw bytes so a multi-byte character split across network
/// chunks is only decoded once the whole frame has arrived.
fn next_frame(buf: &mut BytesMut, delimiter: &[u8]) -> Option<BytesMut> {
    let idx = buf
        .windows(delimiter.len())
        .position(|window| window == delimiter)?;
    let mut frame = buf.split_to(idx + delimiter.len());
    frame.truncate(idx);
    Some(frame)
}

/// JSON value carried by one raw frame, or `None` to skip it.
fn frame_value(frame: &[u8]) -> Option<Value> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "skipping non-UTF-8 SSE frame");
            return None;
        }
    };
    let payload = frame_payload(text)?;
    match serde_json::from_str::<Value>(&payload) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(error = %e, "skipping non-JSON SSE frame");
            None
        }
    }
}

fn is_done(frame: &[u8], done_signal: &str) -> bool {
    std::str::from_utf8(frame)
        .ok()
        .and_then(frame_payload)
        .is_some_and(|p| p.trim() == done_signal)
}

#[async_trait::async_trait]
impl Decoder for SseDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> PipeResult<BoxStream<'static, Value>> {
        let delimiter = self.delimiter.clone();
        let done_signal = self.done_signal.clone();

        // Incrementally buffer bytes and emit full frames split by delimiter.
        let stream = stream::unfold(
            (input, BytesMut::new(), false),
            move |(mut input, mut buf, done)| {
                let delimiter = delimiter.clone();
                let done_signal = done_signal.clone();
                async move {
                    if done {
                        return None;
                    }
                    loop {
                        if let Some(frame) = next_frame(&mut buf, delimiter.as_bytes()) {
                            if is_done(&frame, &done_signal) {
                                return None;
                            }
                            match frame_value(&frame) {
                                Some(v) => return Some((Ok(v), (input, buf, false))),
                                None => continue,
                            }
                        }

                        match input.next().await {
                            // CR never occurs inside a multi-byte sequence, so
                            // CRLF can be normalized before the frame is complete.
                            Some(Ok(bytes)) => {
                                buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'))
                            }
                            Some(Err(e)) => return Some((Err(e), (input, buf, true))),
                            None => {
                                // EOF: the last frame may lack its delimiter.
                                if is_done(&buf, &done_signal) {
                                    return None;
                                }
                                let v = frame_value(&buf)?;
                                return Some((Ok(v), (input, BytesMut::new(), true)));
                            }
                        }
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn decode(chunks: Vec<&'static str>) -> Vec<PipeResult<Value>> {
        let input = stream::iter(chunks).map(|s| Ok(Bytes::from(s)));
        SseDecoder::new()
            .decode_stream(Box::pin(input))
            .await
            .unwrap()
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let out = decode(vec![
            "data: {\"a\":",
            "1}\n\ndata: {\"a\":2}\n",
            "\n: keep-alive\n\ndata: [DONE]\n\n",
            "data: {\"a\":3}\n\n",
        ])
        .await;
        let values: Vec<Value> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn test_crlf_and_trailing_frame() {
        let out = decode(vec!["data: {\"x\":true}\r\n\r\ndata: {\"y\":1}"]).await;
        let values: Vec<Value> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![json!({"x": true}), json!({"y": 1})]);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let frame = "data: {\"content\":\"你好\"}\n\n".as_bytes();
        // Cut inside the three-byte encoding of '你'.
        let cut = frame.iter().position(|b| *b >= 0x80).unwrap() + 1;
        let input = stream::iter(vec![
            Ok(Bytes::copy_from_slice(&frame[..cut])),
            Ok(Bytes::copy_from_slice(&frame[cut..])),
        ]);
        let out: Vec<_> = SseDecoder::new()
            .decode_stream(Box::pin(input))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), &json!({"content": "你好"}));
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let input = stream::iter(vec![
            Ok(Bytes::from("data: {\"n\":1}\n\n")),
            Err(crate::Error::runtime("connection reset")),
            Ok(Bytes::from("data: {\"n\":2}\n\n")),
        ]);
        let out: Vec<_> = SseDecoder::new()
            .decode_stream(Box::pin(input))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(out[1].is_err());
    }
}
