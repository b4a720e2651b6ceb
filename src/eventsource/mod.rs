mod decoder;

use crate::claude::StreamEvent;
use crate::core::ChatError;
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::debug;

pub use decoder::Utf8Decoder;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One recognized `data: ` line of the event stream.
#[derive(Debug)]
pub enum Frame {
    /// The `[DONE]` sentinel: no further frames follow.
    Done,
    /// A JSON payload that parsed as a stream event.
    Event(StreamEvent),
    /// A payload that did not parse, as a `MalformedFrame` error.
    Malformed(ChatError),
}

impl Frame {
    /// Parses a single line without its terminator.
    ///
    /// # Returns
    ///
    /// `None` for lines that are not data frames (`event:` lines, comments,
    /// blank separators).
    pub fn parse_line(line: &str) -> Option<Self> {
        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload == DONE_SENTINEL {
            return Some(Self::Done);
        }

        Some(match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => Self::Event(event),
            Err(e) => Self::Malformed(ChatError::MalformedFrame(format!("{e}: {payload}"))),
        })
    }
}

/// Rolling text buffer that hands out newline-terminated lines and holds
/// back the trailing partial segment for the next chunk.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Removes and returns every complete line. `\r\n` terminators are
    /// accepted as well as `\n`.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let partial = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, partial);
        complete.lines().map(str::to_owned).collect()
    }

    /// The held-back, unterminated segment.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}

/// Turns a chunked byte body into a stream of frames.
///
/// The stream ends after yielding [`Frame::Done`], or when the byte source
/// ends. An error from the byte source is yielded once and ends the stream.
/// A trailing segment without a newline at end of input is discarded.
pub fn frames<S, B, E>(bytes: S) -> impl Stream<Item = Result<Frame, ChatError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ChatError>,
{
    try_stream! {
        let mut bytes = std::pin::pin!(bytes);
        let mut decoder = Utf8Decoder::new();
        let mut lines = LineBuffer::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(Into::<ChatError>::into)?;
            lines.push(&decoder.decode(chunk.as_ref()));

            for line in lines.drain_lines() {
                match Frame::parse_line(&line) {
                    Some(Frame::Done) => {
                        yield Frame::Done;
                        return;
                    }
                    Some(frame) => yield frame,
                    None => continue,
                }
            }
        }

        lines.push(&decoder.finish());
        if !lines.remainder().is_empty() {
            debug!("Discarding unterminated stream tail: {:?}", lines.remainder());
        }
    }
}
