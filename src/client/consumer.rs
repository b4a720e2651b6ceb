use crate::claude::{extract_error_message, ChatRequest, MessageResponse, StreamEvent};
use crate::core::{ChatError, ClientConfig};
use crate::eventsource::{frames, Frame};
use futures::{Stream, StreamExt};
use log::{debug, error, warn};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use std::borrow::Cow;
use std::time::Duration;

const EVENT_STREAM: &str = "text/event-stream";

/// Talks to the proxy on behalf of one user. Holds no per-call state, so
/// concurrent calls never share an accumulator.
pub struct ProxyClient {
    client: Client,
    proxy_url: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.read_timeout_secs {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            proxy_url: config.proxy_url.clone(),
        })
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    /// Streams a reply, calling `on_chunk` once per text fragment, and
    /// returns the whole reply.
    ///
    /// On any failure `on_chunk` receives one final diagnostic message
    /// before the error is returned, so a caller rendering chunks never
    /// goes silent.
    pub async fn stream_chat<F>(
        &self,
        request: &ChatRequest,
        mut on_chunk: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&str),
    {
        match self.try_stream_chat(request, &mut on_chunk).await {
            Ok(text) => Ok(text),
            Err(err) => {
                error!("Error streaming response from Claude: {err}");
                on_chunk(&connection_error_message(&err));
                Err(err)
            }
        }
    }

    async fn try_stream_chat<F>(
        &self,
        request: &ChatRequest,
        on_chunk: &mut F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&str),
    {
        request.validate()?;
        let request = if request.stream {
            Cow::Borrowed(request)
        } else {
            Cow::Owned(request.clone().with_stream(true))
        };

        debug!(
            "Streaming {} message(s) via {}",
            request.messages.len(),
            self.proxy_url
        );
        let response = self
            .client
            .post(&self.proxy_url)
            .json(&*request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(EVENT_STREAM));
        if !is_event_stream {
            return Err(ChatError::ProtocolError(
                "server did not return a streaming response".to_string(),
            ));
        }

        read_stream(response.bytes_stream(), on_chunk).await
    }

    /// Requests a complete, non-streamed reply and returns its first text block.
    pub async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        request.validate()?;
        let request = if request.stream {
            Cow::Owned(request.clone().with_stream(false))
        } else {
            Cow::Borrowed(request)
        };

        let response = self
            .client
            .post(&self.proxy_url)
            .json(&*request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let message: MessageResponse = response.json().await.map_err(|e| {
            ChatError::ProtocolError(format!("Failed to parse Claude response: {e}"))
        })?;

        message
            .first_text()
            .map(str::to_owned)
            .ok_or_else(|| {
                ChatError::ProtocolError("response contained no text content".to_string())
            })
    }
}

/// Turns a non-success reply into `UpstreamError`. The message is taken
/// from the error envelope, else the raw body, else the status reason.
async fn ensure_success(response: Response) -> Result<Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty()).then(|| body.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    Err(ChatError::upstream(status, message))
}

/// Drains an event-stream body, delivering each text delta to `on_chunk`.
///
/// Ends successfully at `[DONE]` or when the body ends, returning the text
/// accumulated so far. Malformed frames are logged and skipped. A read error
/// is returned as is.
pub async fn read_stream<S, B, E, F>(bytes: S, on_chunk: &mut F) -> Result<String, ChatError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ChatError>,
    F: FnMut(&str),
{
    let mut accumulated = String::new();
    let mut frames = std::pin::pin!(frames(bytes));

    while let Some(frame) = frames.next().await {
        match frame? {
            Frame::Done => break,
            Frame::Event(StreamEvent::Error { error }) => {
                warn!("Upstream reported a stream error: {}", error.message);
            }
            Frame::Event(event) => {
                if let Some(text) = event.text_delta() {
                    on_chunk(text);
                    accumulated.push_str(text);
                }
            }
            Frame::Malformed(err) => warn!("Error parsing stream data: {err}"),
        }
    }

    Ok(accumulated)
}

pub fn connection_error_message(err: &ChatError) -> String {
    format!("Error connecting to Claude API: {err}. Please check your API key and try again.")
}
