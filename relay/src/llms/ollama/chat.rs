//! Ollama [`ModelClient`] implementation.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::client::ModelClient;
use crate::error::UpstreamError;
use crate::message::{Chunk, Completion, Prompt};
use crate::stream::ChunkStream;

use super::client::{Ollama, OllamaChatRequest, OllamaMessage};
use super::stream::{LineBuffer, StreamLine, parse_stream_line};

/// Ollama chat completion response.
#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[async_trait]
impl ModelClient for Ollama {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, UpstreamError> {
        let url = self.chat_url();
        let body = self.build_body(prompt, false);

        debug!(model = %body.model, %url, "sending chat request");

        let response = self
            .http_client
            .post(&url)
            .timeout(self.config.request_timeout())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text));
        }

        let response_text = response.text().await?;
        let parsed: OllamaChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            UpstreamError::response_format(
                "valid Ollama response",
                format!("parse error: {e}, response: {response_text}"),
            )
        })?;

        debug!(
            done_reason = parsed.done_reason.as_deref().unwrap_or("stop"),
            len = parsed.message.content.len(),
            "chat request completed"
        );

        Ok(Completion::from(parsed.message.content))
    }

    fn stream(&self, prompt: &Prompt) -> ChunkStream {
        let client = self.http_client.clone();
        let url = self.chat_url();
        let body = self.build_body(prompt, true);
        let idle_timeout = self.config.request_timeout();

        let stream = try_stream! {
            debug!(model = %body.model, %url, "sending streaming chat request");

            let response = send_streaming(&client, &url, &body, idle_timeout).await?;
            let mut bytes_stream = response.bytes_stream();
            let mut buffer = LineBuffer::default();
            let mut finished = false;

            'read: loop {
                let next = timeout(idle_timeout, bytes_stream.next())
                    .await
                    .map_err(|_| UpstreamError::timeout("Timed out waiting for the next chunk"))?;

                let (lines, exhausted) = match next {
                    Some(bytes) => {
                        let bytes = bytes.map_err(|e| UpstreamError::stream(e.to_string()))?;
                        (buffer.push(&bytes)?, false)
                    }
                    None => (buffer.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for line in lines {
                    let Some(parsed) = parse_stream_line(&line) else {
                        continue;
                    };
                    match parsed? {
                        StreamLine::Content(text) if text.is_empty() => {}
                        StreamLine::Content(text) => {
                            trace!(len = text.len(), "received chunk");
                            yield Chunk::new(text);
                        }
                        StreamLine::Done { reason } => {
                            debug!(done_reason = reason.as_deref().unwrap_or("stop"), "stream completed");
                            finished = true;
                            break 'read;
                        }
                    }
                }

                if exhausted {
                    break;
                }
            }

            if !finished {
                warn!("Ollama stream ended without a final message");
                Err::<(), _>(UpstreamError::stream(
                    "stream ended before the generation completed",
                ))?;
            }
        };

        ChunkStream::new(stream)
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Send a streaming request and check its status.
///
/// Only the wait for response headers is bounded here; the body is read
/// with a per-chunk idle timeout.
async fn send_streaming(
    client: &reqwest::Client,
    url: &str,
    body: &OllamaChatRequest,
    idle_timeout: std::time::Duration,
) -> Result<reqwest::Response, UpstreamError> {
    let response = timeout(idle_timeout, client.post(url).json(body).send())
        .await
        .map_err(|_| UpstreamError::timeout("Request timed out"))??;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(Ollama::parse_error(status.as_u16(), &error_text));
    }

    Ok(response)
}
