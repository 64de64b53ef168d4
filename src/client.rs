// src/client.rs

//! HTTP client for a running `runvisor` server.
//!
//! Mirrors the three RPC operations. `Status` comes back as a stream of
//! [`RunStatusResponse`]s decoded from Server-Sent Events.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::errors::{Result, RunvisorError};
use crate::server::api::STATUS_EVENT;
use crate::service::{PipelineSummary, RunParams, RunStatusResponse, RunSummary};

/// Default server address.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:50051";

/// Boxed stream of status messages.
pub type StatusStream = Pin<Box<dyn Stream<Item = Result<RunStatusResponse>> + Send>>;

#[derive(Debug, Clone)]
pub struct RunvisorClient {
    base: String,
    http: reqwest::Client,
}

impl RunvisorClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let base = endpoint.into().trim_end_matches('/').to_string();
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    /// Single readiness probe.
    pub async fn health(&self) -> Result<()> {
        let resp = self.http.get(self.url("/api/health")).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Poll the server until it answers or `timeout` elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.health().await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    pub async fn list_pipelines(&self) -> Result<PipelineSummary> {
        let resp = self.http.get(self.url("/api/pipelines")).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }

    pub async fn run(&self, params: &RunParams) -> Result<RunSummary> {
        let resp = self.http.post(self.url("/api/run")).json(params).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }

    /// Open the status stream of a run.
    pub async fn status_stream(&self, run_id: &str) -> Result<StatusStream> {
        let resp = self
            .http
            .get(self.url(&format!("/api/run/{run_id}/status")))
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let bytes = Box::pin(resp.bytes_stream().map(|chunk| chunk.map_err(RunvisorError::from)));
        Ok(Box::pin(decode_status_events(bytes)))
    }

    /// Follow a status stream to its end and collect every message.
    pub async fn status(&self, run_id: &str) -> Result<Vec<RunStatusResponse>> {
        let mut stream = self.status_stream(run_id).await?;
        let mut messages = Vec::new();
        while let Some(msg) = stream.next().await {
            messages.push(msg?);
        }
        Ok(messages)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(RunvisorError::Protocol(format!("{status}: {message}")))
}

/// Turn a byte stream of Server-Sent Events into status messages.
///
/// Only `status` events are decoded; keep-alive comments and other event
/// names are skipped.
pub fn decode_status_events<S, B>(bytes: S) -> impl Stream<Item = Result<RunStatusResponse>> + Send
where
    S: Stream<Item = Result<B>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (bytes, SseDecoder::default(), VecDeque::<SseEvent>::new(), false);

    stream::unfold(state, |(mut bytes, mut decoder, mut ready, mut eof)| async move {
        loop {
            if let Some(event) = ready.pop_front() {
                if event.name.as_deref().unwrap_or("message") != STATUS_EVENT {
                    debug!(event = ?event.name, "skipping non-status SSE event");
                    continue;
                }
                let parsed = serde_json::from_str::<RunStatusResponse>(&event.data)
                    .map_err(|e| RunvisorError::Protocol(format!("bad status payload: {e}")));
                return Some((parsed, (bytes, decoder, ready, eof)));
            }
            if eof {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.feed(chunk.as_ref())),
                Some(Err(e)) => return Some((Err(e), (bytes, decoder, ready, true))),
                None => {
                    ready.extend(decoder.finish());
                    eof = true;
                }
            }
        }
    })
}

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub name: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    name: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes; returns the events completed by them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        for &b in chunk {
            if b == b'\n' {
                let line = std::mem::take(&mut self.line);
                let line = String::from_utf8_lossy(&line);
                if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                    out.push(event);
                }
            } else {
                self.line.push(b);
            }
        }
        out
    }

    /// Flush at end of input.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut out = self.feed(b"\n");
        out.extend(self.dispatch());
        out
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.name = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let name = self.name.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { name, data })
    }
}
