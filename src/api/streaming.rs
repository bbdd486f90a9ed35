//! User stream decoder
//!
//! The streaming endpoint sends server-sent events: an `event: <name>` line
//! followed by a `data: <payload>` line, with `:`-prefixed heartbeats in
//! between.

use std::sync::Arc;

use futures::{Stream, StreamExt, stream};

use crate::data::{Notification, Status};
use crate::error::{AppError, Result};

/// Decoded streaming event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A new status for the home timeline
    Update(Arc<Status>),
    /// An existing status was edited
    StatusUpdate(Arc<Status>),
    Notification(Box<Notification>),
    /// Id of a deleted status
    Delete(String),
    Heartbeat,
}

impl StreamEvent {
    /// Metric label
    pub fn name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::StatusUpdate(_) => "status.update",
            Self::Notification(_) => "notification",
            Self::Delete(_) => "delete",
            Self::Heartbeat => "heartbeat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventName {
    Update,
    StatusUpdate,
    Notification,
    Delete,
    Ignored,
}

/// Incremental decoder over raw stream bytes
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    pending: Option<EventName>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns the outcome of every line completed
    /// by it, in order.
    ///
    /// Partial lines (including split UTF-8 sequences) are buffered until
    /// their newline arrives. A line that fails to decode yields an `Err`
    /// entry and decoding continues with the next line.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(index) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=index).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let decoded = String::from_utf8(line)
                .map_err(|e| AppError::Decode(format!("invalid UTF-8 in stream: {}", e)))
                .and_then(|line| self.push_line(&line));
            match decoded {
                Ok(Some(event)) => events.push(Ok(event)),
                Ok(None) => {}
                Err(error) => {
                    self.pending = None;
                    events.push(Err(error));
                }
            }
        }
        events
    }

    /// Feed one complete line
    pub fn push_line(&mut self, line: &str) -> Result<Option<StreamEvent>> {
        if line.starts_with(':') {
            return Ok(Some(StreamEvent::Heartbeat));
        }
        if line.is_empty() {
            self.pending = None;
            return Ok(None);
        }

        if let Some(name) = line.strip_prefix("event:") {
            self.pending = Some(match name.trim() {
                "update" => EventName::Update,
                "status.update" => EventName::StatusUpdate,
                "notification" => EventName::Notification,
                "delete" => EventName::Delete,
                other => {
                    tracing::debug!(event = other, "Ignoring unsupported stream event");
                    EventName::Ignored
                }
            });
            return Ok(None);
        }

        let Some(data) = line.strip_prefix("data:") else {
            // Other SSE fields (id:, retry:) carry nothing we use.
            return Ok(None);
        };
        let data = data.trim_start();

        let Some(name) = self.pending.take() else {
            return Err(AppError::Decode(format!(
                "stream data without event name: {}",
                data
            )));
        };

        let event = match name {
            EventName::Update => StreamEvent::Update(Arc::new(decode_status(data)?)),
            EventName::StatusUpdate => StreamEvent::StatusUpdate(Arc::new(decode_status(data)?)),
            EventName::Notification => {
                let mut notification: Notification = serde_json::from_str(data)?;
                notification.status = notification.status.map(Status::flatten_shared);
                StreamEvent::Notification(Box::new(notification))
            }
            EventName::Delete => StreamEvent::Delete(data.trim().trim_matches('"').to_string()),
            EventName::Ignored => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn decode_status(data: &str) -> Result<Status> {
    let status: Status = serde_json::from_str(data)?;
    Ok(status.flatten_reblog())
}

/// Decode a byte stream into streaming events
pub fn events<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<AppError>,
{
    let mut decoder = EventDecoder::new();
    chunks
        .map(move |chunk| match chunk {
            Ok(bytes) => decoder.push_chunk(bytes.as_ref()),
            Err(error) => vec![Err(error.into())],
        })
        .flat_map(stream::iter)
}
