//! # Command Channel
//!
//! JSON lines over a reader/writer pair.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Channel Flow                                   │
//! │                                                                         │
//! │  reader ──► next_line ──► parse ──ok──► Bridge::dispatch_with ──┐       │
//! │                             │                                   │       │
//! │                             └─err──► INVALID_ARGUMENT ──────────┤       │
//! │                                                                 ▼       │
//! │                                               mpsc ──► writer task      │
//! │                                                        (one line each)  │
//! │                                                                         │
//! │  EOF ──► Bridge::shutdown (drain, disconnect) ──► close writer          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! → {"id": 7, "name": "makePayment", "args": {"amount": 1250}}
//! ← {"id": 7, "success": "CLV-1718000000000-000001"}
//! ← {"id": 8, "errorKind": "NOT_INITIALIZED", "message": "..."}
//! ```
//!
//! Responses are written as outcomes arrive, so they can come back in a
//! different order than the requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use posbridge_core::{CommandError, CommandRequest, Outcome};
use posbridge_engine::Bridge;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Value,

    #[serde(flatten)]
    request: CommandRequest,
}

#[derive(Serialize)]
struct Response<'a> {
    id: &'a Value,

    #[serde(flatten)]
    outcome: &'a Outcome,
}

/// Counters for one channel session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub requests: usize,
    pub rejected: usize,
}

/// Serves requests from `reader` until EOF, then shuts the bridge down.
///
/// Every request line produces exactly one response line on `writer`.
pub async fn serve<R, W>(bridge: &Bridge, reader: R, writer: W) -> std::io::Result<ChannelStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_lines(rx, writer));

    let mut stats = ChannelStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        stats.requests += 1;

        match parse_line(&line) {
            Ok(Envelope { id, request }) => {
                debug!(id = %id, command = %request.name, "Request received");
                let tx = tx.clone();
                bridge.dispatch_with(&request.name, &request.args, move |outcome| {
                    if let Some(encoded) = encode(&id, &outcome) {
                        // The writer only stops once every sender is gone.
                        let _ = tx.send(encoded);
                    }
                });
            }
            Err((id, reason)) => {
                warn!(%reason, "Rejected malformed request");
                stats.rejected += 1;
                let outcome = Outcome::Error(CommandError::invalid_argument(reason));
                if let Some(encoded) = encode(&id, &outcome) {
                    let _ = tx.send(encoded);
                }
            }
        }
    }

    info!(requests = stats.requests, "Channel closed");
    match bridge.shutdown().await {
        Ok(closed) => debug!(closed, "Bridge shut down"),
        Err(e) => warn!(error = %e, "Connector did not close cleanly"),
    }

    drop(tx);
    match writer_task.await {
        Ok(result) => result?,
        Err(e) => error!(error = %e, "Channel writer task failed"),
    }

    Ok(stats)
}

async fn write_lines<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// Parses one request line. On failure, returns whatever id could be
/// recovered along with the reason.
fn parse_line(line: &str) -> Result<Envelope, (Value, String)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (Value::Null, format!("Malformed request: {}", e)))?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| (id, format!("Malformed request: {}", e)))
}

fn encode(id: &Value, outcome: &Outcome) -> Option<String> {
    match serde_json::to_string(&Response { id, outcome }) {
        Ok(line) => Some(line),
        Err(e) => {
            error!(error = %e, "Failed to encode response");
            None
        }
    }
}
