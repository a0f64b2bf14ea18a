//! Stdio transport. Each request runs on its own task so a slow browser
//! operation does not block later requests or cancellations; replies are
//! serialized through a single writer task.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::protocol::ProtocolHandler;
use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::framing;

pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub async fn run(&self) -> McpResult<()> {
        tracing::info!("Stdio transport started");
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve until `reader` hits EOF and every in-flight request has replied.
    pub async fn run_with<R, W>(&self, mut reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Value>();
        let writer_task = tokio::spawn(write_loop(rx, writer));

        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await.map_err(McpError::Io)?;
            if bytes_read == 0 {
                tracing::info!("EOF on stdin, draining in-flight requests");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            match framing::parse_message(&line) {
                // Notifications are handled inline so a cancellation is
                // applied before any request read after it.
                Ok(msg @ JsonRpcMessage::Notification(_)) => {
                    self.handler.handle_message(msg).await;
                }
                Ok(msg) => {
                    let handler = Arc::clone(&self.handler);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = handler.handle_message(msg).await {
                            let _ = tx.send(response);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    let _ = tx.send(framing::parse_failure(&e));
                }
            }
        }

        drop(tx);
        writer_task
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?
    }
}

async fn write_loop<W>(mut rx: mpsc::UnboundedReceiver<Value>, mut writer: W) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let framed = framing::frame_message(&response)?;
        writer
            .write_all(framed.as_bytes())
            .await
            .map_err(McpError::Io)?;
        writer.flush().await.map_err(McpError::Io)?;
    }
    Ok(())
}
