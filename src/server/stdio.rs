//! Newline-delimited JSON-RPC over stdin/stdout

use super::handler::McpHandler;
use super::protocol::JsonRpcResponse;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Serve MCP on the process's stdin/stdout until stdin closes
pub async fn serve_stdio(handler: McpHandler) -> Result<()> {
    info!("Serving MCP over stdio");
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented reader and writer.
///
/// Each request runs in its own task; responses are written by a single
/// writer task in completion order.
pub async fn serve<R, W>(handler: McpHandler, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_string(&response)?;
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<_, anyhow::Error>(())
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let handler = handler.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = handler.handle_message(&line).await {
                // The receiver only goes away if the writer failed
                let _ = tx.send(response);
            }
        });
    }

    debug!("Input closed, draining pending responses");
    drop(tx);
    writer_task.await??;
    Ok(())
}
