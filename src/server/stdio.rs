//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout.
//!
//! Requests are handled one at a time in arrival order. The loop ends on
//! end of input, Ctrl+C or SIGTERM.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::{Error, Result};

use super::dispatch::McpServer;

/// Serve on the process's stdin/stdout until input closes or a signal arrives
pub async fn run_stdio(server: McpServer) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(&server, stdin, stdout, shutdown_signal()).await
}

/// Serve requests read from `reader`, writing replies to `writer`
pub async fn serve<R, W, S>(
    server: &McpServer,
    reader: R,
    mut writer: W,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    info!("Stdio server ready");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read from stdin");
                        return Err(Error::Io(e));
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let reply = server.handle_line(line);
                for out in reply.lines()? {
                    writer.write_all(out.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                }
                writer.flush().await?;
                debug!(
                    responded = reply.response.is_some(),
                    notifications = reply.notifications.len(),
                    "Line handled"
                );
            }
        }
    }

    writer.flush().await?;
    info!("Stdio server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
