//! Activation server implementation

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use wakeguard_api::{
    API_VERSION, Command, ErrorCode, ErrorInfo, Request, Response, ResponsePayload,
};

use crate::{IpcError, IpcResult};

/// How long a connected client gets to send its request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Message from a connected client to the service
#[derive(Debug)]
pub enum ServerMessage {
    /// A duplicate launch asks the primary to show its status.
    /// The service answers whether a new prompt was opened.
    Activate {
        request_id: u64,
        reply: oneshot::Sender<bool>,
    },
}

/// Activation server, bound by the primary instance
pub struct ActivationServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
    message_rx: Mutex<Option<mpsc::UnboundedReceiver<ServerMessage>>>,
}

impl ActivationServer {
    /// Create a new activation server
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            listener: None,
            message_tx,
            message_rx: Mutex::new(Some(message_rx)),
        }
    }

    /// Start listening.
    ///
    /// Only call this while holding the instance lock: any socket left at the
    /// path belongs to a dead primary and is removed.
    pub async fn start(&mut self) -> IpcResult<()> {
        // Create parent directory if needed
        if let Some(parent) = self.socket_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
            std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
        }

        // Remove stale socket
        if self.socket_path.exists() {
            debug!(path = %self.socket_path.display(), "Removing stale socket");
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner only
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;

        info!(path = %self.socket_path.display(), "Activation server listening");

        self.listener = Some(listener);

        Ok(())
    }

    /// Get receiver for server messages
    pub async fn take_message_receiver(&self) -> Option<mpsc::UnboundedReceiver<ServerMessage>> {
        self.message_rx.lock().await.take()
    }

    /// Accept connections in a loop
    pub async fn run(&self) -> IpcResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| IpcError::ServerError("Server not started".into()))?;

        let own_uid = nix::unistd::getuid().as_raw();

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let uid = get_peer_uid(&stream);
                    if uid != Some(own_uid) {
                        warn!(uid = ?uid, "Rejected activation from another user");
                        continue;
                    }

                    debug!("Activation client connected");
                    let message_tx = self.message_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, message_tx).await {
                            debug!(error = %e, "Activation client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for ActivationServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One request, one response, then close
async fn handle_client(
    stream: UnixStream,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
) -> IpcResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    let n = tokio::time::timeout(REQUEST_TIMEOUT, reader.read_line(&mut line))
        .await
        .map_err(|_| IpcError::Timeout)??;
    if n == 0 {
        return Err(IpcError::ConnectionClosed);
    }

    let response = match serde_json::from_str::<Request>(line.trim()) {
        Ok(request) => respond(request, &message_tx).await,
        Err(e) => {
            debug!(error = %e, "Malformed activation request");
            Response::error(
                0,
                ErrorInfo::new(ErrorCode::InvalidRequest, format!("Malformed request: {}", e)),
            )
        }
    };

    let mut json = serde_json::to_string(&response)?;
    json.push('\n');
    write_half.write_all(json.as_bytes()).await?;
    write_half.shutdown().await?;

    Ok(())
}

async fn respond(
    request: Request,
    message_tx: &mpsc::UnboundedSender<ServerMessage>,
) -> Response {
    if request.api_version != API_VERSION {
        return Response::error(
            request.request_id,
            ErrorInfo::new(
                ErrorCode::VersionMismatch,
                format!(
                    "API version mismatch: client {}, server {}",
                    request.api_version, API_VERSION
                ),
            ),
        );
    }

    match request.command {
        Command::Activate => {
            let (reply, answer) = oneshot::channel();
            let sent = message_tx.send(ServerMessage::Activate {
                request_id: request.request_id,
                reply,
            });

            match (sent, answer.await) {
                (Ok(()), Ok(prompt_opened)) => Response::success(
                    request.request_id,
                    ResponsePayload::Activated { prompt_opened },
                ),
                _ => Response::error(
                    request.request_id,
                    ErrorInfo::new(ErrorCode::ShuttingDown, "Primary instance is shutting down"),
                ),
            }
        }
    }
}

/// Get peer UID from Unix socket
fn get_peer_uid(stream: &UnixStream) -> Option<u32> {
    use std::os::unix::io::AsFd;

    // Get the borrowed file descriptor from the stream
    let fd = stream.as_fd();

    match nix::sys::socket::getsockopt(&fd, nix::sys::socket::sockopt::PeerCredentials) {
        Ok(cred) => Some(cred.uid()),
        Err(_) => None,
    }
}
