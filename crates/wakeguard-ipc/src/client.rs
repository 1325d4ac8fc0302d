//! Activation client implementation

use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;
use wakeguard_api::{Command, Request, Response, ResponsePayload, ResponseResult};

use crate::{IpcError, IpcResult};

/// How long a duplicate launch waits for the primary before giving up
pub const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for talking to the primary instance
pub struct IpcClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
    next_request_id: u64,
}

impl IpcClient {
    /// Connect to the primary instance
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        })
    }

    /// Send a command and wait for response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Request::new(request_id, command);
        let mut json = serde_json::to_string(&request)?;
        json.push('\n');

        self.writer.write_all(json.as_bytes()).await?;

        // Read response
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }

        let response: Response = serde_json::from_str(line.trim())?;
        if response.request_id != request_id {
            return Err(IpcError::InvalidMessage(format!(
                "response id {} does not match request {}",
                response.request_id, request_id
            )));
        }

        Ok(response)
    }
}

/// Ask the primary instance at `socket_path` to show its status.
///
/// Any failure, including running out of `timeout`, means the primary's
/// surface could not be reached.
pub async fn forward_activation(
    socket_path: impl AsRef<Path>,
    timeout: Duration,
) -> IpcResult<ResponsePayload> {
    let socket_path = socket_path.as_ref();
    let exchange = async {
        let mut client = IpcClient::connect(socket_path).await?;
        client.send(Command::Activate).await
    };

    let response = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| IpcError::Timeout)??;

    match response.result {
        ResponseResult::Ok(payload) => {
            debug!(?payload, "Activation forwarded");
            Ok(payload)
        }
        ResponseResult::Err(e) => Err(IpcError::ServerError(e.message)),
    }
}
