//! Per-connection worker
//!
//! Owns one socket for its whole lifetime: reads framed lines, decodes,
//! hands the payload to the dispatch engine, and writes back at most one
//! response line per message. Returns (releasing the socket) on EOF, read
//! failure, or write failure; protocol-level faults stay on the wire.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::logging::truncate_for_log;
use crate::mcp::rpc::{decode, encode, json_rpc_error};
use crate::mcp::server::handle_payload;
use crate::AppState;

/// Requests longer than one line of this many bytes are answered with an
/// error instead of being dispatched.
const MAX_LINE_BYTES: usize = 1024 * 1024;

const LOG_PAYLOAD_BYTES: usize = 500;

pub async fn handle_connection(
    state: AppState,
    stream: TcpStream,
    peer: SocketAddr,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(%peer, "peer closed connection");
                return Ok(());
            }
            Err(err) => {
                debug!(%peer, error = %err, "read failed");
                return Err(err);
            }
        };

        debug!(%peer, request = %truncate_for_log(&line, LOG_PAYLOAD_BYTES), "line received");

        let response = if line.len() > MAX_LINE_BYTES {
            Some(json_rpc_error(None, -32600, "Request too large (max 1 MiB)"))
        } else {
            match decode(&line) {
                Ok(payload) => handle_payload(&state, payload).await,
                Err(err) => Some(json_rpc_error(None, err.code(), &err.to_string())),
            }
        };

        if let Some(response) = response {
            let encoded = encode(&response);
            debug!(
                %peer,
                response = %truncate_for_log(encoded.trim_end(), LOG_PAYLOAD_BYTES),
                "line written"
            );
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }
    }
}
