//! TCP transport layer for the Model Context Protocol
//!
//! Line-delimited JSON-RPC over plain sockets: the accept loop lives here,
//! the per-connection read/dispatch/write cycle in [`connection`].

pub mod connection;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::AppState;

/// Accepts connections forever, one spawned task per client. A failed
/// accept is logged and the loop keeps going; a failed connection task
/// only ever takes down its own client.
pub async fn serve(listener: TcpListener, state: AppState) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "client connected");
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(err) = connection::handle_connection(state, stream, peer).await {
                        warn!(%peer, error = %err, "connection terminated");
                    }
                });
            }
            Err(err) => {
                warn!(error = %err, "accept failed");
            }
        }
    }
}
