//! TCP feed server for live consumers.
//!
//! A consumer connects, sends one JSON line naming the feed it wants
//! (`{"feed":"audio"}`), and then receives that feed until it disconnects
//! or falls too far behind. The audio feed is raw f32le PCM; the classifier
//! and state feeds are newline-delimited JSON. Anything the consumer sends
//! after the subscribe line is drained and ignored; it only serves as a
//! liveness signal.

use crate::error::{AdhopError, Result};
use crate::hub::registry::{FeedEvent, SubscriberRegistry};
use crate::protocol::SubscribeRequest;
use crate::shutdown::ShutdownSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Accepts feed consumers and fans published payloads out to them.
pub struct FeedServer {
    listener: TcpListener,
    registry: Arc<SubscriberRegistry>,
}

impl FeedServer {
    /// Binds the server to the given address.
    pub async fn bind(addr: &str, registry: Arc<SubscriberRegistry>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AdhopError::Hub {
                message: format!("failed to bind {addr}: {e}"),
            })?;
        Ok(Self { listener, registry })
    }

    /// The address the server actually listens on (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|e| AdhopError::Hub {
            message: format!("no local address: {e}"),
        })
    }

    /// Accepts consumers until shutdown.
    ///
    /// On shutdown every consumer queue gets the terminal marker, so
    /// connection tasks finish promptly instead of hanging on their queues.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.registry.shutdown();
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let registry = self.registry.clone();
                            tokio::spawn(async move {
                                handle_consumer(stream, peer, registry).await;
                            });
                        }
                        Err(e) => {
                            return Err(AdhopError::Hub {
                                message: format!("accept failed: {e}"),
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Serves one consumer connection from subscribe line to disconnect.
async fn handle_consumer(stream: TcpStream, peer: SocketAddr, registry: Arc<SubscriberRegistry>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    let feed = match SubscribeRequest::from_json(line.trim()) {
        Ok(request) => request.feed,
        Err(e) => {
            eprintln!("[Hub] {peer} sent an invalid subscribe line: {e}");
            return;
        }
    };

    let (id, mut events) = registry.subscribe(feed);
    eprintln!("[Hub] {feed} consumer connected from {peer}");

    let mut inbound = [0u8; 512];
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(FeedEvent::Data(payload)) => {
                        let write = async {
                            write_half.write_all(&payload).await?;
                            if !feed.is_binary() {
                                write_half.write_all(b"\n").await?;
                            }
                            write_half.flush().await
                        };
                        if write.await.is_err() {
                            break;
                        }
                    }
                    // Hub shut down, or this consumer was pruned as stale.
                    Some(FeedEvent::Done) | None => break,
                }
            }
            read = reader.read(&mut inbound) => {
                match read {
                    // Consumer hung up.
                    Ok(0) | Err(_) => break,
                    // Inbound traffic is a liveness signal only.
                    Ok(_) => {}
                }
            }
        }
    }

    registry.unsubscribe(feed, id);
    eprintln!("[Hub] {feed} consumer from {peer} disconnected");
}
