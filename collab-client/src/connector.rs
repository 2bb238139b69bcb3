use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectFailed(String),
}

/// Something arriving from an established link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// One inbound text frame, not yet parsed.
    Frame(String),
    /// The peer closed the link or the channel errored out.
    Closed,
}

/// An established bidirectional link. Dropping `outbound` closes it.
pub struct Link {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Seam between the reconnect supervisor and the actual socket, so
/// transport tests can run against an in-memory link.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Link, TransportError>;
}

#[async_trait]
impl<C: Connector> Connector for std::sync::Arc<C> {
    async fn connect(&self, url: &str) -> Result<Link, TransportError> {
        (**self).connect(url).await
    }
}

/// WebSocket connector. Bridges the socket halves onto plain channels;
/// socket errors fold into `LinkEvent::Closed` and are never fatal.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Link, TransportError> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        let (mut write, mut read) = stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<LinkEvent>();

        // Writer: forward outbound frames until the sender side is dropped.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if write.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Reader: surface text frames, fold close and errors into Closed.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(LinkEvent::Frame(text.to_string())).is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::warn!("websocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
            let _ = in_tx.send(LinkEvent::Closed);
        });

        Ok(Link {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
