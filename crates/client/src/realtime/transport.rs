//! Transport seam for the real-time channel.
//!
//! The channel only needs to open a text-message connection, send, receive
//! and close. [`WsConnector`] does that over `tokio-tungstenite`; tests plug
//! in their own [`Connector`].

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::warn;
use url::Url;

use super::ChannelError;

/// An open, message-oriented connection.
pub trait Transport: Send {
    /// Send one text message.
    fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ChannelError>>;

    /// Next text message; `None` once the peer has closed. Undecodable
    /// messages are skipped, so `Err` always means the connection failed.
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, ChannelError>>>;

    /// Close politely. Errors are swallowed; the transport is done either way.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

/// Opens transports.
pub trait Connector: Send + Sync {
    fn connect(&self, url: Url) -> BoxFuture<'static, Result<Box<dyn Transport>, ChannelError>>;
}

/// WebSocket connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, url: Url) -> BoxFuture<'static, Result<Box<dyn Transport>, ChannelError>> {
        Box::pin(async move {
            let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| ChannelError::Transport(e.to_string()))?;
            Ok(Box::new(WsTransport { stream }) as Box<dyn Transport>)
        })
    }
}

struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ChannelError>> {
        Box::pin(async move {
            self.stream
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| ChannelError::Transport(e.to_string()))
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, ChannelError>>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Some(Ok(text)),
                        Err(e) => warn!(error = %e, "Dropping binary message that is not UTF-8"),
                    },
                    Ok(Message::Close(_)) => return None,
                    Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                    Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let _ = self.stream.close(None).await;
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_recv_skips_binary_that_is_not_utf8() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Binary(vec![0xff, 0xfe, 0x00].into())).await.unwrap();
            ws.send(Message::Binary(b"first".to_vec().into())).await.unwrap();
            ws.send(Message::Text("second".into())).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
        let mut transport = WsConnector.connect(url).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "first");
        assert_eq!(transport.recv().await.unwrap().unwrap(), "second");
        assert!(transport.recv().await.is_none());
        server.await.unwrap();
    }
}
