use std::pin::Pin;

use async_trait::async_trait;
use docchat_client::{SocketConnection, SocketConnector, TransportError};
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as WsMessage};

/// Opens browser WebSockets through gloo-net
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooConnector;

#[async_trait(?Send)]
impl SocketConnector for GlooConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketConnection>, TransportError> {
        log::info!("Connecting to WebSocket: {}", url);
        let mut ws = WebSocket::open(url)
            .map_err(|e| TransportError::SocketUnavailable(format!("Failed to connect: {:?}", e)))?;

        // The sink only becomes ready once the handshake is done
        futures::future::poll_fn(|cx| Pin::new(&mut ws).poll_ready(cx))
            .await
            .map_err(|e| TransportError::SocketUnavailable(format!("{:?}", e)))?;

        let (sink, stream) = ws.split();
        Ok(Box::new(GlooConnection { sink, stream }))
    }
}

struct GlooConnection {
    sink: SplitSink<WebSocket, WsMessage>,
    stream: SplitStream<WebSocket>,
}

#[async_trait(?Send)]
impl SocketConnection for GlooConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        log::debug!("Sending frame: {}", text);
        self.sink
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::Network(format!("Failed to send: {:?}", e)))
    }

    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => {
                    log::debug!("Received frame: {}", text);
                    return Some(Ok(text));
                }
                Ok(WsMessage::Bytes(_)) => {
                    log::warn!("Received unexpected binary message");
                }
                Err(e) => {
                    return Some(Err(TransportError::Network(format!("WebSocket error: {:?}", e))));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            log::debug!("Error while closing WebSocket: {:?}", e);
        }
    }
}
