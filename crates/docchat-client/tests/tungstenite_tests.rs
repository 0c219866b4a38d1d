mod common;

use std::rc::Rc;
use std::time::Duration;

use common::run_local;
use docchat_client::types::{fallback, Query};
use docchat_client::{SocketTransport, TokioSpawner, TokioTimer, Transport, TungsteniteConnector};
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Accept one connection and answer each query frame with `reply(frame)`;
/// `None` closes the socket instead.
async fn serve_once<F>(reply: F) -> String
where
    F: Fn(Value) -> Option<Value> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        while let Some(Ok(message)) = ws.next().await {
            let WsMessage::Text(text) = message else {
                continue;
            };
            let frame: Value = serde_json::from_str(&text).unwrap();
            match reply(frame) {
                Some(answer) => ws.send(WsMessage::Text(answer.to_string())).await.unwrap(),
                None => {
                    let _ = ws.close(None).await;
                    break;
                }
            }
        }
    });

    format!("ws://{}", addr)
}

fn transport(url: &str) -> SocketTransport {
    SocketTransport::new(
        Box::new(TungsteniteConnector::new()),
        url,
        Rc::new(TokioTimer),
        Rc::new(TokioSpawner),
    )
    .with_reconnect_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn test_round_trip_over_real_socket() {
    run_local(async {
        let url = serve_once(|frame| {
            assert_eq!(frame["type"], "ask_query");
            Some(json!({
                "response": format!("<p>You asked: {}</p>", frame["query"].as_str().unwrap_or_default()),
                "request_id": frame["request_id"],
                "session_id": "sess-ws"
            }))
        })
        .await;
        let transport = transport(&url);

        let reply = transport.exchange(&Query::new("hipcc?")).await.unwrap();
        assert_eq!(reply.text, "<p>You asked: hipcc?</p>");
        assert_eq!(reply.session_id.as_deref(), Some("sess-ws"));

        let reply = transport.exchange(&Query::new("again")).await.unwrap();
        assert_eq!(reply.text, "<p>You asked: again</p>");

        transport.shutdown().await;
    })
    .await;
}

#[tokio::test]
async fn test_server_close_while_pending() {
    run_local(async {
        let url = serve_once(|_| None).await;
        let transport = transport(&url);

        let reply = transport.ask(&Query::new("q")).await;
        assert_eq!(reply.text, fallback::SOCKET_CLOSED);
    })
    .await;
}

#[tokio::test]
async fn test_nothing_listening() {
    run_local(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = transport(&url);
        assert_eq!(transport.ask(&Query::new("q")).await.text, fallback::SOCKET_UNAVAILABLE);
    })
    .await;
}
