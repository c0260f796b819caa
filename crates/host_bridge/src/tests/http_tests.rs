use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::BridgeError;
use tokio::net::TcpListener;

use crate::{HostBridge, HttpBridge};

type Received = Arc<Mutex<Vec<(String, Value)>>>;

async fn record_action(
    State(received): State<Received>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    received.lock().expect("received lock").push((action.clone(), body));
    if action == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    if action == "closeRentalMenu" {
        return (StatusCode::OK, "ok".to_string());
    }
    (StatusCode::OK, json!({"accepted": action}).to_string())
}

async fn push_events(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        let frames = [
            json!({"action": "openRentalMenu", "data": {"seq": 1}}).to_string(),
            "not json".to_string(),
            json!({"action": "openRentalMenu", "data": {"seq": 2}}).to_string(),
        ];
        for frame in frames {
            if socket.send(WsMessage::Text(frame)).await.is_err() {
                return;
            }
        }
        let _ = socket.send(WsMessage::Close(None)).await;
    })
}

async fn spawn_host() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/events", get(push_events))
        .route("/:action", post(record_action))
        .with_state(Arc::clone(&received));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("127.0.0.1:{}", addr.port()), received)
}

#[test]
fn action_names_become_single_path_segments() {
    let bridge = HttpBridge::new("http://127.0.0.1:3000/rental/").expect("bridge");
    let url = bridge.action_url("rental:rentVehicle").expect("url");
    assert_eq!(url.path_segments().expect("segments").count(), 2);
    assert!(url.path().starts_with("/rental/rental"));
}

#[test]
fn rejects_unusable_base_urls() {
    assert!(HttpBridge::new("not a url").is_err());
    assert!(HttpBridge::new("mailto:host@example.com").is_err());
}

#[tokio::test]
async fn posts_payload_and_decodes_reply() {
    let (addr, received) = spawn_host().await;
    let bridge = HttpBridge::new(&format!("http://{addr}")).expect("bridge");

    let reply = bridge
        .request("rental:rentVehicle", Some(json!({"model": "BMX"})))
        .await
        .expect("reply");
    assert_eq!(reply, json!({"accepted": "rental:rentVehicle"}));

    let received = received.lock().expect("received lock").clone();
    assert_eq!(
        received,
        vec![("rental:rentVehicle".to_string(), json!({"model": "BMX"}))]
    );
}

#[tokio::test]
async fn missing_payload_is_sent_as_empty_object_and_text_reply_kept() {
    let (addr, received) = spawn_host().await;
    let bridge = HttpBridge::new(&format!("http://{addr}/")).expect("bridge");

    let reply = bridge.request("closeRentalMenu", None).await.expect("reply");
    assert_eq!(reply, json!("ok"));
    assert_eq!(received.lock().expect("received lock")[0].1, json!({}));
}

#[tokio::test]
async fn error_status_is_a_transport_failure() {
    let (addr, _) = spawn_host().await;
    let bridge = HttpBridge::new(&format!("http://{addr}")).expect("bridge");

    assert_eq!(
        bridge.request("broken", None).await,
        Err(BridgeError::Status {
            action: "broken".to_string(),
            status: 500
        })
    );
}

#[tokio::test]
async fn unreachable_host_rejects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let bridge = HttpBridge::new(&format!("http://{addr}")).expect("bridge");
    let err = bridge
        .request("closeRentalMenu", None)
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, BridgeError::Transport(_)));
}

#[tokio::test]
async fn event_stream_dispatches_frames_and_skips_garbage() {
    let (addr, _) = spawn_host().await;
    let bridge = HttpBridge::new(&format!("http://{addr}")).expect("bridge");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = bridge.subscribe(
        "openRentalMenu",
        Arc::new(move |payload: &Value| {
            sink.lock().expect("seen lock").push(payload["seq"].clone());
        }),
    );

    bridge
        .run_event_stream(&format!("ws://{addr}/events"))
        .await
        .expect("stream ends cleanly");

    assert_eq!(*seen.lock().expect("seen lock"), vec![json!(1), json!(2)]);
}

#[test]
fn deliver_reports_undecodable_frames() {
    let bridge = HttpBridge::new("http://127.0.0.1:1").expect("bridge");
    assert!(matches!(bridge.deliver("{"), Err(BridgeError::Decode(_))));
    assert_eq!(
        bridge
            .deliver(r#"{"action":"openRentalMenu","data":{}}"#)
            .expect("decodes"),
        0
    );
}
