//! End-to-end tests over a real listener and WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use classroom_chat::config::CHANNEL_BUFFER_SIZE;
use classroom_chat::health::HEALTH_BODY;
use classroom_chat::{serve, topic_rooms, ChatServer, Server, DEFAULT_TOPICS, WS_PATH};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Start a server on an ephemeral port
async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let chat = ChatServer::new(topic_rooms(DEFAULT_TOPICS.iter().copied()));
    tokio::spawn(Server::new(chat, cmd_rx).run());
    tokio::spawn(serve(listener, cmd_tx));

    addr
}

async fn connect(addr: SocketAddr) -> (Ws, String) {
    let (mut ws, _) = connect_async(format!("ws://{}{}", addr, WS_PATH)).await.unwrap();
    let connected = wait_for(&mut ws, "connected").await;
    let socket_id = connected["socketId"].as_str().unwrap().to_string();
    (ws, socket_id)
}

async fn emit(ws: &mut Ws, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Skip events until one named `event` arrives, returning its data
async fn wait_for(ws: &mut Ws, event: &str) -> Value {
    timeout(WAIT, async {
        loop {
            let frame = ws.next().await.expect("stream ended").expect("websocket error");
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["event"] == event {
                    return value["data"].clone();
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for '{}'", event))
}

async fn register(ws: &mut Ws, id_card: &str, username: &str, role: &str) {
    emit(ws, "register", json!({ "idCard": id_card, "username": username, "role": role })).await;
}

async fn room_id(ws: &mut Ws, name: &str) -> String {
    emit(ws, "getStats", Value::Null).await;
    let stats = wait_for(ws, "statsLoaded").await;
    stats["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .and_then(|r| r["id"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_topic_message_reaches_other_member() {
    let addr = start_server().await;

    let (mut student, _) = connect(addr).await;
    register(&mut student, "S1", "Ani", "SISWA").await;

    let (mut teacher, teacher_socket) = connect(addr).await;
    register(&mut teacher, "T1", "Bu Sari", "GURU").await;

    let online = wait_for(&mut student, "teacherOnline").await;
    assert_eq!(online["user"]["idCard"], "T1");
    assert_eq!(online["socketId"], teacher_socket.as_str());

    let math = room_id(&mut teacher, "Matematika").await;
    emit(&mut teacher, "join", json!(math)).await;
    wait_for(&mut teacher, "joined").await;

    emit(&mut student, "join", json!(math)).await;
    let joined = wait_for(&mut student, "joined").await;
    assert_eq!(joined["users"].as_array().unwrap().len(), 2);

    emit(
        &mut student,
        "sendMessage",
        json!({ "roomId": math, "message": { "type": "text", "text": "hi" } }),
    )
    .await;

    let message = wait_for(&mut teacher, "message").await;
    assert_eq!(message["text"], "hi");
    assert_eq!(message["sender"]["idCard"], "S1");

    let updated = wait_for(&mut teacher, "roomUpdated").await;
    let room = updated["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == math.as_str())
        .unwrap()
        .clone();
    assert_eq!(room["lastMessage"]["text"], "hi");
}

#[tokio::test]
async fn test_private_message_and_offline_notice() {
    let addr = start_server().await;

    let (mut student, _) = connect(addr).await;
    register(&mut student, "S1", "Ani", "SISWA").await;
    let (mut teacher, _) = connect(addr).await;
    register(&mut teacher, "T1", "Bu Sari", "BK").await;
    wait_for(&mut student, "teacherOnline").await;

    emit(
        &mut student,
        "sendPrivateMessage",
        json!({
            "message": { "type": "text", "text": "boleh konsultasi?" },
            "opponent": { "idCard": "T1", "name": "Bu Sari", "role": "BK" }
        }),
    )
    .await;

    let got = wait_for(&mut teacher, "gotPrivateMessage").await;
    assert_eq!(got["message"]["text"], "boleh konsultasi?");
    assert_eq!(got["user"]["idCard"], "S1");

    let updated = wait_for(&mut teacher, "roomUpdated").await;
    let private = updated["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["type"] == "Messages")
        .unwrap()
        .clone();
    assert_eq!(private["id"], "S1");
    assert_eq!(private["unreadCount"], 1);

    teacher.close(None).await.unwrap();

    let offline = wait_for(&mut student, "teacherOffline").await;
    assert_eq!(offline["idCard"], "T1");
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start_server().await;

    let (mut ws, _) = connect(addr).await;
    ws.send(Message::Text("not json".to_string().into())).await.unwrap();
    emit(&mut ws, "register", json!({ "username": "no id card" })).await;
    register(&mut ws, "S1", "Ani", "SISWA").await;

    let stats_rooms = {
        emit(&mut ws, "getStats", Value::Null).await;
        wait_for(&mut ws, "statsLoaded").await
    };
    assert_eq!(stats_rooms["rooms"].as_array().unwrap().len(), DEFAULT_TOPICS.len());
}

/// Read a full HTTP response; the request asks the server to close
async fn read_response(stream: &mut TcpStream) -> String {
    let mut response = String::new();
    timeout(WAIT, stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();
    response
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let addr = start_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with(HEALTH_BODY));
}

#[tokio::test]
async fn test_liveness_request_split_across_writes() {
    let addr = start_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\nHost: loc").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    stream
        .write_all(b"alhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with(HEALTH_BODY));
}

#[tokio::test]
async fn test_liveness_request_with_large_header() {
    let addr = start_server().await;

    let cookie = "a".repeat(8 * 1024);
    let request = format!(
        "GET / HTTP/1.1\r\nHost: localhost\r\nCookie: session={}\r\nConnection: close\r\n\r\n",
        cookie
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with(HEALTH_BODY));
}
