//! End-to-end runs of `ClientBuilder` against a loopback game server.

use std::time::Duration;

use cellarena::Record;
use cellarena::prelude::*;
use cellarena::protocol::{
    Camera, Cell, CellId, Codec, Color, CoordWidth, JsonCodec, Screen, Status, encode_message,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<tokio::net::TcpStream>;

fn frame(message: &Message) -> WsMessage {
    WsMessage::Binary(encode_message(message, CoordWidth::I32).into())
}

fn cell(id: u32, x: i32, y: i32, size: i16) -> Cell {
    Cell {
        id: CellId(id),
        x,
        y,
        size,
        color: Color::new(1, 2, 3),
        is_virus: false,
        name: None,
    }
}

fn field() -> Message {
    let screen = Screen {
        x1: 0.0,
        y1: 0.0,
        x2: 1000.0,
        y2: 1000.0,
    };
    Message::ScreenAndCamera {
        screen,
        camera: Camera::centered_on(&screen),
    }
}

/// Accepts one client and consumes its three handshake frames.
async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    for _ in 0..3 {
        ws.next().await.unwrap().unwrap();
    }
    ws
}

/// Next binary frame from the client, skipping control frames.
async fn next_command(ws: &mut ServerSocket) -> Vec<u8> {
    loop {
        match ws.next().await.unwrap().unwrap() {
            WsMessage::Binary(data) => return data.to_vec(),
            _ => continue,
        }
    }
}

async fn listener() -> (TcpListener, StaticLookup) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let lookup = StaticLookup::new(ServerTicket::new(addr.to_string(), "tok"));
    (listener, lookup)
}

#[tokio::test]
async fn test_bot_spawns_moves_and_records() {
    let (listener, lookup) = listener().await;
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("bot.jsonl");

    let client = ClientBuilder::new()
        .nickname("zz")
        .mode(Mode::Bot(BotKind::Greedy))
        .record_to(&recording)
        .log_messages(true);
    let run = tokio::spawn(client.run(lookup, WebSocketConnector::new()));

    let mut ws = timeout(WAIT, accept(&listener)).await.unwrap();

    // A fresh play field: the bot has no cell yet and must spawn.
    ws.send(frame(&field())).await.unwrap();
    let spawn = timeout(WAIT, next_command(&mut ws)).await.unwrap();
    assert_eq!(spawn, vec![0, b'z', 0, b'z', 0]);

    ws.send(frame(&Message::PlayerIdentity(CellId(1)))).await.unwrap();
    ws.send(frame(&Message::Status(Status {
        cells: vec![cell(1, 0, 0, 100), cell(2, 40, 30, 20)],
        ..Status::default()
    })))
    .await
    .unwrap();

    let movement = timeout(WAIT, next_command(&mut ws)).await.unwrap();
    assert_eq!(movement[0], 16);
    assert_eq!(&movement[1..9], &40.0f64.to_le_bytes());
    assert_eq!(&movement[9..17], &30.0f64.to_le_bytes());

    // The recorder drains its own queue; give it time to catch up.
    let text = timeout(WAIT, async {
        loop {
            let text = std::fs::read_to_string(&recording).unwrap_or_default();
            if text.matches('\n').count() >= 3 {
                return text;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    run.abort();

    let recorded: Vec<Message> = text
        .lines()
        .map(|line| JsonCodec.decode::<Record>(line.as_bytes()).unwrap().message)
        .collect();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0], field());
    assert_eq!(recorded[1], Message::PlayerIdentity(CellId(1)));
    assert!(matches!(recorded[2], Message::Status(_)));
}

#[tokio::test]
async fn test_spectate_is_sent_after_delay() {
    let (listener, lookup) = listener().await;
    let config = SessionConfig::default().with_spectate_delay(Duration::from_millis(20));
    let client = ClientBuilder::new()
        .session_config(config)
        .mode(Mode::Spectate);
    let run = tokio::spawn(client.run(lookup, WebSocketConnector::new()));

    let mut ws = timeout(WAIT, accept(&listener)).await.unwrap();
    let command = timeout(WAIT, next_command(&mut ws)).await.unwrap();
    assert_eq!(command, vec![1]);

    run.abort();
}

#[tokio::test]
async fn test_spectate_is_repeated_on_every_connection() {
    let (listener, lookup) = listener().await;
    let config = SessionConfig::default()
        .with_spectate_delay(Duration::from_millis(10))
        .with_reconnect_pause(Duration::from_millis(1), Duration::ZERO);
    let client = ClientBuilder::new()
        .session_config(config)
        .mode(Mode::Spectate);
    let run = tokio::spawn(client.run(lookup, WebSocketConnector::new()));

    for _ in 0..3 {
        let mut ws = timeout(WAIT, accept(&listener)).await.unwrap();
        let command = timeout(WAIT, next_command(&mut ws)).await.unwrap();
        assert_eq!(command, vec![1]);
        // Drop the connection as soon as the request lands.
        ws.close(None).await.unwrap();
    }

    run.abort();
}

#[tokio::test]
async fn test_fatal_session_error_ends_run() {
    let (listener, lookup) = listener().await;
    drop(listener);

    let outcome = timeout(
        WAIT,
        ClientBuilder::new().run(lookup, WebSocketConnector::new()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.name, "session");
    assert!(matches!(outcome.result, Err(CellArenaError::Session(_))));
}

#[tokio::test]
async fn test_replay_re_records_every_message() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("original.jsonl");
    let copy = dir.path().join("copy.jsonl");

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    for id in 1..=5 {
        tx.send(Message::PlayerIdentity(CellId(id))).unwrap();
    }
    drop(tx);
    Recorder::new(&original, rx).run().await.unwrap();

    let outcome = timeout(
        WAIT,
        ClientBuilder::new()
            .record_to(&copy)
            .replay(&original, ReplayConfig::default().with_speed(0.0)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.name, "replay");
    assert!(outcome.is_ok());
    let copied = std::fs::read_to_string(&copy).unwrap();
    assert_eq!(copied.lines().count(), 5);
}
