//! Integration tests for the relay server: Init, seating, turns, finish,
//! and the pairing endpoint.

use std::sync::Arc;
use std::time::Duration;

use boardlink::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn f(row: u8, col: u8) -> Field {
    Field::new(row, col).unwrap()
}

/// Starts a relay on a random port and returns its address and lobby.
async fn start_server_with(builder: ServerBuilder, referee: FreeplayReferee) -> (String, Arc<Lobby>) {
    let server = builder
        .bind("127.0.0.1:0")
        .build(referee)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let lobby = server.lobby();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, lobby)
}

async fn start_server() -> (String, Arc<Lobby>) {
    start_server_with(ServerBuilder::new(), FreeplayReferee::new()).await
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: &Message) {
    ws.send(WsMessage::Binary(msg.encode().into()))
        .await
        .expect("send");
}

/// Next decoded message, or `None` if the server closed the connection.
async fn recv(ws: &mut ClientWs) -> Option<Message> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame");
        match frame {
            Some(Ok(WsMessage::Binary(data))) => {
                return Some(Message::decode(&data).expect("decode"));
            }
            Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

async fn join(addr: &str, session_id: &str) -> (ClientWs, Color) {
    let mut ws = connect(addr).await;
    send(
        &mut ws,
        &Message::Init {
            session_id: session_id.into(),
        },
    )
    .await;
    match recv(&mut ws).await {
        Some(Message::Assign { color }) => (ws, color),
        other => panic!("expected Assign, got {other:?}"),
    }
}

/// A provisioned table with both seats taken: (white, black).
async fn seated_pair(addr: &str, lobby: &Lobby) -> (ClientWs, ClientWs) {
    let id = lobby.provision().await.unwrap();
    let (white, c1) = join(addr, &id).await;
    let (black, c2) = join(addr, &id).await;
    assert_eq!(c1, Color::White);
    assert_eq!(c2, Color::Black);
    (white, black)
}

// =========================================================================
// Init and seating
// =========================================================================

#[tokio::test]
async fn test_init_unknown_session_closes_connection() {
    let (addr, _lobby) = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &Message::Init {
            session_id: "nobody-home".into(),
        },
    )
    .await;

    assert_eq!(recv(&mut ws).await, None);
}

#[tokio::test]
async fn test_init_provisioned_pair_gets_both_colors() {
    let (addr, lobby) = start_server().await;
    let first = lobby.provision().await.unwrap();
    let second = lobby.provision().await.unwrap();
    assert_eq!(first, second);

    let (_a, color_a) = join(&addr, &first).await;
    let (_b, color_b) = join(&addr, &second).await;

    assert_eq!(color_a, Color::White);
    assert_eq!(color_b, Color::Black);
}

#[tokio::test]
async fn test_init_first_to_move_configurable() {
    let (addr, lobby) =
        start_server_with(ServerBuilder::new().first_to_move(Color::Black), FreeplayReferee::new())
            .await;
    let id = lobby.provision().await.unwrap();

    let (_ws, color) = join(&addr, &id).await;

    assert_eq!(color, Color::Black);
}

#[tokio::test]
async fn test_messages_before_init_ignored() {
    let (addr, lobby) = start_server().await;
    let id = lobby.provision().await.unwrap();
    let mut ws = connect(&addr).await;

    ws.send(WsMessage::Binary(vec![9, 9, 9].into()))
        .await
        .expect("send");
    send(
        &mut ws,
        &Message::HintRequest {
            src: f(6, 0),
            player: Color::White,
        },
    )
    .await;
    send(&mut ws, &Message::Init { session_id: id }).await;

    assert_eq!(
        recv(&mut ws).await,
        Some(Message::Assign {
            color: Color::White
        })
    );
}

#[tokio::test]
async fn test_init_timeout_closes_connection() {
    let (addr, _lobby) = start_server_with(
        ServerBuilder::new().init_timeout(Duration::from_millis(100)),
        FreeplayReferee::new(),
    )
    .await;
    let mut ws = connect(&addr).await;

    assert_eq!(recv(&mut ws).await, None);
}

#[tokio::test]
async fn test_third_connection_refused() {
    let (addr, lobby) = start_server().await;
    let id = lobby.provision().await.unwrap();
    let (_white, _) = join(&addr, &id).await;
    let (_black, _) = join(&addr, &id).await;

    let mut third = connect(&addr).await;
    send(&mut third, &Message::Init { session_id: id }).await;

    assert_eq!(recv(&mut third).await, None);
}

#[tokio::test]
async fn test_reconnect_after_clean_close_finds_seat_vacant() {
    let (addr, lobby) = start_server().await;
    let id = lobby.provision().await.unwrap();
    let (mut white, _) = join(&addr, &id).await;
    let (_black, _) = join(&addr, &id).await;

    white.close(None).await.expect("close");
    // The server's close reply only goes out once the seat is free.
    while let Ok(Some(Ok(_))) = tokio::time::timeout(Duration::from_secs(2), white.next()).await {}

    let (_again, color) = join(&addr, &id).await;
    assert_eq!(color, Color::White);
}

#[tokio::test]
async fn test_reconnect_takes_vacant_seat() {
    let (addr, lobby) = start_server().await;
    let id = lobby.provision().await.unwrap();
    let (white, _) = join(&addr, &id).await;
    let (_black, _) = join(&addr, &id).await;

    drop(white);
    // The seat is vacated asynchronously after the socket goes away.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (_again, color) = join(&addr, &id).await;
    assert_eq!(color, Color::White);
}

// =========================================================================
// Hints and moves
// =========================================================================

#[tokio::test]
async fn test_hint_request_answered_to_requester_only() {
    let (addr, lobby) = start_server().await;
    let (mut white, mut black) = seated_pair(&addr, &lobby).await;

    send(
        &mut white,
        &Message::HintRequest {
            src: f(6, 0),
            player: Color::White,
        },
    )
    .await;

    match recv(&mut white).await {
        Some(Message::Hint { fields }) => {
            assert_eq!(fields.len(), 63);
            assert!(!fields.contains(&f(6, 0)));
        }
        other => panic!("expected Hint, got {other:?}"),
    }
    assert_silent(&mut black).await;
}

#[tokio::test]
async fn test_move_broadcast_to_both_seats() {
    let (addr, lobby) = start_server().await;
    let (mut white, mut black) = seated_pair(&addr, &lobby).await;
    let mv = Message::Move {
        mv: Move::new(f(6, 4), f(4, 4), Action::Replace),
        player: Color::White,
    };

    send(&mut white, &mv).await;

    assert_eq!(recv(&mut white).await, Some(mv.clone()));
    assert_eq!(recv(&mut black).await, Some(mv));
}

#[tokio::test]
async fn test_move_while_opponent_away_dropped() {
    let (addr, lobby) = start_server().await;
    let id = lobby.provision().await.unwrap();
    let (mut white, _) = join(&addr, &id).await;

    let mv = Message::Move {
        mv: Move::new(f(6, 0), f(4, 0), Action::Replace),
        player: Color::White,
    };
    send(&mut white, &mv).await;
    assert_silent(&mut white).await;

    // Once black sits down the same move is played and both see it.
    let (mut black, _) = join(&addr, &id).await;
    send(&mut white, &mv).await;
    assert_eq!(recv(&mut white).await, Some(mv.clone()));
    assert_eq!(recv(&mut black).await, Some(mv));
}

#[tokio::test]
async fn test_out_of_turn_move_dropped() {
    let (addr, lobby) = start_server().await;
    let (mut white, mut black) = seated_pair(&addr, &lobby).await;

    send(
        &mut black,
        &Message::Move {
            mv: Move::new(f(1, 0), f(2, 0), Action::Replace),
            player: Color::Black,
        },
    )
    .await;
    assert_silent(&mut white).await;

    // White's move still goes through; it's the first thing black sees.
    let mv = Message::Move {
        mv: Move::new(f(6, 0), f(5, 0), Action::Replace),
        player: Color::White,
    };
    send(&mut white, &mv).await;
    assert_eq!(recv(&mut black).await, Some(mv));
}

#[tokio::test]
async fn test_move_with_wrong_action_dropped() {
    let (addr, lobby) = start_server().await;
    let (mut white, _black) = seated_pair(&addr, &lobby).await;

    // (7,0) holds White's own piece, so only a Swap is accepted.
    send(
        &mut white,
        &Message::Move {
            mv: Move::new(f(6, 0), f(7, 0), Action::Replace),
            player: Color::White,
        },
    )
    .await;

    assert_silent(&mut white).await;
}

#[tokio::test]
async fn test_undecodable_frame_ignored() {
    let (addr, lobby) = start_server().await;
    let (mut white, _black) = seated_pair(&addr, &lobby).await;

    white
        .send(WsMessage::Binary(vec![2, 6, 0].into()))
        .await
        .expect("send");
    let mv = Message::Move {
        mv: Move::new(f(6, 1), f(5, 1), Action::Replace),
        player: Color::White,
    };
    send(&mut white, &mv).await;

    assert_eq!(recv(&mut white).await, Some(mv));
}

// =========================================================================
// Finish
// =========================================================================

#[tokio::test]
async fn test_outcome_broadcasts_finish_and_closes() {
    let (addr, lobby) =
        start_server_with(ServerBuilder::new(), FreeplayReferee::with_move_limit(2)).await;
    let (mut white, mut black) = seated_pair(&addr, &lobby).await;

    send(
        &mut white,
        &Message::Move {
            mv: Move::new(f(6, 4), f(4, 4), Action::Replace),
            player: Color::White,
        },
    )
    .await;
    recv(&mut white).await;
    recv(&mut black).await;

    send(
        &mut black,
        &Message::Move {
            mv: Move::new(f(1, 4), f(3, 4), Action::Replace),
            player: Color::Black,
        },
    )
    .await;

    for ws in [&mut white, &mut black] {
        assert!(matches!(recv(ws).await, Some(Message::Move { .. })));
        assert_eq!(
            recv(ws).await,
            Some(Message::Finish {
                result: GameResult::Draw
            })
        );
        assert_eq!(recv(ws).await, None);
    }
    assert!(lobby.is_empty().await);
}

/// Reads until the server closes the connection.
async fn drain_until_closed(ws: &mut ClientWs) {
    while recv(ws).await.is_some() {}
}

#[tokio::test]
async fn test_named_table_hosts_consecutive_games() {
    let (addr, lobby) =
        start_server_with(ServerBuilder::new(), FreeplayReferee::with_move_limit(1)).await;
    lobby.open_table("club").await;

    for _ in 0..2 {
        let (mut white, c1) = join(&addr, "club").await;
        let (mut black, c2) = join(&addr, "club").await;
        assert_eq!((c1, c2), (Color::White, Color::Black));

        send(
            &mut white,
            &Message::Move {
                mv: Move::new(f(6, 4), f(4, 4), Action::Replace),
                player: Color::White,
            },
        )
        .await;

        for ws in [&mut white, &mut black] {
            assert!(matches!(recv(ws).await, Some(Message::Move { .. })));
            assert_eq!(
                recv(ws).await,
                Some(Message::Finish {
                    result: GameResult::Draw
                })
            );
        }
        // White's handler resets the table before closing its socket.
        drain_until_closed(&mut white).await;
        drain_until_closed(&mut black).await;
    }
    assert_eq!(lobby.len().await, 1);
}

// =========================================================================
// Pairing endpoint
// =========================================================================

#[tokio::test]
async fn test_pairing_endpoint_pairs_two_clients() {
    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .pairing("127.0.0.1:0")
        .build(FreeplayReferee::new())
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap().to_string();
    let pairing = server.pairing_addr().expect("pairing endpoint bound");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let provisioner = HttpProvisioner::new(format!("http://{pairing}/game"));
    let first = provisioner.provision().await.unwrap();
    let second = provisioner.provision().await.unwrap();
    let third = provisioner.provision().await.unwrap();
    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(first.len(), 32);

    let (_a, color_a) = join(&addr, &first).await;
    let (_b, color_b) = join(&addr, &second).await;
    assert_eq!((color_a, color_b), (Color::White, Color::Black));
}

#[tokio::test]
async fn test_server_without_pairing_has_no_endpoint() {
    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(FreeplayReferee::new())
        .await
        .unwrap();
    assert_eq!(server.pairing_addr(), None);
}
