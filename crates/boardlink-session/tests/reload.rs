//! A session survives a reload through a file-backed store.

use std::path::PathBuf;

use boardlink_game::{Board, InputEvent};
use boardlink_protocol::{Action, Color, Field, GameResult, Message, Move};
use boardlink_session::{FixedProvisioner, JsonFileStore, SessionManager, SessionStore};

fn f(row: u8, col: u8) -> Field {
    Field::new(row, col).unwrap()
}

fn state_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "boardlink-reload-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn confirm(session: &mut SessionManager<JsonFileStore>, mv: Move, player: Color) {
    let bytes = Message::Move { mv, player }.encode();
    session.handle_bytes(&bytes).unwrap();
}

#[tokio::test]
async fn test_reload_restores_board_color_and_session_id() {
    let dir = state_dir("restore");
    let moves = [
        (Move::new(f(6, 4), f(4, 4), Action::Replace), Color::White),
        (Move::new(f(1, 3), f(3, 3), Action::Replace), Color::Black),
        (Move::new(f(4, 4), f(3, 3), Action::Replace), Color::White),
        (Move::new(f(0, 4), f(0, 6), Action::Swap), Color::Black),
    ];

    let expected_board = {
        let mut session = SessionManager::restore(JsonFileStore::open(&dir).unwrap());
        let id = session
            .session_id(&FixedProvisioner::new("table-1"))
            .await
            .unwrap();
        assert_eq!(id, "table-1");

        session
            .handle_bytes(&Message::Assign { color: Color::White }.encode())
            .unwrap();
        for (mv, player) in moves {
            confirm(&mut session, mv, player);
        }
        session.board().clone()
    };

    let mut session = SessionManager::restore(JsonFileStore::open(&dir).unwrap());

    assert_eq!(session.board(), &expected_board);
    assert_eq!(session.moves_played(), 4);
    assert_eq!(session.color(), Some(Color::White));
    assert_eq!(
        session.init_message(),
        Some(Message::Init {
            session_id: "table-1".into()
        })
    );
    // The restored color is usable straight away.
    assert!(session.handle_input(InputEvent::primary(f(3, 3))).is_some());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_reload_after_finish_starts_a_new_session() {
    let dir = state_dir("finish");
    {
        let mut session = SessionManager::restore(JsonFileStore::open(&dir).unwrap());
        session
            .session_id(&FixedProvisioner::new("table-2"))
            .await
            .unwrap();
        session
            .handle_message(Message::Assign { color: Color::Black })
            .unwrap();
        confirm(
            &mut session,
            Move::new(f(6, 0), f(5, 0), Action::Replace),
            Color::White,
        );
        session
            .handle_message(Message::Finish {
                result: GameResult::BlackWin,
            })
            .unwrap();
    }

    let store = JsonFileStore::open(&dir).unwrap();
    assert_eq!(store.load_session_id().unwrap(), None);
    assert_eq!(store.load_history().unwrap(), None);
    assert_eq!(store.load_color().unwrap(), None);

    let session = SessionManager::restore(store);
    assert_eq!(session.board(), &Board::new());
    assert!(!session.is_terminal());
    assert!(session.init_message().is_none());

    let _ = std::fs::remove_dir_all(&dir);
}
