use boardlink::prelude::*;

// ---------------------------------------------------------------------------
// Referee
// ---------------------------------------------------------------------------

/// Every piece moves like a king: one step in any direction. Stepping onto
/// an opponent captures it, onto a friend swaps the two. A side with no
/// pieces left has lost.
struct KingStep;

impl Referee for KingStep {
    fn destinations(&self, board: &Board, src: Field, player: Color) -> Vec<Field> {
        if board.color_at(src) != Some(player) {
            return Vec::new();
        }
        let (row, col) = (i16::from(src.row()), i16::from(src.col()));
        let mut out = Vec::new();
        for dr in -1..=1 {
            for dc in -1..=1 {
                if (dr, dc) == (0, 0) {
                    continue;
                }
                let (r, c) = (row + dr, col + dc);
                if let (Ok(r), Ok(c)) = (u8::try_from(r), u8::try_from(c)) {
                    out.extend(Field::new(r, c));
                }
            }
        }
        out
    }

    fn outcome(&self, board: &Board, _moves_played: usize) -> Option<GameResult> {
        match (board.count(Color::Black), board.count(Color::White)) {
            (0, 0) => Some(GameResult::Draw),
            (0, _) => Some(GameResult::WhiteWin),
            (_, 0) => Some(GameResult::BlackWin),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), BoardlinkError> {
    boardlink::init_tracing();

    let addr = std::env::var("BOARDLINK_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let pairing =
        std::env::var("BOARDLINK_PAIRING_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".into());
    let session = std::env::var("BOARDLINK_SESSION").unwrap_or_else(|_| "demo".into());

    let server = ServerBuilder::new()
        .bind(&addr)
        .pairing(&pairing)
        .build(KingStep)
        .await?;

    // Clients that set BOARDLINK_SESSION skip pairing and meet here.
    server.lobby().open_table(session.as_str()).await;
    tracing::info!(%addr, %pairing, %session, "relay ready");

    server.run().await
}
