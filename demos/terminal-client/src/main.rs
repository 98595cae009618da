use boardlink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draws the board as text: `b`/`w` for pieces, `*` for hinted fields.
fn render(board: &[Placement], highlights: &[Field]) -> String {
    let mut cells = [['.'; 8]; 8];
    for p in board {
        cells[usize::from(p.field.row())][usize::from(p.field.col())] = match p.color {
            Color::Black => 'b',
            Color::White => 'w',
        };
    }
    for h in highlights {
        cells[usize::from(h.row())][usize::from(h.col())] = '*';
    }

    let mut out = String::from("  01234567\n");
    for (r, row) in cells.iter().enumerate() {
        out.push_str(&format!("{r} "));
        out.extend(row.iter());
        out.push('\n');
    }
    out
}

struct Terminal;

impl Renderer for Terminal {
    fn repaint(&mut self, board: &[Placement], highlights: &[Field]) {
        println!("{}", render(board, highlights));
    }

    fn assigned(&mut self, color: Color) {
        println!("you play {color}");
    }

    fn finished(&mut self, result: GameResult) {
        println!("game over: {result}");
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// `"r c"` selects or targets a field, `"x"` cancels the selection.
fn parse_command(line: &str) -> Option<InputEvent> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "x" => Field::new(0, 0).map(InputEvent::secondary),
        row => {
            let row: u8 = row.parse().ok()?;
            let col: u8 = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Field::new(row, col).map(InputEvent::primary)
        }
    }
}

async fn read_stdin(tx: mpsc::UnboundedSender<InputEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Some(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            None => println!("enter `row col` (0-7) or `x`"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), BoardlinkError> {
    boardlink::init_tracing();

    let url = std::env::var("BOARDLINK_URL").unwrap_or_else(|_| ClientConfig::default().url);
    let pairing_url = std::env::var("BOARDLINK_PAIRING_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8001/game".into());
    let state_dir =
        std::env::var("BOARDLINK_STATE_DIR").unwrap_or_else(|_| ".boardlink".into());

    let store = JsonFileStore::open(&state_dir)?;
    let mut builder = ClientBuilder::new().url(&url);
    // A named session skips pairing.
    if let Ok(session) = std::env::var("BOARDLINK_SESSION") {
        builder = builder.session_id(session.as_str());
    }
    let mut client = builder.build(store, HttpProvisioner::new(pairing_url));

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(read_stdin(tx));

    match client.run(&mut Terminal, rx).await? {
        Some(result) => tracing::info!(%result, "finished"),
        None => tracing::info!("disconnected before the game ended"),
    }
    Ok(())
}
