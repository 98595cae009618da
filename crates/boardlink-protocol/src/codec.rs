//! The binary wire codec.
//!
//! Every message is one buffer. The first byte is the kind tag, the rest is
//! a kind-specific payload:
//!
//! ```text
//! tag  kind         direction  payload
//! ---  -----------  ---------  -----------------------------------------
//!  0   Init         c → s      UTF-8 session id (rest of buffer)
//!  1   Assign       s → c      color
//!  2   Move         both       src.row src.col dst.row dst.col action player
//!  3   Finish       s → c      result
//!  4   HintRequest  c → s      src.row src.col player
//!  5   Hint         s → c      (row col)*, zero or more pairs
//! ```
//!
//! There are no length prefixes. Variable payloads (`Init`, `Hint`) run to
//! the end of the buffer; the others have a fixed size and anything extra
//! is rejected.

use std::fmt;

use crate::{Action, Color, Field, GameResult, Move, ProtocolError};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The six message kinds, with their tag bytes as discriminants.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Init = 0,
    Assign = 1,
    Move = 2,
    Finish = 3,
    HintRequest = 4,
    Hint = 5,
}

impl MessageKind {
    /// The tag byte that starts every buffer of this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by its tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Init),
            1 => Some(Self::Assign),
            2 => Some(Self::Move),
            3 => Some(Self::Finish),
            4 => Some(Self::HintRequest),
            5 => Some(Self::Hint),
            _ => None,
        }
    }

    /// Which side is allowed to send this kind.
    pub fn direction(self) -> Direction {
        match self {
            Self::Init | Self::HintRequest => Direction::ClientToServer,
            Self::Assign | Self::Finish | Self::Hint => {
                Direction::ServerToClient
            }
            Self::Move => Direction::Both,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Assign => "Assign",
            Self::Move => "Move",
            Self::Finish => "Finish",
            Self::HintRequest => "HintRequest",
            Self::Hint => "Hint",
        };
        f.write_str(name)
    }
}

/// Who may send a given message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
    Both,
}

impl Direction {
    /// Returns `true` if a client may receive messages flowing this way.
    pub fn reaches_client(self) -> bool {
        matches!(self, Self::ServerToClient | Self::Both)
    }

    /// Returns `true` if a server may receive messages flowing this way.
    pub fn reaches_server(self) -> bool {
        matches!(self, Self::ClientToServer | Self::Both)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded protocol message.
///
/// This is a closed set: receivers `match` on it exhaustively, so adding a
/// kind is a compile error everywhere it isn't handled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client → server: "I belong to this session."
    Init { session_id: String },

    /// Server → client: "You play this color."
    Assign { color: Color },

    /// Both ways: a move proposal (client) or a confirmed move (server).
    Move { mv: Move, player: Color },

    /// Server → client: "The game is over."
    Finish { result: GameResult },

    /// Client → server: "Where can the piece on `src` go?"
    HintRequest { src: Field, player: Color },

    /// Server → client: legal destinations for the last hint request.
    Hint { fields: Vec<Field> },
}

/// Payload sizes of the fixed-layout kinds.
const ASSIGN_LEN: usize = 1;
const MOVE_LEN: usize = 6;
const FINISH_LEN: usize = 1;
const HINT_REQUEST_LEN: usize = 3;

impl Message {
    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Init { .. } => MessageKind::Init,
            Self::Assign { .. } => MessageKind::Assign,
            Self::Move { .. } => MessageKind::Move,
            Self::Finish { .. } => MessageKind::Finish,
            Self::HintRequest { .. } => MessageKind::HintRequest,
            Self::Hint { .. } => MessageKind::Hint,
        }
    }

    /// Encodes this message into a single wire buffer.
    ///
    /// Infallible: every `Field` is range-checked when it is built, and the
    /// enums only have valid byte values.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![self.kind().tag()];
        match self {
            Self::Init { session_id } => {
                buf.extend_from_slice(session_id.as_bytes());
            }
            Self::Assign { color } => buf.push(color.to_byte()),
            Self::Move { mv, player } => {
                buf.extend_from_slice(&[
                    mv.src.row(),
                    mv.src.col(),
                    mv.dst.row(),
                    mv.dst.col(),
                    mv.action.to_byte(),
                    player.to_byte(),
                ]);
            }
            Self::Finish { result } => buf.push(result.to_byte()),
            Self::HintRequest { src, player } => {
                buf.extend_from_slice(&[src.row(), src.col(), player.to_byte()]);
            }
            Self::Hint { fields } => {
                buf.reserve(fields.len() * 2);
                for field in fields {
                    buf.push(field.row());
                    buf.push(field.col());
                }
            }
        }
        buf
    }

    /// Decodes one wire buffer.
    ///
    /// Total over any input: every malformed buffer (empty, unknown tag,
    /// truncated, trailing garbage, out-of-range values) comes back as a
    /// [`ProtocolError`], never a panic.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let (&tag, payload) =
            data.split_first().ok_or(ProtocolError::Empty)?;
        let kind =
            MessageKind::from_tag(tag).ok_or(ProtocolError::UnknownTag(tag))?;

        match kind {
            MessageKind::Init => {
                let session_id = std::str::from_utf8(payload)
                    .map_err(|_| ProtocolError::InvalidUtf8)?;
                Ok(Self::Init {
                    session_id: session_id.to_owned(),
                })
            }
            MessageKind::Assign => {
                let p = fixed(kind, payload, ASSIGN_LEN)?;
                Ok(Self::Assign { color: color(p[0])? })
            }
            MessageKind::Move => {
                let p = fixed(kind, payload, MOVE_LEN)?;
                let action = Action::from_byte(p[4])
                    .ok_or(ProtocolError::InvalidAction(p[4]))?;
                Ok(Self::Move {
                    mv: Move::new(field(p[0], p[1])?, field(p[2], p[3])?, action),
                    player: color(p[5])?,
                })
            }
            MessageKind::Finish => {
                let p = fixed(kind, payload, FINISH_LEN)?;
                let result = GameResult::from_byte(p[0])
                    .ok_or(ProtocolError::InvalidResult(p[0]))?;
                Ok(Self::Finish { result })
            }
            MessageKind::HintRequest => {
                let p = fixed(kind, payload, HINT_REQUEST_LEN)?;
                Ok(Self::HintRequest {
                    src: field(p[0], p[1])?,
                    player: color(p[2])?,
                })
            }
            MessageKind::Hint => {
                // An odd length means the last pair lost its column.
                if payload.len() % 2 != 0 {
                    return Err(ProtocolError::Truncated {
                        kind,
                        expected: payload.len() + 1,
                        actual: payload.len(),
                    });
                }
                let fields = payload
                    .chunks_exact(2)
                    .map(|pair| field(pair[0], pair[1]))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Hint { fields })
            }
        }
    }
}

/// Checks that a fixed-layout payload has exactly `len` bytes.
fn fixed(
    kind: MessageKind,
    payload: &[u8],
    len: usize,
) -> Result<&[u8], ProtocolError> {
    if payload.len() < len {
        return Err(ProtocolError::Truncated {
            kind,
            expected: len,
            actual: payload.len(),
        });
    }
    if payload.len() > len {
        return Err(ProtocolError::TrailingBytes {
            kind,
            extra: payload.len() - len,
        });
    }
    Ok(payload)
}

fn field(row: u8, col: u8) -> Result<Field, ProtocolError> {
    Field::new(row, col).ok_or(ProtocolError::InvalidField { row, col })
}

fn color(byte: u8) -> Result<Color, ProtocolError> {
    Color::from_byte(byte).ok_or(ProtocolError::InvalidColor(byte))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Byte-level tests for the codec.
    //!
    //! The layouts are a compatibility contract with the other side of the
    //! socket, so most of these pin exact bytes rather than only checking
    //! that decode undoes encode.

    use super::*;

    fn f(row: u8, col: u8) -> Field {
        Field::new(row, col).unwrap()
    }

    // =====================================================================
    // encode()
    // =====================================================================

    #[test]
    fn test_encode_move_matches_wire_layout() {
        let msg = Message::Move {
            mv: Move::new(f(0, 0), f(0, 1), Action::Replace),
            player: Color::White,
        };
        assert_eq!(msg.encode(), vec![2, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_encode_swap_move_sets_action_byte() {
        let msg = Message::Move {
            mv: Move::new(f(7, 4), f(7, 7), Action::Swap),
            player: Color::Black,
        };
        assert_eq!(msg.encode(), vec![2, 7, 4, 7, 7, 1, 0]);
    }

    #[test]
    fn test_encode_hint_request_matches_wire_layout() {
        let msg = Message::HintRequest {
            src: f(6, 0),
            player: Color::White,
        };
        assert_eq!(msg.encode(), vec![4, 6, 0, 1]);
    }

    #[test]
    fn test_encode_init_appends_raw_utf8() {
        let msg = Message::Init {
            session_id: "ab12".into(),
        };
        assert_eq!(msg.encode(), vec![0, b'a', b'b', b'1', b'2']);
    }

    #[test]
    fn test_encode_empty_hint_is_just_the_tag() {
        let msg = Message::Hint { fields: vec![] };
        assert_eq!(msg.encode(), vec![5]);
    }

    #[test]
    fn test_encode_assign_and_finish() {
        assert_eq!(Message::Assign { color: Color::Black }.encode(), vec![1, 0]);
        assert_eq!(
            Message::Finish {
                result: GameResult::Draw
            }
            .encode(),
            vec![3, 2]
        );
    }

    // =====================================================================
    // decode(): valid buffers
    // =====================================================================

    #[test]
    fn test_decode_hint_yields_pairs_in_order() {
        let msg = Message::decode(&[5, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            msg,
            Message::Hint {
                fields: vec![f(2, 3), f(4, 5)]
            }
        );
    }

    #[test]
    fn test_decode_move_reads_action_after_destination() {
        // Action sits at offset 5, after dst.col. Here dst.col is 3 and the
        // action byte is 1 (swap); mixing the offsets up would fail.
        let msg = Message::decode(&[2, 1, 2, 0, 3, 1, 0]).unwrap();
        assert_eq!(
            msg,
            Message::Move {
                mv: Move::new(f(1, 2), f(0, 3), Action::Swap),
                player: Color::Black,
            }
        );
    }

    #[test]
    fn test_decode_finish_draw() {
        assert_eq!(
            Message::decode(&[3, 2]).unwrap(),
            Message::Finish {
                result: GameResult::Draw
            }
        );
    }

    #[test]
    fn test_decode_init_with_empty_session_id() {
        assert_eq!(
            Message::decode(&[0]).unwrap(),
            Message::Init {
                session_id: String::new()
            }
        );
    }

    #[test]
    fn test_decode_reverses_encode_for_each_kind() {
        let messages = vec![
            Message::Init {
                session_id: "0f3a9c".into(),
            },
            Message::Assign {
                color: Color::White,
            },
            Message::Move {
                mv: Move::new(f(6, 4), f(4, 4), Action::Replace),
                player: Color::White,
            },
            Message::Finish {
                result: GameResult::BlackWin,
            },
            Message::HintRequest {
                src: f(1, 7),
                player: Color::Black,
            },
            Message::Hint {
                fields: vec![f(2, 7), f(3, 7)],
            },
        ];
        for msg in messages {
            assert_eq!(Message::decode(&msg.encode()).unwrap(), msg);
        }
    }

    // =====================================================================
    // decode(): malformed buffers
    // =====================================================================

    #[test]
    fn test_decode_empty_buffer_returns_empty() {
        assert_eq!(Message::decode(&[]), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_decode_unknown_tag_returns_unknown() {
        assert_eq!(
            Message::decode(&[6, 1, 2]),
            Err(ProtocolError::UnknownTag(6))
        );
        assert_eq!(
            Message::decode(&[255]),
            Err(ProtocolError::UnknownTag(255))
        );
    }

    #[test]
    fn test_decode_truncated_move_returns_truncated() {
        assert_eq!(
            Message::decode(&[2, 0, 0, 0]),
            Err(ProtocolError::Truncated {
                kind: MessageKind::Move,
                expected: 6,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_decode_bare_tags_never_panic() {
        for tag in 1..=4u8 {
            assert!(
                matches!(
                    Message::decode(&[tag]),
                    Err(ProtocolError::Truncated { .. })
                ),
                "tag {tag}"
            );
        }
    }

    #[test]
    fn test_decode_trailing_bytes_rejected() {
        assert_eq!(
            Message::decode(&[1, 0, 9]),
            Err(ProtocolError::TrailingBytes {
                kind: MessageKind::Assign,
                extra: 1,
            })
        );
    }

    #[test]
    fn test_decode_odd_hint_payload_is_truncated() {
        assert!(matches!(
            Message::decode(&[5, 1, 2, 3]),
            Err(ProtocolError::Truncated {
                kind: MessageKind::Hint,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_out_of_range_values() {
        assert_eq!(
            Message::decode(&[4, 8, 0, 1]),
            Err(ProtocolError::InvalidField { row: 8, col: 0 })
        );
        assert_eq!(
            Message::decode(&[1, 2]),
            Err(ProtocolError::InvalidColor(2))
        );
        assert_eq!(
            Message::decode(&[2, 0, 0, 0, 1, 2, 1]),
            Err(ProtocolError::InvalidAction(2))
        );
        assert_eq!(
            Message::decode(&[3, 3]),
            Err(ProtocolError::InvalidResult(3))
        );
    }

    #[test]
    fn test_decode_invalid_utf8_session_id() {
        assert_eq!(
            Message::decode(&[0, 0xff, 0xfe]),
            Err(ProtocolError::InvalidUtf8)
        );
    }

    #[test]
    fn test_decode_is_total_over_short_buffers() {
        // Every buffer of length 0..=3 over a spread of byte values.
        // The assertion is simply that none of these panic.
        let bytes = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 128, 255];
        let _ = Message::decode(&[]);
        for &a in &bytes {
            let _ = Message::decode(&[a]);
            for &b in &bytes {
                let _ = Message::decode(&[a, b]);
                for &c in &bytes {
                    let _ = Message::decode(&[a, b, c]);
                }
            }
        }
    }

    // =====================================================================
    // MessageKind
    // =====================================================================

    #[test]
    fn test_kind_directions() {
        assert!(MessageKind::Move.direction().reaches_client());
        assert!(MessageKind::Move.direction().reaches_server());
        assert!(!MessageKind::Init.direction().reaches_client());
        assert!(!MessageKind::HintRequest.direction().reaches_client());
        assert!(!MessageKind::Hint.direction().reaches_server());
        assert!(!MessageKind::Assign.direction().reaches_server());
    }

    #[test]
    fn test_kind_tag_lookup() {
        for tag in 0..=5u8 {
            assert_eq!(MessageKind::from_tag(tag).unwrap().tag(), tag);
        }
        assert_eq!(MessageKind::from_tag(6), None);
    }
}
